//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate holds the rules behind the camera barcode scanner and the cart
//! it feeds, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront UI (browser)                      │   │
//! │  │    Catalog ──► Cart ──► Checkout        Scanner dialog          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ on_barcode_detected(code)              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tally-scanner (camera + decoder actor)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  device   │  │   dedup   │  │  catalog  │  │   cart    │  │   │
//! │  │   │ rear-cam  │  │ cooldown  │  │  barcode  │  │  totals   │  │   │
//! │  │   │ heuristic │  │ threshold │  │  lookup   │  │  limits   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CAMERA • NO DECODER • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CameraDevice, DecodeResult, BarcodeFormat, Product)
//! - [`device`] - Preferred camera selection and camera cycling
//! - [`dedup`] - Confidence threshold + cooldown rule for accepting scans
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - Barcode → product lookup
//! - [`cart`] - Cart built from scanned products
//! - [`error`] - Domain error types
//! - [`validation`] - Barcode and quantity validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use tally_core::dedup::{DedupConfig, Deduplicator};
//! use tally_core::types::{BarcodeFormat, DecodeResult};
//!
//! let mut dedup = Deduplicator::new(DedupConfig::default());
//! let t0 = Instant::now();
//! let scan = DecodeResult::new("8801234567891", BarcodeFormat::Ean13, 0.9);
//!
//! assert!(dedup.accept(&scan, t0));
//! // Same code half a second later is the same physical scan
//! assert!(!dedup.accept(&scan, t0 + Duration::from_millis(500)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod dedup;
pub mod device;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals};
pub use catalog::Catalog;
pub use dedup::{AcceptedScan, CooldownScope, DedupConfig, Deduplicator};
pub use device::{next_device, select_preferred};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum unique items allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart.
///
/// A held-down scan that slips past the cooldown should hit this long before
/// it empties the shelf.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default minimum decoder confidence for accepting a scan.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.65;

/// Default cooldown before the same code is accepted again (milliseconds).
pub const DEFAULT_COOLDOWN_MS: u64 = 3000;
