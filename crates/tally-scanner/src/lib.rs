//! # tally-scanner: Camera Barcode Capture for Tally POS
//!
//! This crate turns a camera into a barcode input for the storefront: it
//! acquires the camera, runs a decode engine over the stream, filters the
//! results, and hands each accepted code to the host exactly once.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scanner Architecture                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │               ScannerController (actor, one task)                │  │
//! │  │                                                                  │  │
//! │  │  Closed → Opening → Requesting → DeviceReady → SessionActive     │  │
//! │  │                                    ▲               │  ▲          │  │
//! │  │                       Error ◄──────┴───────────────┘  │ pause    │  │
//! │  │                                              Detecting┘          │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ CameraAccess   │  │ DecodeSession  │  │ FeedbackDispatcher     │    │
//! │  │ Manager        │  │                │  │                        │    │
//! │  │ permission,    │  │ one engine at  │  │ cue, vibration,        │    │
//! │  │ fallback,      │  │ a time, init   │  │ "Barcode detected!"    │    │
//! │  │ release        │  │ timeout        │  │ toast                  │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          ▼                   ▼                       ▼                  │
//! │     MediaDevices        DecodeEngine            FeedbackSink            │
//! │     (platform ports, simulated in `sim`)                               │
//! │                                                                         │
//! │  ACCEPTED CODES:                                                       │
//! │  Deduplicator (tally-core) → FeedbackDispatcher → ScanHandler          │
//! │  (`CartHandoff` adds one unit of the scanned product to the cart)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`controller`] - Scanner actor and its handle
//! - [`camera`] - Camera permission, acquisition and release
//! - [`session`] - Decode engine lifecycle and result stream
//! - [`feedback`] - Scan feedback effects and the host callback
//! - [`handoff`] - Scan → cart hand-off
//! - [`retry`] - Bounded exponential retry policy
//! - [`config`] - Scanner configuration (TOML + environment)
//! - [`status`] - Published status snapshot
//! - [`platform`] - Platform port traits
//! - [`sim`] - Simulated platform for tests and `scan-sim`
//! - [`error`] - Scanner error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_scanner::{ScannerConfig, ScannerController, ScannerDeps};
//!
//! let config = ScannerConfig::load_or_default(None);
//! let handle = ScannerController::spawn(config, deps);
//!
//! handle.open().await?;
//! let mut status = handle.subscribe();
//! status.changed().await?;
//! println!("Phase: {}", status.borrow().phase);
//!
//! handle.close().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod feedback;
pub mod handoff;
pub mod platform;
pub mod retry;
pub mod session;
pub mod sim;
pub mod status;

// =============================================================================
// Re-exports
// =============================================================================

pub use camera::{CameraAccessManager, FacingPreference};
pub use config::ScannerConfig;
pub use controller::{ScannerController, ScannerDeps, ScannerHandle};
pub use error::{ScanError, ScanErrorKind, ScanResult};
pub use feedback::{
    FeedbackDispatcher, LogFeedback, NoOpFeedback, Notification, NotificationLevel, ScanHandler,
};
pub use handoff::CartHandoff;
pub use retry::{RetryPolicy, RetrySchedule};
pub use session::{DecodeConfig, DecodeResults, DecodeSession, VideoTarget};
pub use status::{Fault, LastScan, ScanSource, ScannerPhase, ScannerStatus};
