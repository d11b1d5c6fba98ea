//! # Domain Types
//!
//! Core domain types shared by the scanner pipeline and the cart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CameraDevice   │   │  DecodeResult   │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  code           │   │  id             │       │
//! │  │  label          │   │  format         │   │  barcode        │       │
//! │  │  facing         │   │  confidence     │   │  price_cents    │       │
//! │  └─────────────────┘   │  detected_at    │   │  stock          │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Facing      │   │  BarcodeFormat  │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Front          │   │  Ean13  Ean8    │                             │
//! │  │  Back           │   │  Code128 Code39 │                             │
//! │  │  Unknown        │   │  Code93 UpcA/E  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All of these are plain snapshots. A `CameraDevice` list is only valid for
//! the enumeration call that produced it, and a `DecodeResult` is never
//! persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Camera Facing
// =============================================================================

/// Which way a camera points, as far as the platform lets us tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// User-facing ("selfie") camera.
    Front,
    /// Environment-facing camera, the one that can see a product.
    Back,
    /// Label gave no hint (or was anonymous because access was never granted).
    #[default]
    Unknown,
}

/// Label fragments that mark an environment-facing camera.
pub const REAR_LABEL_HINTS: [&str; 3] = ["back", "rear", "environment"];

/// Label fragments that mark a user-facing camera.
const FRONT_LABEL_HINTS: [&str; 3] = ["front", "user", "facetime"];

impl Facing {
    /// Infers the facing from a device label (case-insensitive).
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if REAR_LABEL_HINTS.iter().any(|hint| label.contains(hint)) {
            Facing::Back
        } else if FRONT_LABEL_HINTS.iter().any(|hint| label.contains(hint)) {
            Facing::Front
        } else {
            Facing::Unknown
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
            Facing::Unknown => write!(f, "unknown"),
        }
    }
}

// =============================================================================
// Camera Device
// =============================================================================

/// A video input reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CameraDevice {
    /// Platform device id (stable for the page/process lifetime).
    pub id: String,

    /// Human-readable label. Empty until camera access has been granted once.
    pub label: String,

    /// Inferred facing.
    pub facing: Facing,
}

impl CameraDevice {
    /// Builds a device snapshot, inferring the facing from the label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        CameraDevice {
            id: id.into(),
            facing: Facing::from_label(&label),
            label,
        }
    }

    /// Returns true if the label carries no information.
    pub fn is_anonymous(&self) -> bool {
        self.label.trim().is_empty()
    }

    /// Label for display, falling back to the id for anonymous devices.
    pub fn display_name(&self) -> &str {
        if self.is_anonymous() {
            &self.id
        } else {
            &self.label
        }
    }
}

// =============================================================================
// Barcode Format
// =============================================================================

/// Symbologies the decoder can be asked to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "code_93")]
    Code93,
    #[serde(rename = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    UpcE,
}

impl BarcodeFormat {
    /// Every format the scanner supports, in reader priority order.
    pub const ALL: [BarcodeFormat; 7] = [
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
    ];

    /// Name of the decoder reader that handles this format.
    pub const fn reader_name(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean13 => "ean_reader",
            BarcodeFormat::Ean8 => "ean_8_reader",
            BarcodeFormat::Code128 => "code_128_reader",
            BarcodeFormat::Code39 => "code_39_reader",
            BarcodeFormat::Code93 => "code_93_reader",
            BarcodeFormat::UpcA => "upc_reader",
            BarcodeFormat::UpcE => "upc_e_reader",
        }
    }

    /// Fixed digit count for retail formats, `None` for variable-length ones.
    pub const fn fixed_length(&self) -> Option<usize> {
        match self {
            BarcodeFormat::Ean13 => Some(13),
            BarcodeFormat::Ean8 => Some(8),
            BarcodeFormat::UpcA => Some(12),
            BarcodeFormat::UpcE => Some(8),
            BarcodeFormat::Code128 | BarcodeFormat::Code39 | BarcodeFormat::Code93 => None,
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::Code93 => "code_93",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BarcodeFormat {
    type Err = String;

    /// Accepts both format names (`ean_13`) and reader names (`ean_reader`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase().replace('-', "_");
        BarcodeFormat::ALL
            .into_iter()
            .find(|format| format.to_string() == s || format.reader_name() == s)
            .ok_or_else(|| format!("Unknown barcode format: {}", s))
    }
}

// =============================================================================
// Decode Result
// =============================================================================

/// One decode attempt reported by the engine.
///
/// Low-confidence results are delivered too; filtering is the job of
/// [`crate::dedup::Deduplicator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DecodeResult {
    /// Decoded payload.
    pub code: String,

    /// Symbology the payload was read as.
    pub format: BarcodeFormat,

    /// Decoder certainty, clamped to 0..=1.
    pub confidence: f64,

    /// Wall-clock time of the detection (display/logging only).
    #[ts(as = "String")]
    pub detected_at: DateTime<Utc>,
}

impl DecodeResult {
    /// Creates a result stamped with the current time.
    pub fn new(code: impl Into<String>, format: BarcodeFormat, confidence: f64) -> Self {
        DecodeResult {
            code: code.into(),
            format,
            confidence: confidence.clamp(0.0, 1.0),
            detected_at: Utc::now(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the storefront catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Catalog id.
    pub id: u32,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Price in centavos (smallest currency unit).
    pub price_cents: i64,

    /// Catalog category ("meat", "vegetable", ...).
    pub category: String,

    /// Barcode printed on the shelf label (EAN-13 for the seeded catalog).
    pub barcode: String,

    /// Units on hand.
    pub stock: i64,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be sold from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_from_label() {
        assert_eq!(Facing::from_label("Rear Camera"), Facing::Back);
        assert_eq!(Facing::from_label("camera2 0, facing back"), Facing::Back);
        assert_eq!(Facing::from_label("ENVIRONMENT cam"), Facing::Back);
        assert_eq!(Facing::from_label("Front Camera"), Facing::Front);
        assert_eq!(Facing::from_label("FaceTime HD Camera"), Facing::Front);
        assert_eq!(Facing::from_label("USB Webcam"), Facing::Unknown);
        assert_eq!(Facing::from_label(""), Facing::Unknown);
    }

    #[test]
    fn test_camera_device_display_name() {
        let anon = CameraDevice::new("dev-1", "");
        assert!(anon.is_anonymous());
        assert_eq!(anon.display_name(), "dev-1");

        let named = CameraDevice::new("dev-2", "Back Camera");
        assert_eq!(named.display_name(), "Back Camera");
        assert_eq!(named.facing, Facing::Back);
    }

    #[test]
    fn test_barcode_format_parsing() {
        assert_eq!("ean_13".parse::<BarcodeFormat>().unwrap(), BarcodeFormat::Ean13);
        assert_eq!("ean_reader".parse::<BarcodeFormat>().unwrap(), BarcodeFormat::Ean13);
        assert_eq!("Code-128".parse::<BarcodeFormat>().unwrap(), BarcodeFormat::Code128);
        assert_eq!("upc_e_reader".parse::<BarcodeFormat>().unwrap(), BarcodeFormat::UpcE);
        assert!("qr".parse::<BarcodeFormat>().is_err());
    }

    #[test]
    fn test_barcode_format_serde_names() {
        let json = serde_json::to_string(&BarcodeFormat::Code39).unwrap();
        assert_eq!(json, "\"code_39\"");
        let parsed: BarcodeFormat = serde_json::from_str("\"upc_a\"").unwrap();
        assert_eq!(parsed, BarcodeFormat::UpcA);
    }

    #[test]
    fn test_decode_result_clamps_confidence() {
        assert_eq!(DecodeResult::new("A", BarcodeFormat::Code39, 1.7).confidence, 1.0);
        assert_eq!(DecodeResult::new("A", BarcodeFormat::Code39, -0.2).confidence, 0.0);
    }
}
