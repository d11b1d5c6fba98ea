//! # Scanner Error Types
//!
//! Error types for the capture pipeline.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scanner Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Camera      │  │     Decoder     │  │     State Machine       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ PermissionDenied│  │ DecoderInit-    │  │  InvalidTransition      │ │
//! │  │ NoDeviceFound   │  │   Failed        │  │  UnknownDevice          │ │
//! │  │ DeviceUnavail.  │  │                 │  │  Cancelled              │ │
//! │  │ StreamLost      │  │                 │  │  ChannelError           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  Configuration  │  │      Input      │  Platform ports report       │
//! │  │                 │  │                 │  MediaError / EngineError,   │
//! │  │  InvalidConfig  │  │  InvalidBarcode │  which are mapped into       │
//! │  │  ConfigLoad/Save│  │                 │  ScanError here.             │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use tally_core::ValidationError;

use crate::platform::{EngineError, MediaError};
use crate::status::ScannerPhase;

/// Result type alias for scanner operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Scanner error type covering every failure the host can observe.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    // =========================================================================
    // Camera Errors
    // =========================================================================
    /// The user (or platform policy) refused camera access.
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    /// Access was granted but no video input exists.
    #[error("No camera found on this device")]
    NoDeviceFound,

    /// Camera exists but is busy, unreadable or enumeration failed.
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// The active stream ended without being released by us.
    #[error("Camera stream lost")]
    StreamLost,

    // =========================================================================
    // Decoder Errors
    // =========================================================================
    /// The decode engine failed to start or timed out during init.
    #[error("Failed to initialize barcode scanner: {0}")]
    DecoderInitFailed(String),

    // =========================================================================
    // State Machine Errors
    // =========================================================================
    /// Operation is not valid in the current phase.
    #[error("Cannot {operation} while scanner is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: ScannerPhase,
    },

    /// `change_device` named a device that is not in the current list.
    #[error("Unknown camera device: {0}")]
    UnknownDevice(String),

    /// The command was still queued when the scanner shut down.
    #[error("Operation cancelled")]
    Cancelled,

    /// Controller command channel closed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scanner configuration.
    #[error("Invalid scanner configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// A manually entered code failed barcode validation.
    #[error("Invalid barcode: {0}")]
    InvalidBarcode(String),
}

/// Machine-readable error kind, published in the scanner status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorKind {
    PermissionDenied,
    NoDeviceFound,
    DeviceUnavailable,
    StreamLost,
    DecoderInitFailed,
    InvalidTransition,
    UnknownDevice,
    Cancelled,
    ChannelError,
    InvalidConfig,
    ConfigLoadFailed,
    ConfigSaveFailed,
    InvalidBarcode,
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScanErrorKind::PermissionDenied => "permission_denied",
            ScanErrorKind::NoDeviceFound => "no_device_found",
            ScanErrorKind::DeviceUnavailable => "device_unavailable",
            ScanErrorKind::StreamLost => "stream_lost",
            ScanErrorKind::DecoderInitFailed => "decoder_init_failed",
            ScanErrorKind::InvalidTransition => "invalid_transition",
            ScanErrorKind::UnknownDevice => "unknown_device",
            ScanErrorKind::Cancelled => "cancelled",
            ScanErrorKind::ChannelError => "channel_error",
            ScanErrorKind::InvalidConfig => "invalid_config",
            ScanErrorKind::ConfigLoadFailed => "config_load_failed",
            ScanErrorKind::ConfigSaveFailed => "config_save_failed",
            ScanErrorKind::InvalidBarcode => "invalid_barcode",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<MediaError> for ScanError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotAllowed(msg) => ScanError::PermissionDenied(msg),
            MediaError::NotFound(_) | MediaError::Overconstrained(_) => ScanError::NoDeviceFound,
            MediaError::NotReadable(msg) | MediaError::Other(msg) => {
                ScanError::DeviceUnavailable(msg)
            }
        }
    }
}

impl From<EngineError> for ScanError {
    fn from(err: EngineError) -> Self {
        ScanError::DecoderInitFailed(err.to_string())
    }
}

impl From<ValidationError> for ScanError {
    fn from(err: ValidationError) -> Self {
        ScanError::InvalidBarcode(err.to_string())
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ScanError {
    fn from(err: toml::ser::Error) -> Self {
        ScanError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ScanError {
    pub fn kind(&self) -> ScanErrorKind {
        match self {
            ScanError::PermissionDenied(_) => ScanErrorKind::PermissionDenied,
            ScanError::NoDeviceFound => ScanErrorKind::NoDeviceFound,
            ScanError::DeviceUnavailable(_) => ScanErrorKind::DeviceUnavailable,
            ScanError::StreamLost => ScanErrorKind::StreamLost,
            ScanError::DecoderInitFailed(_) => ScanErrorKind::DecoderInitFailed,
            ScanError::InvalidTransition { .. } => ScanErrorKind::InvalidTransition,
            ScanError::UnknownDevice(_) => ScanErrorKind::UnknownDevice,
            ScanError::Cancelled => ScanErrorKind::Cancelled,
            ScanError::ChannelError(_) => ScanErrorKind::ChannelError,
            ScanError::InvalidConfig(_) => ScanErrorKind::InvalidConfig,
            ScanError::ConfigLoadFailed(_) => ScanErrorKind::ConfigLoadFailed,
            ScanError::ConfigSaveFailed(_) => ScanErrorKind::ConfigSaveFailed,
            ScanError::InvalidBarcode(_) => ScanErrorKind::InvalidBarcode,
        }
    }

    /// Returns true if retrying the same operation may succeed.
    ///
    /// ## Retryable Errors
    /// - Stream loss (camera unplugged and replugged, OS reclaimed it)
    /// - Busy camera (another app held it)
    ///
    /// Permission denial is not retryable without user action; the UI offers
    /// a manual retry button for it instead.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::StreamLost | ScanError::DeviceUnavailable(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidConfig(_)
                | ScanError::ConfigLoadFailed(_)
                | ScanError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ScanError::StreamLost.is_retryable());
        assert!(ScanError::DeviceUnavailable("busy".into()).is_retryable());

        assert!(!ScanError::PermissionDenied("denied".into()).is_retryable());
        assert!(!ScanError::NoDeviceFound.is_retryable());
        assert!(!ScanError::DecoderInitFailed("wasm".into()).is_retryable());
    }

    #[test]
    fn test_media_error_mapping() {
        let err: ScanError = MediaError::NotAllowed("dismissed".into()).into();
        assert_eq!(err.kind(), ScanErrorKind::PermissionDenied);

        let err: ScanError = MediaError::Overconstrained("facingMode".into()).into();
        assert_eq!(err.kind(), ScanErrorKind::NoDeviceFound);

        let err: ScanError = MediaError::NotReadable("in use".into()).into();
        assert_eq!(err.kind(), ScanErrorKind::DeviceUnavailable);
    }

    #[test]
    fn test_error_display() {
        let err = ScanError::InvalidTransition {
            operation: "open",
            phase: ScannerPhase::SessionActive,
        };
        assert_eq!(err.to_string(), "Cannot open while scanner is session_active");
        assert!(!err.is_config_error());
        assert!(ScanError::InvalidConfig("x".into()).is_config_error());
    }

    #[test]
    fn test_validation_error_is_invalid_barcode() {
        let err: ScanError = ValidationError::Required {
            field: "barcode".into(),
        }
        .into();
        assert_eq!(err.kind(), ScanErrorKind::InvalidBarcode);
        assert_eq!(err.to_string(), "Invalid barcode: barcode is required");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ScanErrorKind::DecoderInitFailed).unwrap();
        assert_eq!(json, "\"decoder_init_failed\"");
        assert_eq!(ScanErrorKind::StreamLost.to_string(), "stream_lost");
    }
}
