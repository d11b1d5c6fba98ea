//! # Scanner Status
//!
//! The read-only snapshot the controller publishes after every transition.
//!
//! ## Phase Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scanner Phases                                   │
//! │                                                                         │
//! │  ┌────────┐  open()  ┌─────────┐       ┌────────────┐                  │
//! │  │ Closed │ ───────► │ Opening │ ────► │ Requesting │ ◄──── retry()    │
//! │  └────────┘          └─────────┘       └─────┬──────┘         ▲        │
//! │      ▲                                 granted│  denied/none   │        │
//! │      │                                       ▼        ┌───────┴──┐     │
//! │      │                               ┌─────────────┐  │  Error   │     │
//! │      │ close()                       │ DeviceReady │─►│          │     │
//! │      │ (from anywhere)               └──────┬──────┘  └──────────┘     │
//! │      │                                      │ engine up      ▲         │
//! │      │                                      ▼                │         │
//! │      │                             ┌───────────────┐  stream lost,     │
//! │      └──────────────────────────── │ SessionActive │  retries spent    │
//! │                                    └──┬─────────▲──┘                   │
//! │                              accepted │         │ pause elapsed        │
//! │                                       ▼         │                      │
//! │                                    ┌───────────────┐                   │
//! │                                    │   Detecting   │                   │
//! │                                    └───────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::CameraDevice;
use ts_rs::TS;

use crate::error::{ScanError, ScanErrorKind};

/// Number of accepted codes kept in [`ScannerStatus::recent_scans`].
pub const RECENT_SCAN_LIMIT: usize = 5;

// =============================================================================
// Scanner Phase
// =============================================================================

/// Where the scanner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScannerPhase {
    /// Dialog closed; nothing held.
    #[default]
    Closed,
    /// Dialog opened, about to ask for the camera.
    Opening,
    /// Waiting on the permission prompt or a device stream.
    Requesting,
    /// Stream acquired, decoder not yet running.
    DeviceReady,
    /// Decoder running, results flowing.
    SessionActive,
    /// A scan was just accepted; decoder paused.
    Detecting,
    /// Waiting for the user to retry or close.
    Error,
}

impl ScannerPhase {
    /// Returns true while a camera stream is (or may be) attached.
    pub fn holds_camera(&self) -> bool {
        matches!(
            self,
            ScannerPhase::DeviceReady | ScannerPhase::SessionActive | ScannerPhase::Detecting
        )
    }

    /// Returns true for phases where the decode engine may be live.
    pub fn is_scanning(&self) -> bool {
        matches!(self, ScannerPhase::SessionActive)
    }
}

impl std::fmt::Display for ScannerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScannerPhase::Closed => write!(f, "closed"),
            ScannerPhase::Opening => write!(f, "opening"),
            ScannerPhase::Requesting => write!(f, "requesting"),
            ScannerPhase::DeviceReady => write!(f, "device_ready"),
            ScannerPhase::SessionActive => write!(f, "session_active"),
            ScannerPhase::Detecting => write!(f, "detecting"),
            ScannerPhase::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Fault / Scans
// =============================================================================

/// The error shown in the scanner dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Fault {
    pub kind: ScanErrorKind,
    pub message: String,
}

impl From<&ScanError> for Fault {
    fn from(err: &ScanError) -> Self {
        Fault {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// How an accepted code entered the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanSource {
    Camera,
    Manual,
}

/// An accepted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LastScan {
    pub code: String,
    #[ts(as = "String")]
    pub at: DateTime<Utc>,
    pub source: ScanSource,
}

// =============================================================================
// Scanner Status
// =============================================================================

/// Snapshot of the scanner, published through a `watch` channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScannerStatus {
    pub phase: ScannerPhase,

    /// Device the current stream was acquired for.
    pub active_device: Option<String>,

    /// Video inputs from the last enumeration.
    pub devices: Vec<CameraDevice>,

    pub last_accepted: Option<LastScan>,

    /// Codes accepted in this session, newest first.
    pub recent_scans: Vec<LastScan>,

    pub fault: Option<Fault>,

    /// Decoder failed but the raw video is still shown.
    pub passthrough: bool,

    /// Current automatic stream recovery attempt (0 when not recovering).
    pub stream_retry_attempt: u32,
}

impl ScannerStatus {
    pub fn is_open(&self) -> bool {
        self.phase != ScannerPhase::Closed
    }

    pub fn fault_kind(&self) -> Option<ScanErrorKind> {
        self.fault.as_ref().map(|f| f.kind)
    }

    /// Records an accepted code as the latest scan and at the head of the
    /// history, dropping the oldest entry past [`RECENT_SCAN_LIMIT`].
    pub fn record_scan(&mut self, scan: LastScan) {
        self.recent_scans.insert(0, scan.clone());
        self.recent_scans.truncate(RECENT_SCAN_LIMIT);
        self.last_accepted = Some(scan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default() {
        let status = ScannerStatus::default();
        assert_eq!(status.phase, ScannerPhase::Closed);
        assert!(!status.is_open());
        assert!(status.fault.is_none());
        assert!(!status.passthrough);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ScannerPhase::SessionActive.to_string(), "session_active");
        assert_eq!(ScannerPhase::DeviceReady.to_string(), "device_ready");
        assert!(ScannerPhase::Detecting.holds_camera());
        assert!(!ScannerPhase::Requesting.holds_camera());
    }

    #[test]
    fn test_fault_from_error() {
        let fault = Fault::from(&ScanError::NoDeviceFound);
        assert_eq!(fault.kind, ScanErrorKind::NoDeviceFound);
        assert_eq!(fault.message, "No camera found on this device");
    }

    #[test]
    fn test_record_scan_keeps_newest_five() {
        let mut status = ScannerStatus::default();
        for n in 0..7 {
            status.record_scan(LastScan {
                code: format!("code-{}", n),
                at: Utc::now(),
                source: ScanSource::Camera,
            });
        }

        let codes: Vec<&str> = status.recent_scans.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["code-6", "code-5", "code-4", "code-3", "code-2"]);
        assert_eq!(status.last_accepted.unwrap().code, "code-6");
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = ScannerStatus {
            stream_retry_attempt: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "closed");
        assert_eq!(json["streamRetryAttempt"], 2);
        assert!(json["recentScans"].as_array().unwrap().is_empty());
    }
}
