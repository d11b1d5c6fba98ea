//! # Platform Ports
//!
//! Traits the host platform implements for the scanner: camera access, the
//! barcode decode engine and user feedback (cue, vibration, toast).
//!
//! ## Port Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Platform Ports                                 │
//! │                                                                         │
//! │   tally-scanner                         platform backend                │
//! │   ─────────────                         ────────────────                │
//! │   CameraAccessManager ──► MediaDevices   getUserMedia / enumerate       │
//! │                          └► MediaStream  tracks, liveness               │
//! │   DecodeSession ────────► DecodeEngine   start(request, results) / stop │
//! │                          ▲ DecodeEngineFactory (one engine per start)   │
//! │   FeedbackDispatcher ───► FeedbackSink   cue, vibrate, notify           │
//! │                                                                         │
//! │   A simulated backend lives in `crate::sim`.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tally_core::{BarcodeFormat, DecodeResult};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::feedback::Notification;

// =============================================================================
// Media Errors
// =============================================================================

/// Failure reported by the platform media API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// User or policy refused access.
    #[error("permission denied: {0}")]
    NotAllowed(String),

    /// No hardware matches the request.
    #[error("no matching device: {0}")]
    NotFound(String),

    /// Hardware exists but cannot satisfy the constraints.
    #[error("constraints cannot be satisfied: {0}")]
    Overconstrained(String),

    /// Hardware is busy or failed to start.
    #[error("device busy or unreadable: {0}")]
    NotReadable(String),

    #[error("media error: {0}")]
    Other(String),
}

impl MediaError {
    pub fn is_denial(&self) -> bool {
        matches!(self, MediaError::NotAllowed(_))
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    Environment,
    User,
}

/// Video constraints passed to `get_user_media`.
///
/// `None` fields are unconstrained. Resolution values are hints the platform
/// may ignore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: Option<FacingMode>,
    /// Exact device id.
    pub device_id: Option<String>,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl VideoConstraints {
    /// Any camera, any resolution.
    pub fn any() -> Self {
        Self::default()
    }

    /// An environment-facing camera with resolution hints.
    pub fn environment(ideal_width: u32, ideal_height: u32) -> Self {
        VideoConstraints {
            facing_mode: Some(FacingMode::Environment),
            device_id: None,
            ideal_width: Some(ideal_width),
            ideal_height: Some(ideal_height),
        }
    }

    /// One specific device with resolution hints.
    pub fn device(device_id: impl Into<String>, ideal_width: u32, ideal_height: u32) -> Self {
        VideoConstraints {
            facing_mode: None,
            device_id: Some(device_id.into()),
            ideal_width: Some(ideal_width),
            ideal_height: Some(ideal_height),
        }
    }
}

// =============================================================================
// Devices, Streams, Tracks
// =============================================================================

/// Kind of a media device as reported by enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// One entry of the platform's device enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A single media track.
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    fn label(&self) -> String;

    /// Stops the track. Calling it on a stopped track does nothing.
    fn stop(&self);

    fn is_live(&self) -> bool;
}

/// A live camera stream.
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;

    /// Device the platform actually opened, if it reports one.
    fn device_id(&self) -> Option<String>;

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// `true` while the stream is live. Flips to `false` once when the
    /// stream ends, whether stopped by us or lost.
    fn liveness(&self) -> watch::Receiver<bool>;
}

/// Shared handle to a camera stream.
pub type SharedStream = Arc<dyn MediaStream>;

/// The platform media-device API.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Requests a stream. May block on a permission prompt.
    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<SharedStream, MediaError>;

    /// Lists media devices in platform order. Labels are empty until access
    /// has been granted once.
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError>;
}

// =============================================================================
// Decode Engine
// =============================================================================

/// Region of the frame the engine searches, as percentages of each edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanArea {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for ScanArea {
    fn default() -> Self {
        ScanArea {
            top: 25.0,
            right: 10.0,
            bottom: 25.0,
            left: 10.0,
        }
    }
}

/// Everything an engine needs to start decoding.
#[derive(Clone)]
pub struct EngineRequest {
    /// Render surface the engine draws onto.
    pub surface: String,
    pub stream: SharedStream,
    pub device_id: Option<String>,
    pub formats: Vec<BarcodeFormat>,
    pub workers: usize,
    /// Frames sampled per second.
    pub frequency: u32,
    pub area: ScanArea,
    /// Locate the barcode before decoding (slower, tolerates rotation).
    pub locate: bool,
}

impl EngineRequest {
    /// Reader names for the requested formats, in priority order.
    pub fn readers(&self) -> Vec<&'static str> {
        self.formats.iter().map(BarcodeFormat::reader_name).collect()
    }
}

impl std::fmt::Debug for EngineRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRequest")
            .field("surface", &self.surface)
            .field("stream", &self.stream.id())
            .field("device_id", &self.device_id)
            .field("formats", &self.formats)
            .field("workers", &self.workers)
            .field("frequency", &self.frequency)
            .finish()
    }
}

/// Decode engine failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine init failed: {0}")]
    InitFailed(String),

    #[error("engine init timed out after {0:?}")]
    Timeout(Duration),

    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// A barcode decode engine instance.
///
/// `start` returns once the engine is running; results then flow into
/// `results` until `stop` is called, which drops the sender.
#[async_trait]
pub trait DecodeEngine: Send {
    async fn start(
        &mut self,
        request: EngineRequest,
        results: mpsc::Sender<DecodeResult>,
    ) -> Result<(), EngineError>;

    /// Stops decoding and releases the result sender. Idempotent.
    fn stop(&mut self);
}

/// Creates engine instances.
pub trait DecodeEngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn DecodeEngine>;
}

// =============================================================================
// Feedback
// =============================================================================

/// Feedback effect failure. Always best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("not supported on this platform")]
    Unsupported,

    #[error("feedback failed: {0}")]
    Failed(String),
}

/// User feedback surface (speaker, vibration motor, toast area).
pub trait FeedbackSink: Send + Sync {
    fn play_cue(&self) -> Result<(), FeedbackError>;

    fn vibrate(&self, duration: Duration) -> Result<(), FeedbackError>;

    fn notify(&self, notification: &Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints() {
        let any = VideoConstraints::any();
        assert!(any.facing_mode.is_none());
        assert!(any.device_id.is_none());

        let env = VideoConstraints::environment(1280, 720);
        assert_eq!(env.facing_mode, Some(FacingMode::Environment));
        assert_eq!(env.ideal_width, Some(1280));

        let dev = VideoConstraints::device("cam-1", 1280, 720);
        assert_eq!(dev.device_id.as_deref(), Some("cam-1"));
        assert!(dev.facing_mode.is_none());
    }

    #[test]
    fn test_media_error_denial() {
        assert!(MediaError::NotAllowed("x".into()).is_denial());
        assert!(!MediaError::NotFound("x".into()).is_denial());
    }

    #[test]
    fn test_default_scan_area() {
        let area = ScanArea::default();
        assert_eq!(area.top, 25.0);
        assert_eq!(area.left, 10.0);
    }
}
