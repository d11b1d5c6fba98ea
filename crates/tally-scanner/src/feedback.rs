//! # Scan Feedback
//!
//! Effects that run when a scan is accepted or the scanner faults, plus the
//! host callback trait.
//!
//! ## Acceptance Effects (in order)
//! ```text
//! accepted "8801234567891"
//!      │
//!      ├── play_cue()      best-effort, failure logged at debug
//!      ├── vibrate(100ms)  best-effort, only if enabled
//!      ├── notify("Barcode detected!", "Code: 8801234567891")
//!      │
//!      └── ScanHandler::on_barcode_detected("8801234567891")   (controller)
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::config::FeedbackSettings;
use crate::error::{ScanError, ScanErrorKind};
use crate::platform::{FeedbackError, FeedbackSink};

// =============================================================================
// Notification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A toast shown to the cashier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Warning,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    /// The toast for an accepted scan.
    pub fn detected(code: &str) -> Self {
        Self::info("Barcode detected!", format!("Code: {}", code))
    }

    /// The toast for a scanner fault.
    pub fn for_fault(err: &ScanError) -> Self {
        match err.kind() {
            ScanErrorKind::PermissionDenied => Self::error(
                "Camera Error",
                "Camera permission denied. Please allow camera access and try again.",
            ),
            ScanErrorKind::NoDeviceFound => {
                Self::error("Camera Error", "No cameras detected on your device")
            }
            ScanErrorKind::DecoderInitFailed => Self::warning("Scanner Error", err.to_string()),
            ScanErrorKind::StreamLost => Self::error(
                "Camera Error",
                "The camera stopped responding. Tap retry to reconnect.",
            ),
            ScanErrorKind::InvalidBarcode => {
                Self::error("Invalid Barcode", "Please enter a valid barcode")
            }
            _ => Self::error("Camera Error", err.to_string()),
        }
    }
}

// =============================================================================
// Host Callback
// =============================================================================

/// Receives every accepted code exactly once.
pub trait ScanHandler: Send + Sync {
    fn on_barcode_detected(&self, code: &str);
}

impl<F> ScanHandler for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_barcode_detected(&self, code: &str) {
        self(code)
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Sink that does nothing (headless use).
pub struct NoOpFeedback;

impl FeedbackSink for NoOpFeedback {
    fn play_cue(&self) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn vibrate(&self, _duration: Duration) -> Result<(), FeedbackError> {
        Err(FeedbackError::Unsupported)
    }

    fn notify(&self, _notification: &Notification) {}
}

/// Sink that writes notifications to the log.
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn play_cue(&self) -> Result<(), FeedbackError> {
        debug!("beep");
        Ok(())
    }

    fn vibrate(&self, duration: Duration) -> Result<(), FeedbackError> {
        debug!(?duration, "vibrate");
        Ok(())
    }

    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Info => {
                info!(title = %notification.title, "{}", notification.description)
            }
            NotificationLevel::Warning => {
                warn!(title = %notification.title, "{}", notification.description)
            }
            NotificationLevel::Error => {
                error!(title = %notification.title, "{}", notification.description)
            }
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Runs feedback effects according to the configured settings.
#[derive(Clone)]
pub struct FeedbackDispatcher {
    sink: Arc<dyn FeedbackSink>,
    settings: FeedbackSettings,
}

impl FeedbackDispatcher {
    pub fn new(sink: Arc<dyn FeedbackSink>, settings: FeedbackSettings) -> Self {
        FeedbackDispatcher { sink, settings }
    }

    /// Effects for an accepted scan. Never fails.
    pub fn accepted(&self, code: &str) {
        if self.settings.audio {
            if let Err(e) = self.sink.play_cue() {
                debug!(?e, "Scan cue failed");
            }
        }

        if self.settings.vibrate {
            let duration = Duration::from_millis(self.settings.vibrate_ms);
            if let Err(e) = self.sink.vibrate(duration) {
                debug!(?e, "Vibration failed");
            }
        }

        if self.settings.notify {
            self.sink.notify(&Notification::detected(code));
        }
    }

    /// Toast for a controller fault.
    pub fn fault(&self, err: &ScanError) {
        self.sink.notify(&Notification::for_fault(err));
    }

    pub fn notify(&self, notification: Notification) {
        self.sink.notify(&notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        cues: Mutex<u32>,
        vibrations: Mutex<u32>,
        notes: Mutex<Vec<Notification>>,
        fail_cue: bool,
    }

    impl FeedbackSink for Recorder {
        fn play_cue(&self) -> Result<(), FeedbackError> {
            *self.cues.lock().unwrap() += 1;
            if self.fail_cue {
                Err(FeedbackError::Failed("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }

        fn vibrate(&self, _duration: Duration) -> Result<(), FeedbackError> {
            *self.vibrations.lock().unwrap() += 1;
            Ok(())
        }

        fn notify(&self, notification: &Notification) {
            self.notes.lock().unwrap().push(notification.clone());
        }
    }

    #[test]
    fn test_accepted_runs_enabled_effects() {
        let sink = Arc::new(Recorder::default());
        let dispatcher = FeedbackDispatcher::new(sink.clone(), FeedbackSettings::default());

        dispatcher.accepted("8801234567891");

        assert_eq!(*sink.cues.lock().unwrap(), 1);
        assert_eq!(*sink.vibrations.lock().unwrap(), 0);
        let notes = sink.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Barcode detected!");
        assert_eq!(notes[0].description, "Code: 8801234567891");
    }

    #[test]
    fn test_cue_failure_is_swallowed() {
        let sink = Arc::new(Recorder {
            fail_cue: true,
            ..Default::default()
        });
        let settings = FeedbackSettings {
            vibrate: true,
            ..Default::default()
        };
        let dispatcher = FeedbackDispatcher::new(sink.clone(), settings);

        dispatcher.accepted("A");

        assert_eq!(*sink.vibrations.lock().unwrap(), 1);
        assert_eq!(sink.notes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_audio_disabled() {
        let sink = Arc::new(Recorder::default());
        let settings = FeedbackSettings {
            audio: false,
            ..Default::default()
        };
        FeedbackDispatcher::new(sink.clone(), settings).accepted("A");
        assert_eq!(*sink.cues.lock().unwrap(), 0);
    }

    #[test]
    fn test_fault_notifications() {
        let note = Notification::for_fault(&ScanError::PermissionDenied("denied".into()));
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.description.contains("allow camera access"));

        let note = Notification::for_fault(&ScanError::DecoderInitFailed("wasm".into()));
        assert_eq!(note.level, NotificationLevel::Warning);
        assert!(note.description.contains("wasm"));
    }

    #[test]
    fn test_invalid_barcode_notification() {
        let note = Notification::for_fault(&ScanError::InvalidBarcode("blank".into()));
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.description, "Please enter a valid barcode");
    }

    #[test]
    fn test_closure_is_scan_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = move |code: &str| sink.lock().unwrap().push(code.to_string());

        let handler: &dyn ScanHandler = &handler;
        handler.on_barcode_detected("X");

        assert_eq!(*seen.lock().unwrap(), vec!["X".to_string()]);
    }
}
