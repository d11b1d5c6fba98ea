//! # Camera Access
//!
//! Acquires and releases camera streams through the platform media API.
//!
//! ## Request Flow
//! ```text
//! request_access(Environment)
//!      │
//!      ├── get_user_media(facing=environment, 1280x720) ── ok ──► stream
//!      │         │ err
//!      │         ▼
//!      ├── get_user_media(any) ─────────────────────────── ok ──► stream
//!      │         │ err
//!      │         ▼
//!      └── either attempt denied? ── yes ──► PermissionDenied
//!                                    no  ──► NoDeviceFound / DeviceUnavailable
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tally_core::CameraDevice;
use tracing::{debug, info, warn};

use crate::config::CameraSettings;
use crate::error::{ScanError, ScanResult};
use crate::platform::{DeviceKind, MediaDevices, MediaError, SharedStream, VideoConstraints};

/// Which camera the first request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingPreference {
    /// Environment-facing first, then any camera.
    Environment,
    /// Any camera.
    Any,
}

/// Owns camera acquisition for one scanner.
pub struct CameraAccessManager {
    media: Arc<dyn MediaDevices>,
    settings: CameraSettings,
    permission_granted: AtomicBool,
}

impl CameraAccessManager {
    pub fn new(media: Arc<dyn MediaDevices>, settings: CameraSettings) -> Self {
        CameraAccessManager {
            media,
            settings,
            permission_granted: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Returns true once any request has succeeded in this process.
    pub fn permission_granted(&self) -> bool {
        self.permission_granted.load(Ordering::SeqCst)
    }

    /// Asks for a camera stream, prompting for permission if needed.
    pub async fn request_access(&self, preferred: FacingPreference) -> ScanResult<SharedStream> {
        let first_error = match preferred {
            FacingPreference::Environment => {
                let constraints = VideoConstraints::environment(
                    self.settings.ideal_width,
                    self.settings.ideal_height,
                );
                match self.media.get_user_media(&constraints).await {
                    Ok(stream) => return Ok(self.granted(stream)),
                    Err(e) => {
                        debug!(?e, "Environment camera request failed, trying any camera");
                        Some(e)
                    }
                }
            }
            FacingPreference::Any => None,
        };

        match self.media.get_user_media(&VideoConstraints::any()).await {
            Ok(stream) => Ok(self.granted(stream)),
            Err(e) => {
                let denied = e.is_denial() || first_error.as_ref().is_some_and(MediaError::is_denial);
                warn!(?e, ?first_error, "Camera request failed");
                if denied {
                    Err(ScanError::PermissionDenied(e.to_string()))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Acquires a stream for one specific device.
    pub async fn request_device(&self, device_id: &str) -> ScanResult<SharedStream> {
        let constraints = VideoConstraints::device(
            device_id,
            self.settings.ideal_width,
            self.settings.ideal_height,
        );

        match self.media.get_user_media(&constraints).await {
            Ok(stream) => Ok(self.granted(stream)),
            Err(e) => {
                warn!(device_id = %device_id, ?e, "Device request failed");
                Err(e.into())
            }
        }
    }

    /// Stops every track of `stream`. Safe to call more than once.
    pub fn release(&self, stream: &SharedStream) {
        let tracks = stream.tracks();
        debug!(stream_id = %stream.id(), tracks = tracks.len(), "Releasing camera stream");
        for track in tracks {
            track.stop();
        }
    }

    /// Lists video inputs in platform order.
    pub async fn list_devices(&self) -> ScanResult<Vec<CameraDevice>> {
        if !self.permission_granted() {
            warn!("Listing cameras before access was granted; labels will be empty");
        }

        let devices = self
            .media
            .enumerate_devices()
            .await
            .map_err(|e| ScanError::DeviceUnavailable(e.to_string()))?;

        let cameras: Vec<CameraDevice> = devices
            .into_iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .map(|d| CameraDevice::new(d.device_id, d.label))
            .collect();

        debug!(count = cameras.len(), "Enumerated cameras");
        Ok(cameras)
    }

    fn granted(&self, stream: SharedStream) -> SharedStream {
        if !self.permission_granted.swap(true, Ordering::SeqCst) {
            info!("Camera access granted");
        }
        stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMediaDevices;

    fn manager(media: Arc<SimMediaDevices>) -> CameraAccessManager {
        CameraAccessManager::new(media, CameraSettings::default())
    }

    #[tokio::test]
    async fn test_environment_request_succeeds() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[("cam-0", "Back Camera")]));
        let camera = manager(media.clone());

        let stream = camera
            .request_access(FacingPreference::Environment)
            .await
            .unwrap();

        assert!(camera.permission_granted());
        assert_eq!(stream.device_id().as_deref(), Some("cam-0"));
        assert_eq!(media.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_any_camera() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[("cam-0", "Front Camera")]));
        media.fail_next(MediaError::Overconstrained("facingMode".into()));
        let camera = manager(media.clone());

        let stream = camera
            .request_access(FacingPreference::Environment)
            .await
            .unwrap();

        assert_eq!(stream.device_id().as_deref(), Some("cam-0"));
        let requests = media.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].facing_mode.is_none());
    }

    #[tokio::test]
    async fn test_denial_on_either_attempt_is_permission_denied() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[("cam-0", "Back Camera")]));
        media.fail_next(MediaError::NotAllowed("user".into()));
        media.fail_next(MediaError::NotFound("none".into()));
        let camera = manager(media);

        let err = camera
            .request_access(FacingPreference::Environment)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ScanError::PermissionDenied(_)));
        assert!(!camera.permission_granted());
    }

    #[tokio::test]
    async fn test_no_hardware_is_no_device_found() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[]));
        let camera = manager(media);

        let err = camera.request_access(FacingPreference::Any).await.err().unwrap();
        assert!(matches!(err, ScanError::NoDeviceFound));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[("cam-0", "Back Camera")]));
        let camera = manager(media.clone());
        let stream = camera.request_access(FacingPreference::Any).await.unwrap();

        camera.release(&stream);
        camera.release(&stream);

        assert_eq!(media.tracks_stopped(), 1);
        assert_eq!(media.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_list_devices_keeps_video_inputs() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[
            ("cam-0", "Front Camera"),
            ("cam-1", "Rear Camera"),
        ]));
        media.add_microphone("mic-0");
        let camera = manager(media);

        let devices = camera.list_devices().await.unwrap();
        let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["cam-0", "cam-1"]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_device_unavailable() {
        let media = Arc::new(SimMediaDevices::with_cameras(&[("cam-0", "Back")]));
        media.fail_enumeration(MediaError::Other("blocked".into()));
        let camera = manager(media);

        let err = camera.list_devices().await.unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable(_)));
    }
}
