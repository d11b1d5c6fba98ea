//! # Decode Session
//!
//! Binds one decode engine to one camera stream and exposes its results as
//! a stream.
//!
//! ## Lifecycle
//! ```text
//!   start(target, device, config)
//!        │
//!        ├── engine running? ──► stop() first
//!        │
//!        ├── factory.create()
//!        ├── engine.start(request, tx)   bounded by init_timeout
//!        │        │ err / timeout ──► DecoderInitFailed (engine dropped)
//!        ▼
//!   DecodeResults (rx) ◄── every frame result, low-confidence included
//!        │
//!   stop() ──► engine.stop() drops tx ──► DecodeResults ends
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tally_core::{BarcodeFormat, DecodeResult};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::error::{ScanError, ScanResult};
use crate::platform::{DecodeEngine, DecodeEngineFactory, EngineError, EngineRequest, ScanArea, SharedStream};

/// Engine result buffer. Results beyond it wait for the consumer.
const RESULT_BUFFER: usize = 64;

/// Engine parameters for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    pub formats: Vec<BarcodeFormat>,
    pub workers: usize,
    pub frequency: u32,
    pub area: ScanArea,
    pub locate: bool,
    pub init_timeout: Duration,
}

/// Where the engine renders and what it reads from.
#[derive(Clone)]
pub struct VideoTarget {
    pub surface: String,
    pub stream: SharedStream,
}

impl VideoTarget {
    pub fn new(surface: impl Into<String>, stream: SharedStream) -> Self {
        VideoTarget {
            surface: surface.into(),
            stream,
        }
    }
}

/// Results of one running engine. Ends when the engine stops.
pub struct DecodeResults {
    inner: ReceiverStream<DecodeResult>,
}

impl Stream for DecodeResults {
    type Item = DecodeResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Owns at most one running decode engine.
pub struct DecodeSession {
    factory: Arc<dyn DecodeEngineFactory>,
    engine: Option<Box<dyn DecodeEngine>>,
}

impl DecodeSession {
    pub fn new(factory: Arc<dyn DecodeEngineFactory>) -> Self {
        DecodeSession {
            factory,
            engine: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_some()
    }

    /// Starts a fresh engine on `target`, stopping any running one first.
    pub async fn start(
        &mut self,
        target: VideoTarget,
        device_id: Option<&str>,
        config: &DecodeConfig,
    ) -> ScanResult<DecodeResults> {
        self.stop();

        let request = EngineRequest {
            surface: target.surface,
            stream: target.stream,
            device_id: device_id.map(str::to_string),
            formats: config.formats.clone(),
            workers: config.workers,
            frequency: config.frequency,
            area: config.area,
            locate: config.locate,
        };
        debug!(?request, readers = ?request.readers(), "Starting decode engine");

        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        let mut engine = self.factory.create();

        let started = match tokio::time::timeout(config.init_timeout, engine.start(request, tx)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(config.init_timeout)),
        };

        match started {
            Ok(()) => {
                info!(device_id = ?device_id, "Decode engine running");
                self.engine = Some(engine);
                Ok(DecodeResults {
                    inner: ReceiverStream::new(rx),
                })
            }
            Err(e) => {
                warn!(?e, "Decode engine failed to start");
                engine.stop();
                Err(ScanError::from(e))
            }
        }
    }

    /// Stops the running engine, if any.
    pub fn stop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
            debug!("Decode engine stopped");
        }
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraAccessManager, FacingPreference};
    use crate::config::CameraSettings;
    use crate::sim::{SimEngineFactory, SimMediaDevices};
    use tally_core::BarcodeFormat;
    use tokio_stream::StreamExt;

    fn config() -> DecodeConfig {
        DecodeConfig {
            formats: vec![BarcodeFormat::Ean13],
            workers: 2,
            frequency: 10,
            area: ScanArea::default(),
            locate: true,
            init_timeout: Duration::from_secs(10),
        }
    }

    async fn target() -> VideoTarget {
        let media = Arc::new(SimMediaDevices::with_cameras(&[("cam-0", "Back Camera")]));
        let camera = CameraAccessManager::new(media, CameraSettings::default());
        let stream = camera.request_access(FacingPreference::Any).await.unwrap();
        VideoTarget::new("viewport", stream)
    }

    #[tokio::test]
    async fn test_results_flow_until_stop() {
        let engines = Arc::new(SimEngineFactory::new());
        let mut session = DecodeSession::new(engines.clone());

        let mut results = session.start(target().await, Some("cam-0"), &config()).await.unwrap();
        assert!(session.is_running());
        assert!(engines.emit(DecodeResult::new("123", BarcodeFormat::Ean13, 0.3)));

        let first = results.next().await.unwrap();
        assert_eq!(first.code, "123");

        session.stop();
        session.stop();
        assert!(results.next().await.is_none());
        assert_eq!(engines.live(), 0);
    }

    #[tokio::test]
    async fn test_restart_stops_previous_engine() {
        let engines = Arc::new(SimEngineFactory::new());
        let mut session = DecodeSession::new(engines.clone());
        let target = target().await;

        let mut old = session.start(target.clone(), None, &config()).await.unwrap();
        let _new = session.start(target, None, &config()).await.unwrap();

        assert!(old.next().await.is_none());
        assert_eq!(engines.created(), 2);
        assert_eq!(engines.max_live(), 1);
    }

    #[tokio::test]
    async fn test_init_failure() {
        let engines = Arc::new(SimEngineFactory::new());
        engines.fail_init("wasm unavailable");
        let mut session = DecodeSession::new(engines.clone());

        let err = session.start(target().await, None, &config()).await.err().unwrap();
        assert!(matches!(err, ScanError::DecoderInitFailed(_)));
        assert!(!session.is_running());
        assert_eq!(engines.live(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_timeout_is_failure() {
        let engines = Arc::new(SimEngineFactory::new());
        engines.set_init_delay(Duration::from_secs(30));
        let mut session = DecodeSession::new(engines.clone());

        let err = session.start(target().await, None, &config()).await.err().unwrap();
        assert!(matches!(err, ScanError::DecoderInitFailed(_)));
        assert_eq!(engines.live(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_config() {
        let engines = Arc::new(SimEngineFactory::new());
        let mut session = DecodeSession::new(engines.clone());

        let _results = session.start(target().await, Some("cam-0"), &config()).await.unwrap();

        let request = engines.last_request().unwrap();
        assert_eq!(request.device_id.as_deref(), Some("cam-0"));
        assert_eq!(request.readers(), vec!["ean_reader"]);
        assert_eq!(request.frequency, 10);
    }
}
