//! # Scanner Controller
//!
//! The actor that drives the scanner dialog: permission, device choice,
//! decode session, acceptance, pause, recovery and teardown.
//!
//! ## Actor Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scanner Controller                               │
//! │                                                                         │
//! │  ScannerHandle (Clone)                                                  │
//! │     │ open / close / retry / change_device / switch_camera /            │
//! │     │ submit_manual / shutdown                                          │
//! │     ▼                                                                   │
//! │  cmd_rx ──┐                                                             │
//! │           ├──► select! loop ──► ScannerStatus ──► watch ──► subscribers │
//! │  event_rx─┘        │                                                    │
//! │     ▲              │ spawns                                             │
//! │     │              ▼                                                    │
//! │     │   ┌──────────────────────────────────────────────┐               │
//! │     └───│ permission request   device enumeration      │               │
//! │         │ device request       stream liveness watch   │               │
//! │         │ pause timer          retry timer             │               │
//! │         │ detection forwarder                           │               │
//! │         └──────────────────────────────────────────────┘               │
//! │                                                                         │
//! │  Every spawned step carries the generation it was started under.       │
//! │  close / retry / change_device bump the generation, so results from    │
//! │  superseded steps are dropped (and any stream they carry released).    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engine init runs inline under its timeout, so two inits never overlap
//! and at most one engine is ever live.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_core::device::{find_device, next_device, select_preferred};
use tally_core::validation::validate_barcode;
use tally_core::{CameraDevice, DecodeResult, Deduplicator};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::camera::{CameraAccessManager, FacingPreference};
use crate::config::ScannerConfig;
use crate::error::{ScanError, ScanResult};
use crate::feedback::{FeedbackDispatcher, ScanHandler};
use crate::platform::{DecodeEngineFactory, FeedbackSink, MediaDevices, SharedStream};
use crate::retry::RetrySchedule;
use crate::session::{DecodeConfig, DecodeResults, DecodeSession, VideoTarget};
use crate::status::{Fault, LastScan, ScanSource, ScannerPhase, ScannerStatus};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

// =============================================================================
// Dependencies
// =============================================================================

/// Platform ports and the host callback the controller runs against.
#[derive(Clone)]
pub struct ScannerDeps {
    pub media: Arc<dyn MediaDevices>,
    pub engines: Arc<dyn DecodeEngineFactory>,
    pub feedback: Arc<dyn FeedbackSink>,
    pub handler: Arc<dyn ScanHandler>,
}

// =============================================================================
// Commands and Events
// =============================================================================

type Reply = oneshot::Sender<ScanResult<()>>;

enum Command {
    Open(Reply),
    Close(Reply),
    Retry(Reply),
    ChangeDevice { device_id: String, reply: Reply },
    SwitchCamera(Reply),
    SubmitManual { code: String, reply: Reply },
    Shutdown(oneshot::Sender<()>),
}

impl Command {
    /// Answers a command that was queued behind a shutdown.
    fn cancel(self) {
        match self {
            Command::Open(reply)
            | Command::Close(reply)
            | Command::Retry(reply)
            | Command::ChangeDevice { reply, .. }
            | Command::SwitchCamera(reply)
            | Command::SubmitManual { reply, .. } => {
                let _ = reply.send(Err(ScanError::Cancelled));
            }
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }
}

/// Results posted back by spawned steps.
enum Event {
    AccessResolved {
        generation: u64,
        result: ScanResult<SharedStream>,
    },
    DevicesListed {
        generation: u64,
        result: ScanResult<Vec<CameraDevice>>,
    },
    DeviceAcquired {
        generation: u64,
        device_id: String,
        result: ScanResult<SharedStream>,
    },
    StreamEnded {
        generation: u64,
        stream_id: String,
    },
    Detection {
        generation: u64,
        epoch: u64,
        result: DecodeResult,
    },
    PauseElapsed {
        generation: u64,
    },
    RetryDue {
        generation: u64,
    },
}

impl Event {
    fn generation(&self) -> u64 {
        match self {
            Event::AccessResolved { generation, .. }
            | Event::DevicesListed { generation, .. }
            | Event::DeviceAcquired { generation, .. }
            | Event::StreamEnded { generation, .. }
            | Event::Detection { generation, .. }
            | Event::PauseElapsed { generation }
            | Event::RetryDue { generation } => *generation,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Event::AccessResolved { .. } => "access_resolved",
            Event::DevicesListed { .. } => "devices_listed",
            Event::DeviceAcquired { .. } => "device_acquired",
            Event::StreamEnded { .. } => "stream_ended",
            Event::Detection { .. } => "detection",
            Event::PauseElapsed { .. } => "pause_elapsed",
            Event::RetryDue { .. } => "retry_due",
        }
    }

    /// The stream this event hands over, if any.
    fn into_stream(self) -> Option<SharedStream> {
        match self {
            Event::AccessResolved { result, .. } | Event::DeviceAcquired { result, .. } => {
                result.ok()
            }
            _ => None,
        }
    }
}

/// Posts a step result, releasing its stream if the actor is gone.
async fn post(events: &mpsc::Sender<Event>, camera: &CameraAccessManager, event: Event) {
    if let Err(mpsc::error::SendError(event)) = events.send(event).await {
        if let Some(stream) = event.into_stream() {
            camera.release(&stream);
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle for driving the scanner. Cheap to clone.
#[derive(Clone)]
pub struct ScannerHandle {
    cmd_tx: mpsc::Sender<Command>,
    status_rx: watch::Receiver<ScannerStatus>,
}

impl ScannerHandle {
    /// Opens the scanner dialog. Only valid while closed.
    pub async fn open(&self) -> ScanResult<()> {
        self.request(Command::Open).await?
    }

    /// Closes the dialog and releases everything. Valid in any phase.
    pub async fn close(&self) -> ScanResult<()> {
        self.request(Command::Close).await?
    }

    /// Starts over after an error. Only valid in the error phase.
    pub async fn retry(&self) -> ScanResult<()> {
        self.request(Command::Retry).await?
    }

    /// Moves the session to another camera. Only valid while scanning.
    pub async fn change_device(&self, device_id: impl Into<String>) -> ScanResult<()> {
        let device_id = device_id.into();
        self.request(|reply| Command::ChangeDevice { device_id, reply })
            .await?
    }

    /// Moves the session to the next camera in enumeration order.
    pub async fn switch_camera(&self) -> ScanResult<()> {
        self.request(Command::SwitchCamera).await?
    }

    /// Submits a typed code as if it had been scanned. Valid while scanning,
    /// and while the decoder is down but the camera feed is still shown.
    pub async fn submit_manual(&self, code: impl Into<String>) -> ScanResult<()> {
        let code = code.into();
        self.request(|reply| Command::SubmitManual { code, reply })
            .await?
    }

    /// Returns the latest published status.
    pub fn status(&self) -> ScannerStatus {
        self.status_rx.borrow().clone()
    }

    /// Subscribes to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ScannerStatus> {
        self.status_rx.clone()
    }

    /// Closes the scanner and stops the actor.
    pub async fn shutdown(&self) -> ScanResult<()> {
        self.request(Command::Shutdown).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> ScanResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| ScanError::ChannelError("Scanner command channel closed".into()))?;
        reply_rx
            .await
            .map_err(|_| ScanError::ChannelError("Scanner stopped before replying".into()))
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Owns all scanner state. Runs as a single task; see [`ScannerController::spawn`].
pub struct ScannerController {
    config: ScannerConfig,
    decode_config: DecodeConfig,
    camera: Arc<CameraAccessManager>,
    session: DecodeSession,
    feedback: FeedbackDispatcher,
    handler: Arc<dyn ScanHandler>,
    dedup: Deduplicator,

    status: ScannerStatus,
    status_tx: watch::Sender<ScannerStatus>,
    events_tx: mpsc::Sender<Event>,

    stream: Option<SharedStream>,
    /// Bumped whenever in-flight steps must be abandoned.
    generation: u64,
    /// Bumped on every engine start; tags detections from that engine.
    epoch: u64,
    stream_retry: RetrySchedule,
    recovering: bool,
}

impl ScannerController {
    /// Starts the controller actor and returns a handle to it.
    pub fn spawn(config: ScannerConfig, deps: ScannerDeps) -> ScannerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (status_tx, status_rx) = watch::channel(ScannerStatus::default());

        let controller = ScannerController {
            decode_config: config.decode_config(),
            camera: Arc::new(CameraAccessManager::new(deps.media, config.camera.clone())),
            session: DecodeSession::new(deps.engines),
            feedback: FeedbackDispatcher::new(deps.feedback, config.feedback.clone()),
            handler: deps.handler,
            dedup: Deduplicator::new(config.dedup_config()),
            status: ScannerStatus::default(),
            status_tx,
            events_tx,
            stream: None,
            generation: 0,
            epoch: 0,
            stream_retry: config.stream_retry_policy().schedule(),
            recovering: false,
            config,
        };

        tokio::spawn(controller.run(cmd_rx, events_rx));

        ScannerHandle { cmd_tx, status_rx }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>, mut events_rx: mpsc::Receiver<Event>) {
        info!(
            pause_ms = self.config.detection.pause_ms,
            min_confidence = self.config.dedup.min_confidence,
            cooldown_ms = self.config.dedup.cooldown_ms,
            "Scanner controller started"
        );

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown(reply)) => {
                            self.close();
                            cmd_rx.close();
                            while let Ok(pending) = cmd_rx.try_recv() {
                                pending.cancel();
                            }
                            let _ = reply.send(());
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            debug!("All scanner handles dropped");
                            self.close();
                            break;
                        }
                    }
                }
                Some(event) = events_rx.recv() => {
                    self.handle_event(event).await;
                }
            }
        }

        info!("Scanner controller stopped");
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Open(reply) => {
                let _ = reply.send(self.open());
            }
            Command::Close(reply) => {
                self.close();
                let _ = reply.send(Ok(()));
            }
            Command::Retry(reply) => {
                let _ = reply.send(self.retry());
            }
            Command::ChangeDevice { device_id, reply } => {
                let _ = reply.send(self.change_device(device_id));
            }
            Command::SwitchCamera(reply) => {
                let _ = reply.send(self.switch_camera());
            }
            Command::SubmitManual { code, reply } => {
                let _ = reply.send(self.submit_manual(&code));
            }
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    fn open(&mut self) -> ScanResult<()> {
        if self.status.phase != ScannerPhase::Closed {
            return Err(self.invalid("open"));
        }

        info!("Opening scanner");
        self.generation += 1;
        self.set_phase(ScannerPhase::Opening);
        self.request_access();
        Ok(())
    }

    fn close(&mut self) {
        if self.status.phase == ScannerPhase::Closed {
            return;
        }

        self.generation += 1;
        self.session.stop();
        self.detach();
        self.dedup.reset();
        self.recovering = false;
        self.stream_retry.reset();

        self.status = ScannerStatus::default();
        self.publish();
        info!("Scanner closed");
    }

    fn retry(&mut self) -> ScanResult<()> {
        if self.status.phase != ScannerPhase::Error {
            return Err(self.invalid("retry"));
        }

        info!(fault = ?self.status.fault_kind(), "Retrying scanner");
        self.generation += 1;
        self.session.stop();
        self.detach();
        self.recovering = false;
        self.stream_retry.reset();
        self.status.fault = None;
        self.status.passthrough = false;
        self.status.stream_retry_attempt = 0;
        self.request_access();
        Ok(())
    }

    fn change_device(&mut self, device_id: String) -> ScanResult<()> {
        if self.status.phase != ScannerPhase::SessionActive {
            return Err(self.invalid("change device"));
        }
        if find_device(&self.status.devices, &device_id).is_none() {
            return Err(ScanError::UnknownDevice(device_id));
        }

        info!(from = ?self.status.active_device, to = %device_id, "Changing camera");
        self.generation += 1;
        self.session.stop();
        self.detach();
        self.dedup.reset();
        self.acquire_device(device_id);
        Ok(())
    }

    fn switch_camera(&mut self) -> ScanResult<()> {
        if self.status.phase != ScannerPhase::SessionActive {
            return Err(self.invalid("switch camera"));
        }

        let next = next_device(&self.status.devices, self.status.active_device.as_deref())
            .map(|device| device.id.clone())
            .ok_or(ScanError::NoDeviceFound)?;
        self.change_device(next)
    }

    fn submit_manual(&mut self, code: &str) -> ScanResult<()> {
        let accepting = match self.status.phase {
            ScannerPhase::SessionActive | ScannerPhase::Detecting => true,
            ScannerPhase::Error => self.status.passthrough,
            _ => false,
        };
        if !accepting {
            return Err(self.invalid("submit a manual code"));
        }

        let code = code.trim();
        if let Err(e) = validate_barcode(code) {
            let err = ScanError::from(e);
            warn!(error = %err, "Manual code rejected");
            self.feedback.fault(&err);
            return Err(err);
        }

        info!(code = %code, "Manual code entered");
        self.deliver(code, Utc::now(), ScanSource::Manual);
        self.publish();
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    async fn handle_event(&mut self, event: Event) {
        if event.generation() != self.generation {
            debug!(
                event = event.name(),
                event_generation = event.generation(),
                generation = self.generation,
                "Discarding stale step result"
            );
            if let Some(stream) = event.into_stream() {
                self.camera.release(&stream);
            }
            return;
        }

        match event {
            Event::AccessResolved { result, .. } => match result {
                Ok(stream) => {
                    self.attach(stream);
                    self.list_devices();
                }
                Err(e) => self.fail(e),
            },
            Event::DevicesListed { result, .. } => self.on_devices_listed(result).await,
            Event::DeviceAcquired {
                device_id, result, ..
            } => self.on_device_acquired(device_id, result).await,
            Event::StreamEnded { stream_id, .. } => self.on_stream_ended(&stream_id),
            Event::Detection { epoch, result, .. } => self.on_detection(epoch, result),
            Event::PauseElapsed { .. } => {
                if self.status.phase == ScannerPhase::Detecting {
                    debug!("Pause window elapsed, resuming decoder");
                    self.start_session().await;
                }
            }
            Event::RetryDue { .. } => self.on_retry_due(),
        }
    }

    async fn on_devices_listed(&mut self, result: ScanResult<Vec<CameraDevice>>) {
        let devices = match result {
            Ok(devices) => devices,
            Err(e) => return self.fail(e),
        };
        self.status.devices = devices;

        // The stream was lost while enumerating; recovery owns the next step.
        if self.stream.is_none() {
            self.publish();
            return;
        }

        let Some(preferred) = select_preferred(&self.status.devices).map(|d| d.id.clone()) else {
            return self.fail(ScanError::NoDeviceFound);
        };

        let granted = self.stream.as_ref().and_then(|stream| stream.device_id());
        match granted {
            Some(granted) if granted != preferred => {
                info!(granted = %granted, preferred = %preferred, "Switching to preferred camera");
                self.detach();
                self.acquire_device(preferred);
            }
            granted => {
                self.status.active_device = Some(granted.unwrap_or(preferred));
                self.enter_device_ready().await;
            }
        }
    }

    async fn on_device_acquired(&mut self, device_id: String, result: ScanResult<SharedStream>) {
        match result {
            Ok(stream) => {
                self.attach(stream);
                self.status.active_device = Some(device_id);
                self.enter_device_ready().await;
            }
            Err(e) if self.recovering => {
                warn!(device_id = %device_id, ?e, "Stream recovery attempt failed");
                self.schedule_stream_retry();
            }
            Err(e) => self.fail(e),
        }
    }

    fn on_stream_ended(&mut self, stream_id: &str) {
        let current = self.stream.as_ref().map(|stream| stream.id().to_string());
        if current.as_deref() != Some(stream_id) {
            return;
        }

        match self.status.phase {
            ScannerPhase::Closed => {}
            ScannerPhase::Error => {
                debug!(stream_id = %stream_id, "Passthrough stream ended");
                self.detach();
                self.status.passthrough = false;
                self.publish();
            }
            phase => {
                warn!(stream_id = %stream_id, %phase, "Camera stream lost");
                self.session.stop();
                self.detach();
                self.recovering = true;
                self.schedule_stream_retry();
            }
        }
    }

    fn on_detection(&mut self, epoch: u64, result: DecodeResult) {
        if epoch != self.epoch || self.status.phase != ScannerPhase::SessionActive {
            return;
        }

        let now = tokio::time::Instant::now().into_std();
        if !self.dedup.accept(&result, now) {
            return;
        }

        info!(
            code = %result.code,
            format = %result.format,
            confidence = result.confidence,
            "Barcode accepted"
        );
        self.deliver(&result.code, result.detected_at, ScanSource::Camera);

        let pause = self.config.pause_window();
        if pause.is_zero() {
            self.publish();
            return;
        }

        self.session.stop();
        self.set_phase(ScannerPhase::Detecting);

        let events = self.events_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            tokio::time::sleep(pause).await;
            let _ = events.send(Event::PauseElapsed { generation }).await;
        });
    }

    fn on_retry_due(&mut self) {
        match self.status.active_device.clone() {
            Some(device_id) => self.acquire_device(device_id),
            None => self.request_access(),
        }
    }

    // =========================================================================
    // Steps
    // =========================================================================

    fn request_access(&mut self) {
        self.set_phase(ScannerPhase::Requesting);

        let preference = if self.config.camera.prefer_environment {
            FacingPreference::Environment
        } else {
            FacingPreference::Any
        };
        let camera = self.camera.clone();
        let events = self.events_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = camera.request_access(preference).await;
            post(&events, &camera, Event::AccessResolved { generation, result }).await;
        });
    }

    fn list_devices(&self) {
        let camera = self.camera.clone();
        let events = self.events_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = camera.list_devices().await;
            post(&events, &camera, Event::DevicesListed { generation, result }).await;
        });
    }

    fn acquire_device(&mut self, device_id: String) {
        if self.status.phase != ScannerPhase::Requesting {
            self.set_phase(ScannerPhase::Requesting);
        }

        let camera = self.camera.clone();
        let events = self.events_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = camera.request_device(&device_id).await;
            post(
                &events,
                &camera,
                Event::DeviceAcquired {
                    generation,
                    device_id,
                    result,
                },
            )
            .await;
        });
    }

    fn schedule_stream_retry(&mut self) {
        let Some(delay) = self.stream_retry.next_delay() else {
            return self.fail(ScanError::StreamLost);
        };

        self.status.stream_retry_attempt = self.stream_retry.attempt();
        info!(
            attempt = self.status.stream_retry_attempt,
            ?delay,
            "Scheduling camera stream recovery"
        );
        self.set_phase(ScannerPhase::Requesting);

        let events = self.events_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::RetryDue { generation }).await;
        });
    }

    async fn enter_device_ready(&mut self) {
        self.set_phase(ScannerPhase::DeviceReady);
        self.start_session().await;
    }

    /// Starts the decoder on the attached stream, retrying per the init policy.
    async fn start_session(&mut self) {
        let Some(stream) = self.stream.clone() else {
            return self.fail(ScanError::StreamLost);
        };

        let device_id = self.status.active_device.clone();
        let mut schedule = self.config.init_retry_policy().schedule();

        loop {
            let target = VideoTarget::new(self.config.camera.surface.clone(), stream.clone());
            match self
                .session
                .start(target, device_id.as_deref(), &self.decode_config)
                .await
            {
                Ok(results) => {
                    self.epoch += 1;
                    self.forward(results);
                    self.finish_recovery();
                    self.status.fault = None;
                    self.status.passthrough = false;
                    self.set_phase(ScannerPhase::SessionActive);
                    return;
                }
                Err(e) => match schedule.next_retry_delay() {
                    Some(delay) => {
                        warn!(?e, ?delay, "Decoder init failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => return self.fail_passthrough(e),
                },
            }
        }
    }

    fn forward(&self, mut results: DecodeResults) {
        let events = self.events_tx.clone();
        let generation = self.generation;
        let epoch = self.epoch;

        tokio::spawn(async move {
            while let Some(result) = results.next().await {
                let event = Event::Detection {
                    generation,
                    epoch,
                    result,
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
        });
    }

    // =========================================================================
    // State Helpers
    // =========================================================================

    /// Records an accepted code, then runs feedback and the host callback.
    fn deliver(&mut self, code: &str, at: DateTime<Utc>, source: ScanSource) {
        self.status.record_scan(LastScan {
            code: code.to_string(),
            at,
            source,
        });
        self.feedback.accepted(code);
        self.handler.on_barcode_detected(code);
    }

    /// Clears stream-loss recovery once a session is running again.
    fn finish_recovery(&mut self) {
        if self.recovering {
            info!(attempt = self.stream_retry.attempt(), "Camera stream recovered");
        }
        self.recovering = false;
        self.stream_retry.reset();
        self.status.stream_retry_attempt = 0;
    }

    /// Takes ownership of `stream` and watches it for loss.
    fn attach(&mut self, stream: SharedStream) {
        if let Some(old) = self.stream.replace(stream.clone()) {
            self.camera.release(&old);
        }

        let mut liveness = stream.liveness();
        let stream_id = stream.id().to_string();
        let events = self.events_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            loop {
                let live = *liveness.borrow_and_update();
                if !live || liveness.changed().await.is_err() {
                    break;
                }
            }
            let _ = events
                .send(Event::StreamEnded {
                    generation,
                    stream_id,
                })
                .await;
        });
    }

    /// Releases the attached stream, if any.
    fn detach(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.camera.release(&stream);
        }
    }

    fn fail(&mut self, err: ScanError) {
        error!(error = %err, kind = %err.kind(), phase = %self.status.phase, "Scanner fault");
        self.feedback.fault(&err);
        self.session.stop();
        self.detach();
        self.recovering = false;
        self.status.fault = Some(Fault::from(&err));
        self.status.passthrough = false;
        self.status.stream_retry_attempt = 0;
        self.set_phase(ScannerPhase::Error);
    }

    /// Decoder is unavailable; keep the stream so the raw video stays visible.
    fn fail_passthrough(&mut self, err: ScanError) {
        error!(error = %err, "Decoder unavailable, showing camera feed only");
        self.feedback.fault(&err);
        self.finish_recovery();
        self.status.fault = Some(Fault::from(&err));
        self.status.passthrough = true;
        self.set_phase(ScannerPhase::Error);
    }

    fn invalid(&self, operation: &'static str) -> ScanError {
        ScanError::InvalidTransition {
            operation,
            phase: self.status.phase,
        }
    }

    fn set_phase(&mut self, phase: ScannerPhase) {
        debug!(from = %self.status.phase, to = %phase, "Scanner phase");
        self.status.phase = phase;
        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}
