//! # Simulated Platform
//!
//! In-memory implementations of the platform ports, used by the test suite
//! and the `scan-sim` binary.
//!
//! - [`SimMediaDevices`]: cameras with counted tracks, a permission gate,
//!   scripted failures and simulated unplugging.
//! - [`SimEngineFactory`]: engines that count live instances and decode
//!   whatever the caller injects.
//! - [`RecordingFeedback`]: remembers every cue and notification.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tally_core::device::is_rear_label;
use tally_core::DecodeResult;
use tokio::sync::{mpsc, watch};
use tracing::debug;
use uuid::Uuid;

use crate::feedback::Notification;
use crate::platform::{
    DecodeEngine, DecodeEngineFactory, DeviceKind, EngineError, EngineRequest, FacingMode,
    FeedbackError, FeedbackSink, MediaDeviceInfo, MediaDevices, MediaError, MediaStream,
    MediaTrack, SharedStream, TrackKind, VideoConstraints,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Tracks and Streams
// =============================================================================

struct SimTrack {
    label: String,
    stopped: AtomicBool,
    ended: AtomicBool,
    live_tx: watch::Sender<bool>,
    stop_counter: Arc<AtomicUsize>,
}

impl MediaTrack for SimTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.stop_counter.fetch_add(1, Ordering::SeqCst);
            self.live_tx.send_replace(false);
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.ended.load(Ordering::SeqCst)
    }
}

struct SimStream {
    id: String,
    device_id: String,
    track: Arc<SimTrack>,
}

impl SimStream {
    fn end(&self) {
        self.track.ended.store(true, Ordering::SeqCst);
        self.track.live_tx.send_replace(false);
    }
}

impl MediaStream for SimStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_id(&self) -> Option<String> {
        Some(self.device_id.clone())
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![self.track.clone() as Arc<dyn MediaTrack>]
    }

    fn liveness(&self) -> watch::Receiver<bool> {
        self.track.live_tx.subscribe()
    }
}

// =============================================================================
// Media Devices
// =============================================================================

#[derive(Default)]
struct MediaState {
    devices: Vec<MediaDeviceInfo>,
    scripted_failures: VecDeque<MediaError>,
    enumeration_failure: Option<MediaError>,
    enumeration_delay: Option<Duration>,
    unavailable: bool,
    requests: Vec<VideoConstraints>,
    streams: Vec<Arc<SimStream>>,
}

/// Simulated camera hardware and permission prompt.
pub struct SimMediaDevices {
    state: Mutex<MediaState>,
    gate: watch::Sender<bool>,
    pending: AtomicUsize,
    tracks_stopped: Arc<AtomicUsize>,
}

impl SimMediaDevices {
    /// Hardware with the given `(device_id, label)` cameras, in platform order.
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Self {
        let devices = cameras
            .iter()
            .map(|(id, label)| MediaDeviceInfo {
                device_id: id.to_string(),
                kind: DeviceKind::VideoInput,
                label: label.to_string(),
            })
            .collect();

        let (gate, _) = watch::channel(true);
        SimMediaDevices {
            state: Mutex::new(MediaState {
                devices,
                ..Default::default()
            }),
            gate,
            pending: AtomicUsize::new(0),
            tracks_stopped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn add_microphone(&self, device_id: &str) {
        lock(&self.state).devices.push(MediaDeviceInfo {
            device_id: device_id.to_string(),
            kind: DeviceKind::AudioInput,
            label: "Microphone".to_string(),
        });
    }

    /// Fails the next stream request with `err`. Calls queue up.
    pub fn fail_next(&self, err: MediaError) {
        lock(&self.state).scripted_failures.push_back(err);
    }

    /// Fails every enumeration with `err`.
    pub fn fail_enumeration(&self, err: MediaError) {
        lock(&self.state).enumeration_failure = Some(err);
    }

    /// Makes every enumeration take `delay` before answering.
    pub fn set_enumeration_delay(&self, delay: Duration) {
        lock(&self.state).enumeration_delay = Some(delay);
    }

    /// While set, every stream request fails as if the camera were busy.
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.state).unavailable = unavailable;
    }

    /// Holds stream requests as an open permission prompt would.
    pub fn hold_requests(&self) {
        self.gate.send_replace(false);
    }

    /// Answers held requests.
    pub fn release_requests(&self) {
        self.gate.send_replace(true);
    }

    /// Requests currently waiting on the permission gate.
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Constraints of every request so far.
    pub fn requests(&self) -> Vec<VideoConstraints> {
        lock(&self.state).requests.clone()
    }

    pub fn streams_opened(&self) -> usize {
        lock(&self.state).streams.len()
    }

    /// Streams whose track is neither stopped nor ended.
    pub fn live_streams(&self) -> usize {
        lock(&self.state)
            .streams
            .iter()
            .filter(|s| s.track.is_live())
            .count()
    }

    /// Tracks stopped by the consumer.
    pub fn tracks_stopped(&self) -> usize {
        self.tracks_stopped.load(Ordering::SeqCst)
    }

    /// Ends the newest live stream as if the camera were unplugged.
    pub fn lose_stream(&self) -> bool {
        let state = lock(&self.state);
        match state.streams.iter().rev().find(|s| s.track.is_live()) {
            Some(stream) => {
                debug!(stream_id = %stream.id, "Simulating stream loss");
                stream.end();
                true
            }
            None => false,
        }
    }

    async fn wait_for_gate(&self) {
        let mut gate = self.gate.subscribe();
        loop {
            let open = *gate.borrow_and_update();
            if open || gate.changed().await.is_err() {
                break;
            }
        }
    }

    fn open_stream(&self, constraints: &VideoConstraints) -> Result<SharedStream, MediaError> {
        let mut state = lock(&self.state);
        state.requests.push(constraints.clone());

        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        if state.unavailable {
            return Err(MediaError::NotReadable("device in use".into()));
        }

        let cameras: Vec<&MediaDeviceInfo> = state
            .devices
            .iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .collect();

        let chosen = match (&constraints.device_id, constraints.facing_mode) {
            (Some(id), _) => cameras.iter().find(|d| &d.device_id == id),
            (None, Some(FacingMode::Environment)) => cameras
                .iter()
                .find(|d| is_rear_label(&d.label))
                .or_else(|| cameras.first()),
            (None, _) => cameras.first(),
        };

        let Some(device) = chosen else {
            return Err(MediaError::NotFound("no matching camera".into()));
        };

        let (live_tx, _) = watch::channel(true);
        let stream = Arc::new(SimStream {
            id: Uuid::new_v4().to_string(),
            device_id: device.device_id.clone(),
            track: Arc::new(SimTrack {
                label: device.label.clone(),
                stopped: AtomicBool::new(false),
                ended: AtomicBool::new(false),
                live_tx,
                stop_counter: self.tracks_stopped.clone(),
            }),
        });

        debug!(stream_id = %stream.id, device_id = %stream.device_id, "Simulated stream opened");
        state.streams.push(stream.clone());
        Ok(stream)
    }
}

#[async_trait]
impl MediaDevices for SimMediaDevices {
    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<SharedStream, MediaError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.pending.fetch_sub(1, Ordering::SeqCst);

        self.open_stream(constraints)
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError> {
        let delay = lock(&self.state).enumeration_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = lock(&self.state);
        match &state.enumeration_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.devices.clone()),
        }
    }
}

// =============================================================================
// Decode Engines
// =============================================================================

#[derive(Default)]
struct EngineState {
    created: usize,
    live: usize,
    max_live: usize,
    current: Option<(u64, mpsc::Sender<DecodeResult>)>,
    persistent_failure: Option<String>,
    scripted_failures: VecDeque<String>,
    init_delay: Option<Duration>,
    last_request: Option<EngineRequest>,
}

/// Creates simulated engines and lets callers inject decode results.
#[derive(Clone, Default)]
pub struct SimEngineFactory {
    state: Arc<Mutex<EngineState>>,
}

impl SimEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every engine init fails with `reason` until cleared.
    pub fn fail_init(&self, reason: &str) {
        lock(&self.state).persistent_failure = Some(reason.to_string());
    }

    /// The next engine init fails with `reason`.
    pub fn fail_next_init(&self, reason: &str) {
        lock(&self.state).scripted_failures.push_back(reason.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = lock(&self.state);
        state.persistent_failure = None;
        state.scripted_failures.clear();
    }

    /// Makes every init take `delay` before reporting success.
    pub fn set_init_delay(&self, delay: Duration) {
        lock(&self.state).init_delay = Some(delay);
    }

    /// Feeds a result to the running engine. Returns false if none is running.
    pub fn emit(&self, result: DecodeResult) -> bool {
        match &lock(&self.state).current {
            Some((_, tx)) => tx.try_send(result).is_ok(),
            None => false,
        }
    }

    pub fn created(&self) -> usize {
        lock(&self.state).created
    }

    pub fn live(&self) -> usize {
        lock(&self.state).live
    }

    /// Highest number of engines ever running at once.
    pub fn max_live(&self) -> usize {
        lock(&self.state).max_live
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        lock(&self.state).last_request.clone()
    }
}

impl DecodeEngineFactory for SimEngineFactory {
    fn create(&self) -> Box<dyn DecodeEngine> {
        let id = {
            let mut state = lock(&self.state);
            state.created += 1;
            state.created as u64
        };
        Box::new(SimEngine {
            id,
            state: self.state.clone(),
            running: false,
        })
    }
}

struct SimEngine {
    id: u64,
    state: Arc<Mutex<EngineState>>,
    running: bool,
}

#[async_trait]
impl DecodeEngine for SimEngine {
    async fn start(
        &mut self,
        request: EngineRequest,
        results: mpsc::Sender<DecodeResult>,
    ) -> Result<(), EngineError> {
        let (failure, delay) = {
            let mut state = lock(&self.state);
            state.last_request = Some(request);
            let failure = state
                .scripted_failures
                .pop_front()
                .or_else(|| state.persistent_failure.clone());
            (failure, state.init_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = failure {
            return Err(EngineError::InitFailed(reason));
        }

        let mut state = lock(&self.state);
        state.live += 1;
        state.max_live = state.max_live.max(state.live);
        state.current = Some((self.id, results));
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        let mut state = lock(&self.state);
        state.live -= 1;
        if matches!(state.current, Some((id, _)) if id == self.id) {
            state.current = None;
        }
    }
}

impl Drop for SimEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Feedback
// =============================================================================

/// Feedback sink that records everything it is asked to do.
#[derive(Default)]
pub struct RecordingFeedback {
    cues: AtomicUsize,
    vibrations: AtomicUsize,
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> usize {
        self.cues.load(Ordering::SeqCst)
    }

    pub fn vibrations(&self) -> usize {
        self.vibrations.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    pub fn titles(&self) -> Vec<String> {
        lock(&self.notifications)
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn play_cue(&self) -> Result<(), FeedbackError> {
        self.cues.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn vibrate(&self, _duration: Duration) -> Result<(), FeedbackError> {
        self.vibrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn notify(&self, notification: &Notification) {
        lock(&self.notifications).push(notification.clone());
    }
}
