//! # Scanner Configuration
//!
//! Configuration management for the capture pipeline.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_MIN_CONFIDENCE=0.7                                           │
//! │     TALLY_COOLDOWN_MS=2000                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/scanner.toml (Linux)                           │
//! │     ~/Library/Application Support/com.tally.pos/scanner.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.65 confidence, 3s cooldown, 1.5s pause, 3 stream retries         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [camera]
//! ideal_width = 1280
//! ideal_height = 720
//!
//! [decoder]
//! formats = ["ean_13", "ean_8", "code_128", "code_39", "code_93"]
//! frequency = 10
//! init_timeout_ms = 10000
//!
//! [dedup]
//! min_confidence = 0.65
//! cooldown_ms = 3000
//! scope = "same_code"
//!
//! [detection]
//! pause_ms = 1500
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! max_delay_ms = 4000
//!
//! [feedback]
//! audio = true
//! vibrate = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use tally_core::validation::validate_confidence;
use tally_core::{BarcodeFormat, CooldownScope, DedupConfig, DEFAULT_COOLDOWN_MS, DEFAULT_MIN_CONFIDENCE};

use crate::error::{ScanError, ScanResult};
use crate::platform::ScanArea;
use crate::retry::RetryPolicy;
use crate::session::DecodeConfig;

// =============================================================================
// Camera Settings
// =============================================================================

/// Camera acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Resolution hint for the first (environment-facing) request.
    #[serde(default = "default_ideal_width")]
    pub ideal_width: u32,

    #[serde(default = "default_ideal_height")]
    pub ideal_height: u32,

    /// Ask for the environment-facing camera first.
    #[serde(default = "default_true")]
    pub prefer_environment: bool,

    /// Render surface handed to the decode engine.
    #[serde(default = "default_surface")]
    pub surface: String,
}

fn default_ideal_width() -> u32 {
    1280
}

fn default_ideal_height() -> u32 {
    720
}

fn default_true() -> bool {
    true
}

fn default_surface() -> String {
    "scanner-viewport".to_string()
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            ideal_width: default_ideal_width(),
            ideal_height: default_ideal_height(),
            prefer_environment: true,
            surface: default_surface(),
        }
    }
}

// =============================================================================
// Decoder Settings
// =============================================================================

/// Decode engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderSettings {
    /// Accepted symbologies, in reader priority order.
    #[serde(default = "default_formats")]
    pub formats: Vec<BarcodeFormat>,

    /// Worker hint for the engine.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Frames sampled per second.
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    /// Locate the barcode before decoding.
    #[serde(default = "default_true")]
    pub locate: bool,

    #[serde(default)]
    pub area: ScanArea,

    /// Upper bound on one engine init (milliseconds).
    #[serde(default = "default_init_timeout")]
    pub init_timeout_ms: u64,

    /// Engine init attempts before giving up (1 = no retry).
    #[serde(default = "default_init_attempts")]
    pub init_attempts: u32,
}

fn default_formats() -> Vec<BarcodeFormat> {
    vec![
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
    ]
}

/// Half the available cores, at least two.
pub fn default_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(0);
    (cores / 2).max(2)
}

fn default_frequency() -> u32 {
    10
}

fn default_init_timeout() -> u64 {
    10_000
}

fn default_init_attempts() -> u32 {
    1
}

impl Default for DecoderSettings {
    fn default() -> Self {
        DecoderSettings {
            formats: default_formats(),
            workers: default_workers(),
            frequency: default_frequency(),
            locate: true,
            area: ScanArea::default(),
            init_timeout_ms: default_init_timeout(),
            init_attempts: default_init_attempts(),
        }
    }
}

// =============================================================================
// Dedup / Detection Settings
// =============================================================================

/// Acceptance rule settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupSettings {
    /// Results at or below this confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default = "default_cooldown")]
    pub cooldown_ms: u64,

    #[serde(default)]
    pub scope: CooldownScope,

    /// Drop EAN/UPC reads whose check digit does not match.
    #[serde(default)]
    pub verify_check_digit: bool,
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN_MS
}

impl Default for DedupSettings {
    fn default() -> Self {
        DedupSettings {
            min_confidence: default_min_confidence(),
            cooldown_ms: default_cooldown(),
            scope: CooldownScope::default(),
            verify_check_digit: false,
        }
    }
}

/// What happens right after an acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Decoder pause after an accepted scan (milliseconds). 0 keeps it running.
    #[serde(default = "default_pause")]
    pub pause_ms: u64,
}

fn default_pause() -> u64 {
    1500
}

impl Default for DetectionSettings {
    fn default() -> Self {
        DetectionSettings {
            pause_ms: default_pause(),
        }
    }
}

// =============================================================================
// Retry / Feedback Settings
// =============================================================================

/// Automatic recovery when the camera stream drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    4000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

/// Scan feedback effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    #[serde(default = "default_true")]
    pub audio: bool,

    #[serde(default)]
    pub vibrate: bool,

    #[serde(default = "default_vibrate_ms")]
    pub vibrate_ms: u64,

    /// Post "Barcode detected" toasts.
    #[serde(default = "default_true")]
    pub notify: bool,
}

fn default_vibrate_ms() -> u64 {
    100
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        FeedbackSettings {
            audio: true,
            vibrate: false,
            vibrate_ms: default_vibrate_ms(),
            notify: true,
        }
    }
}

// =============================================================================
// Main Scanner Configuration
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub camera: CameraSettings,

    #[serde(default)]
    pub decoder: DecoderSettings,

    #[serde(default)]
    pub dedup: DedupSettings,

    #[serde(default)]
    pub detection: DetectionSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub feedback: FeedbackSettings,
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ScanResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());

        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document. Missing sections and fields take defaults.
    pub fn from_toml(contents: &str) -> ScanResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ScanResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ScanError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    pub fn validate(&self) -> ScanResult<()> {
        validate_confidence(self.dedup.min_confidence)
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;

        if self.decoder.formats.is_empty() {
            return Err(ScanError::InvalidConfig(
                "at least one barcode format is required".into(),
            ));
        }

        if self.decoder.workers == 0 {
            return Err(ScanError::InvalidConfig(
                "workers must be greater than 0".into(),
            ));
        }

        if self.decoder.frequency == 0 {
            return Err(ScanError::InvalidConfig(
                "frequency must be greater than 0".into(),
            ));
        }

        if self.decoder.init_attempts == 0 {
            return Err(ScanError::InvalidConfig(
                "decoder.init_attempts must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ScanError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.retry.multiplier < 1.0 {
            return Err(ScanError::InvalidConfig(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from `lookup` (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TALLY_MIN_CONFIDENCE") {
            match value.parse::<f64>() {
                Ok(v) => {
                    debug!(min_confidence = v, "Overriding confidence threshold from environment");
                    self.dedup.min_confidence = v;
                }
                Err(_) => warn!(value = %value, "Invalid TALLY_MIN_CONFIDENCE"),
            }
        }

        if let Some(value) = lookup("TALLY_COOLDOWN_MS") {
            if let Ok(ms) = value.parse::<u64>() {
                debug!(cooldown_ms = ms, "Overriding cooldown from environment");
                self.dedup.cooldown_ms = ms;
            }
        }

        if let Some(value) = lookup("TALLY_COOLDOWN_SCOPE") {
            match value.parse::<CooldownScope>() {
                Ok(scope) => self.dedup.scope = scope,
                Err(_) => warn!(scope = %value, "Unknown cooldown scope in environment"),
            }
        }

        if let Some(value) = lookup("TALLY_PAUSE_MS") {
            if let Ok(ms) = value.parse::<u64>() {
                self.detection.pause_ms = ms;
            }
        }

        if let Some(value) = lookup("TALLY_STREAM_RETRIES") {
            if let Ok(n) = value.parse::<u32>() {
                debug!(max_attempts = n, "Overriding stream retries from environment");
                self.retry.max_attempts = n;
            }
        }

        if let Some(value) = lookup("TALLY_AUDIO") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.feedback.audio = true,
                "0" | "false" | "off" | "no" => self.feedback.audio = false,
                _ => warn!(value = %value, "Invalid TALLY_AUDIO"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos").map(|dirs| {
            let config_dir = dirs.config_dir();
            config_dir.join("scanner.toml")
        })
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    pub fn dedup_config(&self) -> DedupConfig {
        DedupConfig {
            min_confidence: self.dedup.min_confidence,
            cooldown: Duration::from_millis(self.dedup.cooldown_ms),
            scope: self.dedup.scope,
            verify_check_digit: self.dedup.verify_check_digit,
        }
    }

    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig {
            formats: self.decoder.formats.clone(),
            workers: self.decoder.workers,
            frequency: self.decoder.frequency,
            area: self.decoder.area,
            locate: self.decoder.locate,
            init_timeout: Duration::from_millis(self.decoder.init_timeout_ms),
        }
    }

    /// Policy for automatic stream-loss recovery.
    pub fn stream_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            multiplier: self.retry.multiplier,
        }
    }

    /// Policy for engine init; same timing, `decoder.init_attempts` tries.
    pub fn init_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.decoder.init_attempts,
            ..self.stream_retry_policy()
        }
    }

    pub fn pause_window(&self) -> Duration {
        Duration::from_millis(self.detection.pause_ms)
    }
}
