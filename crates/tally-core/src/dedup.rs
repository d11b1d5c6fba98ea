//! # Detection De-duplication
//!
//! Decides whether a decode result becomes a cart insertion.
//!
//! ## Why This Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One physical scan = many decoded frames                                │
//! │                                                                         │
//! │  t=0ms    "8801234567891" conf 0.91  ──► ACCEPT  (cart +1)              │
//! │  t=100ms  "8801234567891" conf 0.88  ──► reject  (cooldown)             │
//! │  t=200ms  "8801234567891" conf 0.40  ──► reject  (low confidence)       │
//! │  t=500ms  "8801234567891" conf 0.93  ──► reject  (cooldown)             │
//! │  t=3500ms "8801234567891" conf 0.90  ──► ACCEPT  (cashier scanned again)│
//! │                                                                         │
//! │  Over-filtering loses real scans. Under-filtering double-adds items.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rule
//! `accept(result, now)` is true iff
//! - `result.confidence > min_confidence`, and
//! - there is no last acceptance, or the cooldown does not block:
//!   - [`CooldownScope::SameCode`]: blocked only if the code is identical and
//!     less than `cooldown` has elapsed
//!   - [`CooldownScope::AnyCode`]: blocked if less than `cooldown` has
//!     elapsed, whatever the code
//!
//! Rejected results never move the window. The decision is pure; audio, toasts
//! and the host callback are dispatched by the caller.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::types::DecodeResult;
use crate::validation::check_digit_valid;
use crate::{DEFAULT_COOLDOWN_MS, DEFAULT_MIN_CONFIDENCE};

// =============================================================================
// Configuration
// =============================================================================

/// Which detections the cooldown window blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// Only repeats of the last accepted code are blocked.
    #[default]
    SameCode,
    /// Every code is blocked until the window elapses.
    AnyCode,
}

impl std::fmt::Display for CooldownScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CooldownScope::SameCode => write!(f, "same_code"),
            CooldownScope::AnyCode => write!(f, "any_code"),
        }
    }
}

impl std::str::FromStr for CooldownScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "same_code" | "same" => Ok(CooldownScope::SameCode),
            "any_code" | "any" => Ok(CooldownScope::AnyCode),
            other => Err(format!("Unknown cooldown scope: {}", other)),
        }
    }
}

/// Tunables for the acceptance rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupConfig {
    /// Results at or below this confidence are rejected.
    pub min_confidence: f64,

    /// Minimum time between two acceptances the scope applies to.
    pub cooldown: Duration,

    /// What the cooldown blocks.
    pub scope: CooldownScope,

    /// Reject EAN/UPC results whose check digit does not match.
    pub verify_check_digit: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        DedupConfig {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            scope: CooldownScope::SameCode,
            verify_check_digit: false,
        }
    }
}

// =============================================================================
// Deduplicator
// =============================================================================

/// The last code that made it through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedScan {
    pub code: String,
    pub at: Instant,
}

/// Stateful acceptance filter. One per scanner session.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    last_accepted: Option<AcceptedScan>,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Deduplicator {
            config,
            last_accepted: None,
        }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// The most recent acceptance, if any.
    pub fn last_accepted(&self) -> Option<&AcceptedScan> {
        self.last_accepted.as_ref()
    }

    /// Applies the acceptance rule and records the result if accepted.
    pub fn accept(&mut self, result: &DecodeResult, now: Instant) -> bool {
        if !self.passes_threshold(result) {
            return false;
        }

        if self.in_cooldown(&result.code, now) {
            return false;
        }

        self.last_accepted = Some(AcceptedScan {
            code: result.code.clone(),
            at: now,
        });
        true
    }

    /// Forgets the last acceptance (scanner closed or camera switched).
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }

    fn passes_threshold(&self, result: &DecodeResult) -> bool {
        if result.code.is_empty() || result.confidence <= self.config.min_confidence {
            return false;
        }

        !self.config.verify_check_digit || check_digit_valid(&result.code, result.format)
    }

    fn in_cooldown(&self, code: &str, now: Instant) -> bool {
        let Some(last) = &self.last_accepted else {
            return false;
        };

        // `now` earlier than the last acceptance saturates to zero elapsed.
        let elapsed = now.saturating_duration_since(last.at);
        if elapsed >= self.config.cooldown {
            return false;
        }

        match self.config.scope {
            CooldownScope::SameCode => last.code == code,
            CooldownScope::AnyCode => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BarcodeFormat;

    fn scan(code: &str, confidence: f64) -> DecodeResult {
        DecodeResult::new(code, BarcodeFormat::Ean13, confidence)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_same_code_within_cooldown_accepted_once() {
        let mut dedup = Deduplicator::new(DedupConfig {
            cooldown: ms(3000),
            ..Default::default()
        });
        let t0 = Instant::now();

        let accepted: Vec<bool> = [0, 500, 3500]
            .into_iter()
            .map(|offset| dedup.accept(&scan("A", 0.9), t0 + ms(offset)))
            .collect();

        assert_eq!(accepted, vec![true, false, true]);
        assert_eq!(accepted.iter().filter(|a| **a).count(), 2);
    }

    #[test]
    fn test_rejects_below_threshold() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        assert!(!dedup.accept(&scan("X", 0.4), Instant::now()));
        assert!(dedup.last_accepted().is_none());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut dedup = Deduplicator::new(DedupConfig {
            min_confidence: 0.5,
            ..Default::default()
        });
        assert!(!dedup.accept(&scan("X", 0.5), Instant::now()));
        assert!(dedup.accept(&scan("X", 0.51), Instant::now()));
    }

    #[test]
    fn test_empty_code_rejected() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        assert!(!dedup.accept(&scan("", 0.99), Instant::now()));
    }

    #[test]
    fn test_different_code_passes_same_code_scope() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let t0 = Instant::now();
        assert!(dedup.accept(&scan("A", 0.9), t0));
        assert!(dedup.accept(&scan("B", 0.9), t0 + ms(100)));
        // B is now the last accepted code, so A passes again
        assert!(dedup.accept(&scan("A", 0.9), t0 + ms(200)));
    }

    #[test]
    fn test_any_code_scope_blocks_everything() {
        let mut dedup = Deduplicator::new(DedupConfig {
            cooldown: ms(1000),
            scope: CooldownScope::AnyCode,
            ..Default::default()
        });
        let t0 = Instant::now();
        assert!(dedup.accept(&scan("A", 0.9), t0));
        assert!(!dedup.accept(&scan("B", 0.9), t0 + ms(999)));
        assert!(dedup.accept(&scan("B", 0.9), t0 + ms(1000)));
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let mut dedup = Deduplicator::new(DedupConfig {
            cooldown: ms(1000),
            ..Default::default()
        });
        let t0 = Instant::now();
        assert!(dedup.accept(&scan("A", 0.9), t0));
        for offset in [200, 400, 600, 800] {
            assert!(!dedup.accept(&scan("A", 0.9), t0 + ms(offset)));
        }
        assert!(dedup.accept(&scan("A", 0.9), t0 + ms(1001)));
    }

    #[test]
    fn test_low_confidence_does_not_reset_window() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let t0 = Instant::now();
        assert!(dedup.accept(&scan("A", 0.9), t0));
        assert!(!dedup.accept(&scan("B", 0.1), t0 + ms(10)));
        assert!(!dedup.accept(&scan("A", 0.9), t0 + ms(20)));
    }

    #[test]
    fn test_check_digit_filter() {
        let mut dedup = Deduplicator::new(DedupConfig {
            verify_check_digit: true,
            ..Default::default()
        });
        let t0 = Instant::now();
        assert!(!dedup.accept(&scan("4006381333932", 0.9), t0));
        assert!(dedup.accept(&scan("4006381333931", 0.9), t0));

        let code39 = DecodeResult::new("TALLY-01", BarcodeFormat::Code39, 0.9);
        assert!(dedup.accept(&code39, t0));
    }

    #[test]
    fn test_reset_forgets_last_code() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let t0 = Instant::now();
        assert!(dedup.accept(&scan("A", 0.9), t0));
        dedup.reset();
        assert!(dedup.accept(&scan("A", 0.9), t0 + ms(1)));
    }

    #[test]
    fn test_cooldown_scope_parsing() {
        assert_eq!("same_code".parse::<CooldownScope>().unwrap(), CooldownScope::SameCode);
        assert_eq!("ANY".parse::<CooldownScope>().unwrap(), CooldownScope::AnyCode);
        assert_eq!("any-code".parse::<CooldownScope>().unwrap(), CooldownScope::AnyCode);
        assert!("sometimes".parse::<CooldownScope>().is_err());
    }
}
