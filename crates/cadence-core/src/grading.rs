//! Performance Grading
//!
//! Maps a rolling window of quiz attempts onto a four-level recall grade.
//! Accuracy is the primary signal; speed and confidence only ever demote by
//! one level, which keeps the grade non-decreasing in accuracy for any fixed
//! speed and confidence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::fsrs::Grade;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Highest value on the confidence scale
pub const MAX_CONFIDENCE: f64 = 5.0;

/// Confidence assumed when no attempt carried a rating
pub const NEUTRAL_CONFIDENCE: f64 = 2.5;

// ============================================================================
// ATTEMPTS
// ============================================================================

/// One answered quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub section_id: String,
    pub correct: bool,
    /// Seconds spent answering
    pub time_sec: f64,
    /// Self-reported confidence (0-5), if asked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub attempted_at: DateTime<Utc>,
}

/// Aggregate over the attempts inside a lookback window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    /// Share of correct answers (0.0 - 1.0)
    pub accuracy: f64,
    pub avg_time_sec: f64,
    /// Mean confidence (0-5)
    pub avg_confidence: f64,
    pub count: u32,
}

impl Default for AttemptStats {
    fn default() -> Self {
        Self {
            accuracy: 0.0,
            avg_time_sec: 0.0,
            avg_confidence: NEUTRAL_CONFIDENCE,
            count: 0,
        }
    }
}

impl AttemptStats {
    /// Aggregate attempts. Non-finite times and confidences are ignored.
    pub fn from_attempts<'a>(attempts: impl IntoIterator<Item = &'a AttemptRecord>) -> Self {
        let mut count = 0u32;
        let mut correct = 0u32;
        let mut time_total = 0.0;
        let mut timed = 0u32;
        let mut confidence_total = 0.0;
        let mut rated = 0u32;

        for attempt in attempts {
            count += 1;
            if attempt.correct {
                correct += 1;
            }
            if attempt.time_sec.is_finite() && attempt.time_sec >= 0.0 {
                time_total += attempt.time_sec;
                timed += 1;
            }
            if let Some(c) = attempt.confidence.filter(|c| c.is_finite()) {
                confidence_total += c.clamp(0.0, MAX_CONFIDENCE);
                rated += 1;
            }
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            accuracy: f64::from(correct) / f64::from(count),
            avg_time_sec: if timed > 0 {
                time_total / f64::from(timed)
            } else {
                0.0
            },
            avg_confidence: if rated > 0 {
                confidence_total / f64::from(rated)
            } else {
                NEUTRAL_CONFIDENCE
            },
            count,
        }
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Cutoffs used by the grader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingThresholds {
    /// Accuracy at or above this is `Easy` before modifiers
    pub easy_accuracy: f64,
    /// Accuracy at or above this is `Good` before modifiers
    pub good_accuracy: f64,
    /// Accuracy at or above this is `Hard`; below it is `Again`
    pub hard_accuracy: f64,
    /// Average answer time at or below this counts as fast
    pub fast_seconds: f64,
    /// Average answer time above this counts as slow
    pub slow_seconds: f64,
    /// Confidence below this counts as unsure
    pub low_confidence: f64,
    /// Confidence at or above this counts as sure
    pub high_confidence: f64,
}

impl Default for GradingThresholds {
    fn default() -> Self {
        Self {
            easy_accuracy: 0.9,
            good_accuracy: 0.7,
            hard_accuracy: 0.5,
            fast_seconds: 20.0,
            slow_seconds: 60.0,
            low_confidence: 2.0,
            high_confidence: 4.0,
        }
    }
}

impl GradingThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 <= self.hard_accuracy
            && self.hard_accuracy <= self.good_accuracy
            && self.good_accuracy <= self.easy_accuracy
            && self.easy_accuracy <= 1.0;
        if !ordered {
            return Err(ConfigError::InvalidThresholds(
                "accuracy cutoffs must satisfy 0 <= hard <= good <= easy <= 1".to_string(),
            ));
        }
        if !(0.0 <= self.fast_seconds && self.fast_seconds <= self.slow_seconds) {
            return Err(ConfigError::InvalidThresholds(
                "fastSeconds must not exceed slowSeconds".to_string(),
            ));
        }
        if !(0.0 <= self.low_confidence
            && self.low_confidence <= self.high_confidence
            && self.high_confidence <= MAX_CONFIDENCE)
        {
            return Err(ConfigError::InvalidThresholds(
                "confidence cutoffs must satisfy 0 <= low <= high <= 5".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// GRADER
// ============================================================================

/// Turns attempt statistics into a recall grade
#[derive(Debug, Clone, Default)]
pub struct PerformanceGrader {
    thresholds: GradingThresholds,
}

impl PerformanceGrader {
    pub fn new(thresholds: GradingThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GradingThresholds {
        &self.thresholds
    }

    /// Grade a window of attempts. No attempts means `Good`, so sections that
    /// were never quizzed are not punished.
    pub fn grade(&self, stats: &AttemptStats) -> Grade {
        if stats.count == 0 {
            return Grade::Good;
        }
        self.grade_signals(stats.accuracy, stats.avg_time_sec, stats.avg_confidence)
    }

    /// Grade raw signals. Out-of-range values are clamped; a non-finite time
    /// or confidence is treated as neutral.
    pub fn grade_signals(&self, accuracy: f64, avg_time_sec: f64, avg_confidence: f64) -> Grade {
        let t = &self.thresholds;
        let accuracy = if accuracy.is_finite() {
            accuracy.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let fast = avg_time_sec.is_finite() && avg_time_sec <= t.fast_seconds;
        let slow = avg_time_sec.is_finite() && avg_time_sec > t.slow_seconds;
        let confidence = if avg_confidence.is_finite() {
            avg_confidence.clamp(0.0, MAX_CONFIDENCE)
        } else {
            NEUTRAL_CONFIDENCE
        };
        let unsure = confidence < t.low_confidence;
        let sure = confidence >= t.high_confidence;

        if accuracy >= t.easy_accuracy {
            // top tier needs conviction and fluency
            if unsure || slow { Grade::Good } else { Grade::Easy }
        } else if accuracy >= t.good_accuracy {
            if unsure && slow { Grade::Hard } else { Grade::Good }
        } else if accuracy >= t.hard_accuracy {
            // confidently and quickly wrong half the time: misconception
            if sure && fast { Grade::Again } else { Grade::Hard }
        } else {
            Grade::Again
        }
    }
}

/// Grade raw signals with the default thresholds
pub fn grade_from_performance(accuracy: f64, avg_time_sec: f64, avg_confidence: f64) -> Grade {
    PerformanceGrader::default().grade_signals(accuracy, avg_time_sec, avg_confidence)
}

// ============================================================================
// TESTS
// ============================================================================
