//! Planner Configuration
//!
//! Every constant the scheduler depends on is supplied by the caller through
//! [`PlannerConfig`]. Learner-supplied availability is accepted in a raw,
//! lenient form ([`AvailabilityConfig`]) and clamped into [`Availability`]
//! before any algorithm sees it, so the algorithms only ever run over valid
//! domains.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fsrs::{FsrsParameters, ReviewTarget};
use crate::grading::GradingThresholds;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Smallest daily budget a calendar day may carry (and the cursor threshold
/// used by the placer)
pub const DEFAULT_MIN_DAILY_MINUTES: u32 = 15;

/// Largest daily budget a calendar day may carry
pub const DEFAULT_MAX_DAILY_MINUTES: u32 = 480;

/// Hard cap on calendar length
pub const DEFAULT_MAX_SCHEDULE_DAYS: u32 = 365;

/// Horizon used when no exam date is known
pub const DEFAULT_STUDY_PERIOD_DAYS: u32 = 30;

/// Daily budget assumed when availability omits one
pub const DEFAULT_MINUTES_PER_DAY: i64 = 60;

/// Upper bound of the catch-up buffer
pub const MAX_CATCH_UP_BUFFER_PERCENT: f64 = 50.0;

/// Quiz attempts older than this are ignored when grading a review
pub const DEFAULT_ATTEMPT_LOOKBACK_DAYS: u32 = 30;

/// Size assumed for an overdue task that carries no estimate
pub const DEFAULT_CATCH_UP_MINUTES: u32 = 30;

/// Window used by catch-up when no capacity data is available
pub const DEFAULT_CATCH_UP_SPAN_DAYS: u32 = 5;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors raised by invalid caller configuration.
///
/// Learner data is never rejected; only the constants a deployment supplies
/// can fail validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Daily limits are inverted or zero
    #[error("Invalid daily limits: min {min} must be positive and not exceed max {max}")]
    InvalidDailyLimits { min: u32, max: u32 },
    /// Schedule window is empty
    #[error("Invalid schedule window: {0}")]
    InvalidScheduleWindow(String),
    /// FSRS weight vector is malformed
    #[error("Invalid FSRS weights: {0}")]
    InvalidWeights(String),
    /// Retention target or interval bounds are malformed
    #[error("Invalid review target: {0}")]
    InvalidReviewTarget(String),
    /// Grading thresholds are not ordered
    #[error("Invalid grading thresholds: {0}")]
    InvalidThresholds(String),
    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// REVISION POLICY
// ============================================================================

/// Static review intensity used when no memory state exists for a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RevisionPolicy {
    /// No review units at all
    Off,
    /// A couple of widely spaced reviews
    Light,
    /// Default spacing
    #[default]
    Standard,
    /// Dense early reviews for exam cramming
    Aggressive,
}

impl RevisionPolicy {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionPolicy::Off => "off",
            RevisionPolicy::Light => "light",
            RevisionPolicy::Standard => "standard",
            RevisionPolicy::Aggressive => "aggressive",
        }
    }

    /// Parse from string name. Unknown names fall back to `Standard`.
    pub fn parse_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "off" | "none" => RevisionPolicy::Off,
            "light" => RevisionPolicy::Light,
            "standard" => RevisionPolicy::Standard,
            "aggressive" => RevisionPolicy::Aggressive,
            other => {
                tracing::debug!(policy = other, "Unknown revision policy, using standard");
                RevisionPolicy::Standard
            }
        }
    }
}

impl<'de> Deserialize<'de> for RevisionPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RevisionPolicy::parse_name(&raw))
    }
}

impl std::fmt::Display for RevisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One static review: how many days after the study day, and how long
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStep {
    pub offset_days: u32,
    pub minutes: u32,
}

impl ReviewStep {
    pub const fn new(offset_days: u32, minutes: u32) -> Self {
        Self {
            offset_days,
            minutes,
        }
    }
}

/// Offset/duration tables for each revision policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevisionPolicies {
    pub light: Vec<ReviewStep>,
    pub standard: Vec<ReviewStep>,
    pub aggressive: Vec<ReviewStep>,
}

impl Default for RevisionPolicies {
    fn default() -> Self {
        Self {
            light: vec![ReviewStep::new(3, 10), ReviewStep::new(10, 10)],
            standard: vec![
                ReviewStep::new(1, 15),
                ReviewStep::new(3, 10),
                ReviewStep::new(7, 10),
            ],
            aggressive: vec![
                ReviewStep::new(1, 15),
                ReviewStep::new(2, 10),
                ReviewStep::new(4, 10),
                ReviewStep::new(7, 10),
                ReviewStep::new(14, 10),
            ],
        }
    }
}

impl RevisionPolicies {
    /// Review steps for a policy (`Off` has none)
    pub fn steps(&self, policy: RevisionPolicy) -> &[ReviewStep] {
        match policy {
            RevisionPolicy::Off => &[],
            RevisionPolicy::Light => &self.light,
            RevisionPolicy::Standard => &self.standard,
            RevisionPolicy::Aggressive => &self.aggressive,
        }
    }
}

// ============================================================================
// PLANNER CONFIG
// ============================================================================

/// All caller-supplied constants for one deployment.
///
/// Deserializes with every field defaulted, so a partial JSON document
/// overrides only the keys it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    pub min_daily_minutes: u32,
    pub max_daily_minutes: u32,
    pub max_schedule_days: u32,
    pub default_study_period_days: u32,
    pub revision_policies: RevisionPolicies,
    pub fsrs: FsrsParameters,
    pub review_target: ReviewTarget,
    pub grading: GradingThresholds,
    pub attempt_lookback_days: u32,
    pub catch_up_default_minutes: u32,
    pub catch_up_span_days: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_daily_minutes: DEFAULT_MIN_DAILY_MINUTES,
            max_daily_minutes: DEFAULT_MAX_DAILY_MINUTES,
            max_schedule_days: DEFAULT_MAX_SCHEDULE_DAYS,
            default_study_period_days: DEFAULT_STUDY_PERIOD_DAYS,
            revision_policies: RevisionPolicies::default(),
            fsrs: FsrsParameters::default(),
            review_target: ReviewTarget::default(),
            grading: GradingThresholds::default(),
            attempt_lookback_days: DEFAULT_ATTEMPT_LOOKBACK_DAYS,
            catch_up_default_minutes: DEFAULT_CATCH_UP_MINUTES,
            catch_up_span_days: DEFAULT_CATCH_UP_SPAN_DAYS,
        }
    }
}

impl PlannerConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the constants describe a usable planner
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_daily_minutes == 0 || self.min_daily_minutes > self.max_daily_minutes {
            return Err(ConfigError::InvalidDailyLimits {
                min: self.min_daily_minutes,
                max: self.max_daily_minutes,
            });
        }
        if self.max_schedule_days == 0 {
            return Err(ConfigError::InvalidScheduleWindow(
                "maxScheduleDays must be at least 1".to_string(),
            ));
        }
        if self.default_study_period_days == 0 {
            return Err(ConfigError::InvalidScheduleWindow(
                "defaultStudyPeriodDays must be at least 1".to_string(),
            ));
        }
        self.fsrs.validate()?;
        self.review_target.validate()?;
        self.grading.validate()?;
        Ok(())
    }

    /// Clamp a raw minute count into the daily limits
    pub fn clamp_daily_minutes(&self, raw: i64) -> u32 {
        let min = i64::from(self.min_daily_minutes);
        let max = i64::from(self.max_daily_minutes.max(self.min_daily_minutes));
        raw.clamp(min, max) as u32
    }
}

// ============================================================================
// AVAILABILITY
// ============================================================================

fn default_minutes_per_day() -> i64 {
    DEFAULT_MINUTES_PER_DAY
}

/// Availability exactly as the learner supplied it.
///
/// Values may be out of range or unparseable; [`AvailabilityConfig::sanitize`]
/// turns this into an [`Availability`] without ever failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityConfig {
    /// Minutes available on a day without an override
    #[serde(default = "default_minutes_per_day")]
    pub default_minutes_per_day: i64,
    /// Weekday → minutes. Keys are weekday names ("mon", "Tuesday") or
    /// numbers where 0 is Sunday and 6 is Saturday.
    #[serde(default)]
    pub per_day_overrides: BTreeMap<String, i64>,
    /// ISO dates (`YYYY-MM-DD`) with no study at all
    #[serde(default)]
    pub excluded_dates: Vec<String>,
    /// Share of each day held back for catch-up work (0-50)
    #[serde(default)]
    pub catch_up_buffer_percent: f64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            default_minutes_per_day: DEFAULT_MINUTES_PER_DAY,
            per_day_overrides: BTreeMap::new(),
            excluded_dates: vec![],
            catch_up_buffer_percent: 0.0,
        }
    }
}

impl AvailabilityConfig {
    /// Availability with the same budget every day
    pub fn uniform(minutes_per_day: i64) -> Self {
        Self {
            default_minutes_per_day: minutes_per_day,
            ..Default::default()
        }
    }

    /// Clamp every field into range. Unparseable keys and dates are dropped.
    pub fn sanitize(&self, config: &PlannerConfig) -> Availability {
        let default_minutes = config.clamp_daily_minutes(self.default_minutes_per_day);

        let mut overrides = [None; 7];
        for (key, minutes) in &self.per_day_overrides {
            match parse_weekday(key) {
                Some(day) => {
                    overrides[day.num_days_from_monday() as usize] =
                        Some(config.clamp_daily_minutes(*minutes));
                }
                None => tracing::debug!(key = key.as_str(), "Ignoring unknown weekday override"),
            }
        }

        let excluded = self
            .excluded_dates
            .iter()
            .filter_map(|raw| {
                let parsed = parse_iso_date(raw);
                if parsed.is_none() {
                    tracing::debug!(date = raw.as_str(), "Ignoring unparseable excluded date");
                }
                parsed
            })
            .collect();

        let buffer_percent = if self.catch_up_buffer_percent.is_finite() {
            self.catch_up_buffer_percent
                .clamp(0.0, MAX_CATCH_UP_BUFFER_PERCENT)
        } else {
            0.0
        };

        Availability {
            default_minutes,
            overrides,
            excluded,
            buffer_fraction: buffer_percent / 100.0,
        }
    }
}

/// Availability after clamping. Every value is in range.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    default_minutes: u32,
    /// Indexed by `Weekday::num_days_from_monday`
    overrides: [Option<u32>; 7],
    excluded: BTreeSet<NaiveDate>,
    buffer_fraction: f64,
}

impl Availability {
    /// Budget for a date before the catch-up buffer is withheld
    pub fn minutes_for(&self, date: NaiveDate) -> u32 {
        self.overrides[date.weekday().num_days_from_monday() as usize]
            .unwrap_or(self.default_minutes)
    }

    /// Budget for a date after the catch-up buffer is withheld
    pub fn usable_minutes(&self, date: NaiveDate) -> u32 {
        let minutes = f64::from(self.minutes_for(date));
        // epsilon keeps 90 * 0.8 from flooring to 71
        (minutes * (1.0 - self.buffer_fraction) + 1e-9).floor() as u32
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.excluded.contains(&date)
    }

    /// Fraction of each day withheld (0.0 - 0.5)
    pub fn buffer_fraction(&self) -> f64 {
        self.buffer_fraction
    }

    pub fn default_minutes(&self) -> u32 {
        self.default_minutes
    }
}

fn parse_weekday(key: &str) -> Option<Weekday> {
    let key = key.trim();
    if let Ok(n) = key.parse::<u8>() {
        return match n {
            0 => Some(Weekday::Sun),
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            _ => None,
        };
    }
    key.to_lowercase().parse::<Weekday>().ok()
}

/// Parse `YYYY-MM-DD`, also accepting a full RFC 3339 timestamp
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

// ============================================================================
// TESTS
// ============================================================================
