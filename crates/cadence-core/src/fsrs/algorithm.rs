//! FSRS-5 formulas
//!
//! Pure functions over an injectable 19-weight vector. Nothing here knows
//! about cards or dates; [`super::scheduler`] composes these into reviews.

use super::scheduler::Grade;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of weights in an FSRS-5 parameter vector
pub const WEIGHT_COUNT: usize = 19;

/// Weight vector type
pub type Weights = [f64; WEIGHT_COUNT];

/// Published FSRS-5 default parameters
pub const FSRS5_DEFAULT_WEIGHTS: Weights = [
    0.40255, 1.18385, 3.173, 15.69105, // w0-w3: initial stability per grade
    7.1949, 0.5345, // w4-w5: initial difficulty
    1.4604, 0.0046, // w6-w7: difficulty update and mean reversion
    1.54575, 0.1192, 1.01925, // w8-w10: recall stability
    1.9395, 0.11, 0.29605, 2.2698, // w11-w14: forget stability
    0.2315, 2.9898, // w15-w16: hard penalty, easy bonus
    0.51655, 0.6621, // w17-w18: short-term stability
];

/// Forgetting curve exponent
pub const DECAY: f64 = -0.5;

/// Chosen so that retrievability is 0.9 when elapsed time equals stability
pub const FACTOR: f64 = 19.0 / 81.0;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

pub const MIN_STABILITY: f64 = 0.01;
pub const MAX_STABILITY: f64 = 36500.0;

/// Retention targets outside this band produce degenerate intervals
pub const MIN_RETENTION: f64 = 0.7;
pub const MAX_RETENTION: f64 = 0.99;

pub const DEFAULT_RETENTION: f64 = 0.9;

// ============================================================================
// FORGETTING CURVE
// ============================================================================

/// Negative, NaN and infinite elapsed times collapse to 0
pub fn sanitize_elapsed(elapsed_days: f64) -> f64 {
    if elapsed_days.is_finite() {
        elapsed_days.max(0.0)
    } else {
        0.0
    }
}

/// Probability of recall after `elapsed_days` for a memory of `stability`
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 || !stability.is_finite() {
        return 0.0;
    }
    let t = sanitize_elapsed(elapsed_days);
    (1.0 + FACTOR * t / stability).powf(DECAY)
}

/// Days until retrievability falls to `desired_retention`
pub fn next_interval(stability: f64, desired_retention: f64) -> f64 {
    if stability <= 0.0 || !stability.is_finite() {
        return 0.0;
    }
    let retention = if desired_retention.is_finite() {
        desired_retention.clamp(MIN_RETENTION, MAX_RETENTION)
    } else {
        DEFAULT_RETENTION
    };
    stability / FACTOR * (retention.powf(1.0 / DECAY) - 1.0)
}

/// Whole-day interval clamped to `[min_days, max_days]`.
///
/// Non-decreasing in `stability` for a fixed retention target.
pub fn bounded_interval_days(
    stability: f64,
    desired_retention: f64,
    min_days: u32,
    max_days: u32,
) -> u32 {
    let max_days = max_days.max(min_days);
    let raw = next_interval(stability, desired_retention).round();
    if !raw.is_finite() || raw >= f64::from(max_days) {
        return max_days;
    }
    (raw.max(0.0) as u32).clamp(min_days, max_days)
}

// ============================================================================
// INITIAL STATE
// ============================================================================

pub fn clamp_difficulty(d: f64) -> f64 {
    if d.is_finite() {
        d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    } else {
        MAX_DIFFICULTY
    }
}

fn clamp_stability(s: f64) -> f64 {
    if s.is_finite() {
        s.clamp(MIN_STABILITY, MAX_STABILITY)
    } else {
        MAX_STABILITY
    }
}

/// Stability after the very first review
pub fn initial_stability(w: &Weights, grade: Grade) -> f64 {
    clamp_stability(w[grade.index()])
}

/// Difficulty after the very first review
pub fn initial_difficulty(w: &Weights, grade: Grade) -> f64 {
    clamp_difficulty(w[4] - (w[5] * (grade.value() - 1.0)).exp() + 1.0)
}

// ============================================================================
// UPDATES
// ============================================================================

/// Difficulty after a review: linear damping toward 10, then mean reversion
/// toward the initial difficulty of an `Easy` first review
pub fn next_difficulty(w: &Weights, difficulty: f64, grade: Grade) -> f64 {
    let d = clamp_difficulty(difficulty);
    let delta = -w[6] * (grade.value() - 3.0);
    let damped = d + delta * (MAX_DIFFICULTY - d) / 9.0;
    clamp_difficulty(w[7] * initial_difficulty(w, Grade::Easy) + (1.0 - w[7]) * damped)
}

/// Stability after a successful recall (`Hard`, `Good`, `Easy`)
pub fn next_recall_stability(
    w: &Weights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    grade: Grade,
) -> f64 {
    let hard_penalty = if grade == Grade::Hard { w[15] } else { 1.0 };
    let easy_bonus = if grade == Grade::Easy { w[16] } else { 1.0 };
    let growth = w[8].exp()
        * (11.0 - clamp_difficulty(difficulty))
        * stability.powf(-w[9])
        * (w[10] * (1.0 - retrievability)).exp_m1()
        * hard_penalty
        * easy_bonus;
    clamp_stability(stability * (1.0 + growth))
}

/// Stability after a lapse. Never above the prior stability.
pub fn next_forget_stability(
    w: &Weights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let raw = w[11]
        * clamp_difficulty(difficulty).powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * (w[14] * (1.0 - retrievability)).exp();
    clamp_stability(raw).min(stability)
}

/// Stability after a review on the same day as the previous one
pub fn short_term_stability(w: &Weights, stability: f64, grade: Grade) -> f64 {
    let next = clamp_stability(stability * (w[17] * (grade.value() - 3.0 + w[18])).exp());
    if grade == Grade::Again {
        next.min(stability)
    } else {
        next
    }
}

/// Check a weight vector: finite, non-negative, positive initial stabilities
/// and a mean-reversion weight inside `[0, 1]`
pub fn validate_weights(w: &[f64]) -> Result<(), String> {
    if w.len() != WEIGHT_COUNT {
        return Err(format!("expected {} weights, got {}", WEIGHT_COUNT, w.len()));
    }
    if let Some(i) = w.iter().position(|v| !v.is_finite() || *v < 0.0) {
        return Err(format!("w{} must be finite and non-negative", i));
    }
    if let Some(i) = w[..4].iter().position(|v| *v <= 0.0) {
        return Err(format!("initial stability w{} must be positive", i));
    }
    if w[7] > 1.0 {
        return Err("mean reversion weight w7 must not exceed 1".to_string());
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
