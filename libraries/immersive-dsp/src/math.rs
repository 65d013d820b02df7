//! Numeric helpers shared by the limiter and the scalable-factor engine

/// Floor returned for silence by the dB conversions
pub const SILENCE_DB: f32 = -200.0;

/// Convert dB to linear gain
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude to dB, floored at [`SILENCE_DB`]
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 0.0 {
        (20.0 * linear.log10()).max(SILENCE_DB)
    } else {
        SILENCE_DB
    }
}

/// Convert a power (energy) ratio to dB, floored at [`SILENCE_DB`]
#[inline]
pub fn power_to_db(power: f32) -> f32 {
    if power > 0.0 {
        (10.0 * power.log10()).max(SILENCE_DB)
    } else {
        SILENCE_DB
    }
}

/// Accelerating ease curve used by the gain envelope
///
/// `0 -> 0`, `1 -> 1`, monotonic on `[0, 1]`, clamped outside it.
#[inline]
pub fn curve_accel(x: f32) -> f32 {
    if x > 1.0 {
        return 1.0;
    }
    if x.is_nan() || x < 0.0 {
        return 0.0;
    }
    let d = x - 1.0;
    1.0 - d * d
}
