//! Numerical stability utilities.
//!
//! Provides safe implementations of the scalar bijections used by the
//! reparameterization layer, which are prone to overflow/underflow in naïve
//! form. The softplus pair uses an explicit cutoff (`x > 20.0`) to keep
//! `f64` arithmetic in a well-conditioned regime; the logistic pair splits
//! on the sign of its argument.
//!
//! # Provided items
//! - [`safe_softplus(x)`]: stable `ln(1 + exp(x))`, mapping ℝ → (0, ∞).
//! - [`safe_softplus_inv(x)`]: inverse of softplus, mapping (0, ∞) → ℝ.
//! - [`safe_logistic(x)`]: stable `1 / (1 + exp(-x))`, mapping ℝ → (0, 1).
//! - [`safe_logit(p)`]: inverse of the logistic, mapping (0, 1) → ℝ.

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For sufficiently large `x`, `softplus(x) ≈ x + ln1p(exp(-x)) ≈ x`.
/// - Otherwise, it falls back to `ln1p(exp(x))`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: returns `t = ln(exp(x) - 1)`.
///
/// - For sufficiently large `x`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise, it uses `ln(expm1(x))`.
///
/// `x` must be finite and `> 0`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Never evaluates `exp` of a positive argument, so it neither overflows
/// nor returns NaN for large `|x|`.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of the logistic: `logit(p) = ln(p) - ln(1 - p)` for `p ∈ (0, 1)`.
pub fn safe_logit(p: f64) -> f64 {
    p.ln() - (-p).ln_1p()
}
