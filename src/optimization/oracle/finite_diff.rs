//! oracle::finite_diff — finite-difference gradients of a flat fitness.
//!
//! Purpose
//! -------
//! Supply `∂fitness/∂θ` for models that do not implement an analytic
//! gradient, without exposing the `finitediff` API to the rest of the
//! crate.
//!
//! Key behaviors
//! -------------
//! - Try a central-difference gradient first.
//! - If the fitness closure failed during differencing, or the central
//!   gradient fails validation, retry once with forward differences.
//! - Every returned gradient satisfies [`validate_grad`].
//!
//! Conventions
//! -----------
//! - `finitediff` closures must return `f64`, so the first error raised by
//!   the fitness is captured in a `RefCell` and the closure returns `NaN`;
//!   the captured error is surfaced after differencing.
//! - Differences are taken in the flat space handed in; reparameterization
//!   is handled by the caller.
use std::cell::RefCell;

use finitediff::FiniteDiff;

use crate::optimization::{
    errors::{OptError, OptResult},
    types::{Fitness, Grad, Theta},
    validation::validate_grad,
};

/// Finite-difference gradient of `fitness` at `theta`.
///
/// Parameters
/// ----------
/// - `theta`: `&Theta`
///   Point at which the gradient is approximated; its length is the
///   gradient dimension.
/// - `fitness`: `F`
///   Flat fitness. Errors it raises are captured during differencing and
///   surfaced afterwards.
///
/// Returns
/// -------
/// `OptResult<Grad>`
///   - `Ok(grad)` from the central stencil when it evaluated cleanly and
///     passes [`validate_grad`].
///   - Otherwise the forward-difference gradient, if that one is clean.
///
/// Errors
/// ------
/// - Any error raised by `fitness` on the forward-difference path.
/// - `OptError::InvalidGradient`
///   Returned when the forward-difference gradient still contains
///   non-finite entries (e.g., at an impossible point).
///
/// Notes
/// -----
/// - A central gradient costs `2·dim` fitness calls, a forward one
///   `dim + 1`.
pub fn fd_gradient<F>(theta: &Theta, fitness: F) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<Fitness>,
{
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let scalar = |x: &Theta| -> f64 {
        match fitness(x) {
            Ok(value) => value,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let dim = theta.len();
    let central = theta.central_diff(&scalar);
    if closure_err.borrow().is_none() && validate_grad(&central, dim).is_ok() {
        return Ok(central);
    }
    run_forward_diff(theta, &scalar, &closure_err)
}

/// Forward-difference gradient with error capture and validation.
fn run_forward_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<OptError>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
