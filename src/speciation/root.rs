//! Bracketed scalar root finding.
//!
//! [`brent`] is Brent's method with hyperbolic extrapolation: secant and
//! extrapolation steps while they shrink the bracket fast enough, bisection
//! otherwise. Every iterate stays inside the initial bracket.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootError {
    #[error("No sign change on [{a}, {b}]: f(a) = {fa}, f(b) = {fb}")]
    NoSignChange { a: f64, b: f64, fa: f64, fb: f64 },

    #[error("No convergence after {iterations} iterations (last x = {x})")]
    MaxIterations { iterations: usize, x: f64 },

    #[error("Non-finite function value at x = {x}")]
    NonFinite { x: f64 },
}

/// A converged root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Root {
    pub x: f64,
    /// f(x)
    pub residual: f64,
    pub iterations: usize,
    /// Final bracket `(lo, hi)`, lo <= hi, still containing the sign change.
    pub bracket: (f64, f64),
}

const RTOL: f64 = 4.0 * f64::EPSILON;

fn eval<F: Fn(f64) -> f64>(f: &F, x: f64) -> Result<f64, RootError> {
    let y = f(x);
    if y.is_finite() { Ok(y) } else { Err(RootError::NonFinite { x }) }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Find a root of `f` in `[a, b]`.
///
/// Terminates when half the current bracket is below
/// `(xtol + 4·ε·|x|) / 2`, or when `f` is exactly zero.
///
/// # Errors
/// - [`RootError::NoSignChange`] if `f(a)` and `f(b)` have the same sign
/// - [`RootError::MaxIterations`] if `max_iter` iterations do not converge
/// - [`RootError::NonFinite`] if `f` returns NaN or an infinity
pub fn brent<F>(f: F, a: f64, b: f64, xtol: f64, max_iter: usize) -> Result<Root, RootError>
where
    F: Fn(f64) -> f64,
{
    let mut xpre = a;
    let mut xcur = b;
    let mut fpre = eval(&f, xpre)?;
    let mut fcur = eval(&f, xcur)?;

    if fpre == 0.0 {
        return Ok(Root { x: xpre, residual: 0.0, iterations: 0, bracket: (xpre, xpre) });
    }
    if fcur == 0.0 {
        return Ok(Root { x: xcur, residual: 0.0, iterations: 0, bracket: (xcur, xcur) });
    }
    if fpre.is_sign_negative() == fcur.is_sign_negative() {
        return Err(RootError::NoSignChange { a, b, fa: fpre, fb: fcur });
    }

    let mut xblk = 0.0;
    let mut fblk = 0.0;
    let mut spre = 0.0;
    let mut scur = 0.0;

    for i in 0..max_iter {
        if fpre != 0.0 && fcur != 0.0 && fpre.is_sign_negative() != fcur.is_sign_negative() {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        // keep the best point in xcur
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;
            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }

        let delta = (xtol + RTOL * xcur.abs()) / 2.0;
        let sbis = (xblk - xcur) / 2.0;
        if fcur == 0.0 || sbis.abs() < delta {
            return Ok(Root {
                x: xcur,
                residual: fcur,
                iterations: i,
                bracket: ordered(xcur, xblk),
            });
        }

        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                // secant
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                // hyperbolic extrapolation
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk - fpre) / (fblk * dpre - fpre * dblk)
            };
            if 2.0 * stry.abs() < spre.abs().min(3.0 * sbis.abs() - delta) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }

        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else {
            xcur += if sbis > 0.0 { delta } else { -delta };
        }
        fcur = eval(&f, xcur)?;
    }

    Err(RootError::MaxIterations { iterations: max_iter, x: xcur })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sqrt_two() {
        let r = brent(|x| x * x - 2.0, 0.0, 2.0, 1e-12, 100).unwrap();
        assert!((r.x - 2f64.sqrt()).abs() < 1e-11);
        assert!(r.bracket.0 <= r.x && r.x <= r.bracket.1);
        assert!(r.iterations < 20);
    }

    #[test]
    fn works_with_reversed_bracket() {
        let r = brent(|x| x.powi(3) - x - 1.0, 2.0, 1.0, 1e-12, 100).unwrap();
        assert!((r.x - 1.324_717_957_244_746).abs() < 1e-10);
    }

    #[test]
    fn exact_root_at_endpoint() {
        let r = brent(|x| x - 1.0, 1.0, 3.0, 1e-12, 100).unwrap();
        assert_eq!(r.x, 1.0);
        assert_eq!(r.iterations, 0);
    }

    #[test]
    fn reports_missing_sign_change() {
        let err = brent(|x| x * x + 1.0, -1.0, 1.0, 1e-12, 100).unwrap_err();
        assert!(matches!(err, RootError::NoSignChange { .. }));
    }

    #[test]
    fn reports_iteration_cap() {
        let err = brent(|x| x * x * x - 0.3, 0.0, 1.0, 1e-15, 2).unwrap_err();
        assert!(matches!(err, RootError::MaxIterations { iterations: 2, .. }));
    }

    #[test]
    fn reports_non_finite_values() {
        let err = brent(|x| 1.0 / x - 2.0, 0.0, 1.0, 1e-12, 100).unwrap_err();
        assert_eq!(err, RootError::NonFinite { x: 0.0 });
    }
}
