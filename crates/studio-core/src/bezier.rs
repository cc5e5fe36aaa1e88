//! Cubic bezier evaluation and inversion used by keyframe easing.
//!
//! Easing curves are two independent one-dimensional cubics: the x curve maps
//! the curve parameter to time progress, the y curve maps it to value
//! progress. Easing a time progress `x` means solving the x curve for its
//! parameter and evaluating the y curve there.

use crate::model::BezierTangents;

const SOLVE_EPSILON: f64 = 1e-7;
const MIN_SLOPE: f64 = 1e-3;
const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 10;

/// Evaluate a cubic: B(t) = (1-t)^3*p0 + 3*(1-t)^2*t*p1 + 3*(1-t)*t^2*p2 + t^3*p3
///
/// A non-finite `t` saturates to the nearest end point instead of producing NaN.
pub fn evaluate(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    if !t.is_finite() {
        return if t > 0.0 { p3 } else { p0 };
    }
    if t == 0.0 {
        return p0;
    }
    if t == 1.0 {
        return p3;
    }

    let one_minus_t = 1.0 - t;
    let omt2 = one_minus_t * one_minus_t;
    let t2 = t * t;
    omt2 * one_minus_t * p0 + 3.0 * omt2 * t * p1 + 3.0 * one_minus_t * t2 * p2 + t2 * t * p3
}

/// Derivative of cubic Bezier: B'(t) = 3*(1-t)^2*(p1-p0) + 6*(1-t)*t*(p2-p1) + 3*t^2*(p3-p2)
pub fn derivative(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * (p1 - p0)
        + 6.0 * one_minus_t * t * (p2 - p1)
        + 3.0 * t * t * (p3 - p2)
}

/// Find the parameter `t` in `[0, 1]` at which the cubic reaches `target`.
///
/// Newton-Raphson runs first from a linear guess; near-flat slopes abort it
/// and bisection takes over. A curve with four equal control values has no
/// preferred root and yields `0.5`.
pub fn solve_for_parameter(target: f64, x0: f64, x1: f64, x2: f64, x3: f64) -> f64 {
    if x0 == x1 && x1 == x2 && x2 == x3 {
        return 0.5;
    }

    let increasing = x3 >= x0;
    let (lo_x, hi_x) = if increasing { (x0, x3) } else { (x3, x0) };

    if target.is_nan() {
        return 0.0;
    }
    if target <= lo_x {
        return if increasing { 0.0 } else { 1.0 };
    }
    if target >= hi_x {
        return if increasing { 1.0 } else { 0.0 };
    }

    let span = x3 - x0;
    let mut t = if span != 0.0 {
        ((target - x0) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };

    for _ in 0..NEWTON_ITERATIONS {
        let err = evaluate(t, x0, x1, x2, x3) - target;
        if err.abs() < SOLVE_EPSILON {
            return t;
        }
        let slope = derivative(t, x0, x1, x2, x3);
        if slope.abs() < MIN_SLOPE {
            break;
        }
        t = (t - err / slope).clamp(0.0, 1.0);
    }

    if (evaluate(t, x0, x1, x2, x3) - target).abs() < SOLVE_EPSILON {
        return t;
    }

    // Fallback: bisection for robustness
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    for _ in 0..BISECTION_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        let x = evaluate(mid, x0, x1, x2, x3);
        if (x - target).abs() < SOLVE_EPSILON {
            return mid;
        }
        if (x < target) == increasing {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    (lo + hi) * 0.5
}

/// Compose an x curve and a y curve into an easing function.
pub fn ease(x: f64, xs: [f64; 4], ys: [f64; 4]) -> f64 {
    let t = solve_for_parameter(x, xs[0], xs[1], xs[2], xs[3]);
    evaluate(t, ys[0], ys[1], ys[2], ys[3])
}

/// Expand Lottie-style `{o, i}` tangents into x and y control points,
/// `x: [0, o.x, i.x, 1]`, `y: [0, o.y, i.y, 1]`, using the first component.
pub fn tangent_curves(tangents: &BezierTangents) -> Option<([f64; 4], [f64; 4])> {
    let ox = *tangents.o.x.first()?;
    let oy = *tangents.o.y.first()?;
    let ix = *tangents.i.x.first()?;
    let iy = *tangents.i.y.first()?;
    Some(([0.0, ox, ix, 1.0], [0.0, oy, iy, 1.0]))
}

/// Ease `x` through a pair of Lottie tangents. `None` when a component is missing.
pub fn ease_with_tangents(x: f64, tangents: &BezierTangents) -> Option<f64> {
    let (xs, ys) = tangent_curves(tangents)?;
    Some(ease(x, xs, ys))
}
