//! Adaptive Dormand-Prince RK 4(5) ODE integrator with embedded error
//! estimate and step-size control.
//!
//! No ODE crate appears anywhere in the example pack this core was
//! modeled on, so the Butcher tableau is implemented directly. RC time
//! constants here are seconds-to-minutes and thermal is minutes-to-hours,
//! so an explicit embedded-pair method is adequate — no implicit/stiff
//! solver is needed.

use crate::error::{EpsError, IntegrationError};
use crate::simulation::SimState;

// Dormand-Prince (RKDP) coefficients.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// 5th-order solution weights (identical to row 7 of A, since this tableau
// is FSAL).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 4th-order embedded solution weights, for the error estimate.
const BS1: f64 = 5179.0 / 57600.0;
const BS3: f64 = 7571.0 / 16695.0;
const BS4: f64 = 393.0 / 640.0;
const BS5: f64 = -92097.0 / 339200.0;
const BS6: f64 = 187.0 / 2100.0;
const BS7: f64 = 1.0 / 40.0;

const MAX_STEP_RETRIES: u32 = 12;
const MIN_SHRINK: f64 = 0.2;
const MAX_GROW: f64 = 5.0;
const SAFETY: f64 = 0.9;

/// Absolute/relative tolerance pair per state component.
#[derive(Debug, Clone)]
pub struct Tolerances {
    abs: Vec<f64>,
    rel: f64,
}

impl Tolerances {
    /// Default tolerances for a 3-component state (SoC, V_rc1, V_rc2):
    /// abs ~= 1e-6, rel ~= 1e-5.
    pub fn no_thermal() -> Self {
        Self {
            abs: vec![1e-6, 1e-6, 1e-6],
            rel: 1e-5,
        }
    }

    /// Default tolerances for a 5-component state (SoC, V_rc1, V_rc2,
    /// T_panel, T_battery): same electrical tolerances, plus 1e-3 K for
    /// the two temperature components.
    pub fn with_thermal() -> Self {
        Self {
            abs: vec![1e-6, 1e-6, 1e-6, 1e-3, 1e-3],
            rel: 1e-5,
        }
    }
}

/// A single accepted integration step: the time reached and the state
/// there.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Time at the end of the step (s).
    pub t: f64,
    /// State at `t`.
    pub y: Vec<f64>,
}

fn weighted_error_norm(y_high: &[f64], y_low: &[f64], y_prev: &[f64], tol: &Tolerances) -> f64 {
    let mut max_ratio = 0.0_f64;
    for i in 0..y_high.len() {
        let scale = tol.abs[i] + tol.rel * y_high[i].abs().max(y_prev[i].abs());
        let ratio = (y_high[i] - y_low[i]).abs() / scale;
        max_ratio = max_ratio.max(ratio);
    }
    max_ratio
}

fn vec_add_scaled(base: &[f64], terms: &[(f64, &[f64])]) -> Vec<f64> {
    let mut out = base.to_vec();
    for (coeff, k) in terms {
        if *coeff == 0.0 {
            continue;
        }
        for i in 0..out.len() {
            out[i] += coeff * k[i];
        }
    }
    out
}

/// Take one Dormand-Prince step from `(t, y)` with trial step `dt`,
/// returning the 5th-order solution, 4th-order solution, and the final
/// stage derivative `k7` (reusable as `k1` of the next step under FSAL,
/// not currently exploited since `rhs` also depends on spacecraft state
/// outside `y`).
fn dp_step<F>(
    rhs: &mut F,
    t: f64,
    y: &[f64],
    dt: f64,
) -> std::result::Result<(Vec<f64>, Vec<f64>), EpsError>
where
    F: FnMut(f64, &[f64]) -> std::result::Result<Vec<f64>, EpsError>,
{
    let k1 = rhs(t, y)?;
    let y2 = vec_add_scaled(y, &[(dt * A21, &k1)]);
    let k2 = rhs(t + C2 * dt, &y2)?;
    let y3 = vec_add_scaled(y, &[(dt * A31, &k1), (dt * A32, &k2)]);
    let k3 = rhs(t + C3 * dt, &y3)?;
    let y4 = vec_add_scaled(y, &[(dt * A41, &k1), (dt * A42, &k2), (dt * A43, &k3)]);
    let k4 = rhs(t + C4 * dt, &y4)?;
    let y5 = vec_add_scaled(
        y,
        &[
            (dt * A51, &k1),
            (dt * A52, &k2),
            (dt * A53, &k3),
            (dt * A54, &k4),
        ],
    );
    let k5 = rhs(t + C5 * dt, &y5)?;
    let y6 = vec_add_scaled(
        y,
        &[
            (dt * A61, &k1),
            (dt * A62, &k2),
            (dt * A63, &k3),
            (dt * A64, &k4),
            (dt * A65, &k5),
        ],
    );
    let k6 = rhs(t + dt, &y6)?;
    let y7 = vec_add_scaled(
        y,
        &[
            (dt * A71, &k1),
            (dt * A73, &k3),
            (dt * A74, &k4),
            (dt * A75, &k5),
            (dt * A76, &k6),
        ],
    );
    let k7 = rhs(t + dt, &y7)?;

    let y_high = vec_add_scaled(
        y,
        &[
            (dt * B1, &k1),
            (dt * B3, &k3),
            (dt * B4, &k4),
            (dt * B5, &k5),
            (dt * B6, &k6),
        ],
    );
    let y_low = vec_add_scaled(
        y,
        &[
            (dt * BS1, &k1),
            (dt * BS3, &k3),
            (dt * BS4, &k4),
            (dt * BS5, &k5),
            (dt * BS6, &k6),
            (dt * BS7, &k7),
        ],
    );

    Ok((y_high, y_low))
}

/// Integrate `rhs` from `t0` to `t_end` starting at `y0`, with adaptive
/// step size capped at `dt_max`, recording every accepted step.
///
/// `state_for_error` converts the raw `Vec<f64>` at the point of failure
/// back into a `SimState` for the `IntegrationError` payload.
pub fn integrate<F, S>(
    mut rhs: F,
    t0: f64,
    t_end: f64,
    y0: Vec<f64>,
    dt_max: f64,
    tol: &Tolerances,
    state_for_error: S,
) -> std::result::Result<Vec<StepOutput>, EpsError>
where
    F: FnMut(f64, &[f64]) -> std::result::Result<Vec<f64>, EpsError>,
    S: Fn(&[f64]) -> SimState,
{
    let mut t = t0;
    let mut y = y0;
    let mut dt = dt_max.min((t_end - t0).max(1e-6));
    let mut out = vec![StepOutput { t, y: y.clone() }];

    while t < t_end - 1e-9 {
        let dt_trial = dt.min(t_end - t).min(dt_max);
        let mut accepted = false;
        let mut attempt_dt = dt_trial;

        for _ in 0..MAX_STEP_RETRIES {
            let (y_high, y_low) = dp_step(&mut rhs, t, &y, attempt_dt)?;

            if y_high.iter().any(|v| !v.is_finite()) {
                return Err(IntegrationError {
                    last_good_t: t,
                    last_good_state: state_for_error(&y),
                    reason: "non-finite value produced during integration step".to_string(),
                }
                .into());
            }

            let err_norm = weighted_error_norm(&y_high, &y_low, &y, tol);

            if err_norm <= 1.0 {
                t += attempt_dt;
                y = y_high;
                out.push(StepOutput { t, y: y.clone() });

                let growth = if err_norm > 0.0 {
                    (SAFETY * err_norm.powf(-0.2)).clamp(1.0, MAX_GROW)
                } else {
                    MAX_GROW
                };
                dt = (attempt_dt * growth).min(dt_max);
                accepted = true;
                break;
            } else {
                let shrink = (SAFETY * err_norm.powf(-0.2)).clamp(MIN_SHRINK, 1.0);
                attempt_dt *= shrink;
            }
        }

        if !accepted {
            return Err(IntegrationError {
                last_good_t: t,
                last_good_state: state_for_error(&y),
                reason: format!(
                    "step size retries exhausted at t={t} without meeting tolerance"
                ),
            }
            .into());
        }
    }

    Ok(out)
}
