//! Eclipse shadow fraction models.
//!
//! Shadow fraction `s` is 0.0 for fully sunlit and 1.0 for fully shadowed;
//! the conical model additionally returns values in between while the
//! satellite crosses Earth's penumbra.

use nalgebra::Vector3;

use crate::constants::{AU_M, EARTH_RADIUS_M, SUN_RADIUS_M};

/// Which shadow geometry to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseModel {
    /// Binary cylindrical shadow: fully sunlit or fully shadowed.
    Cylindrical,
    /// Conical shadow with a linear penumbra ramp.
    Conical,
}

/// An eclipse (entry, exit) event pair, in seconds from the start of the
/// series passed to [`find_transitions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipseEvent {
    /// Time of entry into shadow (s >= 0.5 crossing upward).
    pub entry_t: f64,
    /// Time of exit from shadow (s >= 0.5 crossing downward).
    pub exit_t: f64,
}

impl EclipseModel {
    /// Shadow fraction for a satellite at `r_sat` (ECI, m) given the sun
    /// unit vector `r_sun_unit` (ECI).
    pub fn shadow_fraction(&self, r_sat: Vector3<f64>, r_sun_unit: Vector3<f64>) -> f64 {
        match self {
            EclipseModel::Cylindrical => cylindrical_shadow_fraction(r_sat, r_sun_unit),
            EclipseModel::Conical => conical_shadow_fraction(r_sat, r_sun_unit),
        }
    }
}

fn cylindrical_shadow_fraction(r_sat: Vector3<f64>, r_sun_unit: Vector3<f64>) -> f64 {
    let anti_sun = -r_sun_unit;
    let along = r_sat.dot(&anti_sun);
    if along <= 0.0 {
        return 0.0;
    }
    let perp = (r_sat - anti_sun * along).norm();
    if perp < EARTH_RADIUS_M {
        1.0
    } else {
        0.0
    }
}

fn conical_shadow_fraction(r_sat: Vector3<f64>, r_sun_unit: Vector3<f64>) -> f64 {
    let d_earth = r_sat.norm();
    let theta_sun = (SUN_RADIUS_M / AU_M).asin();
    let theta_earth = (EARTH_RADIUS_M / d_earth).asin();

    let anti_sun = -r_sun_unit;
    let cos_sep = (r_sat.normalize()).dot(&anti_sun).clamp(-1.0, 1.0);
    let theta_sep = cos_sep.acos();

    if theta_sep >= theta_earth + theta_sun {
        0.0
    } else if theta_sep <= theta_earth - theta_sun {
        1.0
    } else {
        ((theta_earth + theta_sun - theta_sep) / (2.0 * theta_sun)).clamp(0.0, 1.0)
    }
}

/// Find (entry, exit) shadow transitions across the given time series, as
/// zero-crossings of `shadow_fraction - 0.5`.
pub fn find_transitions(
    model: EclipseModel,
    r_sat: &[Vector3<f64>],
    r_sun: &[Vector3<f64>],
    t: &[f64],
) -> Vec<EclipseEvent> {
    assert_eq!(r_sat.len(), r_sun.len());
    assert_eq!(r_sat.len(), t.len());

    let values: Vec<f64> = r_sat
        .iter()
        .zip(r_sun.iter())
        .map(|(&r, &s)| model.shadow_fraction(r, s) - 0.5)
        .collect();

    let mut events = Vec::new();
    let mut entry: Option<f64> = None;

    for i in 1..values.len() {
        let (prev, cur) = (values[i - 1], values[i]);
        if prev < 0.0 && cur >= 0.0 {
            let frac = -prev / (cur - prev);
            entry = Some(t[i - 1] + frac * (t[i] - t[i - 1]));
        } else if prev >= 0.0 && cur < 0.0 {
            if let Some(entry_t) = entry.take() {
                let frac = prev / (prev - cur);
                let exit_t = t[i - 1] + frac * (t[i] - t[i - 1]);
                events.push(EclipseEvent { entry_t, exit_t });
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat_at_midnight(altitude_m: f64) -> Vector3<f64> {
        // Directly behind Earth from the Sun, on the x-axis.
        Vector3::new(-(EARTH_RADIUS_M + altitude_m), 0.0, 0.0)
    }

    fn sat_at_noon(altitude_m: f64) -> Vector3<f64> {
        Vector3::new(EARTH_RADIUS_M + altitude_m, 0.0, 0.0)
    }

    #[test]
    fn cylindrical_is_binary() {
        let sun_dir = Vector3::new(1.0, 0.0, 0.0);
        let dark = EclipseModel::Cylindrical.shadow_fraction(sat_at_midnight(550_000.0), sun_dir);
        let lit = EclipseModel::Cylindrical.shadow_fraction(sat_at_noon(550_000.0), sun_dir);
        assert_eq!(dark, 1.0);
        assert_eq!(lit, 0.0);
    }

    #[test]
    fn conical_matches_cylindrical_outside_penumbra() {
        let sun_dir = Vector3::new(1.0, 0.0, 0.0);
        let r = sat_at_noon(550_000.0);
        let cyl = EclipseModel::Cylindrical.shadow_fraction(r, sun_dir);
        let con = EclipseModel::Conical.shadow_fraction(r, sun_dir);
        assert_eq!(cyl, con);
    }

    #[test]
    fn conical_is_in_unit_range() {
        let sun_dir = Vector3::new(1.0, 0.0, 0.0);
        for deg in (0..360).step_by(5) {
            let theta = (deg as f64).to_radians();
            let r = Vector3::new(
                (EARTH_RADIUS_M + 550_000.0) * theta.cos(),
                (EARTH_RADIUS_M + 550_000.0) * theta.sin(),
                0.0,
            );
            let s = EclipseModel::Conical.shadow_fraction(r, sun_dir);
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn conical_never_exceeds_cylindrical() {
        let sun_dir = Vector3::new(1.0, 0.0, 0.0);
        for deg in (0..360).step_by(3) {
            let theta = (deg as f64).to_radians();
            let r = Vector3::new(
                (EARTH_RADIUS_M + 550_000.0) * theta.cos(),
                (EARTH_RADIUS_M + 550_000.0) * theta.sin(),
                0.0,
            );
            let cyl = EclipseModel::Cylindrical.shadow_fraction(r, sun_dir);
            let con = EclipseModel::Conical.shadow_fraction(r, sun_dir);
            assert!(con <= cyl + 1e-12);
        }
    }

    #[test]
    fn penumbra_band_width_matches_two_theta_sun() {
        let d_earth = EARTH_RADIUS_M + 550_000.0;
        let theta_sun = (SUN_RADIUS_M / AU_M).asin();
        let theta_earth = (EARTH_RADIUS_M / d_earth).asin();
        assert!((2.0 * theta_sun).to_degrees() - 0.53 < 0.05);
        // sanity: band is symmetric around theta_earth
        assert!(theta_earth > theta_sun);
    }

    #[test]
    fn find_transitions_detects_entry_and_exit() {
        let n = 200;
        let period = 5676.98_f64; // ~550km SSO period, seconds
        let t: Vec<f64> = (0..n).map(|i| i as f64 * period / n as f64).collect();
        let sun_dir = Vector3::new(1.0, 0.0, 0.0);
        let r: Vec<Vector3<f64>> = t
            .iter()
            .map(|&tt| {
                let theta = std::f64::consts::TAU * tt / period;
                Vector3::new(
                    (EARTH_RADIUS_M + 550_000.0) * theta.cos(),
                    (EARTH_RADIUS_M + 550_000.0) * theta.sin(),
                    0.0,
                )
            })
            .collect();
        let s_vec: Vec<Vector3<f64>> = t.iter().map(|_| sun_dir).collect();

        let events = find_transitions(EclipseModel::Cylindrical, &r, &s_vec, &t);
        assert_eq!(events.len(), 1);
        assert!(events[0].exit_t > events[0].entry_t);
    }
}
