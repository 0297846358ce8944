//! Annual ecliptic sun geometry.
//!
//! A first-order approximation: the Sun moves at a constant rate around the
//! ecliptic over the year and Earth-Sun distance is fixed at 1 AU for
//! direction purposes. Distance variation feeds into seasonal flux instead
//! (see [`crate::environment`]).

use nalgebra::Vector3;

use crate::constants::{DAYS_PER_YEAR, OBLIQUITY_DEG, SECONDS_PER_DAY};

/// Annual sun ephemeris referenced to a day-of-year epoch.
#[derive(Debug, Clone, Copy)]
pub struct SunEphemeris {
    /// Day of year at simulation t=0 (1.0 = Jan 1st, fractional allowed).
    epoch_doy: f64,
}

impl SunEphemeris {
    /// Construct an ephemeris anchored at the given epoch day-of-year.
    pub fn new(epoch_doy: f64) -> Self {
        Self { epoch_doy }
    }

    /// Day of year at simulation time `t` seconds past epoch.
    pub fn day_of_year(&self, t: f64) -> f64 {
        self.epoch_doy + t / SECONDS_PER_DAY
    }

    /// Ecliptic longitude of the Sun (radians), measured from the vernal
    /// equinox direction, advancing at a constant rate over the year.
    pub fn ecliptic_longitude(&self, t: f64) -> f64 {
        std::f64::consts::TAU * self.day_of_year(t) / DAYS_PER_YEAR
    }

    /// Sun direction unit vector in the Earth-centered inertial frame at
    /// time `t`.
    pub fn direction_eci(&self, t: f64) -> Vector3<f64> {
        let lambda = self.ecliptic_longitude(t);
        let eps = OBLIQUITY_DEG.to_radians();
        Vector3::new(
            lambda.cos(),
            eps.cos() * lambda.sin(),
            eps.sin() * lambda.sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_unit_length() {
        let sun = SunEphemeris::new(80.0);
        for t in [0.0, 1e5, 1e7, 3e7] {
            let dir = sun.direction_eci(t);
            assert!((dir.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn longitude_advances_one_full_turn_per_year() {
        let sun = SunEphemeris::new(0.0);
        let lambda0 = sun.ecliptic_longitude(0.0);
        let lambda1 = sun.ecliptic_longitude(DAYS_PER_YEAR * SECONDS_PER_DAY);
        assert!((lambda1 - lambda0 - std::f64::consts::TAU).abs() < 1e-9);
    }

    #[test]
    fn equinox_direction_lies_in_equatorial_plane() {
        // At lambda = 0 (vernal equinox), the sun direction should have no
        // declination component (z = 0).
        let sun = SunEphemeris::new(0.0);
        let dir = sun.direction_eci(0.0);
        assert!(dir.z.abs() < 1e-12);
        assert!((dir.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn solstice_declination_matches_obliquity() {
        // At lambda = 90 deg (summer solstice), z = sin(obliquity).
        let sun = SunEphemeris::new(0.0);
        let t = DAYS_PER_YEAR * SECONDS_PER_DAY / 4.0;
        let dir = sun.direction_eci(t);
        assert!((dir.z - OBLIQUITY_DEG.to_radians().sin()).abs() < 1e-6);
    }
}
