//! Seasonal solar flux, albedo, Earth IR, and beta angle.
//!
//! Solar flux varies with Earth's elliptical orbit around the Sun; albedo
//! and Earth-IR heat loads fall off with the square of altitude. This
//! seasonal variation is always applied — there is no option to disable it.

use nalgebra::Vector3;

use crate::constants::{EARTH_RADIUS_M, SOLAR_CONSTANT};

/// Seasonal solar flux at the given day-of-year (W/m²).
pub fn solar_flux_at_epoch(doy: f64) -> f64 {
    SOLAR_CONSTANT * (1.0 + 0.0334 * (std::f64::consts::TAU * (doy - 3.0) / 365.25).cos())
}

/// Albedo flux reaching a spacecraft at the given altitude (W/m²).
pub fn albedo_flux(altitude_m: f64, doy: f64) -> f64 {
    let view_factor = (EARTH_RADIUS_M / (EARTH_RADIUS_M + altitude_m)).powi(2);
    0.3 * view_factor * solar_flux_at_epoch(doy)
}

/// Earth infrared flux reaching a spacecraft at the given altitude (W/m²).
pub fn earth_ir_flux(altitude_m: f64) -> f64 {
    237.0 * (EARTH_RADIUS_M / (EARTH_RADIUS_M + altitude_m)).powi(2)
}

/// Beta angle (radians): angle between the orbit plane and the Sun
/// direction, computed from inclination, RAAN, and the Sun's ecliptic
/// longitude.
///
/// `sin(beta) = cos(lambda_sun)*sin(raan)*sin(i) - sin(lambda_sun)*cos(eps)*cos(raan)*sin(i)
///              + sin(lambda_sun)*sin(eps)*cos(i)`
/// This is the standard closed-form beta-angle expression; we compute it
/// directly from the orbit normal and sun direction instead, which is
/// equivalent and avoids re-deriving the trig identity.
pub fn beta_angle(inclination_rad: f64, raan_rad: f64, sun_direction_eci: Vector3<f64>) -> f64 {
    // Orbit normal (angular momentum direction) for arg_periapsis = 0.
    let normal = Vector3::new(
        raan_rad.sin() * inclination_rad.sin(),
        -raan_rad.cos() * inclination_rad.sin(),
        inclination_rad.cos(),
    );
    let cos_angle = normal.dot(&sun_direction_eci).clamp(-1.0, 1.0);
    std::f64::consts::FRAC_PI_2 - cos_angle.acos()
}
