//! Circular Kepler orbit propagation with optional J2 secular RAAN drift.
//!
//! This is deliberately not a general orbit propagator: no drag, no
//! higher-order gravity terms, no eccentricity. A CubeSat power analysis
//! needs an ascending-node-referenced circular orbit and nothing more.

use nalgebra::Vector3;

use crate::constants::{EARTH_MU, EARTH_RADIUS_M, J2};
use crate::error::{ConfigError, Result};

/// A circular low-Earth orbit, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct Orbit {
    /// Semi-major axis (m).
    semi_major_axis_m: f64,
    /// Inclination (radians).
    inclination_rad: f64,
    /// RAAN at epoch t=0 (radians).
    raan0_rad: f64,
    /// Mean motion n = sqrt(mu / a^3) (rad/s).
    mean_motion: f64,
    /// RAAN drift rate from J2, 0.0 if disabled (rad/s).
    raan_rate: f64,
}

/// A point on the propagated orbit.
#[derive(Debug, Clone, Copy)]
pub struct OrbitState {
    /// Position in ECI (m).
    pub position: Vector3<f64>,
    /// Velocity in ECI (m/s).
    pub velocity: Vector3<f64>,
    /// Altitude above the reference Earth radius (m).
    pub altitude_m: f64,
    /// Current right ascension of the ascending node (radians).
    pub raan_rad: f64,
}

impl Orbit {
    /// Construct a circular orbit.
    ///
    /// `semi_major_axis_m` must exceed the Earth radius; `inclination_rad`
    /// must lie in `[0, pi]`.
    pub fn new(
        semi_major_axis_m: f64,
        inclination_rad: f64,
        raan0_rad: f64,
        j2_enabled: bool,
    ) -> Result<Self> {
        if !(semi_major_axis_m > EARTH_RADIUS_M) {
            return Err(ConfigError::NonPositiveParameter {
                field: "semi_major_axis_m",
                value: semi_major_axis_m,
            }
            .into());
        }
        if !(0.0..=std::f64::consts::PI).contains(&inclination_rad) {
            return Err(ConfigError::FractionOutOfRange {
                field: "inclination_rad",
                value: inclination_rad,
            }
            .into());
        }

        let mean_motion = (EARTH_MU / semi_major_axis_m.powi(3)).sqrt();
        let raan_rate = if j2_enabled {
            -1.5 * mean_motion
                * J2
                * (EARTH_RADIUS_M / semi_major_axis_m).powi(2)
                * inclination_rad.cos()
        } else {
            0.0
        };

        Ok(Self {
            semi_major_axis_m,
            inclination_rad,
            raan0_rad,
            mean_motion,
            raan_rate,
        })
    }

    /// Semi-major axis (m).
    pub fn semi_major_axis_m(&self) -> f64 {
        self.semi_major_axis_m
    }

    /// Inclination (radians).
    pub fn inclination_rad(&self) -> f64 {
        self.inclination_rad
    }

    /// Mean motion n = sqrt(mu/a^3) (rad/s).
    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    /// Orbital period T = 2*pi/n (s).
    pub fn period_s(&self) -> f64 {
        std::f64::consts::TAU / self.mean_motion
    }

    /// RAAN secular drift rate (rad/s), zero if J2 is disabled.
    pub fn raan_rate(&self) -> f64 {
        self.raan_rate
    }

    /// Propagate to scalar time `t` (seconds past the ascending node at
    /// t=0), returning position, velocity, altitude, and current RAAN.
    pub fn propagate(&self, t: f64) -> OrbitState {
        let nu = self.mean_motion * t; // true anomaly == argument of latitude for a circular orbit
        let raan = self.raan0_rad + self.raan_rate * t;

        let r = self.semi_major_axis_m;
        let v = self.mean_motion * r; // circular orbital speed

        let (sin_nu, cos_nu) = nu.sin_cos();
        let (sin_raan, cos_raan) = raan.sin_cos();
        let (sin_i, cos_i) = self.inclination_rad.sin_cos();

        // Perifocal -> ECI rotation with argument of perigee = 0.
        let position = Vector3::new(
            r * (cos_raan * cos_nu - sin_raan * sin_nu * cos_i),
            r * (sin_raan * cos_nu + cos_raan * sin_nu * cos_i),
            r * sin_nu * sin_i,
        );
        let velocity = Vector3::new(
            v * (-cos_raan * sin_nu - sin_raan * cos_nu * cos_i),
            v * (-sin_raan * sin_nu + cos_raan * cos_nu * cos_i),
            v * cos_nu * sin_i,
        );

        OrbitState {
            position,
            velocity,
            altitude_m: r - EARTH_RADIUS_M,
            raan_rad: raan,
        }
    }

    /// Propagate at every requested time, in order.
    pub fn propagate_all(&self, times: &[f64]) -> Vec<OrbitState> {
        times.iter().map(|&t| self.propagate(t)).collect()
    }
}
