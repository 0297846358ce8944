//! Physical constants fixed at the system boundary.
//!
//! These values are bit-exact where mission compatibility matters (orbit
//! propagation, eclipse geometry, thermal balance) and are never configurable
//! at runtime — there is no mutable registry inside the core.

/// Earth mean equatorial radius (m).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Earth gravitational parameter μ (m³/s²).
pub const EARTH_MU: f64 = 3.986_004_418e14;
/// Earth's second zonal harmonic J2.
pub const J2: f64 = 1.08263e-3;
/// Sun radius (m).
pub const SUN_RADIUS_M: f64 = 6.957e8;
/// One astronomical unit (m).
pub const AU_M: f64 = 1.495_978_707e11;
/// Stefan-Boltzmann constant (W/(m²·K⁴)).
pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;
/// Solar constant at 1 AU (W/m²).
pub const SOLAR_CONSTANT: f64 = 1361.0;
/// Mean obliquity of the ecliptic (degrees).
pub const OBLIQUITY_DEG: f64 = 23.439_2911;
/// Universal gas constant (J/(mol·K)).
pub const GAS_CONSTANT: f64 = 8.314;
/// Default reference temperature for datasheet parameters (K).
pub const DEFAULT_T_REF_K: f64 = 298.15;
/// Boltzmann constant (J/K), used in the diode thermal voltage.
pub const BOLTZMANN_CONSTANT: f64 = 1.380_649e-23;
/// Elementary charge (C), used in the diode thermal voltage.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Default MPPT peak tracking efficiency.
pub const DEFAULT_MPPT_EFFICIENCY: f64 = 0.97;
/// Default converter efficiency.
pub const DEFAULT_CONVERTER_EFFICIENCY: f64 = 0.92;
/// Default initial battery state of charge.
pub const DEFAULT_INITIAL_SOC: f64 = 1.0;
/// Default maximum ODE step size (s).
pub const DEFAULT_DT_MAX_S: f64 = 30.0;
/// Default epoch day-of-year used by the sun ephemeris.
pub const DEFAULT_EPOCH_DOY: f64 = 80.0;

/// Seconds in a day, used throughout the sun ephemeris and environment model.
pub const SECONDS_PER_DAY: f64 = 86_400.0;
/// Days in a tropical year, used for the annual ecliptic motion of the Sun.
pub const DAYS_PER_YEAR: f64 = 365.25;
