//! Power bus / converter: efficiency curve and battery-current bus-balance
//! solve.

use crate::error::{ConfigError, Result};

/// Converter efficiency model, constant or load-dependent.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Converter {
    /// Nominal (rated-load) efficiency, 0-1.
    pub nominal_eff: f64,
    /// Load-dependence parameters, if any.
    pub load_dependence: Option<LoadDependence>,
}

/// Parameters for the converter's load-dependent efficiency curve.
///
/// Pinned shape (Open Question resolution, see `DESIGN.md`): a two-piece
/// quadratic through `(0, light_load_eff)`, `(0.5*rated, peak_eff)`,
/// `(rated, nominal_eff)`, with a linear droop of 1.5% of `peak_eff` per
/// rated-fraction beyond 1.0, clamped at `1.5*rated`.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct LoadDependence {
    /// Rated power (W) at which `nominal_eff` applies.
    pub rated_power_w: f64,
    /// Peak efficiency, reached near 50% of rated power.
    pub peak_eff: f64,
    /// Efficiency in the zero-load limit.
    pub light_load_eff: f64,
}

impl Converter {
    /// A constant-efficiency converter.
    pub fn constant(nominal_eff: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&nominal_eff) {
            return Err(ConfigError::FractionOutOfRange {
                field: "nominal_eff",
                value: nominal_eff,
            }
            .into());
        }
        Ok(Self {
            nominal_eff,
            load_dependence: None,
        })
    }

    /// A load-dependent converter efficiency curve.
    pub fn load_dependent(
        nominal_eff: f64,
        rated_power_w: f64,
        peak_eff: f64,
        light_load_eff: f64,
    ) -> Result<Self> {
        for (field, value) in [
            ("nominal_eff", nominal_eff),
            ("peak_eff", peak_eff),
            ("light_load_eff", light_load_eff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::FractionOutOfRange { field, value }.into());
            }
        }
        if !(rated_power_w > 0.0) {
            return Err(ConfigError::NonPositiveParameter {
                field: "rated_power_w",
                value: rated_power_w,
            }
            .into());
        }
        Ok(Self {
            nominal_eff,
            load_dependence: Some(LoadDependence {
                rated_power_w,
                peak_eff,
                light_load_eff,
            }),
        })
    }

    /// Converter efficiency at the given load power (W).
    pub fn efficiency(&self, power_w: f64) -> f64 {
        let Some(ld) = self.load_dependence else {
            return self.nominal_eff;
        };

        let x = power_w.max(0.0) / ld.rated_power_w;

        if x <= 0.5 {
            // Quadratic through (0, light_load_eff), (0.5, peak_eff), with
            // zero slope at the peak.
            let t = x / 0.5;
            ld.light_load_eff + (ld.peak_eff - ld.light_load_eff) * t * (2.0 - t)
        } else if x <= 1.0 {
            // Quadratic through (0.5, peak_eff), (1.0, nominal_eff), with
            // zero slope at the peak.
            let t = (x - 0.5) / 0.5;
            ld.peak_eff + (self.nominal_eff - ld.peak_eff) * t * t
        } else {
            // Linear droop past rated power, clamped at 1.5x rated.
            let over = (x.min(1.5) - 1.0) / 0.5;
            self.nominal_eff - 0.015 * ld.peak_eff * over
        }
    }
}

/// Result of the bus-balance solve: net battery current and the power
/// actually delivered to the bus from the solar array.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BusBalance {
    /// Battery current (A). Positive = discharging, negative = charging.
    pub i_bat: f64,
    /// Net power flowing into (positive) or out of (negative) the battery
    /// through the converter (W).
    pub p_bat: f64,
}

/// Solve the bus balance for battery current given solar power generated
/// (W, pre-converter), load power demanded (W), converter, and battery
/// terminal voltage (V).
///
/// `net_power = P_load - P_solar * eta_c(P_load)`. If positive, the battery
/// discharges through the converter: `P_bat = net_power / eta_c`. If
/// negative, the battery absorbs the excess: `P_bat = net_power * eta_c`
/// (negative, i.e. charging).
pub fn net_battery_current(
    p_solar: f64,
    p_load: f64,
    v_bat: f64,
    converter: &Converter,
) -> BusBalance {
    let eta_c = converter.efficiency(p_load);
    let net_power = p_load - p_solar * eta_c;

    let p_bat = if net_power > 0.0 {
        net_power / eta_c
    } else {
        net_power * eta_c
    };

    let i_bat = if v_bat > 0.0 { p_bat / v_bat } else { 0.0 };

    BusBalance { i_bat, p_bat }
}
