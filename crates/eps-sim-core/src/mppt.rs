//! Maximum power point tracker conditioning efficiency.

use crate::constants::DEFAULT_MPPT_EFFICIENCY;
use crate::error::{ConfigError, Result};

/// MPPT conditioning model: constant efficiency, or efficiency that falls
/// off at low input power.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MpptModel {
    /// Peak tracking efficiency (0-1).
    pub peak_eff: f64,
    /// Power-dependence parameters, if any.
    pub power_dependence: Option<PowerDependence>,
}

/// Parameters for power-dependent MPPT efficiency rolloff.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PowerDependence {
    /// Rated input power (W) at which efficiency approaches `peak_eff`.
    pub rated_power_w: f64,
    /// Efficiency as input power approaches zero.
    pub min_eff: f64,
}

impl Default for MpptModel {
    fn default() -> Self {
        Self {
            peak_eff: DEFAULT_MPPT_EFFICIENCY,
            power_dependence: None,
        }
    }
}

impl MpptModel {
    /// A constant-efficiency MPPT model.
    pub fn constant(peak_eff: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&peak_eff) {
            return Err(ConfigError::FractionOutOfRange {
                field: "peak_eff",
                value: peak_eff,
            }
            .into());
        }
        Ok(Self {
            peak_eff,
            power_dependence: None,
        })
    }

    /// A power-dependent MPPT model that rolls off toward `min_eff` as
    /// input power falls well below `rated_power_w`.
    pub fn power_dependent(peak_eff: f64, min_eff: f64, rated_power_w: f64) -> Result<Self> {
        for (field, value) in [("peak_eff", peak_eff), ("min_eff", min_eff)] {
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
            peak_eff,
            power_dependence: Some(PowerDependence {
                rated_power_w,
                min_eff,
            }),
        })
    }

    /// Tracking efficiency at the given input power (W).
    pub fn tracking_efficiency(&self, power_w: f64) -> f64 {
        match self.power_dependence {
            None => self.peak_eff,
            Some(PowerDependence {
                rated_power_w,
                min_eff,
            }) => {
                self.peak_eff
                    - (self.peak_eff - min_eff) * (-5.0 * power_w / rated_power_w).exp()
            }
        }
    }
}
