//! Lumped thermal model: panel and battery temperature derivatives from a
//! Stefan-Boltzmann radiative balance.
//!
//! Both panel and battery are modeled as single lumped thermal masses —
//! no internal gradient, no radiative coupling between panels. Panels
//! radiate from both faces; the battery radiates to a fixed spacecraft
//! reference temperature rather than to deep space directly.

use crate::constants::STEFAN_BOLTZMANN;
use crate::error::{ConfigError, Result};

/// Thermal configuration for one simulation: panel and battery thermal
/// masses, optical properties, and the battery's heater/reference
/// environment.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ThermalConfig {
    /// Solar absorptance of the panel surface (0-1).
    pub panel_absorptance: f64,
    /// Infrared emittance of the panel surface (0-1).
    pub panel_emittance: f64,
    /// Total panel area exposed to the environment (m²), both sides.
    pub panel_area_total_m2: f64,
    /// Panel thermal mass (J/K).
    pub panel_thermal_mass_j_k: f64,
    /// Initial panel temperature (K).
    pub initial_panel_temp_k: f64,
    /// Battery radiating surface area (m²).
    pub battery_area_m2: f64,
    /// Battery infrared emittance (0-1).
    pub battery_emittance: f64,
    /// Battery thermal mass (J/K).
    pub battery_thermal_mass_j_k: f64,
    /// Initial battery temperature (K).
    pub initial_battery_temp_k: f64,
    /// Fixed spacecraft structure temperature the battery radiates
    /// against (K).
    pub spacecraft_temp_k: f64,
    /// Battery heater power (W), zero if no heater is modeled.
    pub heater_power_w: f64,
}

impl ThermalConfig {
    /// Construct a thermal configuration, validating positivity of all
    /// physical quantities and that fractions lie in `[0, 1]`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        panel_absorptance: f64,
        panel_emittance: f64,
        panel_area_total_m2: f64,
        panel_thermal_mass_j_k: f64,
        initial_panel_temp_k: f64,
        battery_area_m2: f64,
        battery_emittance: f64,
        battery_thermal_mass_j_k: f64,
        initial_battery_temp_k: f64,
        spacecraft_temp_k: f64,
        heater_power_w: f64,
    ) -> Result<Self> {
        for (field, value) in [
            ("panel_area_total_m2", panel_area_total_m2),
            ("panel_thermal_mass_j_k", panel_thermal_mass_j_k),
            ("initial_panel_temp_k", initial_panel_temp_k),
            ("battery_area_m2", battery_area_m2),
            ("battery_thermal_mass_j_k", battery_thermal_mass_j_k),
            ("initial_battery_temp_k", initial_battery_temp_k),
            ("spacecraft_temp_k", spacecraft_temp_k),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveParameter { field, value }.into());
            }
        }
        for (field, value) in [
            ("panel_absorptance", panel_absorptance),
            ("panel_emittance", panel_emittance),
            ("battery_emittance", battery_emittance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::FractionOutOfRange { field, value }.into());
            }
        }
        if heater_power_w < 0.0 {
            return Err(ConfigError::NonPositiveParameter {
                field: "heater_power_w",
                value: heater_power_w,
            }
            .into());
        }

        Ok(Self {
            panel_absorptance,
            panel_emittance,
            panel_area_total_m2,
            panel_thermal_mass_j_k,
            initial_panel_temp_k,
            battery_area_m2,
            battery_emittance,
            battery_thermal_mass_j_k,
            initial_battery_temp_k,
            spacecraft_temp_k,
            heater_power_w,
        })
    }

    /// Panel temperature derivative (K/s).
    ///
    /// `Q_solar_abs = alpha * G_eff * area_total - P_elec` is the solar
    /// power absorbed by the panel substrate net of what was converted to
    /// electricity; the panel radiates from both faces (`2 * area`).
    pub fn panel_derivative(
        &self,
        g_eff: f64,
        p_elec_w: f64,
        albedo_flux: f64,
        earth_ir_flux: f64,
        t_panel_k: f64,
    ) -> f64 {
        let area = self.panel_area_total_m2;
        let q_solar_abs = self.panel_absorptance * g_eff * area - p_elec_w;
        let q_albedo = self.panel_absorptance * albedo_flux * area;
        let q_radiated = self.panel_emittance * STEFAN_BOLTZMANN * area * 2.0 * t_panel_k.powi(4);
        let q_ir = self.panel_emittance * earth_ir_flux * area;

        (q_solar_abs + q_albedo - q_radiated + q_ir) / self.panel_thermal_mass_j_k
    }

    /// Battery temperature derivative (K/s).
    ///
    /// `i_bat` is the battery current magnitude (A) and `r0` its internal
    /// resistance (ohm), so `i_bat^2 * r0` is resistive self-heating.
    pub fn battery_derivative(&self, i_bat: f64, r0: f64, t_battery_k: f64) -> f64 {
        let joule_heat = i_bat * i_bat * r0;
        let q_radiated = self.battery_emittance
            * STEFAN_BOLTZMANN
            * self.battery_area_m2
            * (t_battery_k.powi(4) - self.spacecraft_temp_k.powi(4));

        (joule_heat + self.heater_power_w - q_radiated) / self.battery_thermal_mass_j_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> ThermalConfig {
        ThermalConfig::new(0.92, 0.85, 0.06, 200.0, 293.15, 0.02, 0.8, 5000.0, 293.15, 293.15, 0.0)
            .unwrap()
    }

    #[test]
    fn rejects_non_positive_thermal_mass() {
        let result = ThermalConfig::new(0.92, 0.85, 0.06, 0.0, 293.15, 0.02, 0.8, 5000.0, 293.15, 293.15, 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_emittance() {
        let result = ThermalConfig::new(0.92, 1.5, 0.06, 200.0, 293.15, 0.02, 0.8, 5000.0, 293.15, 293.15, 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn panel_heats_up_under_full_sun_with_no_electrical_load() {
        let cfg = sample_config();
        let d = cfg.panel_derivative(1361.0, 0.0, 0.0, 0.0, 250.0);
        assert!(d > 0.0);
    }

    #[test]
    fn panel_cools_in_eclipse() {
        let cfg = sample_config();
        let d = cfg.panel_derivative(0.0, 0.0, 0.0, 0.0, 320.0);
        assert!(d < 0.0);
    }

    #[test]
    fn panel_converges_near_equilibrium() {
        let cfg = sample_config();
        // Find an approximate equilibrium by stepping forward; derivative
        // magnitude should shrink toward zero as T approaches steady state.
        let mut t = 280.0;
        let mut last_abs = f64::INFINITY;
        for _ in 0..2000 {
            let d = cfg.panel_derivative(1361.0, 5.0, 0.0, 0.0, t);
            t += d * 10.0;
            last_abs = d.abs();
        }
        assert!(last_abs < 1e-3);
    }

    #[test]
    fn battery_heats_with_current_and_no_heater() {
        let cfg = sample_config();
        let d = cfg.battery_derivative(2.0, 0.1, 293.15);
        assert!(d > 0.0);
    }

    #[test]
    fn battery_radiates_toward_spacecraft_temperature() {
        let cfg = sample_config();
        let d_hot = cfg.battery_derivative(0.0, 0.1, 320.0);
        let d_cold = cfg.battery_derivative(0.0, 0.1, 260.0);
        assert!(d_hot < 0.0);
        assert!(d_cold > 0.0);
    }

    #[test]
    fn heater_adds_constant_heat() {
        let mut cfg = sample_config();
        let d_no_heater = cfg.battery_derivative(0.0, 0.1, 293.15);
        cfg.heater_power_w = 1.0;
        let d_with_heater = cfg.battery_derivative(0.0, 0.1, 293.15);
        assert!(d_with_heater > d_no_heater);
    }
}
