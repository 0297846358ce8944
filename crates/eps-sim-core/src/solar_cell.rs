//! Single-diode solar cell I-V model with a fill-factor MPP approximation.

use crate::constants::{BOLTZMANN_CONSTANT, ELEMENTARY_CHARGE};
use crate::error::{ConfigError, Result};

/// Default reference temperature for solar cell datasheet parameters (K).
pub const SOLAR_CELL_DEFAULT_T_REF_K: f64 = 301.15;
/// Default reference irradiance for solar cell datasheet parameters (W/m²).
pub const SOLAR_CELL_DEFAULT_G_REF: f64 = 1361.0;
/// Silicon-like bandgap used for the Arrhenius scaling of the diode
/// saturation current (eV). Not a datasheet parameter — a fixed modeling
/// constant, consistent with the single-diode literature's typical
/// treatment of I0(T) when a per-cell bandgap isn't supplied.
const DIODE_BANDGAP_EV: f64 = 1.12;

/// Parameters for a single solar cell, from the manufacturer datasheet.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SolarCellParams {
    /// Cell area (m²).
    pub area_m2: f64,
    /// Open-circuit voltage at reference conditions (V).
    pub voc_ref: f64,
    /// Short-circuit current at reference conditions (A).
    pub isc_ref: f64,
    /// Voltage at maximum power point, reference conditions (V).
    pub vmp_ref: f64,
    /// Current at maximum power point, reference conditions (A).
    pub imp_ref: f64,
    /// Diode ideality factor.
    pub ideality_factor: f64,
    /// Series resistance (ohm).
    pub rs: f64,
    /// Shunt resistance (ohm).
    pub rsh: f64,
    /// dVoc/dT (V/K), typically negative.
    pub d_voc_dt: f64,
    /// dIsc/dT (A/K), typically positive.
    pub d_isc_dt: f64,
    /// dPmp/dT (W/K), typically negative.
    pub d_pmp_dt: f64,
    /// Reference temperature (K).
    pub t_ref_k: f64,
    /// Reference irradiance (W/m²).
    pub g_ref: f64,
    /// Solar absorptance (0-1).
    pub absorptance: f64,
    /// Infrared emittance (0-1).
    pub emittance: f64,
    /// Fraction of panel area actually covered by cells (0-1).
    pub packing_factor: f64,
}

impl SolarCellParams {
    /// Construct solar cell parameters, validating the invariants in the
    /// data model: all positive, Vmp < Voc, Imp < Isc.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        area_m2: f64,
        voc_ref: f64,
        isc_ref: f64,
        vmp_ref: f64,
        imp_ref: f64,
        ideality_factor: f64,
        rs: f64,
        rsh: f64,
        d_voc_dt: f64,
        d_isc_dt: f64,
        d_pmp_dt: f64,
        absorptance: f64,
        emittance: f64,
        packing_factor: f64,
    ) -> Result<Self> {
        for (field, value) in [
            ("area_m2", area_m2),
            ("voc_ref", voc_ref),
            ("isc_ref", isc_ref),
            ("vmp_ref", vmp_ref),
            ("imp_ref", imp_ref),
            ("ideality_factor", ideality_factor),
            ("rs", rs),
            ("rsh", rsh),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveParameter { field, value }.into());
            }
        }
        if vmp_ref >= voc_ref {
            return Err(ConfigError::VmpExceedsVoc {
                vmp: vmp_ref,
                voc: voc_ref,
            }
            .into());
        }
        if imp_ref >= isc_ref {
            return Err(ConfigError::ImpExceedsIsc {
                imp: imp_ref,
                isc: isc_ref,
            }
            .into());
        }
        for (field, value) in [
            ("absorptance", absorptance),
            ("emittance", emittance),
            ("packing_factor", packing_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::FractionOutOfRange { field, value }.into());
            }
        }

        Ok(Self {
            area_m2,
            voc_ref,
            isc_ref,
            vmp_ref,
            imp_ref,
            ideality_factor,
            rs,
            rsh,
            d_voc_dt,
            d_isc_dt,
            d_pmp_dt,
            t_ref_k: SOLAR_CELL_DEFAULT_T_REF_K,
            g_ref: SOLAR_CELL_DEFAULT_G_REF,
            absorptance,
            emittance,
            packing_factor,
        })
    }

    fn thermal_voltage(&self, t_k: f64) -> f64 {
        self.ideality_factor * BOLTZMANN_CONSTANT * t_k / ELEMENTARY_CHARGE
    }

    /// Photocurrent at irradiance `g` (W/m²) and temperature `t_k` (K).
    pub fn photocurrent(&self, g: f64, t_k: f64) -> f64 {
        if g <= 0.0 {
            return 0.0;
        }
        self.isc_ref * (g / self.g_ref) * (1.0 + (self.d_isc_dt / self.isc_ref) * (t_k - self.t_ref_k))
    }

    /// Temperature-corrected open-circuit voltage.
    pub fn voc_at_temperature(&self, t_k: f64) -> f64 {
        self.voc_ref + self.d_voc_dt * (t_k - self.t_ref_k)
    }

    fn saturation_current_ref(&self) -> f64 {
        let vt_ref = self.thermal_voltage(self.t_ref_k);
        let denom = (self.voc_ref / vt_ref).exp() - 1.0;
        (self.isc_ref - self.voc_ref / self.rsh) / denom
    }

    /// Diode saturation current at temperature `t_k`, Arrhenius-scaled from
    /// the value implied by the reference-condition Voc/Isc/Rsh.
    pub fn saturation_current(&self, t_k: f64) -> f64 {
        let i0_ref = self.saturation_current_ref();
        let eg_j = DIODE_BANDGAP_EV * ELEMENTARY_CHARGE;
        let exponent = (eg_j / (self.ideality_factor * BOLTZMANN_CONSTANT))
            * (1.0 / self.t_ref_k - 1.0 / t_k);
        i0_ref * (t_k / self.t_ref_k).powf(3.0 / self.ideality_factor) * exponent.exp()
    }

    /// Solve the single-diode equation for current at voltage `v`, given
    /// irradiance `g` and temperature `t_k`, via Newton-Raphson on the
    /// implicit term `I = Iph - I0*(exp((V+I*Rs)/Vt)-1) - (V+I*Rs)/Rsh`.
    pub fn current_at_voltage(&self, v: f64, g: f64, t_k: f64) -> f64 {
        if g <= 0.0 {
            return 0.0;
        }
        let iph = self.photocurrent(g, t_k);
        let i0 = self.saturation_current(t_k);
        let vt = self.thermal_voltage(t_k);

        let mut i = iph;
        for _ in 0..50 {
            let arg = ((v + i * self.rs) / vt).clamp(-700.0, 700.0);
            let exp_term = arg.exp();
            let f = i - iph + i0 * (exp_term - 1.0) + (v + i * self.rs) / self.rsh;
            let df = 1.0 + i0 * exp_term * (self.rs / vt) + self.rs / self.rsh;
            let delta = f / df;
            i -= delta;
            if delta.abs() < 1e-12 {
                break;
            }
        }
        i.max(0.0)
    }

    /// I(V) curve at the given irradiance and temperature, sampled at the
    /// supplied voltages.
    pub fn iv_curve(&self, g: f64, t_k: f64, voltages: &[f64]) -> Vec<f64> {
        voltages
            .iter()
            .map(|&v| self.current_at_voltage(v, g, t_k))
            .collect()
    }

    /// Maximum power point (V_mp, I_mp) via the fill-factor approximation.
    ///
    /// Returns `(0.0, 0.0)` for non-positive irradiance without invoking
    /// the diode solve.
    pub fn mpp(&self, g: f64, t_k: f64) -> (f64, f64) {
        if g <= 0.0 {
            return (0.0, 0.0);
        }
        let iph = self.photocurrent(g, t_k);
        let voc_t = self.voc_at_temperature(t_k);
        let vt = self.thermal_voltage(t_k);

        let v_oc_norm = voc_t / vt;
        let ff = (v_oc_norm - (v_oc_norm + 0.72).ln()) / (v_oc_norm + 1.0);
        let p_mpp = iph * voc_t * ff * (1.0 - self.rs * iph / voc_t);

        // Split P_mpp between V and I using the reference-condition
        // Vmp/Voc ratio, which is stable across irradiance and temperature
        // for a given cell technology.
        let v_mp = voc_t * (self.vmp_ref / self.voc_ref);
        let i_mp = if v_mp > 0.0 { p_mpp / v_mp } else { 0.0 };
        (v_mp, i_mp.max(0.0))
    }

    /// Power delivered at the maximum power point (W). Zero for `g <= 0`.
    pub fn power_at_mpp(&self, g: f64, t_k: f64) -> f64 {
        let (v_mp, i_mp) = self.mpp(g, t_k);
        (v_mp * i_mp).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azur_3g30c() -> SolarCellParams {
        SolarCellParams::new(
            0.003018, 2.70, 0.52, 2.30, 0.495, 1.3, 0.01, 1000.0, -0.0062, 0.00028, -0.0012, 0.92,
            0.85, 0.85,
        )
        .unwrap()
    }

    #[test]
    fn rejects_vmp_above_voc() {
        let result = SolarCellParams::new(
            0.003, 2.0, 0.5, 2.5, 0.4, 1.3, 0.01, 1000.0, -0.006, 0.0002, -0.001, 0.9, 0.85, 0.85,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_imp_above_isc() {
        let result = SolarCellParams::new(
            0.003, 2.0, 0.5, 1.5, 0.6, 1.3, 0.01, 1000.0, -0.006, 0.0002, -0.001, 0.9, 0.85, 0.85,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_irradiance_gives_zero_power() {
        let cell = azur_3g30c();
        assert_eq!(cell.power_at_mpp(0.0, 301.15), 0.0);
        assert_eq!(cell.power_at_mpp(-100.0, 301.15), 0.0);
    }

    #[test]
    fn power_at_mpp_scales_with_irradiance() {
        let cell = azur_3g30c();
        let p_full = cell.power_at_mpp(1361.0, 301.15);
        let p_half = cell.power_at_mpp(680.5, 301.15);
        assert!(p_full > 0.0);
        assert!(p_half > 0.0);
        assert!(p_half < p_full);
    }

    #[test]
    fn power_at_mpp_decreases_with_temperature() {
        let cell = azur_3g30c();
        let p_cold = cell.power_at_mpp(1361.0, 273.0);
        let p_hot = cell.power_at_mpp(1361.0, 340.0);
        assert!(p_hot < p_cold);
    }

    #[test]
    fn iv_curve_is_non_increasing_in_voltage() {
        let cell = azur_3g30c();
        let voltages: Vec<f64> = (0..=20).map(|i| i as f64 * 2.7 / 20.0).collect();
        let currents = cell.iv_curve(1361.0, 301.15, &voltages);
        for w in currents.windows(2) {
            assert!(w[1] <= w[0] + 1e-9);
        }
    }

    #[test]
    fn current_near_zero_at_open_circuit_voltage() {
        let cell = azur_3g30c();
        let voc_t = cell.voc_at_temperature(301.15);
        let i_at_voc = cell.current_at_voltage(voc_t, 1361.0, 301.15);
        assert!(i_at_voc.abs() < 0.01);
    }
}
