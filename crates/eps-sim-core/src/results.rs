//! Post-integration results: time series, derived scalars, and the
//! per-subsystem power budget report.

use crate::battery::BatteryPack;
use crate::load::LoadProfile;
use crate::simulation::{RhsAuxiliary, SimState};

/// Overtemperature threshold for the panel numerical-boundary flag (K).
const PANEL_OVERTEMP_K: f64 = 400.0;

/// Full time series plus derived scalars from one simulation run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimulationResults {
    /// Time grid (s).
    pub time_s: Vec<f64>,
    /// Battery state of charge at each grid point. Never clamped — values
    /// outside `[0, 1]` are reported, not hidden.
    pub soc: Vec<f64>,
    /// Generated power at the bus (W, post-MPPT) at each grid point.
    pub generated_power_w: Vec<f64>,
    /// Consumed load power (W) at each grid point.
    pub consumed_power_w: Vec<f64>,
    /// Battery terminal voltage (V) at each grid point.
    pub battery_voltage_v: Vec<f64>,
    /// Whether in eclipse at each grid point.
    pub in_eclipse: Vec<bool>,
    /// Names of the loads active at each grid point.
    pub active_modes: Vec<Vec<String>>,
    /// Panel temperature (K) at each grid point, if thermal was enabled.
    pub panel_temp_k: Option<Vec<f64>>,
    /// Battery temperature (K) at each grid point, if thermal was enabled.
    pub battery_temp_k: Option<Vec<f64>>,
    /// Count of grid points where SoC left `[0, 1]`.
    pub soc_excursion_count: u32,
    /// Count of grid points where battery voltage dropped below the pack
    /// minimum.
    pub voltage_excursion_count: u32,
    /// Count of grid points where panel temperature exceeded 400 K.
    pub overtemp_excursion_count: u32,
}

/// Scalar summary of a [`SimulationResults`] run.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ResultsSummary {
    /// Minimum SoC observed.
    pub min_soc: f64,
    /// Maximum SoC observed.
    pub max_soc: f64,
    /// Worst-case depth of discharge, `1 - min_soc`.
    pub worst_case_dod: f64,
    /// Mean generated power (W).
    pub mean_generated_w: f64,
    /// Mean consumed power (W).
    pub mean_consumed_w: f64,
    /// Power margin: `mean_generated - mean_consumed` (W).
    pub power_margin_w: f64,
    /// Fraction of grid points in eclipse.
    pub eclipse_fraction: f64,
    /// Net energy over the run: `power_margin * duration` (J).
    pub energy_balance_j: f64,
    /// Minimum battery voltage observed (V).
    pub min_battery_voltage_v: f64,
    /// Maximum battery voltage observed (V).
    pub max_battery_voltage_v: f64,
}

impl SimulationResults {
    /// Assemble results from integrator output states and the resampled
    /// auxiliary series.
    pub fn from_series(
        time_s: Vec<f64>,
        states: &[SimState],
        aux: &[RhsAuxiliary],
        loads: &LoadProfile,
        battery: &BatteryPack,
    ) -> Self {
        let soc: Vec<f64> = states.iter().map(|s| s.soc()).collect();
        let generated_power_w: Vec<f64> = aux.iter().map(|a| a.p_solar_w).collect();
        let consumed_power_w: Vec<f64> = aux.iter().map(|a| a.p_load_w).collect();
        let battery_voltage_v: Vec<f64> = aux.iter().map(|a| a.v_bat).collect();
        let in_eclipse: Vec<bool> = aux.iter().map(|a| a.in_eclipse).collect();
        let active_modes: Vec<Vec<String>> = in_eclipse
            .iter()
            .map(|&e| {
                loads
                    .active_modes(0.0, e)
                    .into_iter()
                    .map(|m| m.name.clone())
                    .collect()
            })
            .collect();

        let panel_temp_k = if states.iter().any(|s| s.t_panel().is_some()) {
            Some(states.iter().map(|s| s.t_panel().unwrap_or(f64::NAN)).collect())
        } else {
            None
        };
        let battery_temp_k = if states.iter().any(|s| s.t_battery().is_some()) {
            Some(
                states
                    .iter()
                    .map(|s| s.t_battery().unwrap_or(f64::NAN))
                    .collect(),
            )
        } else {
            None
        };

        let min_pack_voltage = battery.min_voltage();
        let soc_excursion_count = soc.iter().filter(|&&s| !(0.0..=1.0).contains(&s)).count() as u32;
        let voltage_excursion_count = battery_voltage_v
            .iter()
            .filter(|&&v| v < min_pack_voltage)
            .count() as u32;
        let overtemp_excursion_count = panel_temp_k
            .as_ref()
            .map(|series| series.iter().filter(|&&t| t > PANEL_OVERTEMP_K).count())
            .unwrap_or(0) as u32;

        Self {
            time_s,
            soc,
            generated_power_w,
            consumed_power_w,
            battery_voltage_v,
            in_eclipse,
            active_modes,
            panel_temp_k,
            battery_temp_k,
            soc_excursion_count,
            voltage_excursion_count,
            overtemp_excursion_count,
        }
    }

    /// Scalar summary of this run.
    pub fn summary(&self) -> ResultsSummary {
        let n = self.soc.len().max(1) as f64;
        let min_soc = self.soc.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_soc = self.soc.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean_generated_w = self.generated_power_w.iter().sum::<f64>() / n;
        let mean_consumed_w = self.consumed_power_w.iter().sum::<f64>() / n;
        let eclipse_fraction =
            self.in_eclipse.iter().filter(|&&e| e).count() as f64 / n;
        let duration = self.time_s.last().copied().unwrap_or(0.0) - self.time_s.first().copied().unwrap_or(0.0);
        let power_margin_w = mean_generated_w - mean_consumed_w;

        ResultsSummary {
            min_soc,
            max_soc,
            worst_case_dod: 1.0 - min_soc,
            mean_generated_w,
            mean_consumed_w,
            power_margin_w,
            eclipse_fraction,
            energy_balance_j: power_margin_w * duration,
            min_battery_voltage_v: self
                .battery_voltage_v
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min),
            max_battery_voltage_v: self
                .battery_voltage_v
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Verdict for a power budget report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Verdict {
    /// Power margin >= 0 and min SoC > 0.
    PositiveMargin,
    /// Power margin < 0, or min SoC <= 0, or worst DoD > 1.
    NegativeMargin,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::PositiveMargin => write!(f, "POSITIVE MARGIN"),
            Verdict::NegativeMargin => write!(f, "NEGATIVE MARGIN"),
        }
    }
}

/// A single subsystem row in the power budget report.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SubsystemRow {
    /// Subsystem/load name.
    pub name: String,
    /// Nameplate power (W).
    pub power_w: f64,
    /// Duty cycle, 0-1.
    pub duty: f64,
    /// Trigger condition name.
    pub trigger: String,
    /// Average contribution to orbit power draw (W).
    pub average_contribution_w: f64,
}

/// Per-subsystem power budget with an overall verdict.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PowerBudgetReport {
    /// Mission name, for display.
    pub mission_name: String,
    /// Per-subsystem rows, in load-profile order.
    pub subsystems: Vec<SubsystemRow>,
    /// Orbit-average generated power (W).
    pub orbit_average_generated_w: f64,
    /// Orbit-average consumed power (W).
    pub orbit_average_consumed_w: f64,
    /// Overall verdict.
    pub verdict: Verdict,
}

/// Produce a per-subsystem power budget report and verdict.
///
/// "POSITIVE MARGIN" iff power margin >= 0 AND min SoC > 0 AND worst DoD
/// <= 1; "NEGATIVE MARGIN" otherwise.
pub fn report(
    results: &SimulationResults,
    loads: &LoadProfile,
    mission_name: impl Into<String>,
) -> PowerBudgetReport {
    let summary = results.summary();

    let sunlight_fraction = 1.0 - summary.eclipse_fraction;
    let subsystems: Vec<SubsystemRow> = loads
        .modes()
        .iter()
        .map(|m| {
            let (trigger, active_fraction) = match m.trigger {
                crate::load::Trigger::Always => ("always", 1.0),
                crate::load::Trigger::Sunlight => ("sunlight", sunlight_fraction),
                crate::load::Trigger::Eclipse => ("eclipse", summary.eclipse_fraction),
            };
            SubsystemRow {
                name: m.name.clone(),
                power_w: m.power_w,
                duty: m.duty_cycle,
                trigger: trigger.to_string(),
                average_contribution_w: m.power_w * m.duty_cycle * active_fraction,
            }
        })
        .collect();

    let verdict = if summary.power_margin_w >= 0.0 && summary.min_soc > 0.0 && summary.worst_case_dod <= 1.0 {
        Verdict::PositiveMargin
    } else {
        Verdict::NegativeMargin
    };

    PowerBudgetReport {
        mission_name: mission_name.into(),
        subsystems,
        orbit_average_generated_w: summary.mean_generated_w,
        orbit_average_consumed_w: summary.mean_consumed_w,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::{BatteryCellParams, OcvTable};
    use crate::load::{LoadMode, Trigger};

    fn test_loads() -> LoadProfile {
        LoadProfile::new(vec![
            LoadMode::new("obc", 1.0, 1.0, Trigger::Always, 0).unwrap(),
            LoadMode::new("radio", 4.0, 0.15, Trigger::Sunlight, 1).unwrap(),
        ])
    }

    fn test_battery() -> BatteryPack {
        let ocv = OcvTable::new(vec![(0.0, 3.0), (0.5, 3.7), (1.0, 4.2)]).unwrap();
        let cell =
            BatteryCellParams::new(3.2, 3.6, 3.0, 4.2, 0.05, 0.02, 2000.0, 0.03, 20000.0, ocv)
                .unwrap();
        BatteryPack::new(cell, 2, 2).unwrap()
    }

    fn fake_results() -> SimulationResults {
        let n = 10;
        let time_s: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
        let states: Vec<SimState> = (0..n)
            .map(|i| SimState::NoThermal([1.0 - 0.01 * i as f64, 0.0, 0.0]))
            .collect();
        let aux: Vec<RhsAuxiliary> = (0..n)
            .map(|i| RhsAuxiliary {
                shadow_fraction: if i % 2 == 0 { 0.0 } else { 1.0 },
                in_eclipse: i % 2 == 1,
                p_solar_w: if i % 2 == 0 { 5.0 } else { 0.0 },
                p_load_w: 2.0,
                v_bat: 7.4,
                i_bat: 0.5,
            })
            .collect();
        SimulationResults::from_series(time_s, &states, &aux, &test_loads(), &test_battery())
    }

    #[test]
    fn summary_computes_min_max_soc() {
        let results = fake_results();
        let summary = results.summary();
        assert!((summary.min_soc - 0.91).abs() < 1e-9);
        assert!((summary.max_soc - 1.0).abs() < 1e-9);
    }

    #[test]
    fn summary_eclipse_fraction_matches_flags() {
        let results = fake_results();
        let summary = results.summary();
        assert!((summary.eclipse_fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn voltage_excursion_counts_below_pack_minimum() {
        let mut results = fake_results();
        results.battery_voltage_v = vec![5.0; results.time_s.len()];
        let battery = test_battery();
        let min_v = battery.min_voltage();
        let count = results
            .battery_voltage_v
            .iter()
            .filter(|&&v| v < min_v)
            .count();
        assert_eq!(count, results.time_s.len());
    }

    #[test]
    fn report_verdict_positive_when_margin_and_soc_healthy() {
        let results = fake_results();
        let budget = report(&results, &test_loads(), "test-mission");
        assert_eq!(budget.verdict, Verdict::PositiveMargin);
    }

    #[test]
    fn report_verdict_negative_when_min_soc_non_positive() {
        let mut results = fake_results();
        results.soc[5] = -0.1;
        let budget = report(&results, &test_loads(), "test-mission");
        assert_eq!(budget.verdict, Verdict::NegativeMargin);
    }

    #[test]
    fn report_subsystem_rows_match_load_count() {
        let results = fake_results();
        let budget = report(&results, &test_loads(), "test-mission");
        assert_eq!(budget.subsystems.len(), 2);
    }

    #[test]
    fn no_thermal_series_has_no_temperature_fields() {
        let results = fake_results();
        assert!(results.panel_temp_k.is_none());
        assert!(results.battery_temp_k.is_none());
    }
}
