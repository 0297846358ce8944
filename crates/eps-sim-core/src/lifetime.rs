//! Lifetime driver: multi-segment re-runs of a simulation template with
//! capacity derating from calendar and cycle aging.

use crate::constants::{DEFAULT_DT_MAX_S, GAS_CONSTANT};
use crate::error::Result;
use crate::results::SimulationResults;
use crate::simulation::Simulation;

/// Capacity floor below which derating stops, to avoid runaway.
const CAPACITY_FLOOR_FRACTION: f64 = 0.5;

/// Calendar and cycle aging rates for a battery chemistry, with Arrhenius
/// temperature acceleration applied to both components.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct AgingModel {
    /// Calendar capacity loss per year at the reference temperature
    /// (fractional, e.g. 0.02 = 2%/yr).
    pub calendar_loss_per_year: f64,
    /// Cycle capacity loss per full-equivalent-cycle at 50% DoD
    /// (fractional).
    pub cycle_loss_per_cycle_50pct_dod: f64,
    /// Cycle capacity loss per full-equivalent-cycle at 100% DoD
    /// (fractional).
    pub cycle_loss_per_cycle_100pct_dod: f64,
    /// Arrhenius activation energy governing the temperature acceleration
    /// of both loss components (J/mol).
    pub activation_energy_j_mol: f64,
    /// Reference temperature for the rates above (K).
    pub t_ref_k: f64,
}

impl AgingModel {
    fn arrhenius_factor(&self, mean_temp_k: f64) -> f64 {
        ((self.activation_energy_j_mol / GAS_CONSTANT) * (1.0 / self.t_ref_k - 1.0 / mean_temp_k))
            .exp()
    }

    /// Interpolate the cycle loss rate at the given depth of discharge
    /// (0-1), linearly between the 50% and 100% DoD rates.
    fn cycle_loss_rate(&self, dod: f64) -> f64 {
        let dod = dod.clamp(0.0, 1.0);
        if dod <= 0.5 {
            self.cycle_loss_per_cycle_50pct_dod * (dod / 0.5)
        } else {
            let t = (dod - 0.5) / 0.5;
            self.cycle_loss_per_cycle_50pct_dod
                + t * (self.cycle_loss_per_cycle_100pct_dod - self.cycle_loss_per_cycle_50pct_dod)
        }
    }
}

/// Per-segment result row.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SegmentResult {
    /// Elapsed mission time at the end of this segment (years).
    pub years: f64,
    /// Fraction of original capacity remaining.
    pub capacity_remaining: f64,
    /// Minimum SoC observed during this segment.
    pub min_soc: f64,
    /// Worst-case depth of discharge during this segment.
    pub worst_dod: f64,
}

/// Full lifetime-driver results.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LifetimeResults {
    /// Per-segment rows, in chronological order.
    pub segments: Vec<SegmentResult>,
    /// Set once the capacity floor was reached and derating was clamped.
    pub capacity_floor_reached: bool,
}

/// Drive a simulation template across multiple segments, derating battery
/// capacity between segments according to an [`AgingModel`].
pub struct LifetimeDriver {
    template: Simulation,
    aging: AgingModel,
    orbits_per_segment: f64,
    update_interval_orbits: f64,
    total_duration_years: f64,
}

impl LifetimeDriver {
    /// Construct a lifetime driver.
    pub fn new(
        template: Simulation,
        aging: AgingModel,
        total_duration_years: f64,
        update_interval_orbits: f64,
        orbits_per_segment: f64,
    ) -> Self {
        Self {
            template,
            aging,
            orbits_per_segment,
            update_interval_orbits,
            total_duration_years,
        }
    }

    /// Run all segments until `total_duration_years` has elapsed.
    pub fn run(&self) -> Result<LifetimeResults> {
        let period_s = self.template.period_s();
        let segment_duration_s = self.orbits_per_segment * period_s;
        let update_interval_s = self.update_interval_orbits * period_s;
        let total_duration_s = self.total_duration_years * 365.25 * 86400.0;

        let mut sim = self.template.clone();
        let cell_capacity0_ah = sim.battery().cell.capacity_ah;

        let mut elapsed_s = 0.0_f64;
        let mut calendar_loss = 0.0_f64;
        let mut cycle_loss = 0.0_f64;
        let mut capacity_floor_reached = false;

        let mut segments = Vec::new();

        while elapsed_s < total_duration_s - 1e-6 {
            let (times, states, aux) = sim.run(segment_duration_s, DEFAULT_DT_MAX_S)?;
            let results = SimulationResults::from_series(
                times,
                &states,
                &aux,
                sim.loads(),
                sim.battery(),
            );
            let summary = results.summary();

            let min_soc = summary.min_soc;
            let worst_dod = summary.worst_case_dod;
            let mean_battery_temp_k = results
                .battery_temp_k
                .as_ref()
                .map(|series| series.iter().sum::<f64>() / series.len() as f64)
                .unwrap_or(self.aging.t_ref_k);

            elapsed_s += update_interval_s;

            let years = elapsed_s / (365.25 * 86400.0);
            let accel = self.aging.arrhenius_factor(mean_battery_temp_k);

            calendar_loss += self.aging.calendar_loss_per_year * (update_interval_s / (365.25 * 86400.0)) * accel;
            cycle_loss += self.aging.cycle_loss_rate(worst_dod) * self.orbits_per_segment * accel;

            let mut capacity_fraction = 1.0 - calendar_loss - cycle_loss;
            if capacity_fraction < CAPACITY_FLOOR_FRACTION {
                capacity_fraction = CAPACITY_FLOOR_FRACTION;
                capacity_floor_reached = true;
            }

            segments.push(SegmentResult {
                years,
                capacity_remaining: capacity_fraction,
                min_soc,
                worst_dod,
            });

            let mut derated_battery = sim.battery().clone();
            derated_battery.cell.capacity_ah = cell_capacity0_ah * capacity_fraction;
            let final_soc = states.last().map(|s| s.soc()).unwrap_or_else(|| sim.initial_soc());

            sim = sim.with_battery(derated_battery).with_initial_soc(final_soc);
        }

        Ok(LifetimeResults {
            segments,
            capacity_floor_reached,
        })
    }
}
