//! Battery cell and pack equivalent-circuit model: OCV(SoC) table,
//! Arrhenius R0(T), two R-C polarization branches, and series/parallel
//! pack scaling.

use crate::constants::GAS_CONSTANT;
use crate::error::{ConfigError, Result};

/// A monotone non-decreasing OCV-vs-SoC lookup table.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OcvTable {
    /// (SoC, OCV) breakpoints, sorted by SoC, SoC in `[0, 1]`.
    points: Vec<(f64, f64)>,
}

impl OcvTable {
    /// Construct an OCV table, validating that SoC covers `[0, 1]` and OCV
    /// is monotone non-decreasing in SoC.
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        for w in points.windows(2) {
            if w[1].1 < w[0].1 {
                return Err(ConfigError::NonMonotoneOcvTable {
                    index: points.iter().position(|p| p.0 == w[1].0).unwrap_or(0),
                }
                .into());
            }
        }

        let min_soc = points.first().map(|p| p.0).unwrap_or(f64::NAN);
        let max_soc = points.last().map(|p| p.0).unwrap_or(f64::NAN);
        if points.len() < 2 || min_soc > 0.0 + 1e-9 || max_soc < 1.0 - 1e-9 {
            return Err(ConfigError::IncompleteOcvTable {
                min: min_soc,
                max: max_soc,
            }
            .into());
        }

        Ok(Self { points })
    }

    /// Linear interpolation of OCV at the given SoC, clamped to the table's
    /// endpoints outside `[0, 1]`.
    pub fn ocv(&self, soc: f64) -> f64 {
        let soc = soc.clamp(self.points[0].0, self.points[self.points.len() - 1].0);
        let idx = self
            .points
            .iter()
            .position(|p| p.0 >= soc)
            .unwrap_or(self.points.len() - 1);
        if idx == 0 {
            return self.points[0].1;
        }
        let (s0, v0) = self.points[idx - 1];
        let (s1, v1) = self.points[idx];
        if (s1 - s0).abs() < 1e-15 {
            return v1;
        }
        v0 + (v1 - v0) * (soc - s0) / (s1 - s0)
    }
}

/// Parameters for a single battery cell.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatteryCellParams {
    /// Nameplate capacity (A·h).
    pub capacity_ah: f64,
    /// Nominal terminal voltage (V), informational.
    pub nominal_voltage: f64,
    /// Minimum allowed terminal voltage (V).
    pub min_voltage: f64,
    /// Maximum allowed terminal voltage (V).
    pub max_voltage: f64,
    /// Series resistance at the reference temperature (ohm).
    pub r0_ref: f64,
    /// First R-C branch resistance (ohm).
    pub r1: f64,
    /// First R-C branch capacitance (F).
    pub c1: f64,
    /// Second R-C branch resistance (ohm).
    pub r2: f64,
    /// Second R-C branch capacitance (F).
    pub c2: f64,
    /// Arrhenius activation energy for R0(T) (J/mol).
    pub activation_energy_j_mol: f64,
    /// Reference temperature for `r0_ref` (K).
    pub t_ref_k: f64,
    /// OCV-vs-SoC table.
    pub ocv_table: OcvTable,
}

impl BatteryCellParams {
    /// Construct battery cell parameters, validating positivity of all
    /// physical quantities.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        capacity_ah: f64,
        nominal_voltage: f64,
        min_voltage: f64,
        max_voltage: f64,
        r0_ref: f64,
        r1: f64,
        c1: f64,
        r2: f64,
        c2: f64,
        ocv_table: OcvTable,
    ) -> Result<Self> {
        for (field, value) in [
            ("capacity_ah", capacity_ah),
            ("nominal_voltage", nominal_voltage),
            ("min_voltage", min_voltage),
            ("max_voltage", max_voltage),
            ("r0_ref", r0_ref),
            ("r1", r1),
            ("c1", c1),
            ("r2", r2),
            ("c2", c2),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveParameter { field, value }.into());
            }
        }

        Ok(Self {
            capacity_ah,
            nominal_voltage,
            min_voltage,
            max_voltage,
            r0_ref,
            r1,
            c1,
            r2,
            c2,
            activation_energy_j_mol: 19_000.0,
            t_ref_k: crate::constants::DEFAULT_T_REF_K,
            ocv_table,
        })
    }

    /// Series resistance at temperature `t_k`, Arrhenius-scaled from
    /// `r0_ref` at `t_ref_k`.
    pub fn r0(&self, t_k: f64) -> f64 {
        self.r0_ref
            * ((self.activation_energy_j_mol / GAS_CONSTANT) * (1.0 / t_k - 1.0 / self.t_ref_k))
                .exp()
    }
}

/// A battery pack built from series/parallel cell strings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatteryPack {
    /// Cell parameters.
    pub cell: BatteryCellParams,
    /// Number of cells in series.
    pub n_series: u32,
    /// Number of parallel strings.
    pub n_parallel: u32,
}

impl BatteryPack {
    /// Construct a pack, validating `n_series` and `n_parallel` are at
    /// least 1.
    pub fn new(cell: BatteryCellParams, n_series: u32, n_parallel: u32) -> Result<Self> {
        if n_series == 0 {
            return Err(ConfigError::ZeroSeriesCells(n_series).into());
        }
        if n_parallel == 0 {
            return Err(ConfigError::ZeroParallelCells(n_parallel).into());
        }
        Ok(Self {
            cell,
            n_series,
            n_parallel,
        })
    }

    /// Pack capacity (A·h).
    pub fn capacity_ah(&self) -> f64 {
        self.cell.capacity_ah * self.n_parallel as f64
    }

    /// Pack nominal voltage (V).
    pub fn nominal_voltage(&self) -> f64 {
        self.cell.nominal_voltage * self.n_series as f64
    }

    /// Pack minimum voltage (V).
    pub fn min_voltage(&self) -> f64 {
        self.cell.min_voltage * self.n_series as f64
    }

    /// Pack maximum voltage (V).
    pub fn max_voltage(&self) -> f64 {
        self.cell.max_voltage * self.n_series as f64
    }

    fn series_over_parallel(&self) -> f64 {
        self.n_series as f64 / self.n_parallel as f64
    }

    fn parallel_over_series(&self) -> f64 {
        self.n_parallel as f64 / self.n_series as f64
    }

    /// Pack OCV at the given SoC.
    pub fn ocv(&self, soc: f64) -> f64 {
        self.cell.ocv_table.ocv(soc) * self.n_series as f64
    }

    /// Pack series resistance at temperature `t_k`.
    pub fn r0(&self, t_k: f64) -> f64 {
        self.cell.r0(t_k) * self.series_over_parallel()
    }

    /// Pack first R-C branch resistance.
    pub fn r1(&self) -> f64 {
        self.cell.r1 * self.series_over_parallel()
    }

    /// Pack first R-C branch capacitance.
    pub fn c1(&self) -> f64 {
        self.cell.c1 * self.parallel_over_series()
    }

    /// Pack second R-C branch resistance.
    pub fn r2(&self) -> f64 {
        self.cell.r2 * self.series_over_parallel()
    }

    /// Pack second R-C branch capacitance.
    pub fn c2(&self) -> f64 {
        self.cell.c2 * self.parallel_over_series()
    }

    /// Terminal voltage given SoC, pack output current (positive =
    /// discharging), temperature, and the two R-C branch voltages.
    pub fn terminal_voltage(&self, soc: f64, i_out: f64, t_k: f64, v_rc1: f64, v_rc2: f64) -> f64 {
        self.ocv(soc) - i_out * self.r0(t_k) - v_rc1 - v_rc2
    }

    /// State derivatives `(dSoC/dt, dV_rc1/dt, dV_rc2/dt)` for pack output
    /// current `i_out` (positive = discharging).
    pub fn derivatives(&self, i_out: f64, v_rc1: f64, v_rc2: f64) -> (f64, f64, f64) {
        let d_soc = -i_out / (self.capacity_ah() * 3600.0);
        let d_vrc1 = i_out / self.c1() - v_rc1 / (self.r1() * self.c1());
        let d_vrc2 = i_out / self.c2() - v_rc2 / (self.r2() * self.c2());
        (d_soc, d_vrc1, d_vrc2)
    }
}
