//! EPS core - error taxonomy.
//!
//! Construction-time errors are immediate and terminal for the simulation
//! that raised them. Integration failures abort a run in progress. Neither
//! category includes `NumericalBoundary` conditions (SoC leaving [0,1],
//! battery voltage below pack minimum, panel overtemperature) — those are
//! non-fatal and are reported as fields on `SimulationResults` instead, so
//! the caller can see how badly a design fails without the run aborting.

use thiserror::Error;

use crate::simulation::SimState;

/// Top-level error for the EPS simulation core.
#[derive(Error, Debug)]
pub enum EpsError {
    /// A component parameter violated an invariant at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The adaptive integrator could not complete the requested horizon.
    #[error("integration failure: {0}")]
    Integration(#[from] IntegrationError),
}

/// Errors raised synchronously when constructing a component.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A scalar parameter that must be strictly positive was not.
    #[error("parameter '{field}' must be positive, got {value}")]
    NonPositiveParameter {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Maximum power point voltage must be below open-circuit voltage.
    #[error("Vmp ({vmp}) must be less than Voc ({voc})")]
    VmpExceedsVoc {
        /// Configured Vmp.
        vmp: f64,
        /// Configured Voc.
        voc: f64,
    },

    /// Maximum power point current must be below short-circuit current.
    #[error("Imp ({imp}) must be less than Isc ({isc})")]
    ImpExceedsIsc {
        /// Configured Imp.
        imp: f64,
        /// Configured Isc.
        isc: f64,
    },

    /// The OCV-vs-SoC table was not monotone non-decreasing, or had points
    /// outside SoC∈[0,1].
    #[error("OCV table is not monotone non-decreasing at index {index}")]
    NonMonotoneOcvTable {
        /// Index of the first offending breakpoint.
        index: usize,
    },

    /// The OCV-vs-SoC table did not cover SoC = 0 and SoC = 1.
    #[error("OCV table must cover SoC in [0, 1], got [{min}, {max}]")]
    IncompleteOcvTable {
        /// Minimum SoC present in the table.
        min: f64,
        /// Maximum SoC present in the table.
        max: f64,
    },

    /// A battery pack was configured with zero parallel strings.
    #[error("N_parallel must be at least 1, got {0}")]
    ZeroParallelCells(u32),

    /// A battery pack was configured with zero series cells.
    #[error("N_series must be at least 1, got {0}")]
    ZeroSeriesCells(u32),

    /// A deployed-wing panel factory was asked for an unsupported wing count.
    #[error("wing_count must be 2 or 4, got {0}")]
    InvalidWingCount(u32),

    /// A load mode referenced a trigger string the scheduler doesn't know.
    #[error("unknown load trigger '{0}', expected always|sunlight|eclipse")]
    UnknownTrigger(String),

    /// A duty cycle or efficiency fraction was outside [0, 1].
    #[error("'{field}' must be in [0, 1], got {value}")]
    FractionOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// Raised when the adaptive step integrator fails to meet tolerance within
/// the retry budget, or a NaN appears in the state vector.
#[derive(Error, Debug)]
#[error("integration failed at t={last_good_t}: {reason}")]
pub struct IntegrationError {
    /// Simulation time of the last state the integrator trusted.
    pub last_good_t: f64,
    /// The last state the integrator trusted.
    pub last_good_state: SimState,
    /// Human-readable reason (max-retry exceeded, NaN detected, ...).
    pub reason: String,
}

/// Result type alias for EPS simulation core operations.
pub type Result<T> = std::result::Result<T, EpsError>;
