//! # eps-sim-core
//!
//! Coupled orbital, electrical, and thermal simulation core for CubeSat
//! Electrical Power System (EPS) analysis.
//!
//! Given a circular low-Earth orbit, a set of solar panels, a battery pack,
//! and a set of power loads, this crate predicts the evolution of battery
//! state of charge, bus power flows, and (optionally) panel and battery
//! temperatures over one or more orbital periods, and aggregates results
//! into a power budget.
//!
//! This is the physics core only: YAML mission loading, component
//! datasheet parsing, the CLI, plot rendering, and any web/JSON API layer
//! are out of scope and live in other crates that consume this one. The
//! core receives pre-validated, fully-parameterized inputs and returns
//! plain data.
//!
//! ## Overview
//!
//! - [`orbit`] — circular Kepler propagation with optional J2 RAAN drift
//! - [`sun`] — annual ecliptic sun geometry
//! - [`eclipse`] — cylindrical and conical shadow models
//! - [`environment`] — seasonal solar flux, albedo, Earth IR, beta angle
//! - [`solar_cell`] — single-diode I-V model with fill-factor MPP
//! - [`panel`] — CubeSat panel geometry and body-frame projection
//! - [`mppt`] — maximum power point tracker conditioning efficiency
//! - [`battery`] — cell/pack equivalent-circuit model
//! - [`load`] — trigger- and duty-cycle-based load scheduling
//! - [`bus`] — converter efficiency and bus power balance
//! - [`thermal`] — lumped panel and battery thermal dynamics
//! - [`ode`] — adaptive Dormand-Prince RK 4(5) integrator
//! - [`simulation`] — the assembled `Simulation` and its coupled RHS
//! - [`results`] — time series, summary statistics, and the power budget
//!   report
//! - [`lifetime`] — multi-segment lifetime driver with capacity derating
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use eps_sim_core::battery::{BatteryCellParams, BatteryPack, OcvTable};
//! use eps_sim_core::bus::Converter;
//! use eps_sim_core::constants::EARTH_RADIUS_M;
//! use eps_sim_core::eclipse::EclipseModel;
//! use eps_sim_core::load::{LoadMode, LoadProfile, Trigger};
//! use eps_sim_core::mppt::MpptModel;
//! use eps_sim_core::orbit::Orbit;
//! use eps_sim_core::panel::{self, FormFactor};
//! use eps_sim_core::results::{self, SimulationResults};
//! use eps_sim_core::simulation::Simulation;
//! use eps_sim_core::solar_cell::SolarCellParams;
//! use eps_sim_core::sun::SunEphemeris;
//!
//! let orbit = Orbit::new(EARTH_RADIUS_M + 550_000.0, 97.6_f64.to_radians(), 0.0, false)?;
//! let cell = Arc::new(SolarCellParams::new(
//!     0.003018, 2.70, 0.52, 2.30, 0.495, 1.3, 0.01, 1000.0,
//!     -0.0062, 0.00028, -0.0012, 0.92, 0.85, 0.85,
//! )?);
//! let panels = panel::cubesat_body(FormFactor::U3, cell, &[]);
//! let ocv = OcvTable::new(vec![(0.0, 3.0), (0.5, 3.7), (1.0, 4.2)])?;
//! let cell_params = BatteryCellParams::new(3.2, 3.6, 3.0, 4.2, 0.05, 0.02, 2000.0, 0.03, 20000.0, ocv)?;
//! let battery = BatteryPack::new(cell_params, 2, 2)?;
//! let loads = LoadProfile::new(vec![
//!     LoadMode::new("obc", 0.5, 1.0, Trigger::Always, 0)?,
//!     LoadMode::new("radio", 4.0, 0.15, Trigger::Sunlight, 1)?,
//! ]);
//!
//! let sim = Simulation::new(
//!     orbit,
//!     SunEphemeris::new(80.0),
//!     EclipseModel::Cylindrical,
//!     panels,
//!     MpptModel::default(),
//!     loads.clone(),
//!     Converter::constant(0.92)?,
//!     battery,
//!     None,
//!     1.0,
//! )?;
//!
//! let (times, states, aux) = sim.run(5.0 * sim.period_s(), 30.0)?;
//! let results: SimulationResults =
//!     SimulationResults::from_series(times, &states, &aux, sim.loads(), sim.battery());
//! let budget = results::report(&results, &loads, "demo-mission");
//! println!("verdict: {}", budget.verdict);
//! # Ok::<(), eps_sim_core::error::EpsError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod battery;
pub mod bus;
pub mod constants;
pub mod eclipse;
pub mod environment;
pub mod error;
pub mod lifetime;
pub mod load;
pub mod mppt;
pub mod ode;
pub mod orbit;
pub mod panel;
pub mod results;
pub mod simulation;
pub mod solar_cell;
pub mod sun;
pub mod thermal;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
