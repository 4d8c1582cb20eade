//! Core of the five-odds picks dashboard.
//!
//! - [`simulation`]: Monte Carlo run of the daily accumulator strategy
//! - [`fixtures`]: normalizing the odds feed and the early-exit pick scan
//! - [`api_sports`]: API-Sports client and the cached [`PicksService`]
//! - [`cache`]: TTL cache with single-flight fetches

pub mod api_sports;
pub mod cache;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod simulation;

pub use api_sports::{PicksReport, PicksService};
pub use config::{EngineConfig, MarketMatch, PriorityMarkets, RelaxPolicy, SimConfig};
pub use error::{ConfigError, SelectError, SimulationError, SourceError};
pub use fixtures::{select_picks, select_with_fallback, FixtureRecord, LiveSelection, SelectionReport};
pub use simulation::{run_simulation, run_simulation_sharded, SimulationReport, WinDistribution};
