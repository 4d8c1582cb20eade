pub mod pick_log;
pub mod simulator;
pub mod types;

pub use pick_log::{CsvPickLog, DaySink, NoopSink};
pub use simulator::{run_simulation, run_simulation_sharded, simulate_day, simulate_week};
pub use types::{DayResult, Pick, SimulationReport, WeekResult, WinDistribution};
