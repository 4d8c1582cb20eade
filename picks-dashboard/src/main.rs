mod config;
mod error;
mod network;
mod types;

use config::Config;
use network::{router, AppState, SharedState};
use picks_engine::simulation::{CsvPickLog, DaySink, NoopSink};
use picks_engine::{run_simulation, PicksService, SimConfig, SimulationReport};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    dotenvy::dotenv().ok();

    info!("🚀 Starting picks-dashboard...");

    let config = Config::from_env()?;

    let report = startup_simulation(config.engine.sim, config.seed, config.log_path.clone()).await?;
    info!(
        "✅ Startup simulation: {}/{} weeks reached {} winning days ({:.2}%)",
        report.successful_weeks,
        report.simulation_count,
        report.success_threshold,
        report.success_rate
    );

    let picks = PicksService::new(config.engine.clone())?;
    if config.engine.api.api_key.is_empty() {
        warn!("API_SPORTS_KEY not set, /picks will answer 503");
    }

    let port = config.port;
    let state: SharedState = Arc::new(AppState::new(config, picks, report));
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("🌐 HTTP server starting on {}", addr);
    info!("✅ picks-dashboard ready!");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Single-threaded seeded run so the audit log covers the first simulated week.
async fn startup_simulation(
    sim: SimConfig,
    seed: u64,
    log_path: Option<PathBuf>,
) -> Result<SimulationReport, Box<dyn std::error::Error>> {
    let report = tokio::task::spawn_blocking(move || {
        let mut sink: Box<dyn DaySink + Send> = match log_path {
            Some(path) => match CsvPickLog::create(&path) {
                Ok(log) => Box::new(log),
                Err(e) => {
                    warn!("Cannot open pick log {:?}: {}", path, e);
                    Box::new(NoopSink)
                }
            },
            None => Box::new(NoopSink),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        run_simulation(&sim, &mut rng, sink.as_mut())
    })
    .await??;
    Ok(report)
}
