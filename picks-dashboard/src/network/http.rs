use crate::config::Config;
use crate::error::ApiError;
use crate::types::{DashboardStats, PicksParams, RunParams};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use picks_engine::{run_simulation_sharded, PicksReport, PicksService, SimulationReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub picks: PicksService,
    pub simulation: RwLock<SimulationReport>,
    pub stats: RwLock<DashboardStats>,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: Config, picks: PicksService, initial: SimulationReport) -> Self {
        Self {
            config,
            picks,
            simulation: RwLock::new(initial),
            stats: RwLock::new(DashboardStats {
                simulations_run: 1,
                ..DashboardStats::default()
            }),
            started: Instant::now(),
        }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/simulation", get(get_simulation))
        .route("/simulation/run", post(run_simulation))
        .route("/picks", get(get_picks))
        .route("/stats", get(get_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Last simulation report
pub async fn get_simulation(State(state): State<SharedState>) -> Json<SimulationReport> {
    Json(state.simulation.read().await.clone())
}

/// Fresh sharded run; replaces the stored report
pub async fn run_simulation(
    State(state): State<SharedState>,
    Query(params): Query<RunParams>,
) -> Result<Json<SimulationReport>, ApiError> {
    let seed = params.seed.unwrap_or_else(rand::random);
    let shards = requested_shards(params.shards, state.config.shards);
    info!("🎲 Simulation requested (seed {}, {} shards)", seed, shards);

    let report = run_simulation_sharded(&state.config.engine.sim, seed, shards).await?;

    *state.simulation.write().await = report.clone();
    state.stats.write().await.simulations_run += 1;
    Ok(Json(report))
}

/// Requested shard count, never above the configured one.
fn requested_shards(requested: Option<u32>, limit: u32) -> u32 {
    requested.unwrap_or(limit).clamp(1, limit.max(1))
}

pub async fn get_picks(
    State(state): State<SharedState>,
    Query(params): Query<PicksParams>,
) -> Result<Json<PicksReport>, ApiError> {
    state.stats.write().await.picks_requests += 1;

    let mut rng = StdRng::from_entropy();
    let report = match params.date {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ApiError::BadDate(raw))?;
            state.picks.picks_for_date(date, &mut rng).await?
        }
        None => state.picks.todays_picks(&mut rng).await?,
    };
    Ok(Json(report))
}

/// Stats endpoint
pub async fn get_stats(State(state): State<SharedState>) -> Json<DashboardStats> {
    let mut stats = state.stats.read().await.clone();
    stats.uptime_seconds = state.started.elapsed().as_secs();
    stats.cache_entries = state.picks.cached_entries();
    Json(stats)
}
