//! Monte Carlo simulation of the daily accumulator strategy.
//!
//! Each trial is one week: `days_per_week` days of `pick_count` random picks.
//! The RNG is always injected so runs can be pinned with a seed.

use super::pick_log::DaySink;
use super::types::{DayResult, Pick, SimulationReport, WeekResult, WinDistribution};
use crate::config::SimConfig;
use crate::error::{ConfigError, SimulationError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Label attached to simulated picks.
pub const SIMULATED_SPORT: &str = "Football";

/// Draw one pick: integer confidence, 2-decimal odds, Bernoulli(confidence) outcome.
pub fn draw_pick<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Pick {
    let confidence = rng.gen_range(config.confidence_min..=config.confidence_max);
    let odds = round2(rng.gen_range(config.odds_min..=config.odds_max));
    let outcome = rng.gen_bool(f64::from(confidence) / 100.0);

    Pick {
        sport: SIMULATED_SPORT.to_string(),
        confidence,
        odds,
        outcome,
    }
}

pub fn simulate_day<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> DayResult {
    let picks = (0..config.pick_count)
        .map(|_| draw_pick(config, rng))
        .collect();
    DayResult::from_picks(picks, config.target_odds)
}

pub fn simulate_week<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> WeekResult {
    let days = (0..config.days_per_week)
        .map(|_| simulate_day(config, rng))
        .collect();
    WeekResult::from_days(days)
}

/// Runs `config.simulation_count` weeks on `rng`.
///
/// The first week's days are passed to `sink` after they are fully drawn,
/// so attaching a sink never changes the random stream.
pub fn run_simulation<R: Rng + ?Sized>(
    config: &SimConfig,
    rng: &mut R,
    sink: &mut dyn DaySink,
) -> Result<SimulationReport, ConfigError> {
    config.validate()?;
    info!(
        "Running {} simulated weeks ({} days x {} picks, target {:.2})",
        config.simulation_count, config.days_per_week, config.pick_count, config.target_odds
    );

    let mut distribution = WinDistribution::new(config.days_per_week);
    for trial in 0..config.simulation_count {
        let week = simulate_week(config, rng);
        if trial == 0 {
            for (i, day) in week.day_results.iter().enumerate() {
                sink.record_day(i as u32 + 1, day);
            }
            sink.finish();
        }
        distribution.record(week.winning_days);
    }

    let report = SimulationReport::from_distribution(config, distribution);
    info!(
        "Simulation done: {}/{} weeks had {}+ winning days ({:.2}%)",
        report.successful_weeks,
        report.simulation_count,
        report.success_threshold,
        report.success_rate
    );
    Ok(report)
}

/// Seeded run split over `shards` blocking workers.
///
/// Shard `i` draws from `ChaCha8Rng::seed_from_u64(seed + i)`; the per-shard
/// distributions are summed, so the result depends only on seed, config and
/// shard count.
pub async fn run_simulation_sharded(
    config: &SimConfig,
    seed: u64,
    shards: u32,
) -> Result<SimulationReport, SimulationError> {
    config.validate()?;
    let shards = shards.clamp(1, config.simulation_count);
    let base = config.simulation_count / shards;
    let remainder = config.simulation_count % shards;

    let mut handles = Vec::with_capacity(shards as usize);
    for shard in 0..shards {
        let trials = base + u32::from(shard < remainder);
        let shard_config = *config;
        let shard_seed = seed.wrapping_add(u64::from(shard));
        handles.push(tokio::task::spawn_blocking(move || {
            let mut rng = ChaCha8Rng::seed_from_u64(shard_seed);
            let mut distribution = WinDistribution::new(shard_config.days_per_week);
            for _ in 0..trials {
                distribution.record(simulate_week(&shard_config, &mut rng).winning_days);
            }
            debug!("Shard {} finished {} weeks", shard, trials);
            distribution
        }));
    }

    let mut distribution = WinDistribution::new(config.days_per_week);
    for handle in handles {
        let part = handle
            .await
            .map_err(|e| SimulationError::Worker(e.to_string()))?;
        distribution.merge(&part);
    }

    let report = SimulationReport::from_distribution(config, distribution);
    info!(
        "Sharded simulation ({} shards, seed {}): {:.2}% success",
        shards, seed, report.success_rate
    );
    Ok(report)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
