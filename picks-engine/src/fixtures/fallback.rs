use super::selector::select_picks;
use super::types::{FixtureRecord, SelectionReport};
use crate::config::{PriorityMarkets, RelaxPolicy, SimConfig};
use crate::error::ConfigError;
use rand::Rng;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackOutcome {
    pub report: SelectionReport,
    /// Config that produced `report`
    pub config: SimConfig,
    pub relaxed: bool,
}

/// Runs `select` with `config`, and once more with `config.relaxed(relax)`
/// if the first pass came back short. Never more than two passes.
pub fn with_fallback<F, E>(
    config: &SimConfig,
    relax: &RelaxPolicy,
    mut select: F,
) -> Result<FallbackOutcome, E>
where
    F: FnMut(&SimConfig) -> Result<SelectionReport, E>,
{
    let strict = select(config)?;
    if strict.picks.len() >= config.pick_count as usize {
        return Ok(FallbackOutcome {
            report: strict,
            config: *config,
            relaxed: false,
        });
    }

    let relaxed_config = config.relaxed(relax);
    info!(
        "Only {}/{} picks found, retrying once with odds {:.2}-{:.2}, confidence >= {}, {} picks",
        strict.picks.len(),
        config.pick_count,
        relaxed_config.odds_min,
        relaxed_config.odds_max,
        relaxed_config.confidence_min,
        relaxed_config.pick_count
    );

    Ok(FallbackOutcome {
        report: select(&relaxed_config)?,
        config: relaxed_config,
        relaxed: true,
    })
}

/// [`select_picks`] with the one-shot relaxed retry.
pub fn select_with_fallback<R: Rng + ?Sized>(
    records: &[FixtureRecord],
    config: &SimConfig,
    relax: &RelaxPolicy,
    markets: Option<&PriorityMarkets>,
    rng: &mut R,
) -> Result<FallbackOutcome, ConfigError> {
    with_fallback(config, relax, |cfg| select_picks(records, cfg, markets, &mut *rng))
}
