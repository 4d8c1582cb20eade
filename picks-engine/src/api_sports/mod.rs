pub mod client;

use crate::api_sports::client::ApiSportsClient;
use crate::cache::TtlCache;
use crate::config::{EngineConfig, SimConfig};
use crate::error::{ConfigError, SourceError};
use crate::fixtures::{records_from_value, select_with_fallback, LiveSelection, SkipCounts};
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Today's picks plus what it took to find them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicksReport {
    pub date: NaiveDate,
    pub picks: Vec<LiveSelection>,
    pub combined_odds: f64,
    pub target_odds: f64,
    pub target_reached: bool,
    /// Picks came from the relaxed second pass
    pub relaxed: bool,
    pub skipped: SkipCounts,
}

/// Fetch (cached) -> normalize -> select with fallback.
pub struct PicksService {
    client: Arc<ApiSportsClient>,
    cache: TtlCache<Arc<Value>, SourceError>,
    config: EngineConfig,
}

impl PicksService {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.sim.validate()?;
        config.sim.relaxed(&config.relax).validate()?;
        let client = Arc::new(ApiSportsClient::new(config.api.clone()));
        Ok(Self {
            client,
            cache: TtlCache::with_capacity(config.api.cache_ttl, config.api.cache_max_entries),
            config,
        })
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.config.sim
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// [`Self::picks_for_date`] for the local date.
    pub async fn todays_picks<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PicksReport, SourceError> {
        self.picks_for_date(chrono::Local::now().date_naive(), rng).await
    }

    pub async fn picks_for_date<R: Rng + ?Sized>(
        &self,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<PicksReport, SourceError> {
        let client = self.client.clone();
        self.picks_from_source(date, rng, move || async move { client.fetch_odds(date).await })
            .await
    }

    /// Same pipeline over any odds source; the response is cached per date.
    pub async fn picks_from_source<R, F, Fut>(
        &self,
        date: NaiveDate,
        rng: &mut R,
        fetch: F,
    ) -> Result<PicksReport, SourceError>
    where
        R: Rng + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, SourceError>> + Send + 'static,
    {
        let key = date.format("%Y-%m-%d").to_string();
        let body = self
            .cache
            .get_or_fetch(&key, move || {
                let pending = fetch();
                async move { pending.await.map(Arc::new) }
            })
            .await?;

        let records = records_from_value(&body)?;
        let outcome = select_with_fallback(
            &records,
            &self.config.sim,
            &self.config.relax,
            self.config.markets.as_ref(),
            rng,
        )?;

        let report = outcome.report;
        let target_odds = self.config.sim.target_odds;
        let target_reached = !report.picks.is_empty() && report.combined_odds >= target_odds;

        if report.picks.is_empty() {
            warn!("No suitable selections for {} in the target odds range", date);
        } else {
            info!(
                "{} picks for {} from {} fixtures, combined odds {:.2} (target {:.2}{})",
                report.picks.len(),
                date,
                records.len(),
                report.combined_odds,
                target_odds,
                if outcome.relaxed { ", relaxed" } else { "" }
            );
        }
        if report.skipped != SkipCounts::default() {
            info!(
                "Skipped {} malformed records, {} bookmakers, {} bets, {} values, {} unparsable odds, {} filtered markets",
                report.skipped.malformed_records,
                report.skipped.malformed_bookmakers,
                report.skipped.malformed_bets,
                report.skipped.malformed_values,
                report.skipped.unparsable_odds,
                report.skipped.filtered_markets
            );
        }

        Ok(PicksReport {
            date,
            combined_odds: report.combined_odds,
            target_odds,
            target_reached,
            relaxed: outcome.relaxed,
            skipped: report.skipped,
            picks: report.picks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, RelaxPolicy};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> PicksService {
        PicksService::new(EngineConfig {
            sim: SimConfig::default(),
            markets: None,
            relax: RelaxPolicy::default(),
            api: ApiConfig::default(),
        })
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 17).unwrap()
    }

    fn odds_body() -> Value {
        json!({"response": [
            {"teams": {"home": {"name": "A"}, "away": {"name": "B"}},
             "bookmakers": [{"bets": [{"name": "Match Winner", "values": [
                {"value": "Home", "odd": "1.80"},
                {"value": "Draw", "odd": "1.90"},
                {"value": "Away", "odd": "1.95"}
             ]}]}]}
        ]})
    }

    #[tokio::test]
    async fn test_picks_from_source_reaches_target() {
        let service = service();
        let report = service
            .picks_from_source(date(), &mut ChaCha8Rng::seed_from_u64(1), || async {
                Ok(odds_body())
            })
            .await
            .unwrap();

        assert_eq!(report.picks.len(), 3);
        assert!((report.combined_odds - 1.80 * 1.90 * 1.95).abs() < 1e-9);
        assert!(report.target_reached);
        assert!(!report.relaxed);
        assert_eq!(report.date, date());
    }

    #[tokio::test]
    async fn test_empty_feed_is_not_an_error() {
        let service = service();
        let report = service
            .picks_from_source(date(), &mut ChaCha8Rng::seed_from_u64(1), || async {
                Ok(json!({"response": []}))
            })
            .await
            .unwrap();

        assert!(report.picks.is_empty());
        assert_eq!(report.combined_odds, 1.0);
        assert!(!report.target_reached);
        assert!(report.relaxed);
    }

    #[tokio::test]
    async fn test_source_failure_is_reported() {
        let service = service();
        let result = service
            .picks_from_source(date(), &mut ChaCha8Rng::seed_from_u64(1), || async {
                Err(SourceError::Unavailable("timeout".to_string()))
            })
            .await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
        assert_eq!(service.cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_is_reported() {
        let service = service();
        let result = service
            .picks_from_source(date(), &mut ChaCha8Rng::seed_from_u64(1), || async { Ok(json!(5)) })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_response_is_cached_per_date() {
        let service = service();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            service
                .picks_from_source(date(), &mut ChaCha8Rng::seed_from_u64(1), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(odds_body())
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let service = service();
        let result = service
            .picks_for_date(date(), &mut ChaCha8Rng::seed_from_u64(1))
            .await;
        assert!(matches!(result, Err(SourceError::MissingApiKey)));
    }

    #[test]
    fn test_new_rejects_invalid_relax_policy() {
        let config = EngineConfig {
            sim: SimConfig::default(),
            markets: None,
            relax: RelaxPolicy {
                odds_min: -1.0,
                ..RelaxPolicy::default()
            },
            api: ApiConfig::default(),
        };
        assert!(PicksService::new(config).is_err());
    }

    #[tokio::test]
    async fn test_todays_picks_without_key_is_unavailable() {
        let service = service();
        let result = service.todays_picks(&mut ChaCha8Rng::seed_from_u64(1)).await;
        assert!(matches!(result, Err(SourceError::MissingApiKey)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig {
            sim: SimConfig {
                pick_count: 0,
                ..SimConfig::default()
            },
            markets: None,
            relax: RelaxPolicy::default(),
            api: ApiConfig::default(),
        };
        assert!(PicksService::new(config).is_err());
    }
}
