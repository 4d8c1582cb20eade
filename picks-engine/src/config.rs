use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Markets the live scan is restricted to unless overridden.
pub const DEFAULT_PRIORITY_MARKETS: [&str; 2] = ["Match Winner", "Over/Under"];

/// Smallest odds bound accepted. Simulated odds are rounded to 2 decimals and
/// must stay positive.
pub const MIN_ODDS: f64 = 0.01;

/// Parameters shared by the simulator and the live selector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub days_per_week: u32,
    pub simulation_count: u32,
    pub target_odds: f64,
    pub pick_count: u32,
    pub odds_min: f64,
    pub odds_max: f64,
    /// Percent, inclusive
    pub confidence_min: u32,
    /// Percent, inclusive
    pub confidence_max: u32,
}

impl Default for SimConfig {
    // "Safest combo": three low-odds, high-confidence picks a day
    fn default() -> Self {
        Self {
            days_per_week: 7,
            simulation_count: 10_000,
            target_odds: 5.0,
            pick_count: 3,
            odds_min: 1.7,
            odds_max: 2.0,
            confidence_min: 95,
            confidence_max: 99,
        }
    }
}

impl SimConfig {
    /// Rejects any configuration the simulator or selector cannot run with.
    /// Nothing is clamped or corrected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.days_per_week == 0 {
            return Err(not_positive("days_per_week", self.days_per_week));
        }
        if self.simulation_count == 0 {
            return Err(not_positive("simulation_count", self.simulation_count));
        }
        if self.pick_count == 0 {
            return Err(not_positive("pick_count", self.pick_count));
        }

        for (field, value) in [
            ("target_odds", self.target_odds),
            ("odds_min", self.odds_min),
            ("odds_max", self.odds_max),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
            if value <= 0.0 {
                return Err(not_positive(field, value));
            }
        }
        if self.odds_min < MIN_ODDS {
            return Err(ConfigError::BelowMinimum {
                field: "odds_min",
                value: self.odds_min,
                min: MIN_ODDS,
            });
        }
        if self.odds_min > self.odds_max {
            return Err(ConfigError::EmptyRange {
                field: "odds",
                min: self.odds_min.to_string(),
                max: self.odds_max.to_string(),
            });
        }

        if self.confidence_max > 100 {
            return Err(ConfigError::ConfidenceAbove100(self.confidence_max));
        }
        if self.confidence_min > self.confidence_max {
            return Err(ConfigError::EmptyRange {
                field: "confidence",
                min: self.confidence_min.to_string(),
                max: self.confidence_max.to_string(),
            });
        }

        Ok(())
    }

    /// Winning days needed for a week to count as a success: ceil(days * 5 / 7).
    pub fn success_threshold(&self) -> u32 {
        let threshold = (u64::from(self.days_per_week) * 5).div_ceil(7);
        u32::try_from(threshold).unwrap_or(u32::MAX)
    }

    /// Loosened copy used for the single fallback pass. Never narrower than `self`.
    pub fn relaxed(&self, policy: &RelaxPolicy) -> SimConfig {
        SimConfig {
            odds_min: self.odds_min.min(policy.odds_min),
            odds_max: self.odds_max.max(policy.odds_max),
            confidence_min: self.confidence_min.min(policy.confidence_min),
            pick_count: self
                .pick_count
                .saturating_sub(policy.pick_reduction)
                .max(1)
                .min(self.pick_count),
            ..*self
        }
    }

    /// Reads `PICKS_*` overrides on top of the defaults.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = SimConfig::default();
        let config = SimConfig {
            days_per_week: parse_var(lookup, "PICKS_DAYS_PER_WEEK", d.days_per_week)?,
            simulation_count: parse_var(lookup, "PICKS_SIMULATIONS", d.simulation_count)?,
            target_odds: parse_var(lookup, "PICKS_TARGET_ODDS", d.target_odds)?,
            pick_count: parse_var(lookup, "PICKS_PICK_COUNT", d.pick_count)?,
            odds_min: parse_var(lookup, "PICKS_ODDS_MIN", d.odds_min)?,
            odds_max: parse_var(lookup, "PICKS_ODDS_MAX", d.odds_max)?,
            confidence_min: parse_var(lookup, "PICKS_CONFIDENCE_MIN", d.confidence_min)?,
            confidence_max: parse_var(lookup, "PICKS_CONFIDENCE_MAX", d.confidence_max)?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// How far the fallback pass may loosen a [`SimConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelaxPolicy {
    pub odds_min: f64,
    pub odds_max: f64,
    pub confidence_min: u32,
    /// Picks dropped from `pick_count` (never below one)
    pub pick_reduction: u32,
}

impl Default for RelaxPolicy {
    fn default() -> Self {
        Self {
            odds_min: 1.3,
            odds_max: 3.0,
            confidence_min: 85,
            pick_reduction: 1,
        }
    }
}

/// Market-name comparison used by [`PriorityMarkets`]. Always case-insensitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketMatch {
    Exact,
    #[default]
    Substring,
}

impl FromStr for MarketMatch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MarketMatch::Exact),
            "substring" | "contains" => Ok(MarketMatch::Substring),
            _ => Err(ConfigError::BadEnv {
                var: "PICKS_MARKET_MATCH",
                value: s.to_string(),
            }),
        }
    }
}

/// Optional allow-list of market names for the live scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityMarkets {
    // stored lowercased
    names: Vec<String>,
    mode: MarketMatch,
}

impl PriorityMarkets {
    pub fn new<I, S>(names: I, mode: MarketMatch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
            mode,
        }
    }

    pub fn mode(&self) -> MarketMatch {
        self.mode
    }

    pub fn matches(&self, market_name: &str) -> bool {
        let name = market_name.trim().to_lowercase();
        self.names.iter().any(|wanted| match self.mode {
            MarketMatch::Exact => name == *wanted,
            MarketMatch::Substring => name.contains(wanted.as_str()),
        })
    }

    /// `PICKS_PRIORITY_MARKETS` unset gives the defaults, set-but-empty disables filtering.
    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let mode = match lookup("PICKS_MARKET_MATCH") {
            Some(v) => v.parse()?,
            None => MarketMatch::default(),
        };

        match lookup("PICKS_PRIORITY_MARKETS") {
            None => Ok(Some(PriorityMarkets::new(DEFAULT_PRIORITY_MARKETS, mode))),
            Some(list) => {
                let markets = PriorityMarkets::new(list.split(','), mode);
                if markets.names.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(markets))
                }
            }
        }
    }
}

/// API-Sports connection settings.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub host: String,
    pub timezone: String,
    pub bookmaker: Option<u32>,
    pub cache_ttl: Duration,
    /// Dates kept in the response cache at once
    pub cache_max_entries: usize,
    pub request_timeout: Duration,
    pub min_request_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://v3.football.api-sports.io".to_string(),
            host: "v3.football.api-sports.io".to_string(),
            timezone: "Europe/London".to_string(),
            bookmaker: Some(6),
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 32,
            request_timeout: Duration::from_secs(10),
            min_request_interval: Duration::from_secs(1),
        }
    }
}

impl ApiConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = ApiConfig::default();
        let bookmaker = match lookup("API_SPORTS_BOOKMAKER") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().parse().map_err(|_| ConfigError::BadEnv {
                var: "API_SPORTS_BOOKMAKER",
                value: v.clone(),
            })?),
            None => d.bookmaker,
        };
        let ttl_secs = parse_var(lookup, "PICKS_CACHE_TTL_SECS", d.cache_ttl.as_secs())?;
        let cache_max_entries = parse_var(lookup, "PICKS_CACHE_MAX_ENTRIES", d.cache_max_entries)?;
        if cache_max_entries == 0 {
            return Err(not_positive("cache_max_entries", cache_max_entries));
        }

        Ok(Self {
            api_key: lookup("API_SPORTS_KEY").unwrap_or_default(),
            base_url: lookup("API_SPORTS_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(d.base_url),
            host: lookup("API_SPORTS_HOST").unwrap_or(d.host),
            timezone: lookup("API_SPORTS_TIMEZONE").unwrap_or(d.timezone),
            bookmaker,
            cache_ttl: Duration::from_secs(ttl_secs),
            cache_max_entries,
            ..d
        })
    }
}

/// Everything the engine needs, loaded together.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub sim: SimConfig,
    pub markets: Option<PriorityMarkets>,
    pub relax: RelaxPolicy,
    pub api: ApiConfig,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            sim: SimConfig::from_lookup(lookup)?,
            markets: PriorityMarkets::from_lookup(lookup)?,
            relax: RelaxPolicy::default(),
            api: ApiConfig::from_lookup(lookup)?,
        })
    }
}

/// Parses `var` when set, otherwise falls back to `default`.
pub fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::BadEnv { var, value: raw }),
        None => Ok(default),
    }
}

fn not_positive(field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::NotPositive {
        field,
        value: value.to_string(),
    }
}
