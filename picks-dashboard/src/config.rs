use picks_engine::config::parse_var;
use picks_engine::{ConfigError, EngineConfig};
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub port: u16,
    /// Seed for the startup simulation; random when unset
    pub seed: u64,
    pub shards: u32,
    /// Audit CSV for the startup simulation, `None` when disabled
    pub log_path: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_shards = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);

        let shards = parse_var(lookup, "PICKS_SHARDS", default_shards)?;
        if shards == 0 {
            return Err(ConfigError::NotPositive {
                field: "shards",
                value: "0".to_string(),
            });
        }

        let log_path = match lookup("PICKS_LOG_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path.trim())),
            None => Some(PathBuf::from("daily_picks_log.csv")),
        };

        Ok(Self {
            port: parse_var(lookup, "PORT", 8080)?,
            seed: parse_var(lookup, "PICKS_SEED", rand::random())?,
            shards,
            log_path,
            engine: EngineConfig::from_lookup(lookup)?,
        })
    }
}
