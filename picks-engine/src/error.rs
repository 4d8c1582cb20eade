use thiserror::Error;

/// Rejected configuration. Checked once before any work starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {field} range is empty ({min} > {max})")]
    EmptyRange {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("invalid configuration: {field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: String },

    #[error("invalid configuration: confidence must be at most 100%, got {0}")]
    ConfidenceAbove100(u32),

    #[error("invalid configuration: {field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("invalid configuration: {field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },

    #[error("invalid configuration: {var}='{value}' could not be parsed")]
    BadEnv { var: &'static str, value: String },
}

/// Sharded simulation failures.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("simulation worker failed: {0}")]
    Worker(String),
}

/// Structurally unusable selector input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// External fixture source failures.
#[derive(Debug, Error, Clone)]
pub enum SourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("data source unavailable: API_SPORTS_KEY not set")]
    MissingApiKey,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Unavailable(e.to_string())
    }
}

impl From<SelectError> for SourceError {
    fn from(e: SelectError) -> Self {
        SourceError::Unavailable(e.to_string())
    }
}
