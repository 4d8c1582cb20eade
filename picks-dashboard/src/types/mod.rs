use serde::{Deserialize, Serialize};

/// Stats for monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardStats {
    pub uptime_seconds: u64,
    pub simulations_run: u64,
    pub picks_requests: u64,
    pub cache_entries: usize,
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub seed: Option<u64>,
    pub shards: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PicksParams {
    /// YYYY-MM-DD, today when absent
    pub date: Option<String>,
}

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
