use crate::config::ApiConfig;
use crate::error::SourceError;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Upper bound on pages pulled for one date.
const MAX_PAGES: u64 = 5;

pub struct ApiSportsClient {
    client: Client,
    config: ApiConfig,
    last_request_time: Mutex<Option<Instant>>,
}

impl ApiSportsClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            config,
            last_request_time: Mutex::new(None),
        }
    }

    /// All odds records for `date`, merged across pages into one
    /// `{"response": [...]}` envelope.
    pub async fn fetch_odds(&self, date: NaiveDate) -> Result<Value, SourceError> {
        if self.config.api_key.is_empty() {
            error!("API_SPORTS_KEY not set");
            return Err(SourceError::MissingApiKey);
        }

        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let body = self.fetch_page(date, page).await?;
            let total_pages = body["paging"]["total"].as_u64().unwrap_or(1);
            if let Some(Value::Array(items)) = body.get("response") {
                records.extend(items.iter().cloned());
            }

            if page >= total_pages || page >= MAX_PAGES {
                if total_pages > MAX_PAGES {
                    warn!("Odds for {} span {} pages, only {} fetched", date, total_pages, MAX_PAGES);
                }
                break;
            }
            page += 1;
        }

        debug!("Fetched {} odds records for {}", records.len(), date);
        Ok(serde_json::json!({ "response": records }))
    }

    async fn fetch_page(&self, date: NaiveDate, page: u64) -> Result<Value, SourceError> {
        self.wait_for_rate_limit().await;

        let url = format!("{}/odds", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.host)
            .query(&odds_query(&self.config, date, page))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        parse_page(status, &text)
    }

    // At least `min_request_interval` between requests
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request_time.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            let interval = self.config.min_request_interval;
            if elapsed < interval {
                sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

fn odds_query(config: &ApiConfig, date: NaiveDate, page: u64) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("date", date.format("%Y-%m-%d").to_string()),
        ("timezone", config.timezone.clone()),
    ];
    if let Some(bookmaker) = config.bookmaker {
        params.push(("bookmaker", bookmaker.to_string()));
    }
    if page > 1 {
        params.push(("page", page.to_string()));
    }
    params
}

/// Status + body -> JSON page, or why the source is unusable.
fn parse_page(status: StatusCode, text: &str) -> Result<Value, SourceError> {
    if !status.is_success() {
        error!("API-Sports error: {} - Body: {}", status, text);
        return Err(SourceError::Unavailable(format!("HTTP {}", status)));
    }

    let body: Value = serde_json::from_str(text).map_err(|e| {
        error!("Failed to parse API-Sports response: {} - Body: {}", e, text);
        SourceError::Unavailable(format!("unreadable response: {}", e))
    })?;

    if let Some(reason) = api_errors(&body) {
        error!("API-Sports rejected the request: {}", reason);
        return Err(SourceError::Unavailable(reason));
    }

    Ok(body)
}

// API-Sports reports failures in an `errors` array or object with a 200 status
fn api_errors(body: &Value) -> Option<String> {
    match body.get("errors")? {
        Value::Array(items) if !items.is_empty() => Some(Value::Array(items.clone()).to_string()),
        Value::Object(map) if !map.is_empty() => Some(
            map.iter()
                .map(|(k, v)| format!("{}: {}", k, v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}
