use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::Deref;
use tracing::debug;

/// One fixture from the odds feed, as loosely as the feed sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: Teams,
    #[serde(default)]
    pub bookmakers: LenientVec<Bookmaker>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Teams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub home: Team,
    #[serde(default, deserialize_with = "null_as_default")]
    pub away: Team,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookmaker {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bets: LenientVec<Bet>,
}

/// A market offered on the fixture, e.g. "Match Winner".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bet {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: LenientVec<BetValue>,
}

/// A selection within a market, e.g. "Home" @ "1.50".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetValue {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub odd: OddValue,
}

impl BetValue {
    pub fn label(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Raw odd as sent by the feed (usually a string such as "1.85").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OddValue(pub Value);

impl OddValue {
    /// Decimal odd, or `None` if it does not parse to a finite positive number.
    pub fn parse(&self) -> Option<f64> {
        let odd = match &self.0 {
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        (odd.is_finite() && odd > 0.0).then_some(odd)
    }
}

impl From<&str> for OddValue {
    fn from(s: &str) -> Self {
        OddValue(Value::String(s.to_string()))
    }
}

impl FixtureRecord {
    /// "Home vs Away", or `None` if either side has no usable name.
    pub fn match_name(&self) -> Option<String> {
        let home = non_empty(&self.teams.home.name)?;
        let away = non_empty(&self.teams.away.name)?;
        Some(format!("{} vs {}", home, away))
    }
}

fn non_empty(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

/// Feed array that keeps every element that deserializes and counts the
/// rest, so one bad entry never takes its siblings down with it.
///
/// `null` reads as empty. Anything other than an array or `null` is an error
/// for the enclosing item.
#[derive(Debug, Clone, PartialEq)]
pub struct LenientVec<T> {
    items: Vec<T>,
    dropped: usize,
}

impl<T> LenientVec<T> {
    /// Elements that failed to deserialize and were left out.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<T> Default for LenientVec<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            dropped: 0,
        }
    }
}

impl<T> From<Vec<T>> for LenientVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items, dropped: 0 }
    }
}

impl<T> Deref for LenientVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a LenientVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for LenientVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for LenientVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
        let mut out = LenientVec::default();
        for (i, item) in raw.into_iter().enumerate() {
            match T::deserialize(item) {
                Ok(value) => out.items.push(value),
                Err(e) => {
                    debug!("Dropping malformed entry {}: {}", i, e);
                    out.dropped += 1;
                }
            }
        }
        Ok(out)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A live pick. `confidence` is a synthetic display value, not a model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSelection {
    #[serde(rename = "match")]
    pub match_name: String,
    pub market: String,
    pub selection: String,
    pub odds: f64,
    pub confidence: u32,
}

impl LiveSelection {
    /// "Match Winner - Home"
    pub fn label(&self) -> String {
        format!("{} - {}", self.market, self.selection)
    }
}

/// Items the scan passed over, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub malformed_records: usize,
    pub malformed_bookmakers: usize,
    pub malformed_bets: usize,
    pub malformed_values: usize,
    pub unparsable_odds: usize,
    pub filtered_markets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub picks: Vec<LiveSelection>,
    pub combined_odds: f64,
    pub skipped: SkipCounts,
}

impl Default for SelectionReport {
    fn default() -> Self {
        Self {
            picks: Vec::new(),
            combined_odds: 1.0,
            skipped: SkipCounts::default(),
        }
    }
}
