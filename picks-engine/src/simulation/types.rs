use crate::config::SimConfig;
use serde::{Deserialize, Serialize};

/// A single simulated pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub sport: String,
    pub confidence: u32,
    pub odds: f64,
    pub outcome: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub picks: Vec<Pick>,
    pub combined_odds: f64,
    pub is_win: bool,
}

impl DayResult {
    /// A day wins only when the accumulator reaches the target and every leg lands.
    pub fn from_picks(picks: Vec<Pick>, target_odds: f64) -> Self {
        let combined_odds: f64 = picks.iter().map(|p| p.odds).product();
        let all_won = picks.iter().all(|p| p.outcome);
        Self {
            is_win: combined_odds >= target_odds && all_won,
            combined_odds,
            picks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekResult {
    pub day_results: Vec<DayResult>,
    pub winning_days: u32,
}

impl WeekResult {
    pub fn from_days(day_results: Vec<DayResult>) -> Self {
        let winning_days = day_results.iter().filter(|d| d.is_win).count() as u32;
        Self {
            day_results,
            winning_days,
        }
    }
}

/// Weeks observed per number of winning days. Index = winning days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinDistribution {
    counts: Vec<u64>,
}

impl WinDistribution {
    pub fn new(days_per_week: u32) -> Self {
        Self {
            counts: vec![0; days_per_week as usize + 1],
        }
    }

    pub fn record(&mut self, winning_days: u32) {
        let idx = winning_days as usize;
        if idx >= self.counts.len() {
            self.counts.resize(idx + 1, 0);
        }
        self.counts[idx] += 1;
    }

    /// Element-wise sum. Independent of merge order.
    pub fn merge(&mut self, other: &WinDistribution) {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
    }

    pub fn count(&self, winning_days: u32) -> u64 {
        self.counts.get(winning_days as usize).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Weeks with at least `threshold` winning days.
    pub fn at_least(&self, threshold: u32) -> u64 {
        self.counts.iter().skip(threshold as usize).sum()
    }
}

/// Aggregate outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub simulation_count: u64,
    pub success_threshold: u32,
    pub successful_weeks: u64,
    /// Percent of weeks at or above `success_threshold`
    pub success_rate: f64,
    pub distribution: WinDistribution,
}

impl SimulationReport {
    pub fn from_distribution(config: &SimConfig, distribution: WinDistribution) -> Self {
        let success_threshold = config.success_threshold();
        let simulation_count = distribution.total();
        let successful_weeks = distribution.at_least(success_threshold);
        let success_rate = if simulation_count == 0 {
            0.0
        } else {
            successful_weeks as f64 / simulation_count as f64 * 100.0
        };

        Self {
            simulation_count,
            success_threshold,
            successful_weeks,
            success_rate,
            distribution,
        }
    }
}
