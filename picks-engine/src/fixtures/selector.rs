use super::types::{FixtureRecord, LiveSelection, SelectionReport};
use crate::config::{PriorityMarkets, SimConfig};
use crate::error::ConfigError;
use rand::Rng;
use tracing::debug;

/// Greedy early-exit scan for the first `pick_count` in-range selections.
///
/// Order is record -> bookmaker -> market -> value, exactly as given, and the
/// scan stops the moment enough picks are collected. Bad records, bad nested
/// entries, filtered markets and unparsable odds are counted and skipped.
/// Only an invalid `config` is an error.
pub fn select_picks<R: Rng + ?Sized>(
    records: &[FixtureRecord],
    config: &SimConfig,
    markets: Option<&PriorityMarkets>,
    rng: &mut R,
) -> Result<SelectionReport, ConfigError> {
    config.validate()?;

    let wanted = config.pick_count as usize;
    let mut report = SelectionReport::default();

    for (i, record) in records.iter().enumerate() {
        let match_name = match record.match_name() {
            Some(name) => name,
            None => {
                debug!("Skipping record {}: missing team names", i);
                report.skipped.malformed_records += 1;
                continue;
            }
        };

        report.skipped.malformed_bookmakers += record.bookmakers.dropped();
        for bookmaker in &record.bookmakers {
            report.skipped.malformed_bets += bookmaker.bets.dropped();
            for bet in &bookmaker.bets {
                let market = bet.name.as_deref().unwrap_or_default();
                if let Some(priority) = markets {
                    if !priority.matches(market) {
                        report.skipped.filtered_markets += 1;
                        continue;
                    }
                }

                report.skipped.malformed_values += bet.values.dropped();
                for value in &bet.values {
                    let odd = match value.odd.parse() {
                        Some(odd) => odd,
                        None => {
                            debug!("Skipping unparsable odd {:?} in {} / {}", value.odd.0, match_name, market);
                            report.skipped.unparsable_odds += 1;
                            continue;
                        }
                    };

                    if odd < config.odds_min || odd > config.odds_max {
                        continue;
                    }

                    let confidence = rng.gen_range(config.confidence_min..=config.confidence_max);
                    report.picks.push(LiveSelection {
                        match_name: match_name.clone(),
                        market: market.to_string(),
                        selection: value.label(),
                        odds: odd,
                        confidence,
                    });
                    report.combined_odds *= odd;

                    if report.picks.len() == wanted {
                        return Ok(report);
                    }
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketMatch;
    use crate::fixtures::normalize::records_from_value;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::{json, Value};

    fn record(home: &str, away: &str, bets: Value) -> Value {
        json!({
            "teams": {"home": {"name": home}, "away": {"name": away}},
            "bookmakers": [{"id": 6, "name": "Bwin", "bets": bets}]
        })
    }

    fn config(pick_count: u32, odds_min: f64, odds_max: f64) -> SimConfig {
        SimConfig {
            pick_count,
            odds_min,
            odds_max,
            ..SimConfig::default()
        }
    }

    fn select(input: Value, config: &SimConfig, markets: Option<&PriorityMarkets>) -> SelectionReport {
        let records = records_from_value(&input).unwrap();
        select_picks(&records, config, markets, &mut ChaCha8Rng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let report = select(json!([]), &SimConfig::default(), None);
        assert!(report.picks.is_empty());
        assert_eq!(report.combined_odds, 1.0);
    }

    #[test]
    fn test_single_match_winner_pick() {
        let input = json!([record("A", "B", json!([
            {"name": "Match Winner", "values": [
                {"value": "Home", "odd": "1.50"},
                {"value": "Away", "odd": "2.10"}
            ]}
        ]))]);
        let cfg = config(1, 1.0, 2.0);
        let report = select(input, &cfg, None);

        assert_eq!(report.picks.len(), 1);
        let pick = &report.picks[0];
        assert_eq!(pick.match_name, "A vs B");
        assert_eq!(pick.market, "Match Winner");
        assert_eq!(pick.selection, "Home");
        assert_eq!(pick.odds, 1.50);
        assert!((cfg.confidence_min..=cfg.confidence_max).contains(&pick.confidence));
        assert!((report.combined_odds - 1.50).abs() < 1e-9);
    }

    #[test]
    fn test_stops_at_pick_count() {
        let input = json!([
            record("A", "B", json!([{"name": "Match Winner", "values": [
                {"value": "Home", "odd": "1.80"},
                {"value": "Draw", "odd": "1.90"}
            ]}])),
            record("C", "D", json!([{"name": "Match Winner", "values": [
                {"value": "Home", "odd": "1.75"}
            ]}]))
        ]);
        let report = select(input, &config(2, 1.7, 2.0), None);

        assert_eq!(report.picks.len(), 2);
        assert!(report.picks.iter().all(|p| p.match_name == "A vs B"));
        assert!((report.combined_odds - 1.80 * 1.90).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_in_range_record_is_ignored_after_cutoff() {
        let head = record("A", "B", json!([{"name": "Match Winner", "values": [
            {"value": "Home", "odd": "1.80"}
        ]}]));
        let tail = record("Late", "Entry", json!([{"name": "Match Winner", "values": [
            {"value": "Away", "odd": "1.85"}
        ]}]));

        let without_tail = select(json!([head.clone()]), &config(1, 1.7, 2.0), None);
        let with_tail = select(json!([head, tail]), &config(1, 1.7, 2.0), None);

        assert_eq!(with_tail.picks.len(), 1);
        assert_eq!(with_tail.picks, without_tail.picks);
        assert!(with_tail.picks.iter().all(|p| p.match_name != "Late vs Entry"));
    }

    #[test]
    fn test_unparsable_odd_is_skipped() {
        let input = json!([
            record("A", "B", json!([{"name": "Match Winner", "values": [
                {"value": "Home", "odd": "abc"},
                {"value": "Draw", "odd": "0"}
            ]}])),
            record("C", "D", json!([{"name": "Match Winner", "values": [
                {"value": "Away", "odd": "1.95"}
            ]}]))
        ]);
        let report = select(input, &config(1, 1.7, 2.0), None);

        assert_eq!(report.skipped.unparsable_odds, 2);
        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.picks[0].match_name, "C vs D");
        assert_eq!(report.picks[0].selection, "Away");
    }

    #[test]
    fn test_record_without_teams_is_skipped() {
        let input = json!([
            {"bookmakers": [{"bets": [{"name": "Match Winner", "values": [{"value": "Home", "odd": "1.8"}]}]}]},
            record("", "B", json!([{"name": "Match Winner", "values": [{"value": "Home", "odd": "1.8"}]}])),
            42,
            record("E", "F", json!([{"name": "Match Winner", "values": [{"value": "Home", "odd": "1.8"}]}]))
        ]);
        let report = select(input, &config(3, 1.7, 2.0), None);

        assert_eq!(report.skipped.malformed_records, 3);
        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.picks[0].match_name, "E vs F");
    }

    #[test]
    fn test_out_of_range_odds_are_not_picked() {
        let input = json!([record("A", "B", json!([{"name": "Match Winner", "values": [
            {"value": "Home", "odd": "1.20"},
            {"value": "Draw", "odd": "3.40"},
            {"value": "Away", "odd": "2.00"}
        ]}]))]);
        let report = select(input, &config(3, 1.7, 2.0), None);

        // inclusive upper bound
        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.picks[0].selection, "Away");
        assert!((report.combined_odds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_result_when_input_runs_out() {
        let input = json!([record("A", "B", json!([{"name": "Match Winner", "values": [
            {"value": "Home", "odd": "1.90"}
        ]}]))]);
        let report = select(input, &config(3, 1.7, 2.0), None);
        assert_eq!(report.picks.len(), 1);
        assert!((report.combined_odds - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_scan_order_bookmaker_then_market_then_value() {
        let input = json!([{
            "teams": {"home": {"name": "A"}, "away": {"name": "B"}},
            "bookmakers": [
                {"bets": [
                    {"name": "Match Winner", "values": [{"value": "Home", "odd": "1.71"}]},
                    {"name": "Over/Under", "values": [{"value": "Over 2.5", "odd": "1.72"}]}
                ]},
                {"bets": [
                    {"name": "Match Winner", "values": [{"value": "Away", "odd": "1.73"}]}
                ]}
            ]
        }]);
        let report = select(input, &config(3, 1.7, 2.0), None);
        let odds: Vec<f64> = report.picks.iter().map(|p| p.odds).collect();
        assert_eq!(odds, vec![1.71, 1.72, 1.73]);
    }

    #[test]
    fn test_priority_markets_substring() {
        let input = json!([record("A", "B", json!([
            {"name": "Double Chance", "values": [{"value": "Home/Draw", "odd": "1.80"}]},
            {"name": "Match Winner", "values": [{"value": "Home", "odd": "1.85"}]},
            {"name": "Goals Over/Under", "values": [{"value": "Over 1.5", "odd": "1.75"}]}
        ]))]);
        let markets = PriorityMarkets::new(["match winner", "over/under"], MarketMatch::Substring);
        let report = select(input, &config(3, 1.7, 2.0), Some(&markets));

        assert_eq!(report.skipped.filtered_markets, 1);
        let names: Vec<&str> = report.picks.iter().map(|p| p.market.as_str()).collect();
        assert_eq!(names, vec!["Match Winner", "Goals Over/Under"]);
    }

    #[test]
    fn test_priority_markets_exact() {
        let input = json!([record("A", "B", json!([
            {"name": "Match Winner", "values": [{"value": "Home", "odd": "1.85"}]},
            {"name": "Goals Over/Under", "values": [{"value": "Over 1.5", "odd": "1.75"}]}
        ]))]);
        let markets = PriorityMarkets::new(["Match Winner", "Over/Under"], MarketMatch::Exact);
        let report = select(input, &config(3, 1.7, 2.0), Some(&markets));

        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.picks[0].market, "Match Winner");
        assert_eq!(report.skipped.filtered_markets, 1);
    }

    #[test]
    fn test_confidence_is_drawn_in_range() {
        let values: Vec<Value> = (0..20)
            .map(|i| json!({"value": format!("Sel {}", i), "odd": "1.80"}))
            .collect();
        let input = json!([record("A", "B", json!([{"name": "Match Winner", "values": values}]))]);
        let cfg = SimConfig {
            pick_count: 20,
            confidence_min: 40,
            confidence_max: 45,
            ..SimConfig::default()
        };
        let report = select(input, &cfg, None);
        assert_eq!(report.picks.len(), 20);
        assert!(report.picks.iter().all(|p| (40..=45).contains(&p.confidence)));
    }

    #[test]
    fn test_bad_sibling_bet_keeps_valid_market() {
        let input = json!([record("A", "B", json!([
            {"name": "Match Winner", "values": [{"value": "Home", "odd": "1.80"}]},
            {"name": "Broken", "values": "oops"}
        ]))]);
        let report = select(input, &config(1, 1.7, 2.0), None);

        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.picks[0].selection, "Home");
        assert_eq!(report.skipped.malformed_records, 0);
        assert_eq!(report.skipped.malformed_bets, 1);
    }

    #[test]
    fn test_bad_sibling_value_keeps_valid_selection() {
        let input = json!([record("A", "B", json!([
            {"name": "Match Winner", "values": [
                "garbage",
                {"value": "Home", "odd": "1.80"}
            ]}
        ]))]);
        let report = select(input, &config(1, 1.7, 2.0), None);

        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.picks[0].match_name, "A vs B");
        assert_eq!(report.skipped.malformed_records, 0);
        assert_eq!(report.skipped.malformed_values, 1);
    }

    #[test]
    fn test_bad_bookmaker_is_counted() {
        let input = json!([{
            "teams": {"home": {"name": "A"}, "away": {"name": "B"}},
            "bookmakers": [
                7,
                {"bets": [{"name": "Match Winner", "values": [{"value": "Away", "odd": "1.90"}]}]}
            ]
        }]);
        let report = select(input, &config(1, 1.7, 2.0), None);
        assert_eq!(report.picks.len(), 1);
        assert_eq!(report.skipped.malformed_bookmakers, 1);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let records = records_from_value(&json!([record("A", "B", json!([
            {"name": "Match Winner", "values": [{"value": "Home", "odd": "1.80"}]}
        ]))]))
        .unwrap();
        let cfg = SimConfig {
            confidence_min: 99,
            confidence_max: 95,
            ..SimConfig::default()
        };
        let result = select_picks(&records, &cfg, None, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(matches!(result, Err(ConfigError::EmptyRange { field: "confidence", .. })));

        let cfg = SimConfig {
            pick_count: 0,
            ..SimConfig::default()
        };
        let result = select_picks(&records, &cfg, None, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(matches!(result, Err(ConfigError::NotPositive { field: "pick_count", .. })));
    }
}
