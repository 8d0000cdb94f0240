//! Reference-feed data model.
//!
//! The feed's JSON keys its periods as integers, `"0"`, or `"num_0"`
//! depending on which backend produced the payload; all three forms are
//! accepted here and normalized to integer period indices. Everything past
//! this boundary works with typed values only.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Full game.
pub const PERIOD_FULL_GAME: u8 = 0;
/// First-half equivalent: soccer/basketball 1H, baseball 1st 5 innings,
/// hockey 1st period.
pub const PERIOD_FIRST_HALF: u8 = 1;

/// A fair (no-vig) price in both forms the analyzer needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairPrice {
    pub decimal: f64,
    pub american: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceEvent {
    pub event_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub event_datetime: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default, deserialize_with = "deserialize_periods")]
    pub periods: BTreeMap<u8, PeriodMarkets>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodMarkets {
    #[serde(default)]
    pub money_line: Option<MoneylineMarket>,
    #[serde(default)]
    pub spreads: BTreeMap<String, SpreadMarket>,
    #[serde(default)]
    pub totals: BTreeMap<String, TotalMarket>,
    #[serde(default)]
    pub meta: Option<PeriodMeta>,
}

/// Per-period stake limits, used as fallbacks when a market carries none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodMeta {
    #[serde(default)]
    pub max_money_line: Option<f64>,
    #[serde(default)]
    pub max_spread: Option<f64>,
    #[serde(default)]
    pub max_total: Option<f64>,
}

/// Moneyline prices in decimal form; `draw` present only for 3-way markets.
/// `nvp_*` slots are filled by the enrichment pass, never deserialized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoneylineMarket {
    #[serde(default)]
    pub home: Option<f64>,
    #[serde(default)]
    pub draw: Option<f64>,
    #[serde(default)]
    pub away: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(skip)]
    pub nvp_home: Option<FairPrice>,
    #[serde(skip)]
    pub nvp_draw: Option<FairPrice>,
    #[serde(skip)]
    pub nvp_away: Option<FairPrice>,
}

/// One handicap line; `hdp` is from the home team's perspective.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadMarket {
    pub hdp: f64,
    #[serde(default)]
    pub home: Option<f64>,
    #[serde(default)]
    pub away: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(skip)]
    pub nvp_home: Option<FairPrice>,
    #[serde(skip)]
    pub nvp_away: Option<FairPrice>,
}

/// One total line. `points` stays raw text ("5.5", "2.5,3") until the
/// analyzer normalizes it with the total-line rules.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalMarket {
    #[serde(deserialize_with = "deserialize_points")]
    pub points: String,
    #[serde(default)]
    pub over: Option<f64>,
    #[serde(default)]
    pub under: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(skip)]
    pub nvp_over: Option<FairPrice>,
    #[serde(skip)]
    pub nvp_under: Option<FairPrice>,
}

/// Accept `0`, `"0"`, and `"num_0"` period keys.
fn deserialize_periods<'de, D>(deserializer: D) -> Result<BTreeMap<u8, PeriodMarkets>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, PeriodMarkets> = BTreeMap::deserialize(deserializer)?;
    let mut periods = BTreeMap::new();
    for (key, markets) in raw {
        let digits = key.strip_prefix("num_").unwrap_or(&key);
        let index: u8 = digits
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("bad period key {:?}", key)))?;
        periods.insert(index, markets);
    }
    Ok(periods)
}

/// Accept total points as a JSON number or string.
fn deserialize_points<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_event() -> &'static str {
        r#"{
            "event_id": "1611309203",
            "home_team": "Juventus",
            "away_team": "Internazionale",
            "event_datetime": "2026-08-01T18:00:00Z",
            "league": "Serie A",
            "periods": {
                "num_0": {
                    "money_line": { "home": 2.4, "draw": 3.3, "away": 3.1, "max": 2000.0 },
                    "spreads": {
                        "-0.25": { "hdp": -0.25, "home": 1.95, "away": 1.89 }
                    },
                    "totals": {
                        "2.5": { "points": 2.5, "over": 1.87, "under": 1.95, "max": 1000.0 }
                    },
                    "meta": { "max_money_line": 2000.0 }
                },
                "1": {
                    "money_line": { "home": 2.9, "draw": 2.1, "away": 4.4 }
                }
            }
        }"#
    }

    #[test]
    fn test_mixed_period_keys_normalize() {
        let event: ReferenceEvent = serde_json::from_str(fixture_event()).unwrap();
        assert!(event.periods.contains_key(&PERIOD_FULL_GAME));
        assert!(event.periods.contains_key(&PERIOD_FIRST_HALF));
        assert_eq!(event.periods.len(), 2);
    }

    #[test]
    fn test_market_fields() {
        let event: ReferenceEvent = serde_json::from_str(fixture_event()).unwrap();
        let full = &event.periods[&PERIOD_FULL_GAME];
        let ml = full.money_line.as_ref().unwrap();
        assert_eq!(ml.home, Some(2.4));
        assert_eq!(ml.draw, Some(3.3));
        assert!(ml.nvp_home.is_none()); // enrichment has not run

        let spread = &full.spreads["-0.25"];
        assert!((spread.hdp - (-0.25)).abs() < f64::EPSILON);

        let total = &full.totals["2.5"];
        assert_eq!(total.points, "2.5");
        assert_eq!(total.over, Some(1.87));
    }

    #[test]
    fn test_points_accepts_string() {
        let json = r#"{ "points": "2.5,3", "over": 1.9, "under": 1.9 }"#;
        let total: TotalMarket = serde_json::from_str(json).unwrap();
        assert_eq!(total.points, "2.5,3");
    }

    #[test]
    fn test_bad_period_key_rejected() {
        let json = r#"{
            "event_id": "1",
            "home_team": "A",
            "away_team": "B",
            "periods": { "first": {} }
        }"#;
        assert!(serde_json::from_str::<ReferenceEvent>(json).is_err());
    }

    #[test]
    fn test_minimal_event() {
        let json = r#"{ "event_id": "1", "home_team": "A", "away_team": "B" }"#;
        let event: ReferenceEvent = serde_json::from_str(json).unwrap();
        assert!(event.periods.is_empty());
        assert!(event.event_datetime.is_none());
    }
}
