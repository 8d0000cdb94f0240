//! Secondary-book scraper contract.
//!
//! The scraping itself (session, search POST, HTML parsing) lives in an
//! external collaborator; the core only sees the structured per-game record
//! defined here. Odds arrive as the book prints them — American odds as
//! `"-110"` strings or integers, lines as raw text including split forms —
//! and are normalized downstream.

pub mod http;

use crate::engine::odds;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// What the orchestrator hands the scraper for one reference event.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRequest {
    pub home: String,
    pub away: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Scraper collaborator. `Ok(None)` means the book does not list the game;
/// `Err` is a transport or parse failure. Both are isolated per event.
#[async_trait]
pub trait SecondaryScraper: Send + Sync {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Option<SecondaryGame>>;
}

/// One game as listed on the secondary book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecondaryGame {
    #[serde(default)]
    pub betbck_game_id: Option<String>,
    pub home_team_raw: String,
    pub away_team_raw: String,
    #[serde(default)]
    pub event_datetime: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub full_game: MarketPrices,
    #[serde(default)]
    pub first_half: Option<MarketPrices>,
    /// Diagnostics: the names exactly as the book displayed them.
    #[serde(default)]
    pub betbck_displayed_local: Option<String>,
    #[serde(default)]
    pub betbck_displayed_visitor: Option<String>,
}

impl SecondaryGame {
    /// Stable id for the uniqueness invariant: the book's id when present,
    /// else synthesized from the raw names.
    pub fn game_id(&self) -> String {
        match &self.betbck_game_id {
            Some(id) => id.clone(),
            None => format!("{}::{}", self.home_team_raw, self.away_team_raw),
        }
    }
}

/// Posted prices for one period of one game.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketPrices {
    #[serde(default, deserialize_with = "deserialize_american")]
    pub home_moneyline_american: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_american")]
    pub away_moneyline_american: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_american")]
    pub draw_moneyline_american: Option<i32>,
    #[serde(default)]
    pub home_spreads: Vec<SpreadOption>,
    #[serde(default)]
    pub away_spreads: Vec<SpreadOption>,
    /// Per-side total options, when the book lists them individually.
    #[serde(default)]
    pub totals: Vec<TotalOption>,
    /// Aggregate game total, when the book lists a single line.
    #[serde(default)]
    pub game_total_line: Option<String>,
    #[serde(default, deserialize_with = "deserialize_american")]
    pub game_total_over_odds: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_american")]
    pub game_total_under_odds: Option<i32>,
}

impl MarketPrices {
    /// The same prices with home and away exchanged, for flipped-orientation
    /// matches. Totals are side-independent and stay put.
    pub fn swapped(&self) -> MarketPrices {
        MarketPrices {
            home_moneyline_american: self.away_moneyline_american,
            away_moneyline_american: self.home_moneyline_american,
            draw_moneyline_american: self.draw_moneyline_american,
            home_spreads: self.away_spreads.clone(),
            away_spreads: self.home_spreads.clone(),
            totals: self.totals.clone(),
            game_total_line: self.game_total_line.clone(),
            game_total_over_odds: self.game_total_over_odds,
            game_total_under_odds: self.game_total_under_odds,
        }
    }
}

/// One handicap option: raw line text plus its price.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadOption {
    pub line: String,
    #[serde(default, deserialize_with = "deserialize_american")]
    pub odds: Option<i32>,
}

/// One total option with its side.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalOption {
    pub line: String,
    #[serde(default, deserialize_with = "deserialize_american")]
    pub odds: Option<i32>,
    pub side: OverUnder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OverUnder {
    #[serde(alias = "o", alias = "over")]
    Over,
    #[serde(alias = "u", alias = "under")]
    Under,
}

/// American odds arrive as integers or book-formatted strings ("-110",
/// "+170", "EVEN"). Unparseable or sub-three-digit values are absent, not
/// errors.
fn deserialize_american<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 => {
            Some(n as i32).filter(|v| v.abs() >= 100)
        }
        Some(Raw::Number(_)) => None,
        Some(Raw::Text(s)) => odds::parse_american(&s),
        None => None,
    })
}
