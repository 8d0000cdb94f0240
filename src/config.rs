use crate::engine::matcher::default_minor_league_denylist;
use crate::engine::sports::SportKeywords;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Extra alias classes merged over the built-in table:
    /// canonical name -> list of aliases.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Extra sport keywords merged over the built-in sets.
    #[serde(default)]
    pub sports: SportKeywords,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    #[serde(default = "default_feed_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_feed_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_search_timeout")]
    pub search_timeout_seconds: u64,
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 { 10 }
fn default_search_timeout() -> u64 { 15 }
fn default_scrape_timeout() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub fuzzy_match_threshold: u8,
    pub min_component_match_score: u8,
    pub orientation_confidence_margin: u8,
    pub time_window_seconds: i64,
    pub minor_league_denylist: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 65,
            min_component_match_score: 60,
            orientation_confidence_margin: 10,
            time_window_seconds: 86_400,
            minor_league_denylist: default_minor_league_denylist(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub concurrent_scrapes: usize,
    pub output_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrent_scrapes: 4,
            output_path: "data/matched_games.json".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }
}
