//! Batch orchestrator.
//!
//! One run: pull reference events, enrich them with fair prices, scrape the
//! secondary book per event with bounded concurrency, match the gathered
//! games sequentially, analyze each matched pair, and write the report.
//! Scrapes run in parallel because they wait on the network; matching runs
//! sequentially so the one-match-per-event invariant needs no locking.
//!
//! Per-game scrape failures are isolated: they log and the run continues.
//! Only a failed reference-feed pull is fatal.

use crate::config::Config;
use crate::engine::analyzer::{analyze_pair, EvOpportunity};
use crate::engine::matcher::{EventMatcher, MatchRecord, MatcherConfig, UnmatchedReference, UnmatchedSecondary};
use crate::engine::normalizer::NameNormalizer;
use crate::engine::sports::SportClassifier;
use crate::feed::enrich::enrich_event;
use crate::feed::types::ReferenceEvent;
use crate::feed::ReferenceFeed;
use crate::scrape::{ScrapeRequest, SecondaryGame, SecondaryScraper};
use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How many unmatched samples the summary log prints.
const UNMATCHED_LOG_SAMPLE: usize = 10;

/// One matched game in the report: the match record plus its EV rows.
#[derive(Debug, Serialize)]
pub struct MatchedGameReport {
    #[serde(flatten)]
    pub record: MatchRecord,
    /// Secondary-side display names.
    pub betbck_home_team: String,
    pub betbck_away_team: String,
    pub ev_rows: Vec<EvOpportunity>,
}

/// The sink document written at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub matched_games: Vec<MatchedGameReport>,
    pub total_matches: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub unmatched_secondary_count: usize,
    pub unmatched_reference_count: usize,
    pub unmatched_secondary: Vec<UnmatchedSecondary>,
    pub unmatched_reference: Vec<UnmatchedReference>,
}

pub struct Pipeline {
    config: Config,
    feed: Arc<dyn ReferenceFeed>,
    scraper: Arc<dyn SecondaryScraper>,
    normalizer: NameNormalizer,
    classifier: SportClassifier,
}

impl Pipeline {
    pub fn new(
        config: Config,
        feed: Arc<dyn ReferenceFeed>,
        scraper: Arc<dyn SecondaryScraper>,
    ) -> Result<Self> {
        let normalizer = NameNormalizer::with_extra_aliases(&config.aliases);
        let classifier = SportClassifier::new(&config.sports)?;
        Ok(Self {
            config,
            feed,
            scraper,
            normalizer,
            classifier,
        })
    }

    /// Run one full batch. Returns the report that was written to the sink.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport> {
        let mut events = self
            .feed
            .fetch_events()
            .await
            .context("reference feed unavailable")?;
        for event in &mut events {
            enrich_event(event);
        }

        let games = self.gather_scrapes(&events, &cancel).await;

        let matcher_config = MatcherConfig {
            fuzzy_match_threshold: self.config.matching.fuzzy_match_threshold,
            min_component_match_score: self.config.matching.min_component_match_score,
            orientation_confidence_margin: self.config.matching.orientation_confidence_margin,
            time_window_secs: self.config.matching.time_window_seconds,
            minor_league_denylist: self.config.matching.minor_league_denylist.clone(),
        };
        let matcher = EventMatcher::new(&matcher_config, &self.normalizer, &self.classifier);
        let outcome = matcher.match_games(&events, games);

        let mut matched_games = Vec::new();
        for pair in outcome.pairs {
            let event = &events[pair.event_index];
            match analyze_pair(event, &pair.game, pair.record.orientation) {
                Ok(ev_rows) => {
                    matched_games.push(MatchedGameReport {
                        record: pair.record,
                        betbck_home_team: pair.game.home_team_raw.clone(),
                        betbck_away_team: pair.game.away_team_raw.clone(),
                        ev_rows,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        event_id = event.event_id.as_str(),
                        error = %e,
                        "pair skipped"
                    );
                }
            }
        }

        let report = RunReport {
            total_matches: matched_games.len(),
            matched_games,
            timestamp: chrono::Utc::now(),
            unmatched_secondary_count: outcome.unmatched_secondary.len(),
            unmatched_reference_count: outcome.unmatched_reference.len(),
            unmatched_secondary: outcome.unmatched_secondary,
            unmatched_reference: outcome.unmatched_reference,
        };

        self.log_summary(&report);
        self.write_report(&report)
            .with_context(|| format!("failed to write {}", self.config.pipeline.output_path))?;
        Ok(report)
    }

    /// Fan scrapes out over the reference events with bounded concurrency.
    /// Cancellation stops scrapes that have not started; in-flight ones
    /// drain to their timeouts. Failures and not-listed games drop out here.
    async fn gather_scrapes(
        &self,
        events: &[ReferenceEvent],
        cancel: &CancellationToken,
    ) -> Vec<SecondaryGame> {
        let scrape_timeout = Duration::from_secs(self.config.scraper.scrape_timeout_seconds);
        let concurrency = self.config.pipeline.concurrent_scrapes.max(1);

        let results: Vec<Option<SecondaryGame>> = stream::iter(events.iter().map(|event| {
            let request = ScrapeRequest {
                home: event.home_team.clone(),
                away: event.away_team.clone(),
                search_term: Some(
                    self.normalizer
                        .search_term(&event.home_team, &event.away_team),
                ),
                event_id: Some(event.event_id.clone()),
            };
            let scraper = Arc::clone(&self.scraper);
            let cancel = cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    return None;
                }
                match tokio::time::timeout(scrape_timeout, scraper.scrape(&request)).await {
                    Ok(Ok(game)) => game,
                    Ok(Err(e)) => {
                        tracing::warn!(
                            home = request.home.as_str(),
                            away = request.away.as_str(),
                            error = %e,
                            "scrape failed"
                        );
                        None
                    }
                    Err(_) => {
                        tracing::warn!(
                            home = request.home.as_str(),
                            away = request.away.as_str(),
                            "scrape timed out"
                        );
                        None
                    }
                }
            }
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

        let games: Vec<SecondaryGame> = results.into_iter().flatten().collect();
        tracing::info!(scraped = games.len(), of = events.len(), "scrapes gathered");
        games
    }

    fn log_summary(&self, report: &RunReport) {
        tracing::info!(
            matched = report.total_matches,
            unmatched_secondary = report.unmatched_secondary_count,
            unmatched_reference = report.unmatched_reference_count,
            "run summary"
        );
        for unmatched in report.unmatched_secondary.iter().take(UNMATCHED_LOG_SAMPLE) {
            tracing::info!(
                home = unmatched.home_team_raw.as_str(),
                away = unmatched.away_team_raw.as_str(),
                reason = unmatched.reason,
                "unmatched secondary"
            );
        }
        for unmatched in report.unmatched_reference.iter().take(UNMATCHED_LOG_SAMPLE) {
            tracing::info!(
                event_id = unmatched.event_id.as_str(),
                home = unmatched.home_team.as_str(),
                away = unmatched.away_team.as_str(),
                "unmatched reference"
            );
        }
    }

    fn write_report(&self, report: &RunReport) -> Result<()> {
        let path = Path::new(&self.config.pipeline.output_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_sink_shape() {
        let report = RunReport {
            matched_games: Vec::new(),
            total_matches: 0,
            timestamp: chrono::Utc::now(),
            unmatched_secondary_count: 0,
            unmatched_reference_count: 0,
            unmatched_secondary: Vec::new(),
            unmatched_reference: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("matched_games").is_some());
        assert_eq!(json["total_matches"], 0);
        assert!(json.get("timestamp").is_some());
    }
}
