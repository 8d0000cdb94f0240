//! Event matching: pair each secondary-book game with at most one reference
//! event.
//!
//! Candidates are restricted to the same sport partition, filtered by prop
//! indicators, start-time distance, and league category, then scored with a
//! token-set ratio over both orientations (home-to-home and home-to-away).
//! Tennis listings get last-name matching first, since player names carry
//! too little token overlap for set ratios.
//!
//! Uniqueness holds per run: a reference event id and a secondary game id
//! each appear in at most one match record.

use crate::engine::fuzzy::token_set_ratio;
use crate::engine::normalizer::NameNormalizer;
use crate::engine::sports::{is_tennis_context, league_category, Sport, SportClassifier};
use crate::error::MatchFailure;
use crate::feed::types::ReferenceEvent;
use crate::scrape::SecondaryGame;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Phrases in a listing name that mark a prop/future market, not a game.
const PROP_INDICATORS: &[&str] = &[
    "to lift the trophy",
    "lift the trophy",
    "mvp",
    "futures",
    "outright",
    "coach of the year",
    "player of the year",
    "series correct score",
    "when will series finish",
    "most points in series",
    "most assists in series",
    "most rebounds in series",
    "most threes made in series",
    "margin of victory",
    "exact outcome",
    "winner",
    "to win the tournament",
    "to win group",
    "series price",
    "(corners)",
];

/// Score at which scanning stops early; nothing will beat it meaningfully.
const EARLY_BREAK_SCORE: u8 = 95;

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub fuzzy_match_threshold: u8,
    pub min_component_match_score: u8,
    pub orientation_confidence_margin: u8,
    pub time_window_secs: i64,
    pub minor_league_denylist: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 65,
            min_component_match_score: 60,
            orientation_confidence_margin: 10,
            time_window_secs: 86_400,
            minor_league_denylist: default_minor_league_denylist(),
        }
    }
}

/// Team tokens that mark minor-league listings the reference book also
/// carries; these never pair with the secondary book's major-league board.
pub fn default_minor_league_denylist() -> Vec<String> {
    [
        "durham bulls",
        "salt lake bees",
        "st. paul saints",
        "columbus clippers",
        "tacoma rainiers",
        "norfolk tides",
        "jumbo shrimp",
        "mud hens",
        "reno aces",
        "oklahoma city comets",
        "syracuse mets",
        "indianapolis indians",
        "storm chasers",
        "railriders",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Whether the secondary game's home side corresponds to the reference
/// event's home side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Direct,
    Flipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub event_id: String,
    pub secondary_game_id: String,
    pub orientation: Orientation,
    pub score: u8,
    pub sport: Sport,
    /// Reference-side display names.
    pub home_team: String,
    pub away_team: String,
}

/// A matched pairing: the record plus the index of the reference event in
/// the caller's slice and the secondary game itself.
#[derive(Debug)]
pub struct MatchedPair {
    pub record: MatchRecord,
    pub event_index: usize,
    pub game: SecondaryGame,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedSecondary {
    pub home_team_raw: String,
    pub away_team_raw: String,
    pub norm_home: String,
    pub norm_away: String,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_candidate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedReference {
    pub event_id: String,
    pub home_team: String,
    pub away_team: String,
    pub norm_home: String,
    pub norm_away: String,
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_secondary: Vec<UnmatchedSecondary>,
    pub unmatched_reference: Vec<UnmatchedReference>,
}

/// A name that reads as a prop market rather than a team pairing.
pub fn is_prop_market_by_name(home: &str, away: &str) -> bool {
    let home_lower = home.to_lowercase();
    let away_lower = away.to_lowercase();
    for name in [&home_lower, &away_lower] {
        if PROP_INDICATORS.iter().any(|ind| name.contains(ind)) {
            return true;
        }
    }
    // "The Field" entries and yes/no markets are futures boards.
    if away_lower.contains("field") && away_lower.contains("the") {
        return true;
    }
    home_lower == "yes" && away_lower == "no"
}

/// Last name of a player for tennis matching: "Benoit Saint-Denis" -> "Saint-Denis".
fn last_name(full_name: &str) -> &str {
    full_name.rsplit_once(' ').map_or(full_name, |(_, last)| last)
}

struct Candidate {
    event_index: usize,
    score: u8,
    orientation: Orientation,
    component_home: u8,
    component_away: u8,
}

impl Candidate {
    fn has_component_support(&self, min_score: u8) -> bool {
        self.component_home >= min_score && self.component_away >= min_score
    }
}

pub struct EventMatcher<'a> {
    config: &'a MatcherConfig,
    normalizer: &'a NameNormalizer,
    classifier: &'a SportClassifier,
}

impl<'a> EventMatcher<'a> {
    pub fn new(
        config: &'a MatcherConfig,
        normalizer: &'a NameNormalizer,
        classifier: &'a SportClassifier,
    ) -> Self {
        Self {
            config,
            normalizer,
            classifier,
        }
    }

    fn is_minor_league(&self, event: &ReferenceEvent) -> bool {
        let home = event.home_team.to_lowercase();
        let away = event.away_team.to_lowercase();
        self.config
            .minor_league_denylist
            .iter()
            .any(|token| home.contains(token) || away.contains(token))
    }

    /// Match every secondary game against the reference events.
    pub fn match_games(
        &self,
        events: &[ReferenceEvent],
        games: Vec<SecondaryGame>,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        // Partition reference events by sport; minor-league listings drop out
        // entirely.
        let mut events_by_sport: HashMap<Sport, Vec<usize>> = HashMap::new();
        let mut minor_count = 0usize;
        let mut eligible: Vec<usize> = Vec::new();
        for (index, event) in events.iter().enumerate() {
            if self.is_minor_league(event) {
                minor_count += 1;
                continue;
            }
            let home = self.normalizer.normalize(&event.home_team);
            let away = self.normalizer.normalize(&event.away_team);
            let sport = self.classifier.classify(&home, &away);
            events_by_sport.entry(sport).or_default().push(index);
            eligible.push(index);
        }
        tracing::info!(
            events = eligible.len(),
            minor_league_filtered = minor_count,
            games = games.len(),
            "matching started"
        );

        let mut consumed_events: HashSet<String> = HashSet::new();
        let mut consumed_games: HashSet<String> = HashSet::new();

        for game in games {
            let game_id = game.game_id();
            if consumed_games.contains(&game_id) {
                continue;
            }

            let norm_home = self.normalizer.normalize(&game.home_team_raw);
            let norm_away = self.normalizer.normalize(&game.away_team_raw);
            if norm_home.is_empty() || norm_away.is_empty() {
                tracing::warn!(
                    home = game.home_team_raw.as_str(),
                    away = game.away_team_raw.as_str(),
                    "secondary game name normalized to empty"
                );
                outcome.unmatched_secondary.push(UnmatchedSecondary {
                    home_team_raw: game.home_team_raw,
                    away_team_raw: game.away_team_raw,
                    norm_home,
                    norm_away,
                    reason: MatchFailure::NormalizationFailed.reason(),
                    best_score: None,
                    best_candidate: None,
                });
                continue;
            }

            let sport = self.classifier.classify(&norm_home, &norm_away);
            let candidates = self.score_candidates(
                events,
                events_by_sport.get(&sport).map(Vec::as_slice).unwrap_or(&[]),
                &consumed_events,
                &game,
                &norm_home,
                &norm_away,
            );

            match self.select(&candidates) {
                Some(best) if best.score >= self.config.fuzzy_match_threshold => {
                    let event = &events[best.event_index];
                    consumed_events.insert(event.event_id.clone());
                    consumed_games.insert(game_id.clone());
                    tracing::info!(
                        game_home = game.home_team_raw.as_str(),
                        event_home = event.home_team.as_str(),
                        score = best.score,
                        orientation = ?best.orientation,
                        "matched"
                    );
                    outcome.pairs.push(MatchedPair {
                        record: MatchRecord {
                            event_id: event.event_id.clone(),
                            secondary_game_id: game_id,
                            orientation: best.orientation,
                            score: best.score,
                            sport,
                            home_team: event.home_team.clone(),
                            away_team: event.away_team.clone(),
                        },
                        event_index: best.event_index,
                        game,
                    });
                }
                best => {
                    let failure = match best {
                        Some(runner_up) => MatchFailure::BelowThreshold {
                            best_score: runner_up.score,
                            best_candidate: format!(
                                "{} vs {}",
                                events[runner_up.event_index].home_team,
                                events[runner_up.event_index].away_team
                            ),
                        },
                        None => MatchFailure::NoCandidates,
                    };
                    tracing::warn!(
                        home = game.home_team_raw.as_str(),
                        away = game.away_team_raw.as_str(),
                        reason = failure.reason(),
                        "no match"
                    );
                    let (best_score, best_candidate) = match &failure {
                        MatchFailure::BelowThreshold {
                            best_score,
                            best_candidate,
                        } => (Some(*best_score), Some(best_candidate.clone())),
                        _ => (None, None),
                    };
                    outcome.unmatched_secondary.push(UnmatchedSecondary {
                        home_team_raw: game.home_team_raw,
                        away_team_raw: game.away_team_raw,
                        norm_home,
                        norm_away,
                        reason: failure.reason(),
                        best_score,
                        best_candidate,
                    });
                }
            }
        }

        for index in eligible {
            let event = &events[index];
            if !consumed_events.contains(&event.event_id) {
                outcome.unmatched_reference.push(UnmatchedReference {
                    event_id: event.event_id.clone(),
                    home_team: event.home_team.clone(),
                    away_team: event.away_team.clone(),
                    norm_home: self.normalizer.normalize(&event.home_team),
                    norm_away: self.normalizer.normalize(&event.away_team),
                });
            }
        }

        tracing::info!(
            matched = outcome.pairs.len(),
            unmatched_secondary = outcome.unmatched_secondary.len(),
            unmatched_reference = outcome.unmatched_reference.len(),
            "matching finished"
        );
        outcome
    }

    fn score_candidates(
        &self,
        events: &[ReferenceEvent],
        partition: &[usize],
        consumed_events: &HashSet<String>,
        game: &SecondaryGame,
        norm_home: &str,
        norm_away: &str,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let game_joined = format!("{} {}", norm_home, norm_away);

        for &event_index in partition {
            let event = &events[event_index];
            if consumed_events.contains(&event.event_id) {
                continue;
            }
            if is_prop_market_by_name(&event.home_team, &event.away_team) {
                continue;
            }
            if let (Some(game_time), Some(event_time)) = (game.event_datetime, event.event_datetime)
            {
                let gap = (game_time - event_time).num_seconds().abs();
                if gap > self.config.time_window_secs {
                    continue;
                }
            }
            if let (Some(game_league), Some(event_league)) = (&game.league, &event.league) {
                if let (Some(a), Some(b)) = (league_category(game_league), league_category(event_league)) {
                    if a != b {
                        continue;
                    }
                }
            }

            let event_home = self.normalizer.normalize(&event.home_team);
            let event_away = self.normalizer.normalize(&event.away_team);
            if event_home.is_empty() || event_away.is_empty() {
                continue;
            }

            if is_tennis_context(event.sport.as_deref(), event.league.as_deref()) {
                if let Some(candidate) =
                    tennis_candidate(event_index, norm_home, norm_away, &event_home, &event_away)
                {
                    candidates.push(candidate);
                    break; // exact last-name match; nothing scores higher
                }
            }

            let direct = token_set_ratio(
                &game_joined,
                &format!("{} {}", event_home, event_away),
            );
            let flipped = token_set_ratio(
                &game_joined,
                &format!("{} {}", event_away, event_home),
            );
            let score = direct.max(flipped);
            if score == 0 {
                continue;
            }

            // Component scores in the winning orientation back the tie-break
            // and settle the orientation when the two joined scores sit
            // inside the confidence margin.
            let gap = direct.abs_diff(flipped);
            let comp_direct = (
                token_set_ratio(norm_home, &event_home),
                token_set_ratio(norm_away, &event_away),
            );
            let comp_flipped = (
                token_set_ratio(norm_home, &event_away),
                token_set_ratio(norm_away, &event_home),
            );
            let orientation = if gap >= self.config.orientation_confidence_margin {
                if direct >= flipped {
                    Orientation::Direct
                } else {
                    Orientation::Flipped
                }
            } else if comp_direct.0 >= comp_flipped.0 {
                Orientation::Direct
            } else {
                Orientation::Flipped
            };
            let (component_home, component_away) = match orientation {
                Orientation::Direct => comp_direct,
                Orientation::Flipped => comp_flipped,
            };

            candidates.push(Candidate {
                event_index,
                score,
                orientation,
                component_home,
                component_away,
            });

            if score >= EARLY_BREAK_SCORE {
                break;
            }
        }
        candidates
    }

    /// Pick the winning candidate: contenders within the confidence margin
    /// of the top score are re-ranked by full per-component support, and the
    /// absolute maximum stands when no contender has it.
    fn select<'c>(&self, candidates: &'c [Candidate]) -> Option<&'c Candidate> {
        let best = candidates.iter().max_by_key(|c| c.score)?;
        let margin = self.config.orientation_confidence_margin;
        let floor = best.score.saturating_sub(margin);
        candidates
            .iter()
            .filter(|c| c.score >= floor)
            .filter(|c| c.has_component_support(self.config.min_component_match_score))
            .max_by_key(|c| c.score)
            .or(Some(best))
    }
}

fn tennis_candidate(
    event_index: usize,
    norm_home: &str,
    norm_away: &str,
    event_home: &str,
    event_away: &str,
) -> Option<Candidate> {
    let (gh, ga) = (last_name(norm_home), last_name(norm_away));
    let (eh, ea) = (last_name(event_home), last_name(event_away));
    if gh.is_empty() || ga.is_empty() {
        return None;
    }
    let orientation = if gh == eh && ga == ea {
        Orientation::Direct
    } else if gh == ea && ga == eh {
        Orientation::Flipped
    } else {
        return None;
    };
    Some(Candidate {
        event_index,
        score: 100,
        orientation,
        component_home: 100,
        component_away: 100,
    })
}
