//! Typed failure kinds that cross module seams.
//!
//! Everything here is recoverable at the pipeline level: unmatched games
//! become diagnostic rows, period mismatches suppress rows for one game.
//! Fatal conditions (config, reference feed) stay `anyhow` at the boundary.

use thiserror::Error;

/// Why a secondary-book game produced no match record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchFailure {
    #[error("team name normalized to empty")]
    NormalizationFailed,

    #[error("best candidate scored {best_score}, below threshold")]
    BelowThreshold {
        best_score: u8,
        /// "home vs away" of the runner-up, for the unmatched log.
        best_candidate: String,
    },

    #[error("no candidate events in sport partition")]
    NoCandidates,
}

impl MatchFailure {
    /// Stable reason tag carried into the diagnostics output.
    pub fn reason(&self) -> &'static str {
        match self {
            MatchFailure::NormalizationFailed => "normalization_failed",
            MatchFailure::BelowThreshold { .. } => "below_threshold",
            MatchFailure::NoCandidates => "no_candidates",
        }
    }
}

/// Why EV analysis refused a matched pair outright.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzeError {
    #[error("secondary game {game} has first-half data but reference event {event_id} has no usable periods")]
    PeriodMismatch { event_id: String, game: String },
}
