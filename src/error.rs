//! Error types for scoring, setup, and storage

use thiserror::Error;

/// Rejected transitions on a match. No state changes when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    /// The match is not live
    #[error("Match is not live")]
    InactiveMatch,

    /// A wicket was recorded without naming the incoming batter
    #[error("Please select the new batsman.")]
    MissingReplacement,

    /// Striker, non-striker, or bowler slot is empty
    #[error("Striker, non-striker and bowler must all be set before scoring")]
    IncompleteLineup,

    /// Runs for the delivery would overflow the score
    #[error("Runs for this delivery are out of range")]
    RunsOutOfRange,

    /// The player is not on the side the action needs
    #[error("Player is not on the {0} team")]
    UnknownPlayer(&'static str),
}

/// Match setup validation failure, one reason at a time
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("Please select both teams.")]
    TeamsNotSelected,

    #[error("Teams must be different.")]
    SameTeam,

    #[error("Invalid team selection.")]
    UnknownTeam,

    #[error("{0} needs at least 2 players.")]
    NotEnoughPlayers(String),

    #[error("Overs per innings must be between 1 and 50.")]
    InvalidOvers,

    #[error("Please select the opening players.")]
    OpenersNotSelected,

    #[error("Striker and Non-Striker must be different players.")]
    SameOpeners,

    #[error("Opening batters must belong to the batting team.")]
    BatterNotInTeam,

    #[error("Opening bowler must belong to the bowling team.")]
    BowlerNotInTeam,
}

/// Key-value store failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing would exceed the configured storage quota
    #[error("Storage quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: u64,
        quota: u64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Cached match counter that disagrees with the ball log
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field} mismatch: cached {cached}, derived from ball log {derived}")]
pub struct ConsistencyError {
    pub field: &'static str,
    pub cached: u32,
    pub derived: u32,
}

/// Failure of a session-level action
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No match is in progress")]
    NoActiveMatch,

    #[error("A match is already in progress")]
    MatchInProgress,

    #[error("Unknown team")]
    UnknownTeam,

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}
