use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player
pub type PlayerId = Uuid;

/// A player registered to a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Player identity
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Inline photo as a `data:` URI
    pub photo: Option<String>,

    /// Career totals across all matches
    pub stats: CareerStats,
}

/// Cumulative statistics carried on a player record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerStats {
    pub matches: u32,
    pub runs: u32,
    pub balls_faced: u32,
    pub wickets: u32,
    /// Legal deliveries bowled (one sixth of an over each)
    pub balls_bowled: u32,
    pub runs_conceded: u32,
}

/// Incremental statistic change produced by a single delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    pub player_id: PlayerId,
    pub runs: u32,
    pub balls_faced: u32,
    pub wickets: u32,
    pub balls_bowled: u32,
    pub runs_conceded: u32,
}

impl Player {
    /// Create a player with zeroed statistics
    pub fn new(name: impl Into<String>, photo: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            photo,
            stats: CareerStats::default(),
        }
    }

    /// Copy of this player with a delivery's delta folded in
    pub fn with_delta(&self, delta: &StatDelta) -> Self {
        let mut next = self.clone();
        next.stats.runs = next.stats.runs.saturating_add(delta.runs);
        next.stats.balls_faced = next.stats.balls_faced.saturating_add(delta.balls_faced);
        next.stats.wickets = next.stats.wickets.saturating_add(delta.wickets);
        next.stats.balls_bowled = next.stats.balls_bowled.saturating_add(delta.balls_bowled);
        next.stats.runs_conceded = next.stats.runs_conceded.saturating_add(delta.runs_conceded);
        next
    }

    /// Copy of this player with one more match played
    pub fn with_match_played(&self) -> Self {
        let mut next = self.clone();
        next.stats.matches = next.stats.matches.saturating_add(1);
        next
    }
}

impl CareerStats {
    /// Overs bowled as a fraction (legal balls / 6)
    pub fn overs_bowled(&self) -> f64 {
        f64::from(self.balls_bowled) / 6.0
    }

    /// Runs per match, treating zero matches as one
    pub fn batting_average(&self) -> f64 {
        f64::from(self.runs) / f64::from(self.matches.max(1))
    }

    /// Runs per 100 balls faced
    pub fn strike_rate(&self) -> f64 {
        if self.balls_faced == 0 {
            return 0.0;
        }
        f64::from(self.runs) * 100.0 / f64::from(self.balls_faced)
    }

    /// Runs conceded per over bowled
    pub fn economy(&self) -> f64 {
        if self.balls_bowled == 0 {
            return 0.0;
        }
        f64::from(self.runs_conceded) * 6.0 / f64::from(self.balls_bowled)
    }
}

impl StatDelta {
    pub fn for_player(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }
}
