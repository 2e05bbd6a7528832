use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ball::BallEvent;
use super::player::PlayerId;
use super::team::TeamId;

/// Unique identifier for a match
pub type MatchId = Uuid;

/// Legal deliveries per over
pub const BALLS_PER_OVER: u32 = 6;

/// A single-innings match being scored, or one that has finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Match identity
    pub id: MatchId,

    pub team_a_id: TeamId,

    pub team_b_id: TeamId,

    pub batting_team_id: TeamId,

    pub bowling_team_id: TeamId,

    /// Overs allowed for the innings
    pub total_overs: u32,

    /// Completed overs
    pub current_over: u32,

    /// Legal balls bowled in the current over (0..=5)
    pub current_ball_in_over: u32,

    /// Running total (cache of the ball log)
    pub score: u32,

    /// Wickets fallen (cache of the ball log)
    pub wickets: u32,

    /// Wide/no-ball penalty runs (cache of the ball log)
    pub extras: u32,

    /// Append-only delivery log, the source of truth for every total
    pub balls: Vec<BallEvent>,

    pub striker_id: Option<PlayerId>,

    pub non_striker_id: Option<PlayerId>,

    pub bowler_id: Option<PlayerId>,

    pub status: MatchStatus,

    pub is_completed: bool,

    /// When the match was started
    pub date: DateTime<Utc>,
}

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Live,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        }
    }
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::Live
    }

    /// Legal deliveries bowled so far, from the over counters
    pub fn legal_balls(&self) -> u32 {
        self.current_over * BALLS_PER_OVER + self.current_ball_in_over
    }

    /// Overs in scoreboard notation, e.g. "3.2"
    pub fn overs_label(&self) -> String {
        format!("{}.{}", self.current_over, self.current_ball_in_over)
    }

    /// Score in scoreboard notation, e.g. "45/2"
    pub fn score_label(&self) -> String {
        format!("{}/{}", self.score, self.wickets)
    }

    /// Runs per over so far
    pub fn current_run_rate(&self) -> f64 {
        f64::from(self.score * BALLS_PER_OVER) / f64::from(self.legal_balls().max(1))
    }

    /// Trailing deliveries of the current over for the "this over" strip.
    ///
    /// At an over boundary this shows the last six deliveries.
    pub fn this_over(&self) -> &[BallEvent] {
        let take = match self.current_ball_in_over {
            0 => BALLS_PER_OVER as usize,
            n => n as usize,
        };
        let start = self.balls.len().saturating_sub(take);
        &self.balls[start..]
    }

    /// Whether the innings has run out of overs or batters.
    ///
    /// Informational only; scoring is not gated on it.
    pub fn innings_complete(&self, batting_squad_size: usize) -> bool {
        let all_out = batting_squad_size > 1 && self.wickets as usize >= batting_squad_size - 1;
        self.legal_balls() >= self.total_overs * BALLS_PER_OVER || all_out
    }

    /// Every player who has occupied either batting end
    pub fn batters_used(&self) -> Vec<PlayerId> {
        let mut used: Vec<PlayerId> = Vec::new();
        let current = [self.striker_id, self.non_striker_id];
        let logged = self
            .balls
            .iter()
            .flat_map(|b| [Some(b.striker_id), Some(b.non_striker_id)]);

        for id in current.into_iter().chain(logged).flatten() {
            if !used.contains(&id) {
                used.push(id);
            }
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_match() -> Match {
        Match {
            id: Uuid::new_v4(),
            team_a_id: Uuid::new_v4(),
            team_b_id: Uuid::new_v4(),
            batting_team_id: Uuid::nil(),
            bowling_team_id: Uuid::nil(),
            total_overs: 2,
            current_over: 0,
            current_ball_in_over: 0,
            score: 0,
            wickets: 0,
            extras: 0,
            balls: Vec::new(),
            striker_id: None,
            non_striker_id: None,
            bowler_id: None,
            status: MatchStatus::Live,
            is_completed: false,
            date: Utc::now(),
        }
    }

    #[test]
    fn test_labels_and_run_rate() {
        let mut m = empty_match();
        m.current_over = 1;
        m.current_ball_in_over = 3;
        m.score = 18;
        m.wickets = 1;

        assert_eq!(m.overs_label(), "1.3");
        assert_eq!(m.score_label(), "18/1");
        assert_eq!(m.legal_balls(), 9);
        assert_eq!(m.current_run_rate(), 12.0);
    }

    #[test]
    fn test_run_rate_before_first_ball() {
        let mut m = empty_match();
        m.score = 1; // a wide before any legal ball
        assert_eq!(m.current_run_rate(), 6.0);
    }

    #[test]
    fn test_innings_complete() {
        let mut m = empty_match();
        assert!(!m.innings_complete(4));

        m.wickets = 3;
        assert!(m.innings_complete(4));

        m.wickets = 0;
        m.current_over = 2;
        assert!(m.innings_complete(4));
    }
}
