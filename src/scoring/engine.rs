use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::setup::MatchInit;
use crate::error::ScoringError;
use crate::models::{
    BallEvent, DismissedEnd, Match, MatchStatus, PlayerId, StatDelta, WicketKind, BALLS_PER_OVER,
};

/// What happened on one delivery, as entered by the scorer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub runs_off_bat: u32,
    pub is_wide: bool,
    pub is_no_ball: bool,
    pub is_wicket: bool,
}

/// Dismissal details required when `is_wicket` is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WicketDetails {
    pub dismissed_end: DismissedEnd,
    pub wicket_kind: WicketKind,
    /// Incoming batter; must not have batted already in this innings
    pub replacement_id: Option<PlayerId>,
    pub fielder: Option<String>,
}

/// Result of applying one delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Match state after the delivery
    pub next: Match,

    /// The delivery as logged
    pub ball: BallEvent,

    /// Per-player statistic increments (striker first, then bowler)
    pub deltas: Vec<StatDelta>,
}

impl DeliveryOutcome {
    pub fn runs(runs_off_bat: u32) -> Self {
        Self {
            runs_off_bat,
            ..Default::default()
        }
    }

    pub fn wide(runs_off_bat: u32) -> Self {
        Self {
            runs_off_bat,
            is_wide: true,
            ..Default::default()
        }
    }

    pub fn no_ball(runs_off_bat: u32) -> Self {
        Self {
            runs_off_bat,
            is_no_ball: true,
            ..Default::default()
        }
    }

    pub fn wicket() -> Self {
        Self {
            is_wicket: true,
            ..Default::default()
        }
    }

    pub fn is_legal(&self) -> bool {
        !self.is_wide && !self.is_no_ball
    }

    pub fn extra(&self) -> u32 {
        u32::from(self.is_wide || self.is_no_ball)
    }
}

/// Create a live match from a validated setup
pub fn start_match(init: &MatchInit) -> Match {
    Match {
        id: Uuid::new_v4(),
        team_a_id: init.team_a_id,
        team_b_id: init.team_b_id,
        batting_team_id: init.batting_team_id,
        bowling_team_id: init.bowling_team_id,
        total_overs: init.total_overs,
        current_over: 0,
        current_ball_in_over: 0,
        score: 0,
        wickets: 0,
        extras: 0,
        balls: Vec::new(),
        striker_id: Some(init.striker_id),
        non_striker_id: Some(init.non_striker_id),
        bowler_id: Some(init.bowler_id),
        status: MatchStatus::Live,
        is_completed: false,
        date: Utc::now(),
    }
}

/// Apply one delivery to a live match.
///
/// The input match is never modified; on error nothing is produced. Strike
/// rotates once on odd runs off the bat and once more when the delivery is
/// the sixth legal ball of the over, so an odd-run last ball leaves the ends
/// as they were.
pub fn apply_delivery(
    current: &Match,
    outcome: &DeliveryOutcome,
    wicket: Option<&WicketDetails>,
) -> Result<Transition, ScoringError> {
    if !current.is_live() {
        return Err(ScoringError::InactiveMatch);
    }

    let wicket = if outcome.is_wicket {
        match wicket {
            Some(details) if details.replacement_id.is_some() => Some(details),
            _ => return Err(ScoringError::MissingReplacement),
        }
    } else {
        None
    };

    let (Some(striker_id), Some(non_striker_id), Some(bowler_id)) =
        (current.striker_id, current.non_striker_id, current.bowler_id)
    else {
        return Err(ScoringError::IncompleteLineup);
    };

    let legal = outcome.is_legal();
    let extra = outcome.extra();
    let total_runs = outcome
        .runs_off_bat
        .checked_add(extra)
        .ok_or(ScoringError::RunsOutOfRange)?;
    let score = current
        .score
        .checked_add(total_runs)
        .ok_or(ScoringError::RunsOutOfRange)?;

    let mut next = current.clone();

    // 1. Log the delivery with the pre-delivery lineup
    let dismissed_id = wicket.map(|w| match w.dismissed_end {
        DismissedEnd::Striker => striker_id,
        DismissedEnd::NonStriker => non_striker_id,
    });
    let ball = BallEvent {
        runs: outcome.runs_off_bat,
        is_wide: outcome.is_wide,
        is_no_ball: outcome.is_no_ball,
        is_wicket: outcome.is_wicket,
        wicket_kind: wicket.map(|w| w.wicket_kind),
        dismissed_id,
        fielder: wicket.and_then(|w| w.fielder.clone()),
        bowler_id,
        striker_id,
        non_striker_id,
    };
    next.balls.push(ball.clone());

    // 2. Replace the dismissed end
    let mut new_striker = striker_id;
    let mut new_non_striker = non_striker_id;
    if let Some(details) = wicket {
        next.wickets += 1;
        if let Some(replacement) = details.replacement_id {
            match details.dismissed_end {
                DismissedEnd::Striker => new_striker = replacement,
                DismissedEnd::NonStriker => new_non_striker = replacement,
            }
        }
    }

    // 3. Odd runs off the bat cross the batters
    if outcome.runs_off_bat % 2 == 1 {
        std::mem::swap(&mut new_striker, &mut new_non_striker);
    }

    // 4. End of over: swap ends again and roll the counter
    if legal {
        if current.current_ball_in_over == BALLS_PER_OVER - 1 {
            std::mem::swap(&mut new_striker, &mut new_non_striker);
            next.current_over += 1;
            next.current_ball_in_over = 0;
        } else {
            next.current_ball_in_over += 1;
        }
    }

    next.striker_id = Some(new_striker);
    next.non_striker_id = Some(new_non_striker);

    // 5. Running totals
    next.score = score;
    next.extras += extra;

    // 6. Player statistic deltas
    let batter = StatDelta {
        runs: outcome.runs_off_bat,
        balls_faced: u32::from(legal),
        ..StatDelta::for_player(striker_id)
    };
    let bowler = StatDelta {
        runs_conceded: total_runs,
        balls_bowled: u32::from(legal),
        wickets: u32::from(outcome.is_wicket),
        ..StatDelta::for_player(bowler_id)
    };

    debug!(
        "Delivery {} | {} | score {} after {}",
        next.balls.len(),
        ball.label(),
        next.score_label(),
        next.overs_label()
    );

    Ok(Transition {
        next,
        ball,
        deltas: vec![batter, bowler],
    })
}

/// Put a new bowler on
pub fn change_bowler(current: &Match, bowler_id: PlayerId) -> Result<Match, ScoringError> {
    if !current.is_live() {
        return Err(ScoringError::InactiveMatch);
    }
    Ok(Match {
        bowler_id: Some(bowler_id),
        ..current.clone()
    })
}

/// The irreversible `live -> completed` transition
pub fn complete(current: &Match) -> Result<Match, ScoringError> {
    if !current.is_live() {
        return Err(ScoringError::InactiveMatch);
    }
    Ok(Match {
        status: MatchStatus::Completed,
        is_completed: true,
        ..current.clone()
    })
}

/// Event text handed to the commentary generator
pub fn describe_delivery(outcome: &DeliveryOutcome, wicket: Option<&WicketDetails>) -> String {
    if outcome.is_wicket {
        let (end, kind) = wicket
            .map(|w| (w.dismissed_end.as_str(), w.wicket_kind.as_str()))
            .unwrap_or(("Striker", "out"));
        return format!("WICKET! {} out ({})", end, kind);
    }
    if outcome.is_wide {
        return "Wide Ball".to_string();
    }
    match outcome.runs_off_bat {
        4 => "FOUR!".to_string(),
        6 => "SIX!".to_string(),
        runs => format!("{} runs", runs),
    }
}
