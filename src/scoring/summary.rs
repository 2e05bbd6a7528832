use std::collections::HashMap;

use crate::error::ConsistencyError;
use crate::models::{Match, PlayerId, WicketKind, BALLS_PER_OVER};

/// Batting figures for one player in one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattingLine {
    pub player_id: PlayerId,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub is_out: bool,
    pub dismissal: Option<WicketKind>,
}

/// Bowling figures for one player in one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BowlingLine {
    pub player_id: PlayerId,
    /// Legal deliveries
    pub balls: u32,
    pub runs: u32,
    pub wickets: u32,
}

/// Cumulative team runs at a chart point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverPoint {
    pub over: u32,
    pub runs: u32,
}

/// Innings totals re-derived from the ball log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub score: u32,
    pub wickets: u32,
    pub extras: u32,
    pub legal_balls: u32,
}

/// Full match summary
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub batting: Vec<BattingLine>,
    pub bowling: Vec<BowlingLine>,
    pub runs_per_over: Vec<OverPoint>,
    pub totals: Totals,
}

impl BattingLine {
    fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            runs: 0,
            balls: 0,
            fours: 0,
            sixes: 0,
            is_out: false,
            dismissal: None,
        }
    }

    /// Runs per 100 balls
    pub fn strike_rate(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        f64::from(self.runs) * 100.0 / f64::from(self.balls)
    }
}

impl BowlingLine {
    fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            balls: 0,
            runs: 0,
            wickets: 0,
        }
    }

    /// Overs in scoreboard notation, e.g. "2.3"
    pub fn overs_label(&self) -> String {
        format!("{}.{}", self.balls / BALLS_PER_OVER, self.balls % BALLS_PER_OVER)
    }

    /// Runs conceded per six legal balls
    pub fn economy(&self) -> f64 {
        if self.balls == 0 {
            return 0.0;
        }
        f64::from(self.runs * BALLS_PER_OVER) / f64::from(self.balls)
    }
}

/// Insertion-ordered lines keyed by player
struct Lines<T> {
    index: HashMap<PlayerId, usize>,
    lines: Vec<T>,
}

impl<T> Lines<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            lines: Vec::new(),
        }
    }

    fn entry(&mut self, id: PlayerId, make: impl FnOnce(PlayerId) -> T) -> &mut T {
        let pos = match self.index.get(&id) {
            Some(&pos) => pos,
            None => {
                self.lines.push(make(id));
                let pos = self.lines.len() - 1;
                self.index.insert(id, pos);
                pos
            }
        };
        &mut self.lines[pos]
    }
}

/// Fold a match's ball log into batting and bowling tables.
///
/// The chart adds a point after every sixth logged delivery (and after the
/// last one). That follows ball index rather than legal-ball count, so with
/// wides or no-balls in the log the points drift from the true over ends.
pub fn scorecard(m: &Match) -> Scorecard {
    let mut batting: Lines<BattingLine> = Lines::new();
    let mut bowling: Lines<BowlingLine> = Lines::new();
    let mut runs_per_over = Vec::new();
    let mut totals = Totals::default();

    for id in [m.striker_id, m.non_striker_id].into_iter().flatten() {
        batting.entry(id, BattingLine::new);
    }

    let last = m.balls.len().saturating_sub(1);
    for (index, ball) in m.balls.iter().enumerate() {
        batting.entry(ball.striker_id, BattingLine::new);
        batting.entry(ball.non_striker_id, BattingLine::new);
        bowling.entry(ball.bowler_id, BowlingLine::new);

        let legal = ball.is_legal();
        let total_runs = ball.total_runs();

        totals.score += total_runs;
        totals.extras += ball.extra();
        totals.legal_balls += u32::from(legal);

        if (index + 1) % BALLS_PER_OVER as usize == 0 || index == last {
            runs_per_over.push(OverPoint {
                over: runs_per_over.len() as u32 + 1,
                runs: totals.score,
            });
        }

        let batter = batting.entry(ball.striker_id, BattingLine::new);
        batter.runs += ball.runs;
        if legal {
            batter.balls += 1;
            match ball.runs {
                4 => batter.fours += 1,
                6 => batter.sixes += 1,
                _ => {}
            }
        }

        let bowler = bowling.entry(ball.bowler_id, BowlingLine::new);
        bowler.runs += total_runs;
        bowler.balls += u32::from(legal);

        if ball.is_wicket {
            totals.wickets += 1;
            bowler.wickets += 1;

            let out = batting.entry(ball.dismissed_id.unwrap_or(ball.striker_id), BattingLine::new);
            out.is_out = true;
            out.dismissal = ball.wicket_kind;
        }
    }

    Scorecard {
        batting: batting.lines,
        bowling: bowling.lines,
        runs_per_over,
        totals,
    }
}

/// Check the cached counters on a match against its ball log
pub fn verify(m: &Match) -> Result<Totals, ConsistencyError> {
    let totals = scorecard(m).totals;

    let checks = [
        ("score", m.score, totals.score),
        ("wickets", m.wickets, totals.wickets),
        ("extras", m.extras, totals.extras),
        ("legal balls", m.legal_balls(), totals.legal_balls),
    ];
    for (field, cached, derived) in checks {
        if cached != derived {
            return Err(ConsistencyError {
                field,
                cached,
                derived,
            });
        }
    }

    Ok(totals)
}
