use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Immutable record of one delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallEvent {
    /// Runs scored off the bat
    pub runs: u32,

    pub is_wide: bool,

    pub is_no_ball: bool,

    pub is_wicket: bool,

    /// How the batter was dismissed (wicket deliveries only)
    pub wicket_kind: Option<WicketKind>,

    /// Batter dismissed on this delivery
    #[serde(default)]
    pub dismissed_id: Option<PlayerId>,

    /// Fielder involved in the dismissal, if recorded
    #[serde(default)]
    pub fielder: Option<String>,

    /// Bowler at the time of the delivery
    pub bowler_id: PlayerId,

    /// Striker at the time of the delivery
    pub striker_id: PlayerId,

    /// Non-striker at the time of the delivery
    pub non_striker_id: PlayerId,
}

/// Mode of dismissal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WicketKind {
    Caught,
    Bowled,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
}

/// Which end lost its batter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DismissedEnd {
    #[default]
    Striker,
    NonStriker,
}

impl BallEvent {
    /// Penalty run for a wide or no-ball (never more than one)
    pub fn extra(&self) -> u32 {
        u32::from(self.is_wide || self.is_no_ball)
    }

    /// Runs added to the team total by this delivery
    pub fn total_runs(&self) -> u32 {
        self.runs + self.extra()
    }

    /// Whether the delivery counts toward the six-ball over
    pub fn is_legal(&self) -> bool {
        !self.is_wide && !self.is_no_ball
    }

    /// Short scoreboard label, e.g. "W", "4", "1wd", "0nb"
    pub fn label(&self) -> String {
        if self.is_wicket {
            return "W".to_string();
        }
        let mut label = self.runs.to_string();
        if self.is_wide {
            label.push_str("wd");
        }
        if self.is_no_ball {
            label.push_str("nb");
        }
        label
    }
}

impl WicketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WicketKind::Caught => "caught",
            WicketKind::Bowled => "bowled",
            WicketKind::Lbw => "lbw",
            WicketKind::RunOut => "runout",
            WicketKind::Stumped => "stumped",
            WicketKind::HitWicket => "hitwicket",
        }
    }

    /// Dismissals that involve a fielder
    pub fn involves_fielder(&self) -> bool {
        matches!(
            self,
            WicketKind::Caught | WicketKind::RunOut | WicketKind::Stumped
        )
    }
}

impl std::str::FromStr for WicketKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "caught" => Ok(WicketKind::Caught),
            "bowled" => Ok(WicketKind::Bowled),
            "lbw" => Ok(WicketKind::Lbw),
            "runout" | "run_out" => Ok(WicketKind::RunOut),
            "stumped" => Ok(WicketKind::Stumped),
            "hitwicket" | "hit_wicket" => Ok(WicketKind::HitWicket),
            other => Err(format!("unknown wicket kind: {}", other)),
        }
    }
}

impl DismissedEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissedEnd::Striker => "Striker",
            DismissedEnd::NonStriker => "Non-striker",
        }
    }
}
