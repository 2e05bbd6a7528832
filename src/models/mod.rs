pub mod ball;
pub mod match_state;
pub mod player;
pub mod team;

pub use ball::{BallEvent, DismissedEnd, WicketKind};
pub use match_state::{Match, MatchId, MatchStatus, BALLS_PER_OVER};
pub use player::{CareerStats, Player, PlayerId, StatDelta};
pub use team::{player_name, Team, TeamId};
