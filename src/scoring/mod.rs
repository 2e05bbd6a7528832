pub mod engine;
pub mod setup;
pub mod summary;

pub use engine::{
    apply_delivery, change_bowler, complete, describe_delivery, start_match, DeliveryOutcome,
    Transition, WicketDetails,
};
pub use setup::{MatchInit, MatchSetup};
pub use summary::{scorecard, verify, BattingLine, BowlingLine, OverPoint, Scorecard, Totals};
