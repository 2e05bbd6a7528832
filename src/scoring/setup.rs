use tracing::debug;

use crate::error::SetupError;
use crate::models::{PlayerId, Team, TeamId};

/// Minimum squad size for either side
pub const MIN_PLAYERS: usize = 2;

/// Accepted range for overs per innings
pub const OVERS_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

/// Default overs offered by a fresh setup
pub const DEFAULT_OVERS: u32 = 5;

/// Selections made while setting up a match; any of them may still be missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSetup {
    pub team_a_id: Option<TeamId>,
    pub team_b_id: Option<TeamId>,
    pub total_overs: u32,
    /// Defaults to team A when not chosen
    pub batting_team_id: Option<TeamId>,
    pub striker_id: Option<PlayerId>,
    pub non_striker_id: Option<PlayerId>,
    pub bowler_id: Option<PlayerId>,
}

/// A fully validated match configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInit {
    pub team_a_id: TeamId,
    pub team_b_id: TeamId,
    pub batting_team_id: TeamId,
    pub bowling_team_id: TeamId,
    pub total_overs: u32,
    pub striker_id: PlayerId,
    pub non_striker_id: PlayerId,
    pub bowler_id: PlayerId,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            team_a_id: None,
            team_b_id: None,
            total_overs: DEFAULT_OVERS,
            batting_team_id: None,
            striker_id: None,
            non_striker_id: None,
            bowler_id: None,
        }
    }
}

impl MatchSetup {
    /// Validate against the current teams.
    ///
    /// Checks run from scratch on every call and stop at the first failure.
    pub fn validate(&self, teams: &[Team]) -> Result<MatchInit, SetupError> {
        let (Some(team_a_id), Some(team_b_id)) = (self.team_a_id, self.team_b_id) else {
            return Err(SetupError::TeamsNotSelected);
        };
        if team_a_id == team_b_id {
            return Err(SetupError::SameTeam);
        }

        let find = |id: TeamId| teams.iter().find(|t| t.id == id);
        let (Some(team_a), Some(team_b)) = (find(team_a_id), find(team_b_id)) else {
            return Err(SetupError::UnknownTeam);
        };

        for team in [team_a, team_b] {
            if team.players.len() < MIN_PLAYERS {
                return Err(SetupError::NotEnoughPlayers(team.name.clone()));
            }
        }

        if !OVERS_RANGE.contains(&self.total_overs) {
            return Err(SetupError::InvalidOvers);
        }

        let batting_team_id = self.batting_team_id.unwrap_or(team_a_id);
        let (batting, bowling) = if batting_team_id == team_b_id {
            (team_b, team_a)
        } else if batting_team_id == team_a_id {
            (team_a, team_b)
        } else {
            return Err(SetupError::UnknownTeam);
        };

        let (Some(striker_id), Some(non_striker_id), Some(bowler_id)) =
            (self.striker_id, self.non_striker_id, self.bowler_id)
        else {
            return Err(SetupError::OpenersNotSelected);
        };

        if striker_id == non_striker_id {
            return Err(SetupError::SameOpeners);
        }
        if !batting.has_player(striker_id) || !batting.has_player(non_striker_id) {
            return Err(SetupError::BatterNotInTeam);
        }
        if !bowling.has_player(bowler_id) {
            return Err(SetupError::BowlerNotInTeam);
        }

        debug!(
            "Setup validated: {} batting vs {} ({} overs)",
            batting.name, bowling.name, self.total_overs
        );

        Ok(MatchInit {
            team_a_id,
            team_b_id,
            batting_team_id: batting.id,
            bowling_team_id: bowling.id,
            total_overs: self.total_overs,
            striker_id,
            non_striker_id,
            bowler_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures::squad;

    fn full_setup(a: &Team, b: &Team) -> MatchSetup {
        MatchSetup {
            team_a_id: Some(a.id),
            team_b_id: Some(b.id),
            total_overs: 5,
            batting_team_id: None,
            striker_id: Some(a.players[0].id),
            non_striker_id: Some(a.players[1].id),
            bowler_id: Some(b.players[0].id),
        }
    }

    #[test]
    fn test_valid_setup_defaults_to_team_a_batting() {
        let (a, b) = (squad("Lions", 3), squad("Tigers", 2));
        let init = full_setup(&a, &b).validate(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(init.batting_team_id, a.id);
        assert_eq!(init.bowling_team_id, b.id);
        assert_eq!(init.striker_id, a.players[0].id);
    }

    #[test]
    fn test_team_b_can_bat_first() {
        let (a, b) = (squad("Lions", 2), squad("Tigers", 2));
        let setup = MatchSetup {
            batting_team_id: Some(b.id),
            striker_id: Some(b.players[0].id),
            non_striker_id: Some(b.players[1].id),
            bowler_id: Some(a.players[0].id),
            ..full_setup(&a, &b)
        };
        let init = setup.validate(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(init.batting_team_id, b.id);
        assert_eq!(init.bowling_team_id, a.id);
    }

    #[test]
    fn test_reports_first_failure_only() {
        let (a, b) = (squad("Lions", 1), squad("Tigers", 1));
        let teams = vec![a.clone(), b.clone()];

        assert_eq!(
            MatchSetup::default().validate(&teams),
            Err(SetupError::TeamsNotSelected)
        );

        let same = MatchSetup {
            team_a_id: Some(a.id),
            team_b_id: Some(a.id),
            ..MatchSetup::default()
        };
        assert_eq!(same.validate(&teams), Err(SetupError::SameTeam));

        let short = MatchSetup {
            team_a_id: Some(a.id),
            team_b_id: Some(b.id),
            ..MatchSetup::default()
        };
        assert_eq!(
            short.validate(&teams),
            Err(SetupError::NotEnoughPlayers("Lions".to_string()))
        );
    }

    #[test]
    fn test_unknown_team() {
        let (a, b) = (squad("Lions", 2), squad("Tigers", 2));
        let setup = full_setup(&a, &b);
        assert_eq!(setup.validate(&[a]), Err(SetupError::UnknownTeam));
    }

    #[test]
    fn test_overs_bounds() {
        let (a, b) = (squad("Lions", 2), squad("Tigers", 2));
        let teams = vec![a.clone(), b.clone()];

        for overs in [0, 51] {
            let setup = MatchSetup {
                total_overs: overs,
                ..full_setup(&a, &b)
            };
            assert_eq!(setup.validate(&teams), Err(SetupError::InvalidOvers));
        }
    }

    #[test]
    fn test_player_selection_rules() {
        let (a, b) = (squad("Lions", 3), squad("Tigers", 2));
        let teams = vec![a.clone(), b.clone()];

        let missing = MatchSetup {
            bowler_id: None,
            ..full_setup(&a, &b)
        };
        assert_eq!(missing.validate(&teams), Err(SetupError::OpenersNotSelected));

        let same = MatchSetup {
            non_striker_id: Some(a.players[0].id),
            ..full_setup(&a, &b)
        };
        assert_eq!(same.validate(&teams), Err(SetupError::SameOpeners));

        let wrong_side = MatchSetup {
            striker_id: Some(b.players[1].id),
            ..full_setup(&a, &b)
        };
        assert_eq!(wrong_side.validate(&teams), Err(SetupError::BatterNotInTeam));

        let wrong_bowler = MatchSetup {
            bowler_id: Some(a.players[2].id),
            ..full_setup(&a, &b)
        };
        assert_eq!(wrong_bowler.validate(&teams), Err(SetupError::BowlerNotInTeam));
    }
}
