use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::player::{Player, PlayerId};

/// Unique identifier for a team
pub type TeamId = Uuid;

/// A team and its ordered squad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Team identity
    pub id: TeamId,

    /// Display name
    pub name: String,

    /// Players in insertion (display) order
    pub players: Vec<Player>,
}

impl Team {
    /// Create an empty team
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            players: Vec::new(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn has_player(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Copy of this team under a new name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Copy of this team with a player appended
    pub fn with_player(&self, player: Player) -> Self {
        let mut next = self.clone();
        next.players.push(player);
        next
    }

    /// Copy of this team where every player is passed through `f`
    pub fn with_players_mapped(&self, f: impl Fn(&Player) -> Player) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            players: self.players.iter().map(f).collect(),
        }
    }
}

/// Look up a player's name across all teams
pub fn player_name(teams: &[Team], id: PlayerId) -> Option<&str> {
    teams
        .iter()
        .find_map(|t| t.player(id))
        .map(|p| p.name.as_str())
}
