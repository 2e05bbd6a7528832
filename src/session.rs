//! The scoring session: sole owner of teams, the active match slot, and history.
//!
//! Every action runs to completion before the next one is accepted. State is
//! updated in memory first and then written through to the store; a failed
//! write becomes a [`PersistWarning`] and never rolls the in-memory state back.

use tracing::{info, warn};

use crate::db::StateStore;
use crate::error::{ScoringError, SessionError, StoreError};
use crate::models::{player_name, BallEvent, Match, MatchId, Player, PlayerId, Team, TeamId};
use crate::scoring::{self, DeliveryOutcome, MatchSetup, Scorecard, WicketDetails};
use crate::workers::commentary::{CommentaryDispatcher, MATCH_START_TEXT};

/// Message shown when the store is full
pub const QUOTA_WARNING: &str = "Storage full! Try removing some player photos.";

/// A write that did not make it to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistWarning {
    /// Record that failed to save
    pub record: &'static str,
    pub message: String,
}

/// Result of an action together with any persistence warnings it raised
#[derive(Debug, Clone)]
pub struct Saved<T> {
    pub value: T,
    pub warnings: Vec<PersistWarning>,
}

/// A finished match and its derived scorecard
#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub completed: Match,
    pub scorecard: Scorecard,
}

pub struct ScoringSession {
    store: StateStore,
    commentary: Option<CommentaryDispatcher>,
    teams: Vec<Team>,
    active: Option<Match>,
    history: Vec<Match>,
}

impl PersistWarning {
    fn from_error(record: &'static str, error: &StoreError) -> Self {
        let message = match error {
            StoreError::QuotaExceeded { .. } => QUOTA_WARNING.to_string(),
            other => format!("Could not save {}: {}", record, other),
        };
        warn!("Failed to persist {}: {}", record, error);
        Self { record, message }
    }
}

impl<T> Saved<T> {
    fn new(value: T, warnings: Vec<PersistWarning>) -> Self {
        Self { value, warnings }
    }
}

impl ScoringSession {
    /// Restore teams, the active match, and history from the store
    pub async fn load(
        store: StateStore,
        commentary: Option<CommentaryDispatcher>,
    ) -> Result<Self, StoreError> {
        let teams = store.load_teams().await?;
        let active = store.load_active_match().await?.filter(Match::is_live);
        let history = store.load_history().await?;

        info!(
            "Session loaded: {} teams, {} past matches, live match: {}",
            teams.len(),
            history.len(),
            active.is_some()
        );

        Ok(Self {
            store,
            commentary,
            teams,
            active,
            history,
        })
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn active_match(&self) -> Option<&Match> {
        self.active.as_ref()
    }

    /// Completed matches, newest first
    pub fn history(&self) -> &[Match] {
        &self.history
    }

    pub fn player_name(&self, id: PlayerId) -> Option<&str> {
        player_name(&self.teams, id)
    }

    /// Latest commentary line, if commentary is wired up
    pub async fn commentary_text(&self) -> Option<String> {
        match &self.commentary {
            Some(dispatcher) => Some(dispatcher.current_text().await),
            None => None,
        }
    }

    /// Add a team; blank names are ignored
    pub async fn create_team(&mut self, name: &str) -> Saved<Option<TeamId>> {
        let name = name.trim();
        if name.is_empty() {
            return Saved::new(None, Vec::new());
        }

        let team = Team::new(name);
        let id = team.id;
        self.teams.push(team);
        info!("Created team {}", name);

        let warnings = self.save_teams().await;
        Saved::new(Some(id), warnings)
    }

    /// Rename a team; blank names are ignored
    pub async fn rename_team(&mut self, id: TeamId, name: &str) -> Result<Saved<()>, SessionError> {
        let name = name.trim();
        let team = self.team(id).ok_or(SessionError::UnknownTeam)?;
        if name.is_empty() {
            return Ok(Saved::new((), Vec::new()));
        }

        let renamed = team.with_name(name);
        self.replace_team(renamed);

        Ok(Saved::new((), self.save_teams().await))
    }

    /// Append a player to a team; blank names are ignored
    pub async fn add_player(
        &mut self,
        team_id: TeamId,
        name: &str,
        photo: Option<String>,
    ) -> Result<Saved<Option<PlayerId>>, SessionError> {
        let team = self.team(team_id).ok_or(SessionError::UnknownTeam)?;
        let name = name.trim();
        if name.is_empty() {
            return Ok(Saved::new(None, Vec::new()));
        }

        let player = Player::new(name, photo);
        let id = player.id;
        let updated = team.with_player(player);
        info!("Added {} to {}", name, updated.name);
        self.replace_team(updated);

        Ok(Saved::new(Some(id), self.save_teams().await))
    }

    /// Validate a setup and make it the live match
    pub async fn start_match(&mut self, setup: &MatchSetup) -> Result<Saved<MatchId>, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::MatchInProgress);
        }

        let init = setup.validate(&self.teams)?;
        let started = scoring::start_match(&init);
        let id = started.id;

        info!(
            "Match {} started: {} batting, {} overs",
            id,
            self.team(init.batting_team_id)
                .map(|t| t.name.as_str())
                .unwrap_or("?"),
            init.total_overs
        );

        self.active = Some(started);
        let warnings = self.save_active().await;

        if let Some(dispatcher) = &self.commentary {
            dispatcher.announce(MATCH_START_TEXT).await;
        }

        Ok(Saved::new(id, warnings))
    }

    /// Score one delivery on the live match
    pub async fn score_delivery(
        &mut self,
        outcome: &DeliveryOutcome,
        wicket: Option<&WicketDetails>,
    ) -> Result<Saved<BallEvent>, SessionError> {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveMatch)?;
        let transition = scoring::apply_delivery(current, outcome, wicket)?;

        for delta in &transition.deltas {
            self.teams = self
                .teams
                .iter()
                .map(|t| {
                    t.with_players_mapped(|p| {
                        if p.id == delta.player_id {
                            p.with_delta(delta)
                        } else {
                            p.clone()
                        }
                    })
                })
                .collect();
        }

        let ball = transition.ball;
        let score = transition.next.score_label();
        self.active = Some(transition.next);

        let mut warnings = self.save_teams().await;
        warnings.extend(self.save_active().await);

        if let Some(dispatcher) = &self.commentary {
            let batter = self.player_name(ball.striker_id).unwrap_or("Batter").to_string();
            let bowler = self.player_name(ball.bowler_id).unwrap_or("Bowler").to_string();
            dispatcher
                .dispatch(
                    scoring::describe_delivery(outcome, wicket),
                    batter,
                    bowler,
                    score,
                )
                .await;
        }

        Ok(Saved::new(ball, warnings))
    }

    /// Put a bowling-side player on to bowl
    pub async fn change_bowler(&mut self, bowler_id: PlayerId) -> Result<Saved<()>, SessionError> {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveMatch)?;
        let on_bowling_side = self
            .team(current.bowling_team_id)
            .is_some_and(|t| t.has_player(bowler_id));
        if !on_bowling_side {
            return Err(ScoringError::UnknownPlayer("bowling").into());
        }

        self.active = Some(scoring::change_bowler(current, bowler_id)?);
        Ok(Saved::new((), self.save_active().await))
    }

    /// Batting-side players who have not yet been at either end
    pub fn available_batters(&self) -> Vec<&Player> {
        let Some(current) = &self.active else {
            return Vec::new();
        };
        let used = current.batters_used();

        self.team(current.batting_team_id)
            .map(|t| t.players.iter().filter(|p| !used.contains(&p.id)).collect())
            .unwrap_or_default()
    }

    /// Finish the live match (the caller has already confirmed).
    ///
    /// Every player on both sides is credited with a match, the match goes to
    /// the front of the history, and the active slot is cleared.
    pub async fn end_match(&mut self) -> Result<Saved<MatchSummary>, SessionError> {
        let current = self.active.as_ref().ok_or(SessionError::NoActiveMatch)?;
        let completed = scoring::complete(current)?;

        let sides = [completed.team_a_id, completed.team_b_id];
        self.teams = self
            .teams
            .iter()
            .map(|t| {
                if sides.contains(&t.id) {
                    t.with_players_mapped(Player::with_match_played)
                } else {
                    t.clone()
                }
            })
            .collect();

        self.history.insert(0, completed.clone());
        self.active = None;

        let mut warnings = self.save_active().await;
        if let Err(e) = self.store.save_history(&self.history).await {
            warnings.push(PersistWarning::from_error("match history", &e));
        }
        warnings.extend(self.save_teams().await);

        let scorecard = scoring::scorecard(&completed);
        info!(
            "Match {} completed at {} ({} overs)",
            completed.id,
            completed.score_label(),
            completed.overs_label()
        );

        Ok(Saved::new(
            MatchSummary {
                completed,
                scorecard,
            },
            warnings,
        ))
    }

    fn replace_team(&mut self, updated: Team) {
        for team in self.teams.iter_mut() {
            if team.id == updated.id {
                *team = updated;
                return;
            }
        }
    }

    async fn save_teams(&self) -> Vec<PersistWarning> {
        match self.store.save_teams(&self.teams).await {
            Ok(()) => Vec::new(),
            Err(e) => vec![PersistWarning::from_error("teams", &e)],
        }
    }

    async fn save_active(&self) -> Vec<PersistWarning> {
        match self.store.save_active_match(self.active.as_ref()).await {
            Ok(()) => Vec::new(),
            Err(e) => vec![PersistWarning::from_error("active match", &e)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use crate::models::{DismissedEnd, MatchStatus, WicketKind};
    use crate::scoring::fixtures::teams_and_setup;

    async fn memory_store(quota: u64) -> StateStore {
        StateStore::open("sqlite::memory:", quota).await.unwrap()
    }

    /// Session holding two squads of `size` with a valid setup ready to start
    async fn session_with_teams(size: usize) -> (ScoringSession, MatchSetup) {
        let store = memory_store(1 << 20).await;
        let (batting, bowling, setup) = teams_and_setup(size);
        store.save_teams(&[batting, bowling]).await.unwrap();

        let session = ScoringSession::load(store, None).await.unwrap();
        (session, setup)
    }

    #[tokio::test]
    async fn test_team_management() {
        let store = memory_store(1 << 20).await;
        let mut session = ScoringSession::load(store, None).await.unwrap();

        assert!(session.create_team("   ").await.value.is_none());
        let id = session.create_team("Lions").await.value.unwrap();

        session.rename_team(id, "Pride").await.unwrap();
        let added = session.add_player(id, "Root", None).await.unwrap();
        assert!(added.value.is_some());
        assert!(session.add_player(id, "", None).await.unwrap().value.is_none());

        let team = session.team(id).unwrap();
        assert_eq!(team.name, "Pride");
        assert_eq!(team.players.len(), 1);
        assert_eq!(team.players[0].stats, Default::default());

        let missing = session.add_player(uuid::Uuid::new_v4(), "X", None).await;
        assert_eq!(missing.unwrap_err(), SessionError::UnknownTeam);
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let store = memory_store(1 << 20).await;
        let (batting, bowling, setup) = teams_and_setup(3);
        store.save_teams(&[batting, bowling]).await.unwrap();

        let mut session = ScoringSession::load(store, None).await.unwrap();
        session.start_match(&setup).await.unwrap();
        session
            .score_delivery(&DeliveryOutcome::runs(4), None)
            .await
            .unwrap();

        let ScoringSession { store, .. } = session;
        let reloaded = ScoringSession::load(store, None).await.unwrap();

        let active = reloaded.active_match().unwrap();
        assert_eq!(active.score, 4);
        assert_eq!(reloaded.player_name(active.balls[0].striker_id), Some("Lions 1"));
        let striker = reloaded.teams()[0].player(active.balls[0].striker_id).unwrap();
        assert_eq!(striker.stats.runs, 4);
    }

    #[tokio::test]
    async fn test_only_one_live_match() {
        let (mut session, setup) = session_with_teams(3).await;

        session.start_match(&setup).await.unwrap();
        let err = session.start_match(&setup).await.unwrap_err();
        assert_eq!(err, SessionError::MatchInProgress);
    }

    #[tokio::test]
    async fn test_invalid_setup_is_reported() {
        let (mut session, setup) = session_with_teams(3).await;
        let bad = MatchSetup {
            non_striker_id: setup.striker_id,
            ..setup
        };

        let err = session.start_match(&bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Striker and Non-Striker must be different players.");
        assert!(session.active_match().is_none());
    }

    #[tokio::test]
    async fn test_delivery_updates_player_stats() {
        let (mut session, setup) = session_with_teams(3).await;
        session.start_match(&setup).await.unwrap();
        let striker = setup.striker_id.unwrap();
        let bowler = setup.bowler_id.unwrap();

        session
            .score_delivery(&DeliveryOutcome::runs(4), None)
            .await
            .unwrap();
        session
            .score_delivery(&DeliveryOutcome::wide(0), None)
            .await
            .unwrap();

        let batter = session.teams()[0].player(striker).unwrap();
        assert_eq!((batter.stats.runs, batter.stats.balls_faced), (4, 1));

        let bowler = session.teams()[1].player(bowler).unwrap();
        assert_eq!(bowler.stats.runs_conceded, 5);
        assert_eq!(bowler.stats.balls_bowled, 1);
        assert_eq!(bowler.stats.overs_bowled(), 1.0 / 6.0);
    }

    #[tokio::test]
    async fn test_wicket_flow_and_available_batters() {
        let (mut session, setup) = session_with_teams(4).await;
        session.start_match(&setup).await.unwrap();

        let available: Vec<_> = session.available_batters().iter().map(|p| p.id).collect();
        assert_eq!(available.len(), 2);

        let missing = WicketDetails {
            dismissed_end: DismissedEnd::Striker,
            wicket_kind: WicketKind::Lbw,
            replacement_id: None,
            fielder: None,
        };
        let err = session
            .score_delivery(&DeliveryOutcome::wicket(), Some(&missing))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Scoring(ScoringError::MissingReplacement));
        assert!(session.active_match().unwrap().balls.is_empty());

        let details = WicketDetails {
            replacement_id: Some(available[0]),
            ..missing
        };
        let ball = session
            .score_delivery(&DeliveryOutcome::wicket(), Some(&details))
            .await
            .unwrap()
            .value;

        assert_eq!(ball.dismissed_id, setup.striker_id);
        assert_eq!(session.active_match().unwrap().wickets, 1);
        assert_eq!(session.available_batters().len(), 1);

        let bowler = session.teams()[1].player(setup.bowler_id.unwrap()).unwrap();
        assert_eq!(bowler.stats.wickets, 1);
    }

    #[tokio::test]
    async fn test_change_bowler_requires_bowling_side() {
        let (mut session, setup) = session_with_teams(3).await;
        session.start_match(&setup).await.unwrap();

        let err = session.change_bowler(setup.striker_id.unwrap()).await;
        assert_eq!(
            err.unwrap_err(),
            SessionError::Scoring(ScoringError::UnknownPlayer("bowling"))
        );

        let next = session.teams()[1].players[1].id;
        session.change_bowler(next).await.unwrap();
        assert_eq!(session.active_match().unwrap().bowler_id, Some(next));
    }

    #[tokio::test]
    async fn test_end_match_lifecycle() {
        let (mut session, setup) = session_with_teams(3).await;
        session.start_match(&setup).await.unwrap();
        for runs in [1, 0, 4, 6, 1, 2, 3] {
            session
                .score_delivery(&DeliveryOutcome::runs(runs), None)
                .await
                .unwrap();
        }
        session
            .score_delivery(&DeliveryOutcome::no_ball(1), None)
            .await
            .unwrap();

        let summary = session.end_match().await.unwrap().value;
        let completed = &summary.completed;

        assert_eq!(completed.status, MatchStatus::Completed);
        assert!(completed.is_completed);
        assert!(session.active_match().is_none());
        assert_eq!(session.history()[0].id, completed.id);
        assert!(session
            .teams()
            .iter()
            .flat_map(|t| &t.players)
            .all(|p| p.stats.matches == 1));

        // scorecard agrees with the live player records
        for line in &summary.scorecard.batting {
            let player = session.teams()[0].player(line.player_id).unwrap();
            assert_eq!(line.runs, player.stats.runs);
            assert_eq!(line.balls, player.stats.balls_faced);
        }
        for line in &summary.scorecard.bowling {
            let player = session.teams()[1].player(line.player_id).unwrap();
            assert_eq!(line.runs, player.stats.runs_conceded);
            assert_eq!(line.balls, player.stats.balls_bowled);
        }
        assert_eq!(summary.scorecard.totals.score, completed.score);

        // nothing left to score or end
        let err = session
            .score_delivery(&DeliveryOutcome::runs(1), None)
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NoActiveMatch);
        assert_eq!(session.end_match().await.unwrap_err(), SessionError::NoActiveMatch);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_history_persists_newest_first() {
        let (mut session, setup) = session_with_teams(3).await;

        session.start_match(&setup).await.unwrap();
        let first = session.end_match().await.unwrap().value.completed.id;
        session.start_match(&setup).await.unwrap();
        let second = session.end_match().await.unwrap().value.completed.id;

        let ScoringSession { store, .. } = session;
        let ids: Vec<_> = store
            .load_history()
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
        assert!(store.load_active_match().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quota_failure_warns_but_keeps_state() {
        let store = memory_store(200).await;
        let mut session = ScoringSession::load(store, None).await.unwrap();
        let id = session.create_team("Lions").await.value.unwrap();

        let photo = format!("data:image/png;base64,{}", "A".repeat(500));
        let saved = session.add_player(id, "Root", Some(photo)).await.unwrap();

        assert_eq!(saved.warnings.len(), 1);
        assert_eq!(saved.warnings[0].message, QUOTA_WARNING);
        assert_eq!(session.team(id).unwrap().players.len(), 1);
    }

    #[tokio::test]
    async fn test_history_write_recovers_after_quota_failure() {
        let store = memory_store(64 * 1024).await;
        let (batting, bowling, setup) = teams_and_setup(3);
        store.save_teams(&[batting, bowling]).await.unwrap();
        let mut session = ScoringSession::load(store, None).await.unwrap();

        session.start_match(&setup).await.unwrap();
        session
            .score_delivery(&DeliveryOutcome::runs(2), None)
            .await
            .unwrap();

        // fill the store so only the cleared active slot frees any room
        let used = session.store.kv().used_bytes().await.unwrap();
        let filler = "x".repeat((64 * 1024 - used) as usize);
        session.store.kv().set("filler", &filler).await.unwrap();

        let first = session.end_match().await.unwrap();
        assert_eq!(first.warnings.len(), 1);
        assert_eq!(first.warnings[0].record, "match history");
        assert_eq!(first.warnings[0].message, QUOTA_WARNING);
        assert!(session.store.load_active_match().await.unwrap().is_none());

        session.store.kv().remove("filler").await.unwrap();
        session.start_match(&setup).await.unwrap();
        let second = session.end_match().await.unwrap();
        assert!(second.warnings.is_empty());

        let stored: Vec<_> = session
            .store
            .load_history()
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        let in_memory: Vec<_> = session.history().iter().map(|m| m.id).collect();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored, in_memory);
    }

    #[tokio::test]
    async fn test_commentary_is_dispatched() {
        use crate::api::CommentaryGenerator;
        use crate::workers::commentary::{commentary_channel, READY_TEXT};

        let store = memory_store(1 << 20).await;
        let (batting, bowling, setup) = teams_and_setup(3);
        store.save_teams(&[batting, bowling]).await.unwrap();

        let (dispatcher, _worker) = commentary_channel(CommentaryGenerator::unconfigured(), 4);
        let board = dispatcher.board();
        let mut session = ScoringSession::load(store, Some(dispatcher)).await.unwrap();
        assert_eq!(session.commentary_text().await.as_deref(), Some(READY_TEXT));

        session.start_match(&setup).await.unwrap();
        assert_eq!(
            session.commentary_text().await.as_deref(),
            Some(MATCH_START_TEXT)
        );

        session
            .score_delivery(&DeliveryOutcome::runs(6), None)
            .await
            .unwrap();
        // announce + one delivery request
        assert_eq!(board.read().await.current_seq(), 2);
    }
}
