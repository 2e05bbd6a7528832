use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use super::kv::KvStore;
use crate::error::StoreError;
use crate::models::{Match, Team};

pub const TEAMS_KEY: &str = "teams";
pub const ACTIVE_MATCH_KEY: &str = "active_match";
pub const HISTORY_KEY: &str = "match_history";

/// Typed access to the three persisted records
pub struct StateStore {
    kv: KvStore,
}

impl StateStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Open a SQLite-backed state store
    pub async fn open(database_url: &str, quota_bytes: u64) -> Result<Self, StoreError> {
        let kv = KvStore::new(database_url, quota_bytes).await?;
        Ok(Self::new(kv))
    }

    pub async fn load_teams(&self) -> Result<Vec<Team>, StoreError> {
        Ok(self.read(TEAMS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_teams(&self, teams: &[Team]) -> Result<(), StoreError> {
        self.write(TEAMS_KEY, &teams).await
    }

    pub async fn load_active_match(&self) -> Result<Option<Match>, StoreError> {
        self.read(ACTIVE_MATCH_KEY).await
    }

    /// Store the live match, or clear the slot with `None`
    pub async fn save_active_match(&self, active: Option<&Match>) -> Result<(), StoreError> {
        match active {
            Some(m) => self.write(ACTIVE_MATCH_KEY, m).await,
            None => self.kv.remove(ACTIVE_MATCH_KEY).await,
        }
    }

    /// Completed matches, newest first
    pub async fn load_history(&self) -> Result<Vec<Match>, StoreError> {
        Ok(self.read(HISTORY_KEY).await?.unwrap_or_default())
    }

    /// Replace the stored history (newest first)
    pub async fn save_history(&self, history: &[Match]) -> Result<(), StoreError> {
        self.write(HISTORY_KEY, history).await?;

        info!("Match history saved ({} total)", history.len());
        Ok(())
    }

    /// Direct access to the underlying store
    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable {} record: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw).await
    }
}
