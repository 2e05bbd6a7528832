use std::process::ExitCode;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_scorer::config::Config;
use cricket_scorer::db::StateStore;
use cricket_scorer::scoring::verify;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audit_history=info,cricket_scorer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = StateStore::open(&config.database_url, config.storage_quota_bytes).await?;

    info!(
        "Storage in use: {} of {} bytes",
        store.kv().used_bytes().await?,
        config.storage_quota_bytes
    );

    let history = store.load_history().await?;
    info!("Auditing {} completed matches", history.len());

    let mut total_runs = 0u64;
    let mut total_balls = 0u64;
    let mut mismatched = 0usize;

    for m in &history {
        match verify(m) {
            Ok(totals) => {
                total_runs += u64::from(totals.score);
                total_balls += u64::from(totals.legal_balls);
            }
            Err(e) => {
                mismatched += 1;
                error!("Match {} ({}): {}", m.id, m.date.format("%Y-%m-%d"), e);
            }
        }

        if !m.is_completed {
            warn!("Match {} is in history but not marked completed", m.id);
        }
    }

    if let Some(active) = store.load_active_match().await? {
        info!(
            "Live match {} at {} ({} ov)",
            active.id,
            active.score_label(),
            active.overs_label()
        );
    }

    info!(
        "Done: {} runs off {} legal balls across {} matches, {} mismatched",
        total_runs,
        total_balls,
        history.len(),
        mismatched
    );

    Ok(if mismatched == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
