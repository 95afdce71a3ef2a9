//! Periodic background sweeps: expired device tokens and stale read
//! notifications. Eventually consistent scan-then-mutate — no transaction
//! spans a whole sweep, and a failed cycle just waits for the next tick.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tokio::time::{sleep, Duration as TokioDuration};
use tracing::{error, info};

use crate::state::AppState;

const SWEEP_INTERVAL_MINUTES: u64 = 15;
const READ_NOTIFICATION_RETENTION_DAYS: i64 = 30;

pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let interval = TokioDuration::from_secs(SWEEP_INTERVAL_MINUTES * 60);
        loop {
            if let Err(err) = run_sweep_cycle(&state.db).await {
                error!("maintenance sweep failed: {err:#}");
            }
            sleep(interval).await;
        }
    });
}

async fn run_sweep_cycle(pool: &PgPool) -> Result<()> {
    let expired_tokens = cleanup_expired_tokens(pool).await?;
    let purged_notifications = purge_read_notifications(pool).await?;

    if expired_tokens > 0 || purged_notifications > 0 {
        info!(expired_tokens, purged_notifications, "maintenance sweep completed");
    }
    Ok(())
}

async fn cleanup_expired_tokens(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM device_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await
        .context("failed to delete expired device tokens")?;
    Ok(result.rows_affected())
}

async fn purge_read_notifications(pool: &PgPool) -> Result<u64> {
    let cutoff = Utc::now() - Duration::days(READ_NOTIFICATION_RETENTION_DAYS);
    let result =
        sqlx::query("DELETE FROM notifications WHERE is_read = TRUE AND created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await
            .context("failed to purge read notifications")?;
    Ok(result.rows_affected())
}
