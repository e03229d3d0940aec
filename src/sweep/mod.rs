//! Batched deletion of expired mailboxes and their messages.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

/// Sweep policy, passed in at construction so tests can vary it per run.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Upper bound on mailboxes selected per invocation. A mailbox that is
    /// not reached this tick stays selectable and is finished on a later one.
    pub batch_size: u32,
    /// When set, expired mailboxes keep their row and only their messages
    /// are purged; the address simply stops accumulating mail.
    pub retain_expired_mailboxes: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            batch_size: 100,
            retain_expired_mailboxes: false,
        }
    }
}

/// Row counts removed by one sweep invocation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub mailboxes_deleted: u64,
    pub messages_deleted: u64,
}

/// Delete up to `batch_size` mailboxes expired at or before `now`, messages
/// first.
///
/// Children-first ordering is the safety bias: an interruption between the
/// two deletes leaves mailboxes that the next tick re-selects, never message
/// rows without a mailbox. Deleting zero rows in either step is a no-op, so
/// rerunning after a failed or partial cycle is always safe.
pub async fn run_sweep(
    pool: &SqlitePool,
    config: &SweepConfig,
    now: DateTime<Utc>,
) -> Result<SweepReport, sqlx::Error> {
    let expired: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM mailboxes WHERE expires_at <= ? LIMIT ?")
            .bind(now)
            .bind(i64::from(config.batch_size))
            .fetch_all(pool)
            .await?;

    if expired.is_empty() {
        debug!("sweep: no expired mailboxes");
        return Ok(SweepReport::default());
    }

    let mut delete_messages: QueryBuilder<Sqlite> =
        QueryBuilder::new("DELETE FROM messages WHERE mailbox_id IN (");
    let mut ids = delete_messages.separated(", ");
    for id in &expired {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
    let messages_deleted = delete_messages.build().execute(pool).await?.rows_affected();

    let mailboxes_deleted = if config.retain_expired_mailboxes {
        0
    } else {
        let mut delete_mailboxes: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM mailboxes WHERE id IN (");
        let mut ids = delete_mailboxes.separated(", ");
        for id in &expired {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        delete_mailboxes.build().execute(pool).await?.rows_affected()
    };

    info!("sweep removed {mailboxes_deleted} mailboxes and {messages_deleted} messages");
    Ok(SweepReport {
        mailboxes_deleted,
        messages_deleted,
    })
}
