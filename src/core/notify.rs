//! Fire-and-forget notification delivery.

use crate::db::pool::DbPool;
use crate::db::queries::notifications::insert_notification;
use crate::errors::AppResult;
use crate::models::notification::Notification;

pub trait Notifier {
    fn notify(&self, n: &Notification) -> AppResult<()>;
}

/// Writes notifications to the `notifications` outbox table through its own
/// connection, so delivery never shares a transaction with the workflow.
pub struct OutboxNotifier {
    pool: DbPool,
}

impl OutboxNotifier {
    pub fn open(db_path: &str, busy_timeout_ms: u64) -> AppResult<Self> {
        Ok(Self {
            pool: DbPool::with_busy_timeout(db_path, busy_timeout_ms)?,
        })
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, n: &Notification) -> AppResult<()> {
        insert_notification(&self.pool.conn, n)
    }
}
