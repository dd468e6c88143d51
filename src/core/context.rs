//! Everything a workflow operation needs, handed in explicitly.

use crate::core::notify::Notifier;
use crate::core::verification::Thresholds;
use crate::core::zones::ZoneSource;
use crate::db::pool::DbPool;
use crate::db::queries::audit::{AuditEntry, insert_audit};
use crate::errors::AppResult;
use crate::models::notification::Notification;
use rusqlite::Transaction;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Municipality settings consumed by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    pub thresholds: Thresholds,
    /// Recorded distance a rejection must exceed to be appealable.
    /// `None` falls back to the distance ceiling.
    pub appeal_eligibility_distance_meters: Option<f64>,
}

impl WorkflowSettings {
    pub fn appeal_min_distance(&self) -> f64 {
        self.appeal_eligibility_distance_meters
            .unwrap_or(self.thresholds.max_acceptable_distance_meters)
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            appeal_eligibility_distance_meters: None,
        }
    }
}

/// Side effects produced inside a transaction and delivered after it commits.
#[derive(Debug, Default)]
pub struct Effects {
    audit: Vec<AuditEntry>,
    notifications: Vec<Notification>,
}

impl Effects {
    pub fn audit(&mut self, entry: AuditEntry) {
        self.audit.push(entry);
    }

    pub fn notify(&mut self, n: Notification) {
        self.notifications.push(n);
    }
}

pub struct FieldContext<'a> {
    pub pool: &'a mut DbPool,
    pub zones: &'a dyn ZoneSource,
    pub settings: WorkflowSettings,
    pub notifier: &'a dyn Notifier,
}

impl<'a> FieldContext<'a> {
    pub fn new(
        pool: &'a mut DbPool,
        zones: &'a dyn ZoneSource,
        settings: WorkflowSettings,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            pool,
            zones,
            settings,
            notifier,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.settings.thresholds
    }

    /// Run `func` as one atomic unit, then deliver its audit entries and
    /// notifications. Delivery failures are logged and never undo the commit.
    pub fn transact<T, F>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>, &mut Effects) -> AppResult<T>,
    {
        let mut effects = Effects::default();
        let out = self.pool.with_tx(|tx| func(tx, &mut effects))?;
        self.deliver(effects);
        Ok(out)
    }

    fn deliver(&self, effects: Effects) {
        for entry in &effects.audit {
            if let Err(e) = insert_audit(&self.pool.conn, entry) {
                warn!(
                    entity = %entry.entity,
                    operation = entry.operation,
                    error = %e,
                    "audit write failed"
                );
            }
        }

        for n in &effects.notifications {
            if let Err(e) = self.notifier.notify(n) {
                warn!(
                    entity = %n.entity,
                    kind = n.kind.to_db_str(),
                    error = %e,
                    "notification failed"
                );
            }
        }
    }
}
