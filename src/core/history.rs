use crate::db::queries::appeals::list_appeals_for_entity;
use crate::db::queries::attendance::get_attendance;
use crate::db::queries::audit::{AuditRecord, list_audit_for_entity};
use crate::db::queries::tasks::get_task;
use crate::db::queries::verifications::list_history;
use crate::errors::AppResult;
use crate::models::appeal::{Appeal, EntityRef};
use crate::models::verification::VerificationEntry;
use rusqlite::Connection;
use serde::Serialize;

/// Everything recorded about one attendance record or task.
#[derive(Debug, Serialize)]
pub struct EntityHistory {
    pub entity: EntityRef,
    pub verifications: Vec<VerificationEntry>,
    pub appeals: Vec<Appeal>,
    pub audit: Vec<AuditRecord>,
}

pub struct HistoryLogic;

impl HistoryLogic {
    pub fn load(conn: &Connection, entity: EntityRef) -> AppResult<EntityHistory> {
        // Unknown ids are an error, not an empty history.
        match entity {
            EntityRef::Attendance(id) => {
                get_attendance(conn, id)?;
            }
            EntityRef::Task(id) => {
                get_task(conn, id)?;
            }
        }

        Ok(EntityHistory {
            entity,
            verifications: list_history(conn, &entity)?,
            appeals: list_appeals_for_entity(conn, &entity)?,
            audit: list_audit_for_entity(conn, &entity)?,
        })
    }

    /// Verdict trail only.
    pub fn verdicts(conn: &Connection, entity: EntityRef) -> AppResult<Vec<VerificationEntry>> {
        list_history(conn, &entity)
    }
}
