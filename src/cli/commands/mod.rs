pub mod appeal;
pub mod attendance;
pub mod checkin;
pub mod config;
pub mod db;
pub mod history;
pub mod init;
pub mod log;
pub mod task;

use crate::cli::parser::PositionArgs;
use crate::config::Config;
use crate::core::context::{FieldContext, WorkflowSettings};
use crate::core::notify::OutboxNotifier;
use crate::core::zones::load_zone_file;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::appeal::{EntityKind, EntityRef};
use crate::models::position::Position;
use crate::models::zone::Zone;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Everything a workflow command needs, opened from the configuration.
pub struct Workspace {
    pub pool: DbPool,
    zones: HashMap<i64, Zone>,
    notifier: OutboxNotifier,
    settings: WorkflowSettings,
}

impl Workspace {
    pub fn open(cfg: &Config) -> AppResult<Self> {
        let pool = DbPool::with_busy_timeout(&cfg.database, cfg.busy_timeout_ms)?;
        init_db(&pool.conn)?;

        Ok(Self {
            zones: load_zone_file(Path::new(&cfg.zones_file))?,
            notifier: OutboxNotifier::open(&cfg.database, cfg.busy_timeout_ms)?,
            settings: cfg.settings(),
            pool,
        })
    }

    pub fn ctx(&mut self) -> FieldContext<'_> {
        FieldContext::new(&mut self.pool, &self.zones, self.settings, &self.notifier)
    }
}

impl From<PositionArgs> for Position {
    fn from(p: PositionArgs) -> Self {
        Position::new(p.lat, p.lng, p.accuracy)
    }
}

pub(crate) fn parse_entity(kind: &str, id: i64) -> AppResult<EntityRef> {
    let kind = EntityKind::from_code(kind).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown record kind '{}'. Use 'attendance' or 'task'.",
            kind
        ))
    })?;
    Ok(EntityRef::new(kind, id))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Other(format!("JSON serialization failed: {}", e)))?;
    println!("{}", out);
    Ok(())
}
