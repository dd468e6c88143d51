use crate::db::log::list_admin_events;
use crate::db::pool::DbPool;
use crate::db::queries::audit::AuditRecord;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;

const MAX_OP_WIDTH: usize = 60;

fn strip_ansi(s: &str) -> String {
    match Regex::new(r"\x1B\[[0-9;]*[mK]") {
        Ok(re) => re.replace_all(s, "").into_owned(),
        Err(_) => s.to_string(),
    }
}

/// ANSI colour of an operation name in the internal log and the audit trail.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "init" => Colour::RGB(255, 153, 51),
        "migration_applied" | "config_migrate" => Colour::Purple,
        "vacuum" => Colour::Blue,
        "check_in" | "create" | "start" => Colour::Green,
        "check_out" | "complete" => Colour::Cyan,
        "approve" | "manual_approve" | "appeal_cascade" => Colour::Green,
        "reject" | "cancel" => Colour::Red,
        other if other.starts_with("appeal_") => Colour::Yellow,
        _ => Colour::White,
    }
}

/// Colour the first word, truncate the visible text, return it with its padding.
fn paint_op(op_target: &str, width: usize) -> (String, String) {
    let visible = if op_target.chars().count() > width {
        let mut s = op_target.chars().take(width.saturating_sub(3)).collect::<String>();
        s.push_str("...");
        s
    } else {
        op_target.to_string()
    };

    let painted = match visible.split_once(' ') {
        Some((word, rest)) => format!("{} {}", color_for_operation(word).paint(word), rest),
        None => color_for_operation(&visible).paint(visible.as_str()).to_string(),
    };

    let padding = " ".repeat(width.saturating_sub(strip_ansi(&painted).chars().count()));
    (painted, padding)
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &mut DbPool) -> AppResult<()> {
        let entries: Vec<(i64, String, String, String)> = list_admin_events(&pool.conn)?
            .into_iter()
            .map(|e| {
                let date = chrono::DateTime::parse_from_rfc3339(&e.date)
                    .map(|dt| dt.format("%FT%T%:z").to_string())
                    .unwrap_or(e.date);
                let op_target = if e.target.is_empty() {
                    e.operation
                } else {
                    format!("{} ({})", e.operation, e.target)
                };
                (e.id, date, op_target, e.message)
            })
            .collect();

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let op_w = entries
            .iter()
            .map(|(_, _, op, _)| op.chars().count())
            .max()
            .unwrap_or(10)
            .min(MAX_OP_WIDTH);
        let id_w = entries
            .iter()
            .map(|(id, _, _, _)| id.to_string().len())
            .max()
            .unwrap_or(1);
        let date_w = entries
            .iter()
            .map(|(_, date, _, _)| date.len())
            .max()
            .unwrap_or(10);

        println!("📜 Internal log:\n");

        for (id, date, op_target, message) in entries {
            let (painted, padding) = paint_op(&op_target, op_w);
            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                id,
                date,
                painted,
                padding,
                message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }

    /// Audit trail of one entity, same layout as the internal log.
    pub fn print_audit(entries: &[AuditRecord]) {
        if entries.is_empty() {
            println!("   (no audit entries)");
            return;
        }

        let op_w = entries
            .iter()
            .map(|e| e.operation.chars().count())
            .max()
            .unwrap_or(10)
            .min(MAX_OP_WIDTH);

        for e in entries {
            let (painted, padding) = paint_op(&e.operation, op_w);
            let transition = match &e.old_state {
                Some(old) => format!("{} -> {}", old, e.new_state),
                None => e.new_state.clone(),
            };
            println!(
                "   {} | {}{} | actor {:<6} | {} | {}",
                e.recorded_at.format("%FT%T"),
                painted,
                padding,
                e.actor_id,
                transition,
                e.message
            );
        }
    }
}
