use crate::cli::commands::appeal::print_list as print_appeals;
use crate::cli::commands::{Workspace, parse_entity, print_json};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::history::HistoryLogic;
use crate::core::log::LogLogic;
use crate::errors::AppResult;
use crate::models::verification::VerificationEntry;
use crate::ui::messages::header;
use crate::utils::formatting::{fmt_distance, fmt_opt, verdict_label};
use crate::utils::table::{Column, Table};

fn print_verdicts(entries: &[VerificationEntry]) {
    if entries.is_empty() {
        println!("   (no verification results)");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("WHEN", 19),
        Column::new("PHASE", 13),
        Column::new("VERDICT", 12),
        Column::new("DIST", 8),
        Column::new("ACC", 6),
        Column::new("BY", 6),
        Column::new("NOTE", 30),
    ]);
    for e in entries {
        table.add_row(vec![
            e.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.phase.to_db_str().to_string(),
            verdict_label(e.verdict),
            fmt_distance(e.distance_meters),
            fmt_opt(e.accuracy_meters.map(|a| format!("{:.0}", a))),
            e.actor_id.to_string(),
            fmt_opt(e.note.as_deref()),
        ]);
    }
    print!("{}", table.render());
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::History { kind, id, json } = cmd else {
        return Ok(());
    };

    let entity = parse_entity(kind, *id)?;
    let ws = Workspace::open(cfg)?;
    let history = HistoryLogic::load(&ws.pool.conn, entity)?;

    if *json {
        return print_json(&history);
    }

    header(format!("History of {}", history.entity));
    println!("Verification results:");
    print_verdicts(&history.verifications);
    println!();

    println!("Appeals:");
    if history.appeals.is_empty() {
        println!("   (no appeals)");
    } else {
        print_appeals(&history.appeals);
    }
    println!();

    println!("Audit trail:");
    LogLogic::print_audit(&history.audit);
    println!();

    Ok(())
}
