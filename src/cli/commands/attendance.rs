use crate::cli::commands::{Workspace, print_json};
use crate::cli::parser::{AttendanceAction, Commands};
use crate::config::Config;
use crate::core::attendance::AttendanceLogic;
use crate::errors::AppResult;
use crate::models::attendance::AttendanceRecord;
use crate::ui::messages::{info, success, warning};
use crate::utils::formatting::{bold, fmt_distance, fmt_opt, fmt_ts, verdict_label};
use crate::utils::table::{Column, Table};

pub fn print_record(rec: &AttendanceRecord) {
    println!();
    println!("{}", bold(&format!("Attendance #{}", rec.id)));
    println!("  worker      : {}", rec.worker_id);
    println!("  zone        : {}", rec.zone_id);
    println!("  day         : {}", rec.check_in_date);
    println!(
        "  check-in    : {}  {}  {}",
        fmt_ts(Some(&rec.check_in_time)),
        verdict_label(rec.check_in_verdict),
        fmt_distance(rec.check_in_distance)
    );
    match rec.check_out_verdict {
        Some(v) => println!(
            "  check-out   : {}  {}  {}",
            fmt_ts(rec.check_out_time.as_ref()),
            verdict_label(v),
            fmt_distance(rec.check_out_distance)
        ),
        None => println!("  check-out   : {}", fmt_ts(None)),
    }
    if let Some(minutes) = rec.work_duration_minutes {
        println!("  worked      : {}h {:02}m", minutes / 60, minutes % 60);
    }
    println!("  status      : {}", verdict_label(rec.verification_status));
    if let Some(note) = &rec.review_note {
        println!("  review note : {}", note);
    }
    if rec.is_manual_entry {
        println!(
            "  manual entry: {}",
            rec.manual_reason.as_deref().unwrap_or_default()
        );
    }
    println!("  reviewer    : {}", fmt_opt(rec.reviewer_id));
    println!();
}

fn print_list(records: &[AttendanceRecord]) {
    let mut table = Table::new(vec![
        Column::new("ID", 6),
        Column::new("DAY", 10),
        Column::new("ZONE", 6),
        Column::new("IN", 8),
        Column::new("OUT", 8),
        Column::new("DIST", 8),
        Column::new("STATUS", 12),
    ]);

    for r in records {
        let dist = r.rejection_distance().or(r.check_in_distance);
        table.add_row(vec![
            r.id.to_string(),
            r.check_in_date.to_string(),
            r.zone_id.to_string(),
            r.check_in_time.format("%H:%M").to_string(),
            r.check_out_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--".into()),
            fmt_distance(dist),
            verdict_label(r.verification_status),
        ]);
    }
    print!("{}", table.render());
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Attendance { action } = cmd else {
        return Ok(());
    };
    let mut ws = Workspace::open(cfg)?;

    match action {
        AttendanceAction::Manual {
            worker,
            zone,
            reviewer,
            reason,
        } => {
            let rec =
                AttendanceLogic::record_manual(&mut ws.ctx(), *worker, *zone, *reviewer, reason)?;
            success(format!(
                "Manual attendance #{} recorded for worker {}; it awaits confirmation.",
                rec.id, rec.worker_id
            ));
        }
        AttendanceAction::Approve { id, reviewer, note } => {
            let rec =
                AttendanceLogic::manual_approve(&mut ws.ctx(), *id, *reviewer, note.as_deref())?;
            success(format!("Attendance #{} verified by reviewer {}.", rec.id, reviewer));
        }
        AttendanceAction::Reject {
            id,
            reviewer,
            reason,
        } => {
            let rec = AttendanceLogic::manual_reject(&mut ws.ctx(), *id, *reviewer, reason)?;
            warning(format!(
                "Attendance #{} rejected by reviewer {}: {}",
                rec.id,
                reviewer,
                reason.trim()
            ));
        }
        AttendanceAction::Show { id, json } => {
            let rec = AttendanceLogic::get(&ws.pool.conn, *id)?;
            if *json {
                print_json(&rec)?;
            } else {
                print_record(&rec);
            }
        }
        AttendanceAction::List { worker, json } => {
            let records = AttendanceLogic::list_for_worker(&ws.pool.conn, *worker)?;
            if *json {
                print_json(&records)?;
            } else if records.is_empty() {
                info(format!("No attendance records for worker {}.", worker));
            } else {
                print_list(&records);
            }
        }
    }

    Ok(())
}
