use crate::cli::commands::{Workspace, print_json};
use crate::cli::parser::{Commands, TaskAction};
use crate::config::Config;
use crate::core::task::TaskLogic;
use crate::errors::AppResult;
use crate::models::position::LatLng;
use crate::models::task::{Task, TaskStatus};
use crate::models::verdict::Verdict;
use crate::ui::messages::{info, success, warning};
use crate::utils::formatting::{
    bold, fmt_distance, fmt_opt, fmt_ts, task_status_label, truncate, verdict_label,
};
use crate::utils::table::{Column, Table};

pub fn print_task(t: &Task) {
    println!();
    println!("{}", bold(&format!("Task #{}: {}", t.id, t.title)));
    println!("  worker     : {}", t.assigned_worker_id);
    println!("  zone       : {}", fmt_opt(t.zone_id));
    if let Some(p) = t.target {
        println!("  target     : {:.6}, {:.6}", p.lat, p.lng);
    }
    println!("  status     : {}", task_status_label(t.status));
    if let Some(v) = t.completion_verdict {
        let warn = if t.distance_warning { " (far from target)" } else { "" };
        println!(
            "  location   : {}  {}{}",
            verdict_label(v),
            fmt_distance(t.completion_distance),
            warn
        );
    }
    if let Some(reason) = &t.rejection_reason {
        println!("  rejection  : {}", reason);
    }
    println!("  created    : {}", fmt_ts(Some(&t.created_at)));
    println!("  started    : {}", fmt_ts(t.started_at.as_ref()));
    println!("  completed  : {}", fmt_ts(t.completed_at.as_ref()));
    println!("  resolved   : {}", fmt_ts(t.resolved_at.as_ref()));
    println!("  reviewer   : {}", fmt_opt(t.reviewer_id));
    println!();
}

fn print_list(tasks: &[Task]) {
    let mut table = Table::new(vec![
        Column::new("ID", 6),
        Column::new("TITLE", 30),
        Column::new("ZONE", 6),
        Column::new("STATUS", 12),
        Column::new("DIST", 8),
    ]);
    for t in tasks {
        table.add_row(vec![
            t.id.to_string(),
            truncate(&t.title, 30),
            fmt_opt(t.zone_id),
            task_status_label(t.status),
            fmt_distance(t.completion_distance),
        ]);
    }
    print!("{}", table.render());
}

fn report_completion(t: &Task) {
    match t.completion_verdict {
        Some(Verdict::Rejected) => warning(format!(
            "Task #{} completed, but the location was rejected: {}. \
             A reviewer will decide; you can contest it with `fieldcheck appeal open task {}`.",
            t.id,
            t.rejection_reason.as_deref().unwrap_or("geolocation mismatch"),
            t.id
        )),
        Some(Verdict::PendingManualReview) => warning(format!(
            "Task #{} completed; location confidence is low and a reviewer has been notified.",
            t.id
        )),
        _ => success(format!("Task #{} completed.", t.id)),
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Task { action } = cmd else {
        return Ok(());
    };
    let mut ws = Workspace::open(cfg)?;

    match action {
        TaskAction::Create {
            title,
            worker,
            zone,
            target_lat,
            target_lng,
            by,
        } => {
            let target = match (target_lat, target_lng) {
                (Some(lat), Some(lng)) => Some(LatLng::new(*lat, *lng)),
                _ => None,
            };
            let t = TaskLogic::create(&mut ws.ctx(), title, *worker, *zone, target, *by)?;
            success(format!("Task #{} created for worker {}.", t.id, worker));
        }
        TaskAction::Start { id, worker } => {
            let t = TaskLogic::start(&mut ws.ctx(), *id, *worker)?;
            success(format!("Task #{} started.", t.id));
        }
        TaskAction::Complete {
            id,
            worker,
            position,
        } => {
            let t = TaskLogic::complete(&mut ws.ctx(), *id, *worker, (*position).into())?;
            report_completion(&t);
        }
        TaskAction::Approve {
            id,
            reviewer,
            notes,
        } => {
            let t = TaskLogic::approve(&mut ws.ctx(), *id, *reviewer, notes.as_deref())?;
            success(format!("Task #{} approved.", t.id));
        }
        TaskAction::Reject {
            id,
            reviewer,
            reason,
        } => {
            let t = TaskLogic::reject(&mut ws.ctx(), *id, *reviewer, reason)?;
            success(format!("Task #{} rejected.", t.id));
        }
        TaskAction::Cancel { id, by } => {
            let t = TaskLogic::cancel(&mut ws.ctx(), *id, *by)?;
            success(format!("Task #{} cancelled.", t.id));
        }
        TaskAction::Reassign { id, to, by } => {
            let t = TaskLogic::reassign(&mut ws.ctx(), *id, *to, *by)?;
            success(format!(
                "Task #{} reassigned to worker {} ({}).",
                t.id,
                t.assigned_worker_id,
                TaskStatus::Pending.to_db_str()
            ));
        }
        TaskAction::Show { id, json } => {
            let t = TaskLogic::get(&ws.pool.conn, *id)?;
            if *json {
                print_json(&t)?;
            } else {
                print_task(&t);
            }
        }
        TaskAction::List { worker, json } => {
            let tasks = TaskLogic::list_for_worker(&ws.pool.conn, *worker)?;
            if *json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                info(format!("No tasks assigned to worker {}.", worker));
            } else {
                print_list(&tasks);
            }
        }
    }

    Ok(())
}
