use crate::cli::commands::{Workspace, parse_entity, print_json};
use crate::cli::parser::{AppealAction, Commands};
use crate::config::Config;
use crate::core::appeal::{AppealLogic, AppealRequest};
use crate::errors::AppResult;
use crate::models::appeal::Appeal;
use crate::models::position::LatLng;
use crate::ui::messages::{info, success};
use crate::utils::formatting::{appeal_status_label, bold, fmt_distance, fmt_opt, fmt_ts, truncate};
use crate::utils::table::{Column, Table};

fn fmt_coords(p: LatLng) -> String {
    format!("{:.6}, {:.6}", p.lat, p.lng)
}

pub fn print_appeal(a: &Appeal) {
    println!();
    println!("{}", bold(&format!("Appeal #{} on {}", a.id, a.entity)));
    println!("  worker      : {}", a.worker_id);
    println!("  status      : {}", appeal_status_label(a.status));
    println!("  distance    : {}", fmt_distance(a.distance_meters));
    println!("  reported at : {}", fmt_opt(a.worker_position.map(fmt_coords)));
    println!("  expected at : {}", fmt_opt(a.expected_position.map(fmt_coords)));
    println!("  explanation : {}", a.worker_explanation);
    if let Some(photo) = &a.evidence_photo_ref {
        println!("  evidence    : {}", photo);
    }
    if let Some(reason) = &a.original_rejection_reason {
        println!("  rejected for: {}", reason);
    }
    println!("  submitted   : {}", fmt_ts(Some(&a.submitted_at)));
    println!("  reviewer    : {}", fmt_opt(a.reviewer_id));
    println!("  notes       : {}", fmt_opt(a.review_notes.as_deref()));
    println!("  resolved    : {}", fmt_ts(a.resolved_at.as_ref()));
    println!();
}

pub fn print_list(appeals: &[Appeal]) {
    let mut table = Table::new(vec![
        Column::new("ID", 5),
        Column::new("RECORD", 16),
        Column::new("WORKER", 7),
        Column::new("DIST", 8),
        Column::new("STATUS", 9),
        Column::new("SUBMITTED", 16),
        Column::new("EXPLANATION", 32),
    ]);
    for a in appeals {
        table.add_row(vec![
            a.id.to_string(),
            a.entity.to_string(),
            a.worker_id.to_string(),
            fmt_distance(a.distance_meters),
            appeal_status_label(a.status),
            a.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
            truncate(&a.worker_explanation, 32),
        ]);
    }
    print!("{}", table.render());
}

fn list_or_json(appeals: &[Appeal], json: bool, empty_msg: &str) -> AppResult<()> {
    if json {
        print_json(appeals)?;
    } else if appeals.is_empty() {
        info(empty_msg);
    } else {
        print_list(appeals);
    }
    Ok(())
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Appeal { action } = cmd else {
        return Ok(());
    };
    let mut ws = Workspace::open(cfg)?;

    match action {
        AppealAction::Open {
            kind,
            id,
            worker,
            explanation,
            distance,
            photo,
        } => {
            let req = AppealRequest {
                entity: parse_entity(kind, *id)?,
                worker_id: *worker,
                explanation: explanation.clone(),
                distance_meters: *distance,
                evidence_photo_ref: photo.clone(),
            };
            let a = AppealLogic::open(&mut ws.ctx(), req)?;
            success(format!("Appeal #{} submitted for {}.", a.id, a.entity));
        }
        AppealAction::Approve {
            id,
            reviewer,
            notes,
        } => {
            let a = AppealLogic::approve(&mut ws.ctx(), *id, *reviewer, notes.as_deref())?;
            success(format!("Appeal #{} approved; {} reinstated.", a.id, a.entity));
        }
        AppealAction::Reject {
            id,
            reviewer,
            notes,
        } => {
            let a = AppealLogic::reject(&mut ws.ctx(), *id, *reviewer, notes)?;
            success(format!(
                "Appeal #{} rejected; the rejection of {} stands.",
                a.id, a.entity
            ));
        }
        AppealAction::Pending { json } => {
            let appeals = AppealLogic::pending(&ws.pool.conn)?;
            list_or_json(&appeals, *json, "No pending appeals.")?;
        }
        AppealAction::Mine { worker, json } => {
            let appeals = AppealLogic::for_worker(&ws.pool.conn, *worker)?;
            list_or_json(
                &appeals,
                *json,
                &format!("Worker {} has not filed any appeal.", worker),
            )?;
        }
        AppealAction::Show { id, json } => {
            let a = AppealLogic::get(&ws.pool.conn, *id)?;
            if *json {
                print_json(&a)?;
            } else {
                print_appeal(&a);
            }
        }
    }

    Ok(())
}
