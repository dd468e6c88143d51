use crate::cli::commands::Workspace;
use crate::cli::commands::attendance::print_record;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::attendance::AttendanceLogic;
use crate::errors::AppResult;
use crate::models::attendance::AttendanceRecord;
use crate::models::verdict::Verdict;
use crate::ui::messages::{success, warning};

/// A rejected or unverified fix is still a recorded action, not a failure.
fn report(rec: &AttendanceRecord, verdict: Verdict, what: &str) {
    match verdict {
        Verdict::Verified => success(format!("{} recorded (record #{})", what, rec.id)),
        Verdict::Rejected => warning(format!(
            "{} recorded (record #{}) but the location was rejected; it needs review. \
             You can contest it with `fieldcheck appeal open attendance {}`.",
            what, rec.id, rec.id
        )),
        Verdict::PendingManualReview => warning(format!(
            "{} recorded (record #{}); location confidence is low, a reviewer will confirm it.",
            what, rec.id
        )),
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Checkin {
            worker,
            zone,
            position,
        } => {
            let mut ws = Workspace::open(cfg)?;
            let rec = AttendanceLogic::check_in(&mut ws.ctx(), *worker, *zone, (*position).into())?;
            report(&rec, rec.check_in_verdict, "Check-in");
            print_record(&rec);
        }
        Commands::Checkout { id, position } => {
            let mut ws = Workspace::open(cfg)?;
            let rec = AttendanceLogic::check_out(&mut ws.ctx(), *id, (*position).into())?;
            let verdict = rec.check_out_verdict.unwrap_or(rec.verification_status);
            report(&rec, verdict, "Check-out");
            print_record(&rec);
        }
        _ => {}
    }
    Ok(())
}
