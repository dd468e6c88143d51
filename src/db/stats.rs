use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RED, RESET, YELLOW, missing};
use rusqlite::OptionalExtension;
use std::fs;

fn count(pool: &DbPool, sql: &str) -> rusqlite::Result<i64> {
    pool.conn.query_row(sql, [], |row| row.get(0))
}

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) RECORD COUNTS
    //
    let attendance = count(pool, "SELECT COUNT(*) FROM attendance")?;
    let open = count(
        pool,
        "SELECT COUNT(*) FROM attendance WHERE check_out_time IS NULL",
    )?;
    let tasks = count(pool, "SELECT COUNT(*) FROM tasks")?;
    let appeals = count(pool, "SELECT COUNT(*) FROM appeals")?;
    let pending = count(pool, "SELECT COUNT(*) FROM appeals WHERE status = 'pending'")?;

    println!(
        "{}• Attendance records:{} {}{}{} ({} open)",
        CYAN, RESET, GREEN, attendance, RESET, open
    );
    println!("{}• Tasks:{} {}{}{}", CYAN, RESET, GREEN, tasks, RESET);
    println!(
        "{}• Appeals:{} {}{}{} ({}{}{} pending)",
        CYAN,
        RESET,
        GREEN,
        appeals,
        RESET,
        if pending > 0 { RED } else { GREY },
        pending,
        RESET
    );

    //
    // 3) DATE RANGE
    //
    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT check_in_date FROM attendance ORDER BY check_in_date ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT check_in_date FROM attendance ORDER BY check_in_date DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    println!("{}• Attendance range:{}", CYAN, RESET);
    println!("    from: {}", first.unwrap_or_else(missing));
    println!("    to:   {}", last.unwrap_or_else(missing));

    println!();
    Ok(())
}
