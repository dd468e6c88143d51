mod common;
use common::{DEPOT_LAT, DEPOT_LNG, lat_north_of_depot, rti, setup_test_db, setup_zones_file};

use predicates::prelude::*;

/// Base invocation against an isolated database and zone file.
fn fc(db: &str, zones: &str) -> assert_cmd::Command {
    let mut cmd = rti();
    cmd.args(["--db", db, "--zones", zones, "--test"]);
    cmd
}

fn init(db: &str, zones: &str) {
    fc(db, zones)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database initialized"));
}

#[test]
fn test_init_creates_database() {
    let db = setup_test_db("cli_init");
    let zones = setup_zones_file("cli_init");

    init(&db, &zones);
    assert!(std::path::Path::new(&db).exists());

    fc(&db, &zones)
        .args(["log", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_checkin_and_checkout() {
    let db = setup_test_db("cli_checkin");
    let zones = setup_zones_file("cli_checkin");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["checkin", "--worker", "7", "--zone", "1"])
        .args(["--lat", &lat_north_of_depot(20.0)])
        .args(["--lng", &DEPOT_LNG.to_string(), "--accuracy", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Check-in recorded (record #1)"));

    // same worker, same day
    fc(&db, &zones)
        .args(["checkin", "--worker", "7", "--zone", "1"])
        .args(["--lat", &lat_north_of_depot(20.0)])
        .args(["--lng", &DEPOT_LNG.to_string(), "--accuracy", "8"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    fc(&db, &zones)
        .args(["checkout", "1"])
        .args(["--lat", &lat_north_of_depot(650.0)])
        .args(["--lng", &DEPOT_LNG.to_string(), "--accuracy", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("the location was rejected"));

    fc(&db, &zones)
        .args(["attendance", "show", "1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"check_out_distance\": 650.0"));
}

#[test]
fn test_task_appeal_roundtrip() {
    let db = setup_test_db("cli_task_appeal");
    let zones = setup_zones_file("cli_task_appeal");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["task", "create", "--title", "Inspect hydrant", "--worker", "21"])
        .args(["--zone", "1", "--by", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task #1 created for worker 21."));

    fc(&db, &zones)
        .args(["task", "start", "1", "--worker", "21"])
        .assert()
        .success();

    fc(&db, &zones)
        .args(["task", "complete", "1", "--worker", "21"])
        .args(["--lat", &lat_north_of_depot(650.0)])
        .args(["--lng", &DEPOT_LNG.to_string(), "--accuracy", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected"))
        .stdout(predicate::str::contains("distance=650m"));

    fc(&db, &zones)
        .args(["appeal", "open", "task", "1", "--worker", "21"])
        .args(["--explanation", "GPS drift near building"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Appeal #1 submitted for task #1."));

    fc(&db, &zones)
        .args(["appeal", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GPS drift near building"));

    fc(&db, &zones)
        .args(["appeal", "approve", "1", "--reviewer", "900"])
        .args(["--notes", "confirmed via photo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Appeal #1 approved"));

    fc(&db, &zones)
        .args(["task", "show", "1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"Approved\""))
        .stdout(predicate::str::contains("\"rejection_reason\": null"));

    fc(&db, &zones)
        .args(["appeal", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending appeals."));

    fc(&db, &zones)
        .args(["history", "task", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("History of task #1"))
        .stdout(predicate::str::contains("appeal_cascade"));

    // a second approval is refused
    fc(&db, &zones)
        .args(["appeal", "approve", "1", "--reviewer", "901"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_appeal_requires_explanation() {
    let db = setup_test_db("cli_appeal_explanation");
    let zones = setup_zones_file("cli_appeal_explanation");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["checkin", "--worker", "3", "--zone", "1"])
        .args(["--lat", &lat_north_of_depot(900.0)])
        .args(["--lng", &DEPOT_LNG.to_string(), "--accuracy", "5"])
        .assert()
        .success();

    fc(&db, &zones)
        .args(["appeal", "open", "attendance", "1", "--worker", "3"])
        .args(["--explanation", ""])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    fc(&db, &zones)
        .args(["appeal", "open", "ticket", "1", "--worker", "3"])
        .args(["--explanation", "drift"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown record kind"));

    fc(&db, &zones)
        .args(["appeal", "mine", "--worker", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has not filed any appeal"));
}

#[test]
fn test_unknown_task_is_an_error() {
    let db = setup_test_db("cli_unknown_task");
    let zones = setup_zones_file("cli_unknown_task");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["task", "start", "999", "--worker", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_manual_attendance_and_review() {
    let db = setup_test_db("cli_manual_attendance");
    let zones = setup_zones_file("cli_manual_attendance");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["attendance", "manual", "--worker", "4", "--zone", "2"])
        .args(["--reviewer", "900", "--reason", "device lost"])
        .assert()
        .success();

    fc(&db, &zones)
        .args(["attendance", "approve", "1", "--reviewer", "900"])
        .assert()
        .success();

    fc(&db, &zones)
        .args(["attendance", "list", "--worker", "4", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"verification_status\": \"Verified\""))
        .stdout(predicate::str::contains("\"is_manual_entry\": true"));
}

#[test]
fn test_attendance_reject() {
    let db = setup_test_db("cli_attendance_reject");
    let zones = setup_zones_file("cli_attendance_reject");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["attendance", "manual", "--worker", "4", "--zone", "2"])
        .args(["--reviewer", "900", "--reason", "device lost"])
        .assert()
        .success();

    fc(&db, &zones)
        .args(["attendance", "reject", "1", "--reviewer", "900", "--reason", ""])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    fc(&db, &zones)
        .args(["attendance", "reject", "1", "--reviewer", "900"])
        .args(["--reason", "not on the roster"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attendance #1 rejected by reviewer 900"));

    fc(&db, &zones)
        .args(["attendance", "show", "1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"verification_status\": \"Rejected\""))
        .stdout(predicate::str::contains("\"review_note\": \"not on the roster\""));

    fc(&db, &zones)
        .args(["history", "attendance", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("manual_reject"));
}

#[test]
fn test_task_inside_polygon_is_verified() {
    let db = setup_test_db("cli_polygon");
    let zones = setup_zones_file("cli_polygon");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["task", "create", "--title", "Sweep square", "--worker", "5"])
        .args(["--zone", "2", "--by", "500"])
        .assert()
        .success();
    fc(&db, &zones)
        .args(["task", "start", "1", "--worker", "5"])
        .assert()
        .success();
    fc(&db, &zones)
        .args(["task", "complete", "1", "--worker", "5"])
        .args(["--lat", &DEPOT_LAT.to_string(), "--lng", &DEPOT_LNG.to_string()])
        .args(["--accuracy", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task #1 completed."));

    fc(&db, &zones)
        .args(["task", "list", "--worker", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sweep square"));
}

#[test]
fn test_db_info_and_check() {
    let db = setup_test_db("cli_db_info");
    let zones = setup_zones_file("cli_db_info");
    init(&db, &zones);

    fc(&db, &zones)
        .args(["db", "--info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Appeals"));

    fc(&db, &zones)
        .args(["db", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Integrity check passed"))
        .stdout(predicate::str::contains("Schema is up to date"));
}

#[test]
fn test_checkin_without_zone_file_is_an_error() {
    let db = setup_test_db("cli_missing_zones");
    init(&db, "/nonexistent/zones.yaml");

    fc(&db, "/nonexistent/zones.yaml")
        .args(["checkin", "--worker", "1", "--zone", "1"])
        .args(["--lat", "31.9", "--lng", "35.2", "--accuracy", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
