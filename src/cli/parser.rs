use clap::{Args, Parser, Subcommand};

/// Command-line interface definition for fieldcheck
/// Geofenced attendance, task completion and appeals for municipal field crews
#[derive(Parser)]
#[command(
    name = "fieldcheck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Field worker verification: geofenced attendance, task completion and appeals over SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the zones file
    #[arg(global = true, long = "zones")]
    pub zones: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// A reported GPS fix.
#[derive(Args, Debug, Clone, Copy)]
pub struct PositionArgs {
    #[arg(long, allow_negative_numbers = true, help = "Latitude in degrees")]
    pub lat: f64,

    #[arg(long, allow_negative_numbers = true, help = "Longitude in degrees")]
    pub lng: f64,

    #[arg(long, help = "Reported accuracy radius in meters")]
    pub accuracy: f64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Fill missing fields with their defaults")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Check a worker in at a zone
    Checkin {
        #[arg(long)]
        worker: i64,

        #[arg(long)]
        zone: i64,

        #[command(flatten)]
        position: PositionArgs,
    },

    /// Close an open attendance record
    Checkout {
        /// Attendance record id
        id: i64,

        #[command(flatten)]
        position: PositionArgs,
    },

    /// Attendance review and queries
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },

    /// Task lifecycle
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Appeals against automatic rejections
    Appeal {
        #[command(subcommand)]
        action: AppealAction,
    },

    /// Verification history, appeals and audit trail of a record
    History {
        /// Record kind: attendance | task
        kind: String,

        id: i64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AttendanceAction {
    /// Record attendance on behalf of a worker (no GPS fix)
    Manual {
        #[arg(long)]
        worker: i64,

        #[arg(long)]
        zone: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        reason: String,
    },

    /// Confirm a record awaiting review
    Approve {
        id: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        note: Option<String>,
    },

    /// Refuse a record awaiting review
    Reject {
        id: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        reason: String,
    },

    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    List {
        #[arg(long)]
        worker: i64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task (dispatcher)
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        worker: i64,

        #[arg(long)]
        zone: Option<i64>,

        #[arg(long = "target-lat", allow_negative_numbers = true, requires = "target_lng")]
        target_lat: Option<f64>,

        #[arg(long = "target-lng", allow_negative_numbers = true, requires = "target_lat")]
        target_lng: Option<f64>,

        #[arg(long = "by", help = "Dispatcher id")]
        by: i64,
    },

    Start {
        id: i64,

        #[arg(long)]
        worker: i64,
    },

    Complete {
        id: i64,

        #[arg(long)]
        worker: i64,

        #[command(flatten)]
        position: PositionArgs,
    },

    Approve {
        id: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        notes: Option<String>,
    },

    Reject {
        id: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        reason: String,
    },

    Cancel {
        id: i64,

        #[arg(long = "by")]
        by: i64,
    },

    /// Hand the task to another worker; progress is reset
    Reassign {
        id: i64,

        #[arg(long = "to")]
        to: i64,

        #[arg(long = "by")]
        by: i64,
    },

    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    List {
        #[arg(long)]
        worker: i64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AppealAction {
    /// Contest a rejected attendance record or task
    Open {
        /// Record kind: attendance | task
        kind: String,

        id: i64,

        #[arg(long)]
        worker: i64,

        #[arg(long)]
        explanation: String,

        #[arg(long, help = "Distance in meters (defaults to the recorded one)")]
        distance: Option<f64>,

        #[arg(long = "photo", help = "Reference to an evidence photo")]
        photo: Option<String>,
    },

    Approve {
        id: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        notes: Option<String>,
    },

    Reject {
        id: i64,

        #[arg(long)]
        reviewer: i64,

        #[arg(long)]
        notes: String,
    },

    /// Reviewer queue, oldest first
    Pending {
        #[arg(long)]
        json: bool,
    },

    /// Appeals filed by a worker
    Mine {
        #[arg(long)]
        worker: i64,

        #[arg(long)]
        json: bool,
    },

    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },
}
