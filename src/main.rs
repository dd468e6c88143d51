//! fieldcheck main entrypoint.

use fieldcheck::{dispatch, effective_config, parse_args};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

fn main() {
    let cli = parse_args();

    let cfg = match effective_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let level = LevelFilter::from_str(&cfg.log_level).unwrap_or(LevelFilter::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    println!();
    if let Err(e) = dispatch(&cli, &cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
