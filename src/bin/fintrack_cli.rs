use std::process::ExitCode;

use chrono::Local;
use colored::Colorize;
use fintrack_core::{
    cli,
    config::{Config, ConfigManager},
};

fn main() -> ExitCode {
    fintrack_core::init();

    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "falling back to default configuration");
            Config::default()
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let today = Local::now().date_naive();
    match cli::run(&args, today, &config) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
