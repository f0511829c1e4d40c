use bevy::app::App;
use bevy::log::{error, info};
use chargedrift::cli::{Args, load_and_apply_config, log_plugin};
use chargedrift::simulation::run_simulation;
use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_and_apply_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.print_config {
        return match config.to_toml() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Some(path) = &args.save_config {
        return match config.save(path) {
            Ok(()) => {
                println!("Configuration written to: {path}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    // Headless app, only used to install the log subscriber
    let mut app = App::new();
    app.add_plugins(log_plugin(args.verbose));

    info!(
        "Chargedrift {} (built {}) starting at {}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_DATE"),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let max_wall_time = args
        .max_wall_time
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .map(Duration::from_secs_f64);

    match run_simulation(&config, max_wall_time) {
        Ok(summary) => {
            info!(
                "Finished after {} steps at t = {:.4e} s ({} still active)",
                summary.steps, summary.time, summary.active_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Simulation failed: {e}");
            ExitCode::FAILURE
        }
    }
}
