use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use feedgrid_app::engine::DashEngine;
use feedgrid_app::ffi::FeedgridResult;
use feedgrid_logging::{initialize, LogDestination};

#[derive(Parser, Debug)]
#[command(name = "feedgrid", version, about = "A terminal dashboard of data-driven widgets")]
struct Args {
    /// Config file path; defaults to ~/.feedgrid/config.toml when that
    /// file exists, otherwise a built-in single-widget dashboard.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Terminal is owned by the dashboard, so logs go to a file.
    initialize(LogDestination::File);
    let args = Args::parse();

    let config_path = args.config.or_else(default_config_path);
    if config_path.is_none() {
        log::warn!("no config file found, using the built-in default dashboard");
    }
    let mut engine = match DashEngine::from_path(config_path.as_deref()) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("feedgrid: {err}");
            return exit_code(FeedgridResult::from_init_error(&err));
        }
    };

    let code = match engine.run() {
        Ok(()) => FeedgridResult::Success,
        Err(err) => {
            eprintln!("feedgrid: {err}");
            FeedgridResult::from_run_error(&err)
        }
    };
    engine.shutdown();
    exit_code(code)
}

fn exit_code(code: FeedgridResult) -> ExitCode {
    ExitCode::from(code as u8)
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let path = PathBuf::from(home).join(".feedgrid").join("config.toml");
    path.is_file().then_some(path)
}
