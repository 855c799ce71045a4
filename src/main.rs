use clap::Parser;
use spend_report::args::{Args, Command};
use spend_report::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config_path = args.common().config();
    let mut stdout = std::io::stdout().lock();

    let _: () = match args.command() {
        Command::Report(report_args) => {
            let config = Config::load(config_path)?;
            commands::report(&config, report_args, &mut stdout)?.print()
        }

        Command::Export(export_args) => {
            let config = Config::load(config_path)?;
            commands::export(&config, export_args)?.print()
        }

        Command::Overview(overview_args) => {
            let config = Config::load(config_path)?;
            commands::overview(&config, overview_args, &mut stdout)?.print()
        }

        Command::InitConfig(init_args) => {
            commands::init_config(init_args.path().or(config_path))?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "spend_report={},{}={}",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
