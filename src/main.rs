use clap::Parser;
use gatewayctl::cli::{run_cli, Cli};
use gatewayctl::otel::{self, LogConfig, LogFormat};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config.log_level = "debug".to_string();
        log_config.verbose = true;
    }
    if let Some(format) = &cli.log_format {
        log_config.format = LogFormat::parse(format);
    }
    if let Err(e) = otel::init_logging(&log_config) {
        eprintln!("Warning: {e:#}");
    }

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
