//! pspack CLI entry point
//!
//! Parses arguments, initializes logging on stderr, runs the command and
//! exits with its code:
//! - `0` - success
//! - `1` - the run completed with per-file failures (or an unexpected I/O error)
//! - `2` - nothing ran: invalid input, invalid configuration or output conflict

use clap::Parser;
use pspack::cli::Cli;
use pspack::core::{exit_code_for, user_friendly_error};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.build_config();

    // RUST_LOG wins over the verbosity flags.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_deref().unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let code = match cli.execute_with_config(&config) {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            user_friendly_error(e).display();
            code
        }
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
