mod cli;
mod pipe;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use speedgauge::ClockError;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::pipe::run_pipe;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let result: Result<()> = match cli.command {
        Some(Commands::Pipe(pipe)) => run_pipe(pipe),
        None => {
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(err) = result {
        let code = exit_code_for_error(&err);
        eprintln!("error: {err:?}");
        std::process::exit(code);
    }
}

pub(crate) fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    // 2: invalid clock configuration, 3: I/O failure, 1: other
    for cause in err.chain() {
        if let Some(clock) = cause.downcast_ref::<ClockError>() {
            return match clock {
                ClockError::ZeroResolution | ClockError::ResolutionTooHigh { .. } => 2,
                ClockError::Spawn(_) => 1,
            };
        }
        if cause.is::<std::io::Error>() {
            return 3;
        }
    }
    1
}
