use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use crate::cli::{Args, Command};

#[cfg(test)]
mod tests {
    pub mod fixtures;
}

mod app;
mod argos;
mod art;
mod cli;
mod config;
mod logging;
mod mpris;
mod render;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_file.as_deref());

    match args.command {
        Some(Command::Config) => finish(app::print_default_config()),
        Some(Command::Version) => {
            println!("spotargos {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(Command::Control { action }) => {
            let config = config::load(&args);
            finish(app::control(&config, action).await)
        }
        None => {
            let config = config::load(&args);
            app::run(&config).await
        }
    }
}

fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(err = ?err, "Command failed");
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
