//! dbuser CLI.

use std::process::ExitCode;

use clap::Parser;
use dbuser::cli::{self, DbUserArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = DbUserArgs::parse();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
