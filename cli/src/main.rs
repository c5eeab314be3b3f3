use std::process::ExitCode;

use clap::Parser;
use keepers_cli::Cli;
use keepers_cli::init_logging;
use keepers_cli::run;
use keepers_core::KeeperError;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<KeeperError>() {
                Some(keeper_err) => eprintln!("error[{}]: {keeper_err}", keeper_err.code()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
