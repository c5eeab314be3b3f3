mod keepers_cmd;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

pub use keepers_cmd::KeeperArgs;
pub use keepers_cmd::run;
pub use logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "keepers", version, about = "Grant, revoke and query direction keepers")]
pub struct Cli {
    /// keepers.toml to load (defaults to the nearest one above the working directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding keepers.json and audit.jsonl (defaults to ~/.keepers).
    #[arg(long, global = true, value_name = "DIR", env = "KEEPERS_HOME")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grant a direction to a keeper.
    Add(KeeperArgs),
    /// Revoke a keeper's active direction.
    Deactivate(KeeperArgs),
    /// Print the directions a keeper actively keeps.
    Directions {
        /// Keeper to look up.
        uuid: String,
    },
    /// Print every active keeper.
    List,
    /// Print the JSON schema of keeper records and requests.
    Schema,
}
