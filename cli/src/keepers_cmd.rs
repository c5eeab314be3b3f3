use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use keepers_core::KeeperRequest;
use keepers_core::KeepersConfig;
use keepers_core::KeepersService;
use keepers_core::config::find_keepers_home;
use keepers_core::config::load_config;
use keepers_core::config::load_config_file;
use keepers_core::keeper_request_schema;
use keepers_core::keeper_schema;
use keepers_state::JsonFileKeeperStore;

use crate::Cli;
use crate::Command;

#[derive(Debug, Args)]
pub struct KeeperArgs {
    /// Acting keeper performing the grant or revoke.
    #[arg(long = "from", value_name = "UUID")]
    pub from_uuid: String,

    /// Keeper being granted or revoked.
    #[arg(long, value_name = "UUID")]
    pub uuid: String,

    /// Direction to grant or revoke.
    #[arg(long, value_name = "NAME")]
    pub direction: String,
}

impl From<KeeperArgs> for KeeperRequest {
    fn from(args: KeeperArgs) -> Self {
        KeeperRequest {
            from_uuid: args.from_uuid,
            uuid: args.uuid,
            direction: args.direction,
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        home,
        command,
    } = cli;
    let service = || open_service(config.as_deref(), home.as_deref());

    match command {
        Command::Add(args) => {
            let id = service().await?.add_keeper(&args.into()).await?;
            print_json(&vec![id])
        }
        Command::Deactivate(args) => {
            service().await?.deactivate_keeper(&args.into()).await?;
            print_json(&serde_json::json!({ "status": "ok" }))
        }
        Command::Directions { uuid } => {
            print_json(&service().await?.get_directions(&uuid).await?)
        }
        Command::List => print_json(&service().await?.get_all_active_keepers().await?),
        Command::Schema => print_json(&serde_json::json!({
            "keeper": keeper_schema()?,
            "keeperRequest": keeper_request_schema()?,
        })),
    }
}

async fn open_service(config: Option<&Path>, home: Option<&Path>) -> Result<KeepersService> {
    let config = resolve_config(config).await?;
    let home = match home {
        Some(home) => home.to_path_buf(),
        None => find_keepers_home().context("failed to resolve keepers home directory")?,
    };
    tracing::debug!(home = %home.display(), "opening keeper store");
    let store = JsonFileKeeperStore::open(&home)
        .with_context(|| format!("failed to open keeper store in {}", home.display()))?;
    Ok(KeepersService::from_config(Arc::new(store), &config))
}

async fn resolve_config(path: Option<&Path>) -> Result<KeepersConfig> {
    if let Some(path) = path {
        return Ok(load_config_file(path).await?);
    }
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Ok(load_config(&cwd).await?)
}

fn print_json<T>(value: &T) -> Result<()>
where
    T: serde::Serialize + ?Sized,
{
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
