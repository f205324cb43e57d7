mod cli;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use token_lifecycle::{config::AppConfig, db, logging::init_tracing, state::AppState};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("tokenctl failed: {err:?}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env().context("failed to load config")?;
    init_tracing(&cfg.logging)?;

    let output = match cli.command {
        Commands::SyncSchema => {
            let database = cfg
                .database
                .as_ref()
                .context("database configuration is required (APP_DATABASE__URL)")?;
            db::connect(database).await?;
            json!({ "schema": "synced" })
        }
        Commands::Sessions { user_id } => {
            let state = AppState::connect(&cfg).await?;
            let sessions = state.lifecycle.sessions_for_user(user_id).await?;
            json!({ "user_id": user_id, "sessions": sessions })
        }
        Commands::Revoke { token_id } => {
            let state = AppState::connect(&cfg).await?;
            let changed = state.lifecycle.revoke(token_id).await?;
            json!({ "token_id": token_id, "revoked": changed })
        }
        Commands::RevokeUser { user_id } => {
            let state = AppState::connect(&cfg).await?;
            let count = state.lifecycle.revoke_all_for_user(user_id).await?;
            json!({ "user_id": user_id, "revoked": count })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
