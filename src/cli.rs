use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Operator tool for the refresh token store.
///
/// Configuration comes from `APP_*` environment variables (or `.env`).
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update tables to match the entities
    SyncSchema,
    /// List a user's refresh tokens, newest first
    Sessions {
        #[arg(long)]
        user_id: Uuid,
    },
    /// Revoke one refresh token by row id
    Revoke {
        #[arg(long)]
        token_id: Uuid,
    },
    /// Revoke every refresh token a user holds
    RevokeUser {
        #[arg(long)]
        user_id: Uuid,
    },
}
