//! Cosmetics catalog CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! cosmetics-cli migrate
//!
//! # Create an operator account
//! CATALOG_SUPERUSER_PASSWORD=... cosmetics-cli account create-superuser -e ops@example.com -u ops
//!
//! # Delete an account and its catalog
//! cosmetics-cli account delete -e someone@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cosmetics-cli")]
#[command(author, version, about = "Cosmetics catalog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a staff superuser (password read from `CATALOG_SUPERUSER_PASSWORD`)
    CreateSuperuser {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        username: String,
    },
    /// Delete an account and everything it owns
    Delete {
        /// Login email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::CreateSuperuser { email, username } => {
                commands::account::create_superuser(&email, &username).await?;
            }
            AccountAction::Delete { email } => commands::account::delete(&email).await?,
        },
    }
    Ok(())
}
