//! Thread and Hanger CLI - migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (postgres backend)
//! th-cli migrate
//!
//! # Hash the admin password for ADMIN_PASSWORD_HASH (reads stdin)
//! th-cli admin hash-password
//!
//! # Create products from a YAML file against the configured backend
//! th-cli seed --file catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "th-cli")]
#[command(author, version, about = "Thread and Hanger CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the admin account
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Create products from a YAML catalog file
    Seed {
        /// Path to the catalog file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Print an argon2 hash of the password read from stdin
    HashPassword,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::HashPassword => commands::admin::hash_password()?,
        },
        Commands::Seed { file } => {
            commands::seed::catalog(&file).await?;
        }
    }
    Ok(())
}
