//! AutoCatalog CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations
//! ac-cli migrate
//!
//! # Create an admin (or promote the existing account with that email)
//! ac-cli admin create -e admin@example.com -n "Admin Name" -p "long-password" -r admin
//!
//! # Change the role of an existing account
//! ac-cli admin promote -e admin@example.com -r super_admin
//!
//! # Insert the demo catalog
//! ac-cli seed
//! ```
//!
//! Every command reads `AUTOCATALOG_DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ac-cli")]
#[command(author, version, about = "AutoCatalog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage privileged accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert the demo category tree and products (safe to re-run)
    Seed {
        /// YAML catalog to load instead of the bundled demo data
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an account with a role, or promote the existing one
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Initial password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`user`, `admin`, `super_admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// Change the role of an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role (`user`, `admin`, `super_admin`)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

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
            AdminAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::admin::create_user(&email, &name, &password, &role).await?;
            }
            AdminAction::Promote { email, role } => {
                commands::admin::promote(&email, &role).await?;
            }
        },
        Commands::Seed { file } => {
            commands::seed::catalog(file.as_deref()).await?;
        }
    }
    Ok(())
}
