//! Prostore CLI - database migrations, seed data and administrators.
//!
//! # Usage
//!
//! ```bash
//! # Apply migrations from crates/storefront/migrations
//! prostore-cli migrate
//!
//! # Replace catalog and users with sample data
//! prostore-cli seed
//!
//! # Create an administrator
//! prostore-cli admin create -e admin@example.com -n "Admin Name" -p 'a long password'
//!
//! # Promote an existing shopper
//! prostore-cli admin promote -e jane@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "prostore-cli")]
#[command(author, version, about = "Prostore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Wipe store data and insert sample products and users
    Seed,
    /// Manage administrators
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (min 6 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Give an existing user the admin role
    Promote {
        #[arg(short, long)]
        email: String,
    },
    /// Take the admin role away
    Demote {
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
            AdminAction::Promote { email } => {
                commands::admin::set_role(&email, prostore_core::UserRole::Admin).await?;
            }
            AdminAction::Demote { email } => {
                commands::admin::set_role(&email, prostore_core::UserRole::User).await?;
            }
        },
    }
    Ok(())
}
