//! Atelier CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! atelier-cli migrate
//!
//! # Bootstrap the first admin (registration itself requires an admin)
//! atelier-cli admin create -n "Admin Name" -u admin -e admin@example.com -p 'long passphrase'
//!
//! # Load demo settings, a category and products
//! atelier-cli seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin users
//! - `seed` - Seed database with demo data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "atelier-cli")]
#[command(author, version, about = "Atelier CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with demo data
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Login handle
        #[arg(short, long)]
        username: String,

        /// Email address, used to log in
        #[arg(short, long)]
        email: String,

        /// Initial password (at least 8 characters)
        #[arg(short, long, env = "ATELIER_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
                name,
                username,
                email,
                password,
            } => {
                commands::admin::create_user(&name, &username, &email, &password).await?;
            }
        },
        Commands::Seed => commands::seed::demo().await?,
    }
    Ok(())
}
