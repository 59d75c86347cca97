//! Storedesk CLI - operator tools for the hosted backend.
//!
//! # Usage
//!
//! ```bash
//! # Create a backend user record
//! sd-cli user create -e admin@example.com -n "Admin Name"
//!
//! # Promote a user to admin
//! sd-cli user set-role -e admin@example.com -r admin
//!
//! # Print the dashboard figures for the last 30 days
//! sd-cli dashboard --days 30
//! ```
//!
//! # Commands
//!
//! - `user create` - Create a `users` record
//! - `user set-role` - Change a user's role
//! - `dashboard` - Summarize revenue and orders for a window

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Storedesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage backend user records
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Print dashboard figures for the last N days
    Dashboard {
        /// Window length in days
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user record
    Create {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Change a user's role
    SetRole {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin` or `user`)
        #[arg(short, long)]
        role: String,
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
        Commands::User { action } => match action {
            UserAction::Create { email, name } => {
                commands::user::create_user(&email, name.as_deref()).await?;
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
        },
        Commands::Dashboard { days } => commands::dashboard::summary(days).await?,
    }
    Ok(())
}
