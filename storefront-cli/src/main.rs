//! Storefront CLI - shop from your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::{auth, cart, config, logs, orders, products};

/// Shop - a storefront in your terminal
#[derive(Parser)]
#[command(name = "shop", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        /// Email address
        email: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in and remember the session
    Login {
        /// Email address
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the session and the cached cart
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show who is logged in
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List products, or show one product
    Products {
        /// Product ID
        id: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        command: Option<cart::CartCommands>,
    },

    /// Place an order for the cart contents
    Checkout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List orders, or show one order
    Orders {
        /// Order ID
        id: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (errors only by default)
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Signup {
            email,
            name,
            password,
            json,
        } => auth::run_signup(&email, name, password, json),
        Commands::Login {
            email,
            password,
            json,
        } => auth::run_login(&email, password, json),
        Commands::Logout { json } => auth::run_logout(json),
        Commands::Whoami { json } => auth::run_whoami(json),
        Commands::Products { id, json } => products::run(id, json),
        Commands::Cart { command } => cart::run(command),
        Commands::Checkout { json } => cart::run_checkout(json),
        Commands::Orders { id, json } => orders::run(id, json),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
