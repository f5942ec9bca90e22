//! CLI command implementations

pub mod auth;
pub mod cart;
pub mod config;
pub mod logs;
pub mod orders;
pub mod products;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use storefront_core::{
    Fetched, LogEvent, LoggingService, OperationResult, Outcome, Route, StorefrontContext,
};

use crate::output;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let shop_dir = get_shop_dir().ok()?;
    std::fs::create_dir_all(&shop_dir).ok()?;
    LoggingService::new(&shop_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.record(event);
    }
}

/// Log what a command led to
pub fn log_outcome(logger: &Option<LoggingService>, action: &str, command: &str, outcome: &Outcome) {
    log_event(logger, LogEvent::from_outcome(action, outcome).with_command(command));
}

/// Get the shop directory from environment or default
pub fn get_shop_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SHOP_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".shop"))
}

/// Get or create the storefront context
pub fn get_context() -> Result<StorefrontContext> {
    let shop_dir = get_shop_dir()?;

    std::fs::create_dir_all(&shop_dir)
        .with_context(|| format!("Failed to create shop directory: {:?}", shop_dir))?;
    tracing::debug!(shop_dir = %shop_dir.display(), "opening storefront context");

    StorefrontContext::new(&shop_dir).context("Failed to initialize storefront context")
}

/// Spinner for a blocking load; hidden for JSON output
pub fn spinner(message: &str, json: bool) -> Option<ProgressBar> {
    if json {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

pub fn finish_spinner(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

/// The command that shows a route
pub fn route_command(route: Route) -> String {
    match route {
        Route::Home | Route::Products => "shop products".to_string(),
        Route::Login => "shop login <EMAIL>".to_string(),
        Route::Signup => "shop signup <EMAIL>".to_string(),
        Route::ProductDetail(id) => format!("shop products {}", id),
        Route::Cart => "shop cart".to_string(),
        Route::Orders => "shop orders".to_string(),
        Route::OrderDetail(id) => format!("shop orders {}", id),
    }
}

/// Unwrap a fetch, turning a redirect or failure into a command error
pub fn ready<T>(fetched: Fetched<T>) -> Result<T> {
    match fetched {
        Fetched::Ready(value) => Ok(value),
        Fetched::Navigate(_) => Err(login_required()),
        Fetched::Failed(message) => bail!("{}", message),
    }
}

fn login_required() -> anyhow::Error {
    anyhow::anyhow!(
        "Not logged in or session expired. Run `{}`",
        route_command(Route::Login)
    )
}

/// Print an action's outcome
///
/// A failure or a redirect to login ends the command with an error.
pub fn report(outcome: &Outcome, done: &str, json: bool) -> Result<()> {
    if json {
        let mut result = match outcome {
            Outcome::Failed(message) => OperationResult::<Outcome>::fail(message.clone()),
            Outcome::Navigate(Route::Login) => OperationResult::fail("login required"),
            other => OperationResult::ok(other.clone()),
        };
        if let Some(route) = outcome.route() {
            result = result.with_context("next", serde_json::to_value(route)?);
        }
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.success {
            bail!("command failed");
        }
        return Ok(());
    }

    match outcome {
        Outcome::Updated => output::success(done),
        Outcome::Navigate(Route::Login) => return Err(login_required()),
        Outcome::Navigate(route) => {
            output::success(done);
            output::info(&format!("Next: {}", route_command(*route)));
        }
        Outcome::Failed(message) => bail!("{}", message),
    }
    Ok(())
}
