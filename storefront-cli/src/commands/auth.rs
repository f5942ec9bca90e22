//! Account commands - signup, login, logout, whoami

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Password;

use storefront_core::{LogEvent, OperationResult, Outcome, Route};

use super::{get_context, get_logger, log_event, log_outcome, report, route_command};
use crate::output;

/// Password from the flag, `SHOP_PASSWORD`, or an interactive prompt
fn get_password(password_flag: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }
    if let Ok(p) = std::env::var("SHOP_PASSWORD") {
        return Ok(p);
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

pub fn run_signup(
    email: &str,
    name: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = get_password(password, true)?;
    let ctx = get_context()?;
    let logger = get_logger();

    let outcome = ctx
        .session_service
        .signup(name.as_deref(), email, &password);
    log_outcome(&logger, "signup", "signup", &outcome);

    if json {
        let result = match &outcome {
            Outcome::Failed(message) => OperationResult::fail(message.clone()),
            other => OperationResult::ok(other.clone()),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.success {
            bail!("signup failed");
        }
        return Ok(());
    }
    match outcome {
        Outcome::Failed(message) => bail!("{}", message),
        _ => {
            output::success("Account created");
            output::info(&format!("Next: {}", route_command(Route::Login)));
        }
    }
    Ok(())
}

pub fn run_login(email: &str, password: Option<String>, json: bool) -> Result<()> {
    let password = get_password(password, false)?;
    let mut ctx = get_context()?;
    let logger = get_logger();

    let outcome = ctx.session_service.login(email, &password)?;
    log_outcome(&logger, "login", "login", &outcome);

    let greeting = match ctx.session_service.current_user() {
        Some(user) => format!("Logged in as {}", user.display_name()),
        None => "Logged in".to_string(),
    };
    report(&outcome, &greeting, json)
}

pub fn run_logout(json: bool) -> Result<()> {
    let mut ctx = get_context()?;
    let logger = get_logger();

    let was_authenticated = ctx.session_service.is_authenticated();
    let outcome = ctx.logout()?;
    log_event(&logger, LogEvent::new("logout").with_command("logout"));

    if json {
        let result = OperationResult::ok(outcome);
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if was_authenticated {
        output::success("Logged out");
    } else {
        output::info("Not logged in");
    }
    Ok(())
}

pub fn run_whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.session_service.session();

    if json {
        let user = ctx.session_service.current_user();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "authenticated": session.is_some(),
                "user": user,
                "api_base_url": ctx.config.api_base_url,
            }))?
        );
        return Ok(());
    }

    match session {
        None => {
            output::warning("Not logged in");
            output::info(&format!("Run: {}", route_command(Route::Login)));
        }
        Some(session) => match &session.user {
            Some(user) => {
                println!("{} {}", "Logged in as".bold(), user.display_name());
                println!("  Email: {}", user.email);
                println!("  ID: {}", user.id);
            }
            None => println!("{}", "Logged in (no cached profile)".bold()),
        },
    }
    println!("  API: {}", ctx.config.api_base_url.dimmed());
    Ok(())
}
