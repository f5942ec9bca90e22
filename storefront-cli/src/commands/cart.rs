//! Cart commands - show and edit the cart, check out

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use storefront_core::services::CartState;
use storefront_core::{LogEvent, Outcome, Route};

use super::{finish_spinner, get_context, get_logger, log_event, log_outcome, report, spinner};
use crate::output;

#[derive(Subcommand)]
pub enum CartCommands {
    /// Show the cart contents
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: i64,
        /// Quantity to add
        #[arg(default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the quantity of a product already in the cart (0 removes it)
    Update {
        /// Product ID
        product_id: i64,
        /// New quantity
        quantity: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: Option<CartCommands>) -> Result<()> {
    let mut ctx = get_context()?;
    let logger = get_logger();
    let cart = &mut ctx.cart_service;

    let (outcome, done, json) = match command.unwrap_or(CartCommands::Show { json: false }) {
        CartCommands::Show { json } => {
            let pb = spinner("Loading cart...", json);
            let outcome = cart.refresh(false)?;
            finish_spinner(pb);

            if outcome == Outcome::Updated {
                return print_cart(cart.state(), json);
            }
            (outcome, "", json)
        }
        CartCommands::Add {
            product_id,
            quantity,
            json,
        } => {
            let outcome = cart.add_item(product_id, quantity)?;
            log_outcome(&logger, "cart_add", "cart add", &outcome);
            (outcome, "Added to cart", json)
        }
        CartCommands::Update {
            product_id,
            quantity,
            json,
        } => {
            let outcome = cart.update_quantity(product_id, quantity)?;
            log_outcome(&logger, "cart_update", "cart update", &outcome);
            (outcome, "Cart updated", json)
        }
        CartCommands::Remove { product_id, json } => {
            let outcome = cart.remove_item(product_id)?;
            log_outcome(&logger, "cart_remove", "cart remove", &outcome);
            (outcome, "Removed from cart", json)
        }
    };

    report(&outcome, done, json)?;
    if outcome == Outcome::Updated && !json {
        println!();
        print_cart(cart.state(), false)?;
    }
    Ok(())
}

pub fn run_checkout(json: bool) -> Result<()> {
    let mut ctx = get_context()?;
    let logger = get_logger();

    let outcome = ctx.cart_service.checkout()?;
    match &outcome {
        Outcome::Navigate(route @ Route::OrderDetail(_)) => log_event(
            &logger,
            LogEvent::new("checkout_completed")
                .with_command("checkout")
                .with_route(*route),
        ),
        _ => log_outcome(&logger, "checkout", "checkout", &outcome),
    }

    report(&outcome, "Order placed", json)
}

fn print_cart(state: &CartState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&state.details)?);
        return Ok(());
    }

    let Some(details) = state.details.as_ref().filter(|d| !d.is_empty()) else {
        output::info("Your cart is empty");
        return Ok(());
    };

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Product", "Unit price", "Qty", "Total"]);
    for item in &details.items {
        table.add_row(vec![
            item.product_id.to_string(),
            item.product_name.clone(),
            output::format_price(item.unit_price),
            item.quantity.to_string(),
            output::format_price(item.line_total()),
        ]);
    }
    println!("{}", table);
    println!(
        "{} {} ({} items)",
        "Subtotal:".bold(),
        output::format_price(details.subtotal()),
        details.item_count()
    );
    println!("{}", "Check out with: shop checkout".dimmed());
    Ok(())
}
