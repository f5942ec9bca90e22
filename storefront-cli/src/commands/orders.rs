//! Orders command - order history and order detail

use anyhow::Result;
use colored::Colorize;

use storefront_core::OrderDetails;

use super::{finish_spinner, get_context, ready, spinner};
use crate::output;

pub fn run(id: Option<i64>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let Some(id) = id else {
        let pb = spinner("Loading orders...", json);
        let fetched = ctx.order_service.list_orders();
        finish_spinner(pb);
        let orders = ready(fetched)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&orders)?);
            return Ok(());
        }
        if orders.is_empty() {
            output::info("No orders yet");
            return Ok(());
        }

        let mut table = output::create_table();
        table.set_header(vec!["ID", "Placed", "Status", "Total"]);
        for order in &orders {
            table.add_row(vec![
                order.id.to_string(),
                order.created_at.format("%Y-%m-%d %H:%M").to_string(),
                order.status.clone(),
                output::format_price(order.total_amount),
            ]);
        }
        println!("{}", table);
        return Ok(());
    };

    let pb = spinner("Loading order...", json);
    let fetched = ctx.order_service.get_order(id);
    finish_spinner(pb);
    let details = ready(fetched)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }
    print_order(&details);
    Ok(())
}

fn print_order(details: &OrderDetails) {
    let order = &details.order;
    println!("{}", format!("Order #{}", order.id).bold());
    println!("  Placed: {}", order.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Status: {}", order.status);
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Product", "Unit price", "Qty", "Total"]);
    for item in &details.items {
        table.add_row(vec![
            item.product_name.clone(),
            output::format_price(item.unit_price),
            item.quantity.to_string(),
            output::format_price(item.line_total()),
        ]);
    }
    println!("{}", table);
    println!(
        "{} {}",
        "Total:".bold(),
        output::format_price(order.total_amount)
    );
}
