//! Products command - browse the catalog

use anyhow::Result;
use colored::Colorize;

use storefront_core::Product;

use super::{finish_spinner, get_context, ready, spinner};
use crate::output;

pub fn run(id: Option<i64>, json: bool) -> Result<()> {
    match id {
        Some(id) => show(id, json),
        None => list(json),
    }
}

fn list(json: bool) -> Result<()> {
    let ctx = get_context()?;

    let pb = spinner("Loading products...", json);
    let fetched = ctx.catalog_service.list_products();
    finish_spinner(pb);

    let products = ready(fetched)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        output::warning("No products available");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Name", "Price", "Description"]);
    for product in &products {
        table.add_row(vec![
            product.id.to_string(),
            product.name.clone(),
            output::format_price(product.price),
            product.description.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    println!("{}", "Add to cart with: shop cart add <ID> [QUANTITY]".dimmed());
    Ok(())
}

fn show(id: i64, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let product = ready(ctx.catalog_service.get_product(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
        return Ok(());
    }

    print_product(&product);
    Ok(())
}

fn print_product(product: &Product) {
    println!("{}", product.name.bold());
    println!("  Price: {}", output::format_price(product.price));
    if let Some(description) = &product.description {
        println!("  {}", description);
    }
    println!();
    println!(
        "{}",
        format!("Add to cart with: shop cart add {}", product.id).dimmed()
    );
}
