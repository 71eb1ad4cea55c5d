//! # Component Commands

use atelier_core::text::same_name;
use atelier_core::{Component, UNCATEGORIZED};
use rust_decimal::Decimal;
use tracing::info;

use super::{money, or_dash, Context};
use crate::error::CliResult;

/// Lists components, optionally one category. `Sin categoría` lists the
/// uncategorized ones.
pub async fn list(ctx: &Context, category: Option<&str>) -> CliResult<()> {
    let components: Vec<Component> = ctx
        .db
        .components()
        .list()
        .await?
        .into_iter()
        .filter(|c| match category {
            None => true,
            Some(wanted) if same_name(wanted, UNCATEGORIZED) => c.category.trim().is_empty(),
            Some(wanted) => same_name(&c.category, wanted),
        })
        .collect();

    ctx.emit(&components, |components| {
        println!(
            "{:<20} {:<32} {:<16} {:>12} {:>5}  LINK",
            "ID", "NAME", "CATEGORY", "PRICE", "DIV"
        );
        for c in components {
            println!(
                "{:<20} {:<32} {:<16} {:>12} {:>5}  {}",
                c.id,
                c.name,
                or_dash(Some(&c.category)),
                money(c.price),
                c.unit_divisor,
                if c.link.is_some() { "yes" } else { "-" }
            );
        }
        println!("{} component(s)", components.len());
    })
}

/// Sets a component's purchase price by hand.
pub async fn set_price(ctx: &Context, id: &str, price: Decimal) -> CliResult<()> {
    let component = ctx.db.components().update_price(id, price).await?;
    info!(id = %component.id, price = %component.price, "Component price set");
    ctx.emit(&component, |c| {
        println!("{} ({}) now costs {}", c.name, c.id, money(c.price));
    })
}
