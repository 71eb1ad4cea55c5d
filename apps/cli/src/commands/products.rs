//! # Product Commands
//!
//! Listing with display prices, the cost breakdown of one product, and the
//! default-adjustment migration.

use atelier_core::adjustments::{apply_adjustments, price_with_inflation, AdjustedPrice};
use atelier_core::costing::{summarize, CostSummary};
use atelier_core::ProductIndex;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{money, or_dash, Context};
use crate::error::CliResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductLine {
    id: String,
    name: String,
    #[serde(rename = "type")]
    product_type: &'static str,
    category: String,
    available: i64,
    cost_materials: Decimal,
    estimated_gain: Decimal,
    total_with_labor: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CostView {
    id: String,
    name: String,
    #[serde(flatten)]
    summary: CostSummary,
    base_total: Decimal,
    total_with_labor: Decimal,
    adjustments: Vec<AdjustedPrice>,
}

/// Every product with its cost and display price.
pub async fn list(ctx: &Context) -> CliResult<()> {
    let products = ctx.db.products().list().await?;
    let index = ProductIndex::new(products.clone());
    let lines: Vec<ProductLine> = products
        .iter()
        .map(|product| {
            let summary = summarize(product, &index);
            ProductLine {
                id: product.id.clone(),
                name: product.name.clone(),
                product_type: product.product_type().as_str(),
                category: product.category.clone(),
                available: product.available,
                total_with_labor: price_with_inflation(
                    summary.cost_materials,
                    summary.estimated_gain,
                    &product.price_adjustments,
                ),
                cost_materials: summary.cost_materials,
                estimated_gain: summary.estimated_gain,
            }
        })
        .collect();

    ctx.emit(&lines, |lines| {
        println!(
            "{:<20} {:<28} {:<10} {:<18} {:>5} {:>12} {:>12} {:>12}",
            "ID", "NAME", "TYPE", "CATEGORY", "STOCK", "MATERIALS", "LABOR", "PRICE"
        );
        for p in lines {
            println!(
                "{:<20} {:<28} {:<10} {:<18} {:>5} {:>12} {:>12} {:>12}",
                p.id,
                p.name,
                p.product_type,
                or_dash(Some(&p.category)),
                p.available,
                money(p.cost_materials),
                money(p.estimated_gain),
                money(p.total_with_labor)
            );
        }
        println!("{} product(s)", lines.len());
    })
}

/// Cost summary, composite breakdown and adjusted prices of one product.
pub async fn cost(ctx: &Context, id: &str) -> CliResult<()> {
    let (product, summary) = ctx.db.products().cost_summary(id).await?;
    let base_total = summary.base_total();
    let view = CostView {
        id: product.id.clone(),
        name: product.name.clone(),
        total_with_labor: price_with_inflation(
            summary.cost_materials,
            summary.estimated_gain,
            &product.price_adjustments,
        ),
        adjustments: apply_adjustments(base_total, &product.price_adjustments),
        base_total,
        summary,
    };

    ctx.emit(&view, |v| {
        println!("{} ({})", v.name, v.id);
        println!("  Materials:        {:>12}", money(v.summary.cost_materials));
        println!("  Labor / gain:     {:>12}", money(v.summary.estimated_gain));
        println!("  Base total:       {:>12}", money(v.base_total));
        println!("  With inflation:   {:>12}", money(v.total_with_labor));
        if v.summary.is_composite {
            println!("  Parts:");
            for part in &v.summary.breakdown {
                println!(
                    "    {:<28} {:>12} {:>12}",
                    part.name,
                    money(part.cost_materials),
                    money(part.estimated_gain)
                );
            }
        }
        if !v.adjustments.is_empty() {
            println!("  Adjustments:");
            for a in &v.adjustments {
                println!("    {:<28} {:>6}% {:>12}", a.name, a.percent, money(a.corrected));
            }
        }
    })
}

/// Adds the default adjustments to products that never had them.
pub async fn migrate_adjustments(ctx: &Context) -> CliResult<()> {
    let report = ctx.db.products().migrate_default_adjustments().await?;
    ctx.emit(&report, |r| {
        println!("Scanned {} product(s), migrated {}", r.scanned, r.migrated);
    })
}
