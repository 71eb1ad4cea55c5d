//! # Stats Command
//!
//! Profit report over paid sales.

use atelier_core::stats::{build_report, DateRange, RankBy};
use chrono::NaiveDate;

use super::{money, Context};
use crate::error::CliResult;

pub async fn report(
    ctx: &Context,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    rank_by: RankBy,
) -> CliResult<()> {
    let sales = ctx.db.sales().list().await?;
    let products = ctx.db.products().index().await?;
    let report = build_report(&sales, &products, DateRange::new(from, to), rank_by);

    ctx.emit(&report, |r| {
        let k = &r.kpis;
        println!("Paid sales:        {}", k.count);
        println!("Total profit:      {:>12}", money(k.total_profit));
        println!("Total cost:        {:>12}", money(k.total_cost));
        println!("Average profit:    {:>12}", money(k.avg_profit));
        println!("Average cost:      {:>12}", money(k.avg_cost));

        if !r.payment_methods.is_empty() {
            println!();
            println!("Payment methods");
            for m in &r.payment_methods {
                println!("  {:<20} {:>5} {:>7}%", m.method, m.count, m.pct);
            }
        }

        for (title, buckets) in [
            ("By category", &r.by_category),
            ("Top products", &r.top_products),
            ("Daily", &r.daily),
        ] {
            if buckets.is_empty() {
                continue;
            }
            println!();
            println!("{title}");
            for b in buckets {
                println!("  {:<28} {:>12} {:>12}", b.key, money(b.profit), money(b.cost));
            }
        }
    })
}
