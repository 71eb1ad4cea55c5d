//! # Sales Statistics
//!
//! Profit and cost report over the paid sales of a date range.
//!
//! ## Report Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales ──► in range? ──► status == Pagado? ──► metrics per sale         │
//! │                                                                         │
//! │     realSaleValue = realSaleValue override, else effective value        │
//! │     realProfit    = realSaleValue − costMaterials                       │
//! │                                                                         │
//! │  ┌──────────┐ ┌────────────┐ ┌────────────┐ ┌──────────┐ ┌───────────┐  │
//! │  │   KPIs   │ │  methods   │ │ categories │ │  top 5   │ │   daily   │  │
//! │  └──────────┘ └────────────┘ └────────────┘ └──────────┘ └───────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::ProductIndex;
use crate::money::{round_money, saturating_sum};
use crate::payments::compute_sale_financials;
use crate::types::{PaymentStatus, Sale, UNCATEGORIZED};

/// Label for sales with no payment method.
pub const OTHER_METHOD: &str = "Otro";

/// Daily-series key for sales with no date.
pub const UNDATED: &str = "Sin fecha";

/// Number of products in the top list.
pub const TOP_PRODUCTS: usize = 5;

// =============================================================================
// Report Types
// =============================================================================

/// Field the category and product tables are ranked by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RankBy {
    #[default]
    Profit,
    Cost,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatsKpis {
    pub count: usize,
    #[ts(type = "number")]
    pub total_profit: Decimal,
    #[ts(type = "number")]
    pub total_cost: Decimal,
    #[ts(type = "number")]
    pub avg_profit: Decimal,
    #[ts(type = "number")]
    pub avg_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MethodShare {
    pub method: String,
    pub count: usize,
    /// Share of the paid sales, in percent.
    #[ts(type = "number")]
    pub pct: Decimal,
}

/// Profit and cost under one key (category, product or day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: String,
    #[ts(type = "number")]
    pub profit: Decimal,
    #[ts(type = "number")]
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub kpis: StatsKpis,
    pub payment_methods: Vec<MethodShare>,
    pub by_category: Vec<Bucket>,
    pub top_products: Vec<Bucket>,
    /// Ascending by date; undated sales come last under [`UNDATED`].
    pub daily: Vec<Bucket>,
}

/// Inclusive date range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Builds a range, swapping the bounds when they are reversed.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(from), Some(to)) if to < from => DateRange {
                from: Some(to),
                to: Some(from),
            },
            _ => DateRange { from, to },
        }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// An open range takes everything; a bounded one rejects undated sales.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

// =============================================================================
// Report
// =============================================================================

struct PaidSale<'a> {
    sale: &'a Sale,
    cost: Decimal,
    profit: Decimal,
}

/// Builds the report for `sales` within `range`.
pub fn build_report(
    sales: &[Sale],
    products: &ProductIndex,
    range: DateRange,
    rank_by: RankBy,
) -> StatsReport {
    let paid: Vec<PaidSale<'_>> = sales
        .iter()
        .filter(|sale| range.contains(sale.date))
        .filter_map(|sale| {
            let fin = compute_sale_financials(sale);
            if fin.payment_status != PaymentStatus::Paid {
                return None;
            }
            let real_sale_value = fin.real_sale_value.unwrap_or(fin.effective_sale_value);
            Some(PaidSale {
                sale,
                cost: fin.cost_materials,
                profit: real_sale_value.saturating_sub(fin.cost_materials),
            })
        })
        .collect();

    StatsReport {
        kpis: kpis(&paid),
        payment_methods: payment_methods(&paid),
        by_category: ranked(
            group(&paid, |sale| {
                products
                    .get(&sale.product_id)
                    .map(|p| p.category.trim())
                    .filter(|category| !category.is_empty())
                    .unwrap_or(UNCATEGORIZED)
                    .to_string()
            }),
            rank_by,
        ),
        top_products: {
            let mut rows = ranked(
                group(&paid, |sale| match products.get(&sale.product_id) {
                    Some(product) if !product.name.is_empty() => product.name.clone(),
                    _ => format!("#{}", sale.product_id),
                }),
                rank_by,
            );
            rows.truncate(TOP_PRODUCTS);
            rows
        },
        daily: daily(&paid),
    }
}

fn kpis(paid: &[PaidSale<'_>]) -> StatsKpis {
    let count = paid.len();
    let total_profit = saturating_sum(paid.iter().map(|p| p.profit));
    let total_cost = saturating_sum(paid.iter().map(|p| p.cost));
    let (avg_profit, avg_cost) = if count == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let n = Decimal::from(count);
        (round_money(total_profit / n), round_money(total_cost / n))
    };
    StatsKpis {
        count,
        total_profit: round_money(total_profit),
        total_cost: round_money(total_cost),
        avg_profit,
        avg_cost,
    }
}

fn payment_methods(paid: &[PaidSale<'_>]) -> Vec<MethodShare> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for p in paid {
        let method = p
            .sale
            .payment_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(OTHER_METHOD);
        match counts.iter_mut().find(|(key, _)| key == method) {
            Some((_, count)) => *count += 1,
            None => counts.push((method.to_string(), 1)),
        }
    }

    let total = Decimal::from(paid.len());
    let mut shares: Vec<MethodShare> = counts
        .into_iter()
        .map(|(method, count)| MethodShare {
            method,
            count,
            pct: if total.is_zero() {
                Decimal::ZERO
            } else {
                round_money(Decimal::from(count * 100) / total)
            },
        })
        .collect();
    // Stable sort keeps first-seen order among ties.
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

/// Sums profit and cost per key, in first-seen order.
fn group(paid: &[PaidSale<'_>], key_of: impl Fn(&Sale) -> String) -> Vec<Bucket> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Bucket> = Vec::new();
    for p in paid {
        let key = key_of(p.sale);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(Bucket {
                key,
                profit: Decimal::ZERO,
                cost: Decimal::ZERO,
            });
            rows.len() - 1
        });
        rows[slot].profit = rows[slot].profit.saturating_add(p.profit);
        rows[slot].cost = rows[slot].cost.saturating_add(p.cost);
    }
    for row in &mut rows {
        row.profit = round_money(row.profit);
        row.cost = round_money(row.cost);
    }
    rows
}

fn ranked(mut rows: Vec<Bucket>, rank_by: RankBy) -> Vec<Bucket> {
    match rank_by {
        RankBy::Profit => rows.sort_by(|a, b| b.profit.cmp(&a.profit)),
        RankBy::Cost => rows.sort_by(|a, b| b.cost.cmp(&a.cost)),
    }
    rows
}

fn daily(paid: &[PaidSale<'_>]) -> Vec<Bucket> {
    let mut rows = group(paid, |sale| match sale.date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => UNDATED.to_string(),
    });
    // ISO dates sort lexically, before any letter.
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================
