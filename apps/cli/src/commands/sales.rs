//! # Sale Commands
//!
//! Recording, listing and settling sales. Every edit re-runs the payment
//! pipeline, so received and pending always add up to the effective value.

use atelier_core::payments::SaleFinancials;
use atelier_core::sales::{listing_sum, listing_total, NewSale, SaleFilter};
use atelier_core::{ProductIndex, Sale, SaleEdit};
use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::{money, or_dash, Context};
use crate::error::{CliError, CliResult};

// =============================================================================
// Arguments
// =============================================================================

/// Filters for `sales list`.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Text to look for in the product name or customer
    #[arg(long, short)]
    pub search: Option<String>,

    /// Exact payment method (e.g. Efectivo, Transferencia)
    #[arg(long)]
    pub method: Option<String>,

    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl From<ListArgs> for SaleFilter {
    fn from(args: ListArgs) -> Self {
        SaleFilter {
            search: args.search,
            method: args.method,
            from: args.from,
            to: args.to,
        }
    }
}

/// Fields for `sales new`.
#[derive(Debug, Clone, Args)]
pub struct NewArgs {
    /// Product sold
    #[arg(long, short)]
    pub product: String,

    #[arg(long, short, default_value = "1")]
    pub quantity: Decimal,

    /// Sale date (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long, short)]
    pub customer: Option<String>,

    /// Unit material cost; the product's current cost when omitted
    #[arg(long)]
    pub unit_price: Option<Decimal>,

    /// Unit labor/gain; the product's current estimate when omitted
    #[arg(long)]
    pub gain: Option<Decimal>,

    /// What the customer actually paid in total, if it differs
    #[arg(long)]
    pub real_value: Option<Decimal>,

    /// Amount received so far; the whole value when omitted
    #[arg(long)]
    pub received: Option<Decimal>,

    #[arg(long, short)]
    pub method: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl From<NewArgs> for NewSale {
    fn from(args: NewArgs) -> Self {
        NewSale {
            product_id: args.product,
            quantity: args.quantity,
            date: args.date,
            customer_name: args.customer,
            unit_price: args.unit_price,
            ganancia_unit: args.gain,
            real_sale_value: args.real_value,
            payment_received: args.received,
            payment_method: args.method,
            payment_notes: args.notes,
        }
    }
}

/// Fields for `sales edit`. Applied in the order listed here.
#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    #[arg(long)]
    pub quantity: Option<Decimal>,

    #[arg(long)]
    pub unit_cost: Option<Decimal>,

    #[arg(long)]
    pub gain: Option<Decimal>,

    /// Real sale value override
    #[arg(long, conflicts_with = "clear_real_value")]
    pub real_value: Option<Decimal>,

    /// Drop the real sale value override
    #[arg(long)]
    pub clear_real_value: bool,

    /// Amount received; pending is derived
    #[arg(long, conflicts_with = "pending")]
    pub received: Option<Decimal>,

    /// Amount still owed; received is derived
    #[arg(long)]
    pub pending: Option<Decimal>,
}

impl EditArgs {
    /// The edits to apply. Value edits come before payment edits so the
    /// payment split is taken against the new total.
    pub fn edits(&self) -> Vec<SaleEdit> {
        let mut edits = Vec::new();
        if let Some(quantity) = self.quantity {
            edits.push(SaleEdit::Quantity(quantity));
        }
        if let Some(cost) = self.unit_cost {
            edits.push(SaleEdit::UnitCost(cost));
        }
        if let Some(gain) = self.gain {
            edits.push(SaleEdit::EstimatedGain(gain));
        }
        if self.clear_real_value {
            edits.push(SaleEdit::RealSaleValue(None));
        } else if let Some(value) = self.real_value {
            edits.push(SaleEdit::RealSaleValue(Some(value)));
        }
        if let Some(received) = self.received {
            edits.push(SaleEdit::PaymentReceived(received));
        }
        if let Some(pending) = self.pending {
            edits.push(SaleEdit::PaymentPending(pending));
        }
        edits
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaleLine<'a> {
    id: &'a str,
    date: Option<NaiveDate>,
    product_name: Option<&'a str>,
    customer_name: Option<&'a str>,
    quantity: Decimal,
    payment_method: Option<&'a str>,
    payment_status: String,
    total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaleListing<'a> {
    sales: Vec<SaleLine<'a>>,
    total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaleDetail {
    sale: Sale,
    financials: SaleFinancials,
}

fn print_detail(detail: &SaleDetail) {
    let SaleDetail { sale, financials: f } = detail;
    println!("Sale {}", sale.id);
    println!("  Product:          {}", sale.product_id);
    println!(
        "  Date:             {}",
        sale.date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("  Customer:         {}", or_dash(sale.customer_name.as_deref()));
    println!("  Quantity:         {}", f.quantity);
    println!("  Unit cost:        {:>12}", money(f.unit_cost));
    println!("  Unit gain:        {:>12}", money(f.estimated_gain));
    println!("  Computed total:   {:>12}", money(f.computed_total));
    if let Some(real) = f.real_sale_value {
        println!("  Real sale value:  {:>12}", money(real));
    }
    println!("  Effective value:  {:>12}", money(f.effective_sale_value));
    println!("  Received:         {:>12}", money(f.payment_received));
    println!("  Pending:          {:>12}", money(f.payment_pending));
    println!("  Method:           {}", or_dash(sale.payment_method.as_deref()));
    println!("  Status:           {}", f.payment_status);
}

fn detail(sale: Sale, financials: SaleFinancials) -> SaleDetail {
    SaleDetail { sale, financials }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list(ctx: &Context, args: ListArgs) -> CliResult<()> {
    let sales = ctx.db.sales().list().await?;
    let products: ProductIndex = ctx.db.products().index().await?;
    let filter = SaleFilter::from(args);
    let selected = filter.apply(&sales, &products);

    let listing = SaleListing {
        total: listing_sum(selected.iter().copied()),
        sales: selected
            .iter()
            .map(|sale| SaleLine {
                id: &sale.id,
                date: sale.date,
                product_name: products.get(&sale.product_id).map(|p| p.name.as_str()),
                customer_name: sale.customer_name.as_deref(),
                quantity: sale.quantity,
                payment_method: sale.payment_method.as_deref(),
                payment_status: sale.financials().payment_status.to_string(),
                total: listing_total(sale),
            })
            .collect(),
    };

    ctx.emit(&listing, |l| {
        println!(
            "{:<10} {:<36} {:<24} {:<18} {:>5} {:<14} {:<18} {:>12}",
            "DATE", "ID", "PRODUCT", "CUSTOMER", "QTY", "METHOD", "STATUS", "TOTAL"
        );
        for s in &l.sales {
            println!(
                "{:<10} {:<36} {:<24} {:<18} {:>5} {:<14} {:<18} {:>12}",
                s.date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                s.id,
                or_dash(s.product_name),
                or_dash(s.customer_name),
                s.quantity,
                or_dash(s.payment_method),
                s.payment_status,
                money(s.total)
            );
        }
        println!("{} sale(s), total {}", l.sales.len(), money(l.total));
    })
}

pub async fn show(ctx: &Context, id: &str) -> CliResult<()> {
    let sale = ctx.db.sales().get(id).await?;
    let financials = sale.financials();
    ctx.emit(&detail(sale, financials), print_detail)
}

pub async fn create(ctx: &Context, args: NewArgs) -> CliResult<()> {
    let today = Local::now().date_naive();
    let sale = ctx.db.sales().create(NewSale::from(args), today).await?;
    let financials = sale.financials();
    ctx.emit(&detail(sale, financials), print_detail)
}

pub async fn edit(ctx: &Context, id: &str, args: EditArgs) -> CliResult<()> {
    let edits = args.edits();
    if edits.is_empty() {
        return Err(CliError::validation("Nothing to change: pass at least one field"));
    }
    let (sale, financials) = ctx.db.sales().update(id, &edits).await?;
    ctx.emit(&detail(sale, financials), print_detail)
}

pub async fn pay(ctx: &Context, id: &str) -> CliResult<()> {
    let (sale, financials) = ctx.db.sales().mark_paid(id).await?;
    ctx.emit(&detail(sale, financials), print_detail)
}

pub async fn delete(ctx: &Context, id: &str) -> CliResult<()> {
    let sale = ctx.db.sales().delete(id).await?;
    ctx.emit(&sale, |s| {
        println!("Deleted sale {}; {} unit(s) of {} back in stock", s.id, s.quantity, s.product_id);
    })
}

/// Rewrites every stored sale whose payment figures are out of step.
pub async fn reconcile(ctx: &Context) -> CliResult<()> {
    let changed = ctx.db.sales().reconcile_all().await?;
    info!(changed, "Reconciliation done");
    ctx.emit(&changed, |n| println!("{n} sale(s) rewritten"))
}
