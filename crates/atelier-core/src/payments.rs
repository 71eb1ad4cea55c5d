//! # Sale Financials & Payment Reconciliation
//!
//! A sale has one truth, its effective value, and two views of how much of
//! it has been paid. This module derives the effective value and keeps the
//! two views consistent.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantity × unitCost                      ──► costMaterials             │
//! │  quantity × (unitCost + estimatedGain)    ──► computedTotal             │
//! │  stored total                             ──► fallbackTotal             │
//! │  realSaleValue (if set and ≥ 0)                                         │
//! │      else computedTotal (if > 0)                                        │
//! │      else fallbackTotal                   ──► effectiveSaleValue        │
//! │                                                                         │
//! │  paymentReceived set?  ── yes ──► (received, pending or 0)              │
//! │         │ no                                                            │
//! │  paymentPending set?   ── yes ──► (0, pending)                          │
//! │         │ no                                                            │
//! │         └────────────────────────► (effective, 0)   assume fully paid   │
//! │                                                                         │
//! │                       normalize_payments ──► received + pending = total │
//! │                  determine_payment_status ──► Pagado / Pendiente / Parcial
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Legacy records with inconsistent figures are healed, never rejected:
//! whatever partial data exists yields one deterministic, consistent pair.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::lenient;
use crate::money::{approx_equal, clamp_non_negative, mul_or_zero, round_money};
use crate::types::{PaymentStatus, Sale};

// =============================================================================
// Output Types
// =============================================================================

/// Reconciled payment figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    #[ts(type = "number")]
    pub total: Decimal,
    #[ts(type = "number")]
    pub payment_received: Decimal,
    #[ts(type = "number")]
    pub payment_pending: Decimal,
}

/// Full financial view of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleFinancials {
    #[ts(type = "number")]
    pub quantity: Decimal,
    #[ts(type = "number")]
    pub unit_cost: Decimal,
    #[ts(type = "number")]
    pub estimated_gain: Decimal,
    #[ts(type = "number")]
    pub cost_materials: Decimal,
    #[ts(type = "number")]
    pub computed_total: Decimal,
    #[ts(type = "number")]
    pub fallback_total: Decimal,
    #[ts(type = "number | null")]
    pub real_sale_value: Option<Decimal>,
    #[ts(type = "number")]
    pub effective_sale_value: Decimal,
    #[ts(type = "number")]
    pub payment_received: Decimal,
    #[ts(type = "number")]
    pub payment_pending: Decimal,
    pub payment_status: PaymentStatus,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reads a user-entered amount: blank or non-numeric → `None`, otherwise
/// rounded to cents.
pub fn parse_money_or_null(value: &Value) -> Option<Decimal> {
    if lenient::is_blank(value) {
        return None;
    }
    lenient::decimal_from_value(value).map(round_money)
}

/// Reconciles `received` and `pending` against `total`.
///
/// When `total > 0` the result always satisfies
/// `payment_received + payment_pending ≈ total`:
///
/// 1. the pair already sums to the total → pending is recomputed from it
/// 2. only pending was entered and it equals the total → nothing received
/// 3. otherwise received is capped at the total and pending takes the rest
///
/// ## Example
/// ```rust
/// use atelier_core::payments::normalize_payments;
/// use rust_decimal::Decimal;
///
/// let split = normalize_payments(Decimal::from(300), Decimal::from(100), Decimal::ZERO);
/// assert_eq!(split.payment_pending, Decimal::from(200));
/// ```
pub fn normalize_payments(total: Decimal, received: Decimal, pending: Decimal) -> PaymentSplit {
    let total = clamp_non_negative(total);
    let mut received = clamp_non_negative(received);
    let mut pending = clamp_non_negative(pending);

    if total > Decimal::ZERO {
        if approx_equal(received.saturating_add(pending), total) {
            pending = clamp_non_negative(total - received);
        } else if approx_equal(pending, total) && approx_equal(received, Decimal::ZERO) {
            pending = total;
            received = Decimal::ZERO;
        } else {
            received = received.min(total);
            pending = clamp_non_negative(total - received);
        }
    }

    PaymentSplit {
        total,
        payment_received: received,
        payment_pending: pending,
    }
}

/// Derives the payment status.
///
/// Zero-value sales count as paid unless only a pending amount was recorded.
pub fn determine_payment_status(
    total: Decimal,
    received: Decimal,
    pending: Option<Decimal>,
) -> PaymentStatus {
    let total = clamp_non_negative(total);
    let received = clamp_non_negative(received);

    if total <= Decimal::ZERO {
        if received > Decimal::ZERO {
            return PaymentStatus::Paid;
        }
        if pending.is_some_and(|pending| clamp_non_negative(pending) > Decimal::ZERO) {
            return PaymentStatus::Pending;
        }
        return PaymentStatus::Paid;
    }

    if approx_equal(received, total) {
        PaymentStatus::Paid
    } else if approx_equal(received, Decimal::ZERO) {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Partial
    }
}

/// Runs the full pipeline over a sale record.
pub fn compute_sale_financials(sale: &Sale) -> SaleFinancials {
    let quantity = sale.quantity;
    let unit_cost = sale.unit_price;
    let estimated_gain = sale.ganancia_unit;

    let cost_materials = clamp_non_negative(mul_or_zero(quantity, unit_cost));
    let computed_total = clamp_non_negative(mul_or_zero(
        quantity,
        unit_cost.saturating_add(estimated_gain),
    ));
    let fallback_total = clamp_non_negative(sale.total);
    let real_sale_value = sale.real_sale_value.map(round_money);

    let effective_sale_value = match real_sale_value {
        Some(real) if real >= Decimal::ZERO => real,
        _ if computed_total > Decimal::ZERO => computed_total,
        _ => fallback_total,
    };

    let (base_received, base_pending) = match (sale.payment_received, sale.payment_pending) {
        (Some(received), pending) => (received, pending.unwrap_or_default()),
        (None, Some(pending)) => (Decimal::ZERO, pending),
        (None, None) => (effective_sale_value, Decimal::ZERO),
    };

    let split = normalize_payments(effective_sale_value, base_received, base_pending);
    let payment_status = determine_payment_status(
        effective_sale_value,
        split.payment_received,
        Some(split.payment_pending),
    );

    SaleFinancials {
        quantity,
        unit_cost,
        estimated_gain,
        cost_materials,
        computed_total,
        fallback_total,
        real_sale_value,
        effective_sale_value,
        payment_received: split.payment_received,
        payment_pending: split.payment_pending,
        payment_status,
    }
}

/// True when the sale reconciles to "Pagado".
pub fn is_sale_fully_paid(sale: &Sale) -> bool {
    compute_sale_financials(sale).payment_status == PaymentStatus::Paid
}

// =============================================================================
// Editing
// =============================================================================

/// One edit to an existing sale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SaleEdit {
    Quantity(Decimal),
    UnitCost(Decimal),
    EstimatedGain(Decimal),
    /// `None` clears the override.
    RealSaleValue(Option<Decimal>),
    PaymentReceived(Decimal),
    PaymentPending(Decimal),
}

impl Sale {
    /// Current financial view.
    pub fn financials(&self) -> SaleFinancials {
        compute_sale_financials(self)
    }

    /// Applies an edit and re-runs the whole pipeline.
    ///
    /// Received and pending are two views of one total: editing one derives
    /// the other.
    pub fn apply_edit(&mut self, edit: SaleEdit) -> SaleFinancials {
        match edit {
            SaleEdit::Quantity(quantity) => self.quantity = quantity,
            SaleEdit::UnitCost(cost) => self.unit_price = cost,
            SaleEdit::EstimatedGain(gain) => self.ganancia_unit = gain,
            SaleEdit::RealSaleValue(value) => self.real_sale_value = value,
            SaleEdit::PaymentReceived(received) => {
                self.payment_received = Some(received);
                self.payment_pending = None;
            }
            SaleEdit::PaymentPending(pending) => {
                let total = self.financials().effective_sale_value;
                let pending = clamp_non_negative(pending);
                self.payment_received = Some(clamp_non_negative(total - pending));
                self.payment_pending = Some(pending);
            }
        }
        self.reconcile()
    }

    /// Writes the reconciled figures back into the record.
    ///
    /// The legacy `total` follows the computed total whenever there is one.
    pub fn reconcile(&mut self) -> SaleFinancials {
        let financials = self.financials();
        if financials.computed_total > Decimal::ZERO {
            self.total = financials.computed_total;
        }
        self.payment_received = Some(financials.payment_received);
        self.payment_pending = Some(financials.payment_pending);
        financials
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
