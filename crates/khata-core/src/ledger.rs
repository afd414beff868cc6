//! # Ledger Engine
//!
//! Balance, aggregate and summary derivations. This module is the set of
//! rules that turn raw dealer bills, payments, customer sales and stock
//! movements into every financial figure shown in the app.
//!
//! ## Derivation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger Derivations                               │
//! │                                                                         │
//! │  Bill ──► paid_amount ──► outstanding ──► outstanding_for_dealer       │
//! │                                │                                        │
//! │                                └──► total_outstanding_debt             │
//! │                                                                         │
//! │  Sale ──► total ──► balance ──► customer_balance                       │
//! │                        │                                                │
//! │                        └──► monthly_sales ──► percentage_change        │
//! │                                                                         │
//! │  BillPayment.payer ─┐                                                  │
//! │  Sale.paid_to ──────┴──► personal_account_summary (per principal)      │
//! │                                                                         │
//! │  SaleItem.cost_per_unit_snapshot ──► total_profit                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity Contract
//! Every function here re-derives from the snapshot it is handed. There is
//! no internal state and no caching: computing the same figure twice with
//! no intervening mutation yields identical results, and the figure always
//! reflects the latest committed write the snapshot was read from.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Bill, BillPayment, Customer, Dealer, Sale, SettlementStatus};

// =============================================================================
// Snapshot
// =============================================================================

/// An immutable, consistent view of the record collections the engine
/// derives from. The record store materializes one per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub dealers: Vec<Dealer>,
    pub bills: Vec<Bill>,
    pub customers: Vec<Customer>,
    pub sales: Vec<Sale>,
}

impl LedgerSnapshot {
    pub fn dealer_by_id(&self, id: &str) -> Option<&Dealer> {
        self.dealers.iter().find(|d| d.id == id)
    }

    pub fn customer_by_id(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    /// Total amount owed to all dealers.
    pub fn total_outstanding_debt(&self) -> Money {
        total_outstanding_debt(&self.dealers, &self.bills)
    }

    /// Outstanding balance across one dealer's bills.
    pub fn outstanding_for_dealer(&self, dealer_id: &str) -> Money {
        outstanding_for_dealer(&self.bills, dealer_id)
    }

    /// Sum of a customer's signed sale balances.
    pub fn customer_balance(&self, customer_id: &str) -> Money {
        customer_balance(&self.sales, customer_id)
    }

    /// All dealer payments, newest first, annotated for display.
    pub fn recent_payments(&self) -> Vec<PaymentRecord> {
        recent_payments(&self.dealers, &self.bills)
    }

    /// Current vs previous calendar month sales, relative to `today`.
    pub fn monthly_sales(&self, today: NaiveDate) -> MonthlySales {
        monthly_sales(&self.sales, today)
    }

    /// Cash position of one named principal.
    pub fn personal_account_summary(&self, payer: &str) -> PersonalAccountSummary {
        personal_account_summary(&self.bills, &self.sales, payer)
    }

    /// Revenue minus cost of goods sold across all sales.
    pub fn total_profit(&self) -> Money {
        total_profit(&self.sales)
    }
}

// =============================================================================
// Dealer / Bill Balances
// =============================================================================

impl Bill {
    /// Sum of all payments made against this bill.
    pub fn paid_amount(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// `total_amount - paid_amount`. Negative when overpaid - the value is
    /// never clamped; only the status label collapses it.
    pub fn outstanding(&self) -> Money {
        self.total_amount - self.paid_amount()
    }

    /// Derived settlement state. A zero-total, zero-payment bill is paid
    /// in full by convention.
    pub fn status(&self) -> SettlementStatus {
        SettlementStatus::from_balance(self.outstanding())
    }

    /// Sum of the line totals of the items supplied with this bill.
    pub fn item_total(&self) -> Money {
        self.items.iter().map(|i| i.cost_per_unit.multiply_quantity(i.quantity)).sum()
    }
}

/// Outstanding balance summed over one dealer's bills.
///
/// A dealer with zero bills yields zero, not an error.
pub fn outstanding_for_dealer(bills: &[Bill], dealer_id: &str) -> Money {
    bills
        .iter()
        .filter(|b| b.dealer_id == dealer_id)
        .map(Bill::outstanding)
        .sum()
}

/// Total amount owed to all dealers.
pub fn total_outstanding_debt(dealers: &[Dealer], bills: &[Bill]) -> Money {
    dealers
        .iter()
        .map(|d| outstanding_for_dealer(bills, &d.id))
        .sum()
}

// =============================================================================
// Customer / Sale Balances
// =============================================================================

impl Sale {
    /// Sum of `sale_price × quantity` over the line items.
    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.line_total()).sum()
    }

    /// `total - amount_paid`, unclamped: negative means the customer
    /// overpaid and is owed the difference.
    pub fn balance(&self) -> Money {
        self.total() - self.amount_paid
    }

    pub fn status(&self) -> SettlementStatus {
        SettlementStatus::from_balance(self.balance())
    }
}

/// Sum of a customer's signed sale balances.
pub fn customer_balance(sales: &[Sale], customer_id: &str) -> Money {
    sales
        .iter()
        .filter(|s| s.customer_id == customer_id)
        .map(Sale::balance)
        .sum()
}

/// Customer balance with one sale left out - used by edit flows to preview
/// the "new total balance" without counting the sale being edited twice.
pub fn customer_balance_excluding(sales: &[Sale], customer_id: &str, exclude_sale_id: &str) -> Money {
    sales
        .iter()
        .filter(|s| s.customer_id == customer_id && s.id != exclude_sale_id)
        .map(Sale::balance)
        .sum()
}

/// Date of the customer's most recent sale, optionally ignoring the sale
/// currently being entered or edited. `None` means no prior sales exist -
/// a defined sentinel, not an error.
pub fn last_purchase_date(
    sales: &[Sale],
    customer_id: &str,
    exclude_sale_id: Option<&str>,
) -> Option<NaiveDate> {
    sales
        .iter()
        .filter(|s| s.customer_id == customer_id && Some(s.id.as_str()) != exclude_sale_id)
        .map(|s| s.date)
        .max()
}

// =============================================================================
// Personal Account Summaries
// =============================================================================

/// Cash position of one shop principal: money taken in from sales versus
/// money handed out to dealers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalAccountSummary {
    pub total_received: Money,
    pub total_paid_to_dealers: Money,
    pub net_amount: Money,
}

/// Derives the summary for `payer` by scanning sale receipts (`paid_to`)
/// and bill payments (`payer`). Names are matched exactly.
pub fn personal_account_summary(bills: &[Bill], sales: &[Sale], payer: &str) -> PersonalAccountSummary {
    let total_received: Money = sales
        .iter()
        .filter(|s| s.paid_to == payer)
        .map(|s| s.amount_paid)
        .sum();

    let total_paid_to_dealers: Money = bills
        .iter()
        .flat_map(|b| b.payments.iter())
        .filter(|p| p.payer == payer)
        .map(|p| p.amount)
        .sum();

    PersonalAccountSummary {
        total_received,
        total_paid_to_dealers,
        net_amount: total_received - total_paid_to_dealers,
    }
}

// =============================================================================
// Monthly Sales
// =============================================================================

/// Sale revenue for the current and immediately preceding calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub current_month: Money,
    pub previous_month: Money,
}

impl MonthlySales {
    /// Month-over-month change in percent.
    ///
    /// ## Edge Policy
    /// previous > 0 → ordinary ratio; previous == 0 with current > 0 →
    /// 100%; both zero → 0%. Avoids division by zero.
    pub fn percentage_change(&self) -> f64 {
        if self.previous_month.is_positive() {
            (self.current_month.paisa() - self.previous_month.paisa()) as f64
                / self.previous_month.paisa() as f64
                * 100.0
        } else if self.current_month.is_positive() {
            100.0
        } else {
            0.0
        }
    }
}

/// Sums sale totals for the calendar month containing `today` and the one
/// before it. The reference date is a parameter so the derivation stays
/// pure and testable.
pub fn monthly_sales(sales: &[Sale], today: NaiveDate) -> MonthlySales {
    let current = (today.year(), today.month());
    let previous = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };

    let sum_for = |period: (i32, u32)| -> Money {
        sales
            .iter()
            .filter(|s| (s.date.year(), s.date.month()) == period)
            .map(Sale::total)
            .sum()
    };

    MonthlySales {
        current_month: sum_for(current),
        previous_month: sum_for(previous),
    }
}

// =============================================================================
// Profit
// =============================================================================

/// Revenue minus cost of goods sold.
///
/// COGS comes from the unit cost frozen on each sale line when the sale
/// was recorded, so later catalog-cost edits do not rewrite history.
pub fn total_profit(sales: &[Sale]) -> Money {
    let revenue: Money = sales.iter().map(Sale::total).sum();
    let cogs: Money = sales
        .iter()
        .flat_map(|s| s.items.iter())
        .map(|i| i.line_cost())
        .sum();
    revenue - cogs
}

// =============================================================================
// Recent Payments
// =============================================================================

/// A dealer payment annotated for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment: BillPayment,
    /// "Unknown" when the owning bill's dealer does not resolve.
    pub dealer_name: String,
    pub bill_number: String,
}

/// Flattens every bill's payments, annotates them with dealer name and
/// bill number, and sorts newest first.
pub fn recent_payments(dealers: &[Dealer], bills: &[Bill]) -> Vec<PaymentRecord> {
    let mut records: Vec<PaymentRecord> = bills
        .iter()
        .flat_map(|bill| {
            let dealer_name = dealers
                .iter()
                .find(|d| d.id == bill.dealer_id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            bill.payments.iter().map(move |p| PaymentRecord {
                payment: p.clone(),
                dealer_name: dealer_name.clone(),
                bill_number: bill.bill_number.clone(),
            })
        })
        .collect();

    records.sort_by(|a, b| b.payment.date.cmp(&a.payment.date));
    records
}

// =============================================================================
// Unit Tests
// =============================================================================
