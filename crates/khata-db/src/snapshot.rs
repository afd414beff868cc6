//! # Snapshot Assembly
//!
//! Materializes a [`LedgerSnapshot`] from the record store and assembles
//! the dashboard summary from it.
//!
//! Every figure is re-derived from the snapshot on each call; nothing here
//! caches. A snapshot taken after a commit always reflects that commit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;
use khata_core::ledger::{MonthlySales, PaymentRecord};
use khata_core::{stock, LedgerSnapshot, Money};

/// The numbers the dashboard shows on one screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// How many dealers the shop buys from.
    pub dealer_count: usize,
    /// Total owed to all dealers.
    pub total_outstanding_debt: Money,
    /// Value of all remaining stock at cost.
    pub total_inventory_value: Money,
    /// Current and previous calendar month revenue.
    pub monthly_sales: MonthlySales,
    /// Month-over-month revenue change in percent.
    pub sales_change_pct: f64,
    /// Revenue minus cost of goods sold, all time.
    pub total_profit: Money,
    /// Most recent dealer payments, newest first.
    pub recent_payments: Vec<PaymentRecord>,
}

/// How many payments the dashboard feed shows.
const RECENT_PAYMENT_LIMIT: usize = 10;

impl Database {
    /// Loads a consistent view of all four record collections.
    pub async fn snapshot(&self) -> DbResult<LedgerSnapshot> {
        let dealers = self.dealers().list().await?;
        let bills = self.dealers().list_bills().await?;
        let customers = self.customers().list().await?;
        let sales = self.sales().list().await?;

        debug!(
            dealers = dealers.len(),
            bills = bills.len(),
            customers = customers.len(),
            sales = sales.len(),
            "Assembled ledger snapshot"
        );

        Ok(LedgerSnapshot {
            dealers,
            bills,
            customers,
            sales,
        })
    }

    /// Derives the dashboard summary as of `today`.
    pub async fn dashboard_summary(&self, today: NaiveDate) -> DbResult<DashboardSummary> {
        let snapshot = self.snapshot().await?;

        let monthly_sales = snapshot.monthly_sales(today);
        let mut recent_payments = snapshot.recent_payments();
        recent_payments.truncate(RECENT_PAYMENT_LIMIT);

        Ok(DashboardSummary {
            dealer_count: snapshot.dealers.len(),
            total_outstanding_debt: snapshot.total_outstanding_debt(),
            total_inventory_value: stock::total_inventory_value(&snapshot.bills),
            sales_change_pct: monthly_sales.percentage_change(),
            monthly_sales,
            total_profit: snapshot.total_profit(),
            recent_payments,
        })
    }
}

// =============================================================================
// Integration Tests
// =============================================================================
