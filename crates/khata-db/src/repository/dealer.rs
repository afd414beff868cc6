//! # Dealer Repository
//!
//! Database operations for dealers, their bills, payments against those
//! bills, and the stock items bills bring in.
//!
//! ## Dealer Ledger Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Dealer Ledger Lifecycle                            │
//! │                                                                         │
//! │  1. CREATE DEALER                                                      │
//! │     └── create() → Dealer { id: max(existing)+1 }                      │
//! │                                                                         │
//! │  2. LOG A BILL (optionally with its goods)                             │
//! │     └── add_bill() → Bill + StockItems, one transaction                │
//! │                                                                         │
//! │  3. PAY IT DOWN OVER TIME                                              │
//! │     └── add_payment() → BillPayment (append-only)                      │
//! │     └── add_payment() → BillPayment                                    │
//! │         (outstanding balance is derived, never stored)                 │
//! │                                                                         │
//! │  4. (RARELY) DELETE DEALER                                             │
//! │     └── delete() → cascades to bills, payments, stock items            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::validation::{
    validate_bill_consistency, validate_name, validate_payment_amount, validate_quantity,
};
use khata_core::{Bill, BillPayment, Dealer, Money, StockItem};

// =============================================================================
// Row Types
// =============================================================================

// The runtime query API maps rows into these flat structs; the repository
// assembles them into the nested domain types.

#[derive(sqlx::FromRow)]
struct DealerRow {
    id: String,
    name: String,
    contact: String,
    avatar_url: String,
    created_at: DateTime<Utc>,
}

impl From<DealerRow> for Dealer {
    fn from(row: DealerRow) -> Self {
        Dealer {
            id: row.id,
            name: row.name,
            contact: row.contact,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BillRow {
    id: String,
    dealer_id: String,
    bill_number: String,
    date: NaiveDate,
    total_amount_paisa: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    bill_id: String,
    amount_paisa: i64,
    date: NaiveDate,
    payer: String,
}

impl From<PaymentRow> for BillPayment {
    fn from(row: PaymentRow) -> Self {
        BillPayment {
            id: row.id,
            bill_id: row.bill_id,
            amount: Money::from_paisa(row.amount_paisa),
            date: row.date,
            payer: row.payer,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    bill_id: String,
    brand: String,
    description: String,
    quantity: i64,
    cost_per_unit_paisa: i64,
}

impl From<ItemRow> for StockItem {
    fn from(row: ItemRow) -> Self {
        StockItem {
            id: row.id,
            bill_id: row.bill_id,
            brand: row.brand,
            description: row.description,
            quantity: row.quantity,
            cost_per_unit: Money::from_paisa(row.cost_per_unit_paisa),
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// A stock item supplied with a new bill, before it has an id.
#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub brand: String,
    pub description: String,
    pub quantity: i64,
    pub cost_per_unit: Money,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for dealer-side ledger operations.
#[derive(Debug, Clone)]
pub struct DealerRepository {
    pool: SqlitePool,
}

impl DealerRepository {
    /// Creates a new DealerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DealerRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Dealers
    // -------------------------------------------------------------------------

    /// Creates a dealer with the next numeric id.
    ///
    /// ## Id Scheme
    /// Dealer ids are numeric-looking strings; the new id is
    /// max(existing)+1, computed and inserted in one transaction so two
    /// concurrent creates cannot collide.
    pub async fn create(&self, name: &str, contact: &str) -> DbResult<Dealer> {
        validate_name(name).map_err(khata_core::CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM dealers")
            .fetch_all(&mut *tx)
            .await?;
        let next_id = ids
            .iter()
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let dealer = Dealer {
            id: next_id.to_string(),
            name: name.trim().to_string(),
            contact: contact.trim().to_string(),
            avatar_url: String::new(),
            created_at: Utc::now(),
        };

        debug!(id = %dealer.id, name = %dealer.name, "Creating dealer");

        sqlx::query(
            "INSERT INTO dealers (id, name, contact, avatar_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&dealer.id)
        .bind(&dealer.name)
        .bind(&dealer.contact)
        .bind(&dealer.avatar_url)
        .bind(dealer.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(dealer)
    }

    /// Gets a dealer by id, without its bills.
    pub async fn get(&self, id: &str) -> DbResult<Option<Dealer>> {
        let row: Option<DealerRow> = sqlx::query_as(
            "SELECT id, name, contact, avatar_url, created_at FROM dealers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Dealer::from))
    }

    /// Lists all dealers in id order.
    pub async fn list(&self) -> DbResult<Vec<Dealer>> {
        let rows: Vec<DealerRow> = sqlx::query_as(
            "SELECT id, name, contact, avatar_url, created_at
             FROM dealers
             ORDER BY CAST(id AS INTEGER)",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Dealer::from).collect())
    }

    /// Deletes a dealer and, via cascade, every bill, payment and stock
    /// item in its ledger.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM dealers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Dealer", id));
        }

        debug!(id = %id, "Deleted dealer and cascaded ledger");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bills
    // -------------------------------------------------------------------------

    /// Logs a bill for a dealer, together with the stock items it brought
    /// in. Bill and items commit in one transaction.
    ///
    /// ## Invariant
    /// When `items` is non-empty the stated total must equal the sum of
    /// the items' line costs; an itemless bill may state any total.
    pub async fn add_bill(
        &self,
        dealer_id: &str,
        bill_number: &str,
        date: NaiveDate,
        total_amount: Money,
        items: Vec<NewStockItem>,
    ) -> DbResult<Bill> {
        for item in &items {
            validate_name(&item.brand).map_err(khata_core::CoreError::from)?;
            validate_quantity(item.quantity).map_err(khata_core::CoreError::from)?;
        }

        let bill_id = Uuid::new_v4().to_string();
        let bill = Bill {
            id: bill_id.clone(),
            dealer_id: dealer_id.to_string(),
            bill_number: bill_number.trim().to_string(),
            date,
            total_amount,
            payments: Vec::new(),
            items: items
                .into_iter()
                .map(|item| StockItem {
                    id: Uuid::new_v4().to_string(),
                    bill_id: bill_id.clone(),
                    brand: item.brand.trim().to_string(),
                    description: item.description.trim().to_string(),
                    quantity: item.quantity,
                    cost_per_unit: item.cost_per_unit,
                })
                .collect(),
            created_at: Utc::now(),
        };

        validate_bill_consistency(&bill)?;

        let mut tx = self.pool.begin().await?;

        let dealer_exists: Option<String> = sqlx::query_scalar("SELECT id FROM dealers WHERE id = ?1")
            .bind(dealer_id)
            .fetch_optional(&mut *tx)
            .await?;
        if dealer_exists.is_none() {
            return Err(DbError::not_found("Dealer", dealer_id));
        }

        debug!(id = %bill.id, bill_number = %bill.bill_number, items = bill.items.len(), "Inserting bill");

        sqlx::query(
            "INSERT INTO bills (id, dealer_id, bill_number, date, total_amount_paisa, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&bill.id)
        .bind(&bill.dealer_id)
        .bind(&bill.bill_number)
        .bind(bill.date)
        .bind(bill.total_amount.paisa())
        .bind(bill.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &bill.items {
            sqlx::query(
                "INSERT INTO bill_items (id, bill_id, brand, description, quantity, cost_per_unit_paisa)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&item.id)
            .bind(&item.bill_id)
            .bind(&item.brand)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.cost_per_unit.paisa())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(bill)
    }

    /// Records a payment against a bill. Append-only: payments are never
    /// edited or removed, matching how the paper khata is kept.
    pub async fn add_payment(
        &self,
        bill_id: &str,
        amount: Money,
        date: NaiveDate,
        payer: &str,
    ) -> DbResult<BillPayment> {
        validate_payment_amount(amount.paisa()).map_err(khata_core::CoreError::from)?;
        validate_name(payer).map_err(khata_core::CoreError::from)?;

        let bill_exists: Option<String> = sqlx::query_scalar("SELECT id FROM bills WHERE id = ?1")
            .bind(bill_id)
            .fetch_optional(&self.pool)
            .await?;
        if bill_exists.is_none() {
            return Err(DbError::not_found("Bill", bill_id));
        }

        let payment = BillPayment {
            id: Uuid::new_v4().to_string(),
            bill_id: bill_id.to_string(),
            amount,
            date,
            payer: payer.trim().to_string(),
        };

        debug!(bill_id = %bill_id, amount = %amount, "Recording bill payment");

        sqlx::query(
            "INSERT INTO bill_payments (id, bill_id, amount_paisa, date, payer)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&payment.id)
        .bind(&payment.bill_id)
        .bind(payment.amount.paisa())
        .bind(payment.date)
        .bind(&payment.payer)
        .execute(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Gets a bill by id with its payments and items.
    pub async fn get_bill(&self, id: &str) -> DbResult<Option<Bill>> {
        let row: Option<BillRow> = sqlx::query_as(
            "SELECT id, dealer_id, bill_number, date, total_amount_paisa, created_at
             FROM bills WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut bills = self.assemble(vec![row]).await?;
                Ok(bills.pop())
            }
            None => Ok(None),
        }
    }

    /// Lists one dealer's bills, newest business date first.
    pub async fn bills_for_dealer(&self, dealer_id: &str) -> DbResult<Vec<Bill>> {
        let rows: Vec<BillRow> = sqlx::query_as(
            "SELECT id, dealer_id, bill_number, date, total_amount_paisa, created_at
             FROM bills WHERE dealer_id = ?1
             ORDER BY date DESC, created_at DESC",
        )
        .bind(dealer_id)
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Lists every bill with payments and items, for snapshot assembly.
    pub async fn list_bills(&self) -> DbResult<Vec<Bill>> {
        let rows: Vec<BillRow> = sqlx::query_as(
            "SELECT id, dealer_id, bill_number, date, total_amount_paisa, created_at
             FROM bills
             ORDER BY date, created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Attaches payments and items to bill rows.
    ///
    /// Loads each child table once and distributes in memory rather than
    /// issuing a query per bill.
    async fn assemble(&self, rows: Vec<BillRow>) -> DbResult<Vec<Bill>> {
        let payments: Vec<PaymentRow> = sqlx::query_as(
            "SELECT id, bill_id, amount_paisa, date, payer
             FROM bill_payments ORDER BY date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, bill_id, brand, description, quantity, cost_per_unit_paisa
             FROM bill_items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut bills: Vec<Bill> = rows
            .into_iter()
            .map(|row| Bill {
                id: row.id,
                dealer_id: row.dealer_id,
                bill_number: row.bill_number,
                date: row.date,
                total_amount: Money::from_paisa(row.total_amount_paisa),
                payments: Vec::new(),
                items: Vec::new(),
                created_at: row.created_at,
            })
            .collect();

        for payment in payments {
            if let Some(bill) = bills.iter_mut().find(|b| b.id == payment.bill_id) {
                bill.payments.push(BillPayment::from(payment));
            }
        }
        for item in items {
            if let Some(bill) = bills.iter_mut().find(|b| b.id == item.bill_id) {
                bill.items.push(StockItem::from(item));
            }
        }

        Ok(bills)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn suits(quantity: i64, cost: i64) -> NewStockItem {
        NewStockItem {
            brand: "Sana Safinaz".to_string(),
            description: "Luxury Lawn Suit".to_string(),
            quantity,
            cost_per_unit: Money::from_rupees(cost),
        }
    }

    #[tokio::test]
    async fn test_dealer_ids_are_sequential() {
        let db = test_db().await;
        let first = db.dealers().create("Sana Safinaz", "sana@mail.pk").await.unwrap();
        let second = db.dealers().create("Sapphire", "").await.unwrap();

        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
    }

    #[tokio::test]
    async fn test_bill_and_payment_round_trip() {
        let db = test_db().await;
        let dealers = db.dealers();
        let dealer = dealers.create("Khaadi", "").await.unwrap();

        let bill = dealers
            .add_bill(
                &dealer.id,
                "BN-501",
                "2024-05-01".parse().unwrap(),
                Money::from_rupees(150_000),
                vec![suits(30, 5000)],
            )
            .await
            .unwrap();

        dealers
            .add_payment(
                &bill.id,
                Money::from_rupees(100_000),
                "2024-05-10".parse().unwrap(),
                "Faisal Rehman",
            )
            .await
            .unwrap();

        let loaded = dealers.get_bill(&bill.id).await.unwrap().unwrap();
        assert_eq!(loaded.outstanding(), Money::from_rupees(50_000));
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].quantity, 30);
    }

    #[tokio::test]
    async fn test_bill_total_mismatch_rejected() {
        let db = test_db().await;
        let dealers = db.dealers();
        let dealer = dealers.create("Khaadi", "").await.unwrap();

        // 30 × Rs 5000 = 150,000 but the bill claims 140,000.
        let err = dealers
            .add_bill(
                &dealer.id,
                "BN-502",
                "2024-05-01".parse().unwrap(),
                Money::from_rupees(140_000),
                vec![suits(30, 5000)],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(khata_core::CoreError::BillTotalMismatch { .. })
        ));
        // Nothing committed.
        assert!(dealers.list_bills().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_itemless_bill_accepts_stated_total() {
        let db = test_db().await;
        let dealers = db.dealers();
        let dealer = dealers.create("Gul Ahmed", "").await.unwrap();

        let bill = dealers
            .add_bill(
                &dealer.id,
                "BN-503",
                "2024-05-02".parse().unwrap(),
                Money::from_rupees(75_000),
                Vec::new(),
            )
            .await
            .unwrap();

        assert_eq!(bill.total_amount, Money::from_rupees(75_000));
        assert!(bill.items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_dealer_cascades() {
        let db = test_db().await;
        let dealers = db.dealers();
        let dealer = dealers.create("Khaadi", "").await.unwrap();
        let bill = dealers
            .add_bill(
                &dealer.id,
                "BN-504",
                "2024-05-01".parse().unwrap(),
                Money::from_rupees(150_000),
                vec![suits(30, 5000)],
            )
            .await
            .unwrap();
        dealers
            .add_payment(
                &bill.id,
                Money::from_rupees(10_000),
                "2024-05-02".parse().unwrap(),
                "Faisal Rehman",
            )
            .await
            .unwrap();

        dealers.delete(&dealer.id).await.unwrap();

        assert!(dealers.get(&dealer.id).await.unwrap().is_none());
        assert!(dealers.list_bills().await.unwrap().is_empty());
        let orphan_payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_payments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphan_payments, 0);
    }

    #[tokio::test]
    async fn test_payment_against_unknown_bill() {
        let db = test_db().await;
        let err = db
            .dealers()
            .add_payment(
                "no-such-bill",
                Money::from_rupees(100),
                "2024-05-02".parse().unwrap(),
                "Faisal Rehman",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
