//! # Sale Repository
//!
//! Database operations for sales and sale items, including the stock
//! movements they cause.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD                                                             │
//! │     └── record() → one transaction:                                    │
//! │         • find-or-create the customer (case-insensitive name)          │
//! │         • check EVERY line against stock, then decrement               │
//! │         • insert sale + items with frozen cost snapshots               │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── update() → one transaction:                                    │
//! │         • credit the old lines' quantities back first                  │
//! │         • re-check and decrement the new lines                         │
//! │         • replace the line items                                       │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── delete() → one transaction:                                    │
//! │         • credit quantities back to the source stock items             │
//! │         • remove the sale and its lines                                │
//! │                                                                         │
//! │  A failed check rolls the whole transaction back - stock is never      │
//! │  partially decremented.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::customer;
use khata_core::validation::{
    validate_amount_paisa, validate_line_count, validate_name, validate_quantity,
};
use khata_core::{
    CoreError, Money, PaymentMethod, Sale, SaleItem, SaleType, ValidationError,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: String,
    customer_id: String,
    bill_no: String,
    date: NaiveDate,
    sale_type: SaleType,
    amount_paid_paisa: i64,
    payment_method: PaymentMethod,
    paid_to: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    stock_item_id: String,
    quantity: i64,
    sale_price_paisa: i64,
    cost_per_unit_snapshot_paisa: i64,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            stock_item_id: row.stock_item_id,
            quantity: row.quantity,
            sale_price: Money::from_paisa(row.sale_price_paisa),
            cost_per_unit_snapshot: Money::from_paisa(row.cost_per_unit_snapshot_paisa),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StockRow {
    brand: String,
    quantity: i64,
    cost_per_unit_paisa: i64,
}

// =============================================================================
// Input Types
// =============================================================================

/// One requested line of a new or edited sale.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub stock_item_id: String,
    pub quantity: i64,
    pub sale_price: Money,
}

/// Everything the sale form submits.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub date: NaiveDate,
    pub sale_type: SaleType,
    pub lines: Vec<NewSaleLine>,
    pub amount_paid: Money,
    pub payment_method: PaymentMethod,
    /// Which shop principal received the money.
    pub paid_to: String,
}

/// Fields an edit may change. The customer stays with the sale.
#[derive(Debug, Clone)]
pub struct SaleUpdate {
    pub date: NaiveDate,
    pub sale_type: SaleType,
    pub lines: Vec<NewSaleLine>,
    pub amount_paid: Money,
    pub payment_method: PaymentMethod,
    pub paid_to: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale: resolves the customer, checks and decrements stock,
    /// and inserts the sale with frozen cost snapshots - all in one
    /// transaction. A sale rejected for stock rolls the customer write back
    /// with everything else.
    pub async fn record(&self, new: NewSale) -> DbResult<Sale> {
        validate_name(&new.customer_name).map_err(CoreError::from)?;
        validate_sale_inputs(&new.lines, new.amount_paid, &new.paid_to)?;

        let mut tx = self.pool.begin().await?;

        let customer = customer::ensure_customer(
            &mut tx,
            &new.customer_name,
            new.customer_contact.as_deref(),
        )
        .await?;

        let line_costs = check_and_decrement(&mut tx, &new.lines).await?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let sale = Sale {
            id: sale_id.clone(),
            customer_id: customer.id,
            bill_no: generate_bill_no(&sale_id),
            date: new.date,
            sale_type: new.sale_type,
            items: new
                .lines
                .iter()
                .zip(line_costs)
                .map(|(line, cost)| SaleItem {
                    id: Uuid::new_v4().to_string(),
                    sale_id: sale_id.clone(),
                    stock_item_id: line.stock_item_id.clone(),
                    quantity: line.quantity,
                    sale_price: line.sale_price,
                    cost_per_unit_snapshot: cost,
                })
                .collect(),
            amount_paid: new.amount_paid,
            payment_method: new.payment_method,
            paid_to: new.paid_to.trim().to_string(),
            created_at: now,
        };

        debug!(id = %sale.id, bill_no = %sale.bill_no, lines = sale.items.len(), "Recording sale");

        insert_sale(&mut tx, &sale).await?;

        tx.commit().await?;
        Ok(sale)
    }

    /// Edits a sale. Old quantities are credited back before the new lines
    /// are checked, so shrinking or re-saving a sale never fails its own
    /// stock check.
    ///
    /// ## Snapshot Rule
    /// A new line for a stock item the old sale already carried keeps the
    /// old frozen cost; a genuinely new line freezes the current catalog
    /// cost.
    pub async fn update(&self, sale_id: &str, update: SaleUpdate) -> DbResult<Sale> {
        validate_sale_inputs(&update.lines, update.amount_paid, &update.paid_to)?;

        let mut tx = self.pool.begin().await?;

        let existing: Option<SaleRow> = sqlx::query_as(
            "SELECT id, customer_id, bill_no, date, sale_type, amount_paid_paisa,
                    payment_method, paid_to, created_at
             FROM sales WHERE id = ?1",
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?;
        let existing = existing.ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let old_items: Vec<SaleItemRow> = sqlx::query_as(
            "SELECT id, sale_id, stock_item_id, quantity, sale_price_paisa,
                    cost_per_unit_snapshot_paisa
             FROM sale_items WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        restock(&mut tx, &old_items).await?;

        let line_costs = check_and_decrement(&mut tx, &update.lines).await?;

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE sales SET date = ?2, sale_type = ?3, amount_paid_paisa = ?4,
                    payment_method = ?5, paid_to = ?6
             WHERE id = ?1",
        )
        .bind(sale_id)
        .bind(update.date)
        .bind(update.sale_type)
        .bind(update.amount_paid.paisa())
        .bind(update.payment_method)
        .bind(update.paid_to.trim())
        .execute(&mut *tx)
        .await?;

        let sale = Sale {
            id: sale_id.to_string(),
            customer_id: existing.customer_id,
            bill_no: existing.bill_no,
            date: update.date,
            sale_type: update.sale_type,
            items: update
                .lines
                .iter()
                .zip(line_costs)
                .map(|(line, current_cost)| {
                    let snapshot = old_items
                        .iter()
                        .find(|old| old.stock_item_id == line.stock_item_id)
                        .map(|old| Money::from_paisa(old.cost_per_unit_snapshot_paisa))
                        .unwrap_or(current_cost);
                    SaleItem {
                        id: Uuid::new_v4().to_string(),
                        sale_id: sale_id.to_string(),
                        stock_item_id: line.stock_item_id.clone(),
                        quantity: line.quantity,
                        sale_price: line.sale_price,
                        cost_per_unit_snapshot: snapshot,
                    }
                })
                .collect(),
            amount_paid: update.amount_paid,
            payment_method: update.payment_method,
            paid_to: update.paid_to.trim().to_string(),
            created_at: existing.created_at,
        };

        for item in &sale.items {
            insert_sale_item(&mut tx, item).await?;
        }

        debug!(id = %sale.id, lines = sale.items.len(), "Updated sale");

        tx.commit().await?;
        Ok(sale)
    }

    /// Deletes a sale, crediting every line's quantity back to its source
    /// stock item first.
    ///
    /// A line whose source item was removed with its bill is skipped:
    /// there is nothing left to restock.
    pub async fn delete(&self, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let items: Vec<SaleItemRow> = sqlx::query_as(
            "SELECT id, sale_id, stock_item_id, quantity, sale_price_paisa,
                    cost_per_unit_snapshot_paisa
             FROM sale_items WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        restock(&mut tx, &items).await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        debug!(id = %sale_id, restocked_lines = items.len(), "Deleted sale");

        tx.commit().await?;
        Ok(())
    }

    /// Gets a sale by id with its line items.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let row: Option<SaleRow> = sqlx::query_as(
            "SELECT id, customer_id, bill_no, date, sale_type, amount_paid_paisa,
                    payment_method, paid_to, created_at
             FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut sales = self.assemble(vec![row]).await?;
                Ok(sales.pop())
            }
            None => Ok(None),
        }
    }

    /// Lists all sales, newest business date first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            "SELECT id, customer_id, bill_no, date, sale_type, amount_paid_paisa,
                    payment_method, paid_to, created_at
             FROM sales
             ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Lists one customer's sales, newest business date first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            "SELECT id, customer_id, bill_no, date, sale_type, amount_paid_paisa,
                    payment_method, paid_to, created_at
             FROM sales WHERE customer_id = ?1
             ORDER BY date DESC, created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Attaches line items to sale rows.
    async fn assemble(&self, rows: Vec<SaleRow>) -> DbResult<Vec<Sale>> {
        let items: Vec<SaleItemRow> = sqlx::query_as(
            "SELECT id, sale_id, stock_item_id, quantity, sale_price_paisa,
                    cost_per_unit_snapshot_paisa
             FROM sale_items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sales: Vec<Sale> = rows
            .into_iter()
            .map(|row| Sale {
                id: row.id,
                customer_id: row.customer_id,
                bill_no: row.bill_no,
                date: row.date,
                sale_type: row.sale_type,
                items: Vec::new(),
                amount_paid: Money::from_paisa(row.amount_paid_paisa),
                payment_method: row.payment_method,
                paid_to: row.paid_to,
                created_at: row.created_at,
            })
            .collect();

        for item in items {
            if let Some(sale) = sales.iter_mut().find(|s| s.id == item.sale_id) {
                sale.items.push(SaleItem::from(item));
            }
        }

        Ok(sales)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Checks every requested line against current stock, then decrements.
///
/// Two phases on purpose: phase one only reads, so the first failing line
/// aborts before any quantity has moved. Lines naming the same stock item
/// are checked cumulatively.
///
/// Returns the current unit cost per line, in request order, for the
/// caller to freeze on the sale items.
async fn check_and_decrement(
    tx: &mut SqliteConnection,
    lines: &[NewSaleLine],
) -> DbResult<Vec<Money>> {
    let mut costs = Vec::with_capacity(lines.len());

    // Phase 1: read and check.
    for (index, line) in lines.iter().enumerate() {
        let stock: Option<StockRow> = sqlx::query_as(
            "SELECT brand, quantity, cost_per_unit_paisa FROM bill_items WHERE id = ?1",
        )
        .bind(&line.stock_item_id)
        .fetch_optional(&mut *tx)
        .await?;
        let stock =
            stock.ok_or_else(|| CoreError::StockItemNotFound(line.stock_item_id.clone()))?;

        let already_requested: i64 = lines[..index]
            .iter()
            .filter(|l| l.stock_item_id == line.stock_item_id)
            .map(|l| l.quantity)
            .sum();

        let available = stock.quantity - already_requested;
        if line.quantity > available {
            return Err(CoreError::InsufficientStock {
                brand: stock.brand,
                available,
                requested: line.quantity,
            }
            .into());
        }

        costs.push(Money::from_paisa(stock.cost_per_unit_paisa));
    }

    // Phase 2: decrement.
    for line in lines {
        sqlx::query("UPDATE bill_items SET quantity = quantity - ?2 WHERE id = ?1")
            .bind(&line.stock_item_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
    }

    Ok(costs)
}

/// Credits sale line quantities back to their source stock items.
async fn restock(tx: &mut SqliteConnection, items: &[SaleItemRow]) -> DbResult<()> {
    for item in items {
        // rows_affected 0 means the source bill is gone; nothing to credit.
        sqlx::query("UPDATE bill_items SET quantity = quantity + ?2 WHERE id = ?1")
            .bind(&item.stock_item_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

async fn insert_sale(tx: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sales (id, customer_id, bill_no, date, sale_type,
                            amount_paid_paisa, payment_method, paid_to, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(&sale.bill_no)
    .bind(sale.date)
    .bind(sale.sale_type)
    .bind(sale.amount_paid.paisa())
    .bind(sale.payment_method)
    .bind(&sale.paid_to)
    .bind(sale.created_at)
    .execute(&mut *tx)
    .await?;

    for item in &sale.items {
        insert_sale_item(tx, item).await?;
    }

    Ok(())
}

async fn insert_sale_item(tx: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sale_items (id, sale_id, stock_item_id, quantity,
                                 sale_price_paisa, cost_per_unit_snapshot_paisa)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.stock_item_id)
    .bind(item.quantity)
    .bind(item.sale_price.paisa())
    .bind(item.cost_per_unit_snapshot.paisa())
    .execute(&mut *tx)
    .await?;

    Ok(())
}

/// Shared validation for record() and update().
fn validate_sale_inputs(lines: &[NewSaleLine], amount_paid: Money, paid_to: &str) -> DbResult<()> {
    if lines.is_empty() {
        return Err(CoreError::Validation(ValidationError::Required {
            field: "items".to_string(),
        })
        .into());
    }
    validate_line_count(lines.len()).map_err(CoreError::from)?;
    for line in lines {
        validate_quantity(line.quantity).map_err(CoreError::from)?;
        validate_amount_paisa(line.sale_price.paisa()).map_err(CoreError::from)?;
    }
    validate_amount_paisa(amount_paid.paisa()).map_err(CoreError::from)?;
    validate_name(paid_to).map_err(CoreError::from)?;
    Ok(())
}

/// Generates a receipt-style sale number: S-YYYYMMDD-XXXXXX.
///
/// The suffix is the leading hex of the sale's own UUID, so two sales
/// recorded in the same instant still get distinct numbers.
fn generate_bill_no(sale_id: &str) -> String {
    let suffix: String = sale_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(6)
        .collect();
    format!("S-{}-{}", Utc::now().format("%Y%m%d"), suffix.to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::dealer::NewStockItem;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Seeds one dealer bill carrying `quantity` suits at Rs 5000 cost and
    /// returns the stock item id.
    async fn seed_stock(db: &Database, quantity: i64) -> String {
        let dealer = db.dealers().create("Sana Safinaz", "").await.unwrap();
        let bill = db
            .dealers()
            .add_bill(
                &dealer.id,
                "BN-501",
                "2024-05-01".parse().unwrap(),
                Money::from_rupees(5000 * quantity),
                vec![NewStockItem {
                    brand: "Sana Safinaz".to_string(),
                    description: "Luxury Lawn Suit".to_string(),
                    quantity,
                    cost_per_unit: Money::from_rupees(5000),
                }],
            )
            .await
            .unwrap();
        bill.items[0].id.clone()
    }

    async fn stock_quantity(db: &Database, item_id: &str) -> i64 {
        sqlx::query_scalar("SELECT quantity FROM bill_items WHERE id = ?1")
            .bind(item_id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn sale_for(item_id: &str, quantity: i64, paid: i64) -> NewSale {
        NewSale {
            customer_name: "Ali Khan".to_string(),
            customer_contact: None,
            date: "2024-06-01".parse().unwrap(),
            sale_type: SaleType::Credit,
            lines: vec![NewSaleLine {
                stock_item_id: item_id.to_string(),
                quantity,
                sale_price: Money::from_rupees(7000),
            }],
            amount_paid: Money::from_rupees(paid),
            payment_method: PaymentMethod::Cash,
            paid_to: "Faisal Rehman".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_decrements_stock_and_freezes_cost() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 10).await;

        let sale = db.sales().record(sale_for(&item_id, 3, 21_000)).await.unwrap();

        assert_eq!(stock_quantity(&db, &item_id).await, 7);
        assert_eq!(sale.items[0].cost_per_unit_snapshot, Money::from_rupees(5000));
        assert_eq!(sale.total(), Money::from_rupees(21_000));
        assert_eq!(sale.balance(), Money::zero());
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_untouched() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 3).await;

        let err = db.sales().record(sale_for(&item_id, 4, 0)).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            })
        ));
        // No decrement, no sale row, and the customer write rolled back too.
        assert_eq!(stock_quantity(&db, &item_id).await, 3);
        assert!(db.sales().list().await.unwrap().is_empty());
        assert!(db.customers().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_sale_does_not_touch_existing_customer() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 3).await;
        db.customers()
            .ensure("Ali Khan", Some("0300-1111111"))
            .await
            .unwrap();

        let mut new = sale_for(&item_id, 4, 0);
        new.customer_contact = Some("0300-9999999".to_string());
        assert!(db.sales().record(new).await.is_err());

        // The contact overwrite rolled back with the rest of the sale.
        let customer = db.customers().find_by_name("Ali Khan").await.unwrap().unwrap();
        assert_eq!(customer.contact.as_deref(), Some("0300-1111111"));
    }

    #[tokio::test]
    async fn test_multi_line_failure_rolls_back_earlier_lines() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 5).await;

        let mut new = sale_for(&item_id, 3, 0);
        // Second line for the same item pushes the cumulative request to 6.
        new.lines.push(NewSaleLine {
            stock_item_id: item_id.clone(),
            quantity: 3,
            sale_price: Money::from_rupees(7000),
        });

        assert!(db.sales().record(new).await.is_err());
        assert_eq!(stock_quantity(&db, &item_id).await, 5);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 10).await;

        let sale = db.sales().record(sale_for(&item_id, 4, 0)).await.unwrap();
        assert_eq!(stock_quantity(&db, &item_id).await, 6);

        db.sales().delete(&sale.id).await.unwrap();

        // Round trip: quantity is exactly back where it started.
        assert_eq!(stock_quantity(&db, &item_id).await, 10);
        assert!(db.sales().get(&sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_credits_back_before_checking() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 4).await;

        // The sale takes everything.
        let sale = db.sales().record(sale_for(&item_id, 4, 0)).await.unwrap();
        assert_eq!(stock_quantity(&db, &item_id).await, 0);

        // Re-saving the same quantity must succeed despite zero on hand.
        let updated = db
            .sales()
            .update(
                &sale.id,
                SaleUpdate {
                    date: sale.date,
                    sale_type: sale.sale_type,
                    lines: vec![NewSaleLine {
                        stock_item_id: item_id.clone(),
                        quantity: 4,
                        sale_price: Money::from_rupees(7500),
                    }],
                    amount_paid: Money::from_rupees(10_000),
                    payment_method: PaymentMethod::Cash,
                    paid_to: "Hafiz Abdul Rasheed".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(stock_quantity(&db, &item_id).await, 0);
        assert_eq!(updated.total(), Money::from_rupees(30_000));
        // The line kept its original frozen cost.
        assert_eq!(updated.items[0].cost_per_unit_snapshot, Money::from_rupees(5000));

        // Shrinking the sale frees stock.
        db.sales()
            .update(
                &sale.id,
                SaleUpdate {
                    date: sale.date,
                    sale_type: sale.sale_type,
                    lines: vec![NewSaleLine {
                        stock_item_id: item_id.clone(),
                        quantity: 1,
                        sale_price: Money::from_rupees(7500),
                    }],
                    amount_paid: Money::from_rupees(7500),
                    payment_method: PaymentMethod::Cash,
                    paid_to: "Hafiz Abdul Rasheed".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(stock_quantity(&db, &item_id).await, 3);
    }

    #[tokio::test]
    async fn test_update_beyond_available_fails_atomically() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 4).await;
        let sale = db.sales().record(sale_for(&item_id, 2, 0)).await.unwrap();

        // 2 held by the sale + 2 on hand = 4 available; 5 is too many.
        let err = db
            .sales()
            .update(
                &sale.id,
                SaleUpdate {
                    date: sale.date,
                    sale_type: sale.sale_type,
                    lines: vec![NewSaleLine {
                        stock_item_id: item_id.clone(),
                        quantity: 5,
                        sale_price: Money::from_rupees(7000),
                    }],
                    amount_paid: Money::zero(),
                    payment_method: PaymentMethod::Cash,
                    paid_to: "Faisal Rehman".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        // Rolled back: the sale still holds 2 and stock still shows 2.
        assert_eq!(stock_quantity(&db, &item_id).await, 2);
        let unchanged = db.sales().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(unchanged.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_sales_reuse_customer_case_insensitively() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 10).await;

        let mut first = sale_for(&item_id, 1, 7000);
        first.customer_name = "Ali Khan".to_string();
        let mut second = sale_for(&item_id, 1, 7000);
        second.customer_name = "ALI KHAN".to_string();

        let s1 = db.sales().record(first).await.unwrap();
        let s2 = db.sales().record(second).await.unwrap();

        assert_eq!(s1.customer_id, s2.customer_id);
        assert_eq!(db.customers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bill_numbers_are_distinct_for_simultaneous_sales() {
        let db = test_db().await;
        let item_id = seed_stock(&db, 10).await;

        // Back-to-back in the same millisecond must not collide.
        let s1 = db.sales().record(sale_for(&item_id, 1, 7000)).await.unwrap();
        let s2 = db.sales().record(sale_for(&item_id, 1, 7000)).await.unwrap();

        assert_ne!(s1.bill_no, s2.bill_no);
        assert!(s1.bill_no.starts_with("S-"));
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let db = test_db().await;
        let mut new = sale_for("irrelevant", 1, 0);
        new.lines.clear();
        assert!(db.sales().record(new).await.is_err());
    }
}
