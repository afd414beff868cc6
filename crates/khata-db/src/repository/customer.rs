//! # Customer Repository
//!
//! Customer lookup and search. Customers are mostly written as a side
//! effect of recording sales (see [`crate::repository::sale`]); this
//! repository covers the read paths and the shared lookup rules.
//!
//! ## Identity Rule
//! A customer is identified by case-insensitive name match. "ali khan" and
//! "Ali Khan" are the same person; the first sale creates the record, later
//! sales reuse it and may overwrite the contact.
//!
//! The find-or-create step runs on whatever connection the caller hands it,
//! so a sale can resolve its customer inside the same transaction that
//! moves stock - a rejected sale leaves no customer behind.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use khata_core::validation::{validate_contact, validate_name, validate_search_query};
use khata_core::Customer;

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    contact: Option<String>,
    avatar_url: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            contact: row.contact,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, contact, avatar_url, created_at FROM customers";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Customer::from))
    }

    /// Finds a customer by name, case-insensitively.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        find_by_name_on(&mut conn, name).await
    }

    /// Lists all customers in name order.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY name COLLATE NOCASE"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Searches customers by name or contact substring, case-insensitively.
    ///
    /// An empty query returns all customers.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query).map_err(khata_core::CoreError::from)?;
        if query.is_empty() {
            return self.list().await;
        }

        let pattern = format!("%{query}%");
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE name LIKE ?1 OR contact LIKE ?1 ORDER BY name COLLATE NOCASE"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Finds a customer by name or creates one.
    ///
    /// ## Contact Overwrite
    /// When the customer already exists and `contact` is non-empty, the
    /// stored contact is replaced - the latest sale form wins.
    pub async fn ensure(&self, name: &str, contact: Option<&str>) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        ensure_customer(&mut conn, name, contact).await
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

async fn find_by_name_on(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<Customer>> {
    let row: Option<CustomerRow> = sqlx::query_as(&format!(
        "{SELECT_COLUMNS} WHERE name = ?1 COLLATE NOCASE"
    ))
    .bind(name.trim())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Customer::from))
}

/// Find-or-create on an explicit connection, so callers can fold the
/// customer write into a larger transaction. Rolls back with it.
pub(crate) async fn ensure_customer(
    conn: &mut SqliteConnection,
    name: &str,
    contact: Option<&str>,
) -> DbResult<Customer> {
    validate_name(name).map_err(khata_core::CoreError::from)?;
    if let Some(contact) = contact {
        validate_contact(contact).map_err(khata_core::CoreError::from)?;
    }

    if let Some(mut existing) = find_by_name_on(conn, name).await? {
        if let Some(contact) = contact.map(str::trim).filter(|c| !c.is_empty()) {
            sqlx::query("UPDATE customers SET contact = ?2 WHERE id = ?1")
                .bind(&existing.id)
                .bind(contact)
                .execute(&mut *conn)
                .await?;
            existing.contact = Some(contact.to_string());
        }
        return Ok(existing);
    }

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        contact: contact.map(str::trim).filter(|c| !c.is_empty()).map(String::from),
        avatar_url: String::new(),
        created_at: Utc::now(),
    };

    debug!(id = %customer.id, name = %customer.name, "Creating customer");

    sqlx::query(
        "INSERT INTO customers (id, name, contact, avatar_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.contact)
    .bind(&customer.avatar_url)
    .bind(customer.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(customer)
}

// =============================================================================
// Unit Tests
// =============================================================================
