//! # Domain Types
//!
//! Core domain types used throughout Dukaan Khata.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Dealer      │   │      Bill       │   │   BillPayment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (numeric)   │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name, contact  │   │  dealer_id (FK) │   │  amount, date   │       │
//! │  └─────────────────┘   │  total_amount   │   │  payer          │       │
//! │                        │  payments[]     │   └─────────────────┘       │
//! │  ┌─────────────────┐   │  items[]        │   ┌─────────────────┐       │
//! │  │    Customer     │   └─────────────────┘   │    StockItem    │       │
//! │  │  ─────────────  │   ┌─────────────────┐   │  ─────────────  │       │
//! │  │  id (UUID)      │   │      Sale       │   │  brand, desc    │       │
//! │  │  name, contact? │   │  ─────────────  │   │  quantity       │       │
//! │  └─────────────────┘   │  customer_id    │   │  cost_per_unit  │       │
//! │                        │  items[], paid  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Dealers keep the ledger's historical numeric-looking string ids,
//!   assigned max(existing)+1 by the mutation layer.
//! - Every other record uses a UUID v4 string id.
//!
//! Balance derivations over these types live in [`crate::ledger`]; stock
//! availability rules live in [`crate::stock`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Settlement Status
// =============================================================================

/// The settlement state of a bill or sale, derived from its balance.
///
/// There is no distinct "partially paid" state: any positive balance is
/// due, any non-positive balance (including overpayment) is paid in full.
/// This is a display policy only - the underlying arithmetic keeps the
/// signed balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Balance > 0: money is still owed.
    Due,
    /// Balance ≤ 0: settled (zero) or overpaid (credit).
    PaidInFull,
}

impl SettlementStatus {
    /// Derives the status from a signed balance. The zero boundary is
    /// inclusive on the paid side.
    #[inline]
    pub const fn from_balance(balance: Money) -> Self {
        if balance.is_positive() {
            SettlementStatus::Due
        } else {
            SettlementStatus::PaidInFull
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStatus::Due => write!(f, "Due"),
            SettlementStatus::PaidInFull => write!(f, "Paid in Full"),
        }
    }
}

// =============================================================================
// Sale Type / Payment Method
// =============================================================================

/// Whether a sale was settled up front or extended on credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Cash,
    Credit,
}

/// How the paid portion of a sale was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobilePayment,
}

// =============================================================================
// Dealer
// =============================================================================

/// A supplier the shop owes money to for stocked goods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dealer {
    /// Numeric-looking string id, assigned max(existing)+1.
    pub id: String,
    pub name: String,
    pub contact: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bill
// =============================================================================

/// An invoice from a dealer. Accrues payments over time; its items double
/// as the shop's stock catalog.
///
/// ## Invariant
/// When `items` is non-empty, `total_amount` equals the sum of the items'
/// `cost_per_unit × quantity`. An empty item list with an explicit total
/// is legal (some bills are logged before their goods are itemized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub dealer_id: String,
    pub bill_number: String,
    pub date: NaiveDate,
    pub total_amount: Money,
    pub payments: Vec<BillPayment>,
    pub items: Vec<StockItem>,
    pub created_at: DateTime<Utc>,
}

/// A payment made against a dealer bill. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillPayment {
    pub id: String,
    pub bill_id: String,
    pub amount: Money,
    pub date: NaiveDate,
    /// Free-form payer name; in practice one of the shop principals.
    pub payer: String,
}

// =============================================================================
// Stock Item
// =============================================================================

/// A stocked good, embedded in the bill that brought it in.
///
/// "Inventory" is the flattened union of all bills' items - there is no
/// separate catalog table. Sales decrement `quantity` in place; deleting a
/// sale restores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub bill_id: String,
    pub brand: String,
    pub description: String,
    pub quantity: i64,
    pub cost_per_unit: Money,
}

impl StockItem {
    /// Value of the remaining stock at cost.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.cost_per_unit.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A buyer the shop sells goods to; may owe money back on credit sales.
///
/// Customers are created lazily by the first sale that names them
/// (case-insensitive match); a later sale may overwrite the contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A transaction with a customer, possibly partially paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    /// Receipt-style number generated when the sale is recorded.
    pub bill_no: String,
    pub date: NaiveDate,
    pub sale_type: SaleType,
    pub items: Vec<SaleItem>,
    pub amount_paid: Money,
    pub payment_method: PaymentMethod,
    /// Which shop principal received the money.
    pub paid_to: String,
    pub created_at: DateTime<Utc>,
}

/// A line item on a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// The catalog record this line drew stock from.
    pub stock_item_id: String,
    pub quantity: i64,
    pub sale_price: Money,
    /// Unit cost frozen at the time the sale was recorded, so profit
    /// figures do not shift when the catalog cost is later edited.
    pub cost_per_unit_snapshot: Money,
}

impl SaleItem {
    /// Line revenue (sale_price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.sale_price.multiply_quantity(self.quantity)
    }

    /// Line cost of goods sold, from the frozen unit cost.
    #[inline]
    pub fn line_cost(&self) -> Money {
        self.cost_per_unit_snapshot.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// User & Permissions
// =============================================================================

/// A capability a staff account may hold.
///
/// Authorization is a flat capability set checked per action - there is no
/// role hierarchy. `Admin` implies every other capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Customers,
    Dashboard,
    Dealers,
    Inventory,
    Admin,
}

/// A staff account. The email doubles as the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 hash, never the raw password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Checks whether this account holds a capability. Admin implies all.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission) || self.permissions.contains(&Permission::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.permissions.contains(&Permission::Admin)
    }
}

// =============================================================================
// Session
// =============================================================================

/// A signed-in principal, keyed by an opaque token.
///
/// One row per sign-in: several staff members can be active at once. This
/// replaces the single mutable session slot the original books kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_boundary_is_inclusive_on_paid_side() {
        assert_eq!(
            SettlementStatus::from_balance(Money::from_rupees(1)),
            SettlementStatus::Due
        );
        assert_eq!(
            SettlementStatus::from_balance(Money::zero()),
            SettlementStatus::PaidInFull
        );
        // Overpayment is labelled Paid in Full, not a distinct state.
        assert_eq!(
            SettlementStatus::from_balance(Money::from_rupees(-500)),
            SettlementStatus::PaidInFull
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SettlementStatus::Due.to_string(), "Due");
        assert_eq!(SettlementStatus::PaidInFull.to_string(), "Paid in Full");
    }

    #[test]
    fn test_admin_implies_all_permissions() {
        let user = User {
            id: "u1".into(),
            name: "Admin".into(),
            email: "admin@shop.pk".into(),
            password_hash: String::new(),
            permissions: vec![Permission::Admin],
            created_at: Utc::now(),
        };
        assert!(user.has_permission(Permission::Dealers));
        assert!(user.has_permission(Permission::Admin));
        assert!(user.is_admin());
    }

    #[test]
    fn test_plain_permission_set() {
        let user = User {
            id: "u2".into(),
            name: "Sales".into(),
            email: "sales@shop.pk".into(),
            password_hash: String::new(),
            permissions: vec![Permission::Customers, Permission::Inventory],
            created_at: Utc::now(),
        };
        assert!(user.has_permission(Permission::Customers));
        assert!(!user.has_permission(Permission::Dealers));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_sale_item_line_totals() {
        let item = SaleItem {
            id: "si1".into(),
            sale_id: "s1".into(),
            stock_item_id: "i1".into(),
            quantity: 3,
            sale_price: Money::from_rupees(1500),
            cost_per_unit_snapshot: Money::from_rupees(1000),
        };
        assert_eq!(item.line_total(), Money::from_rupees(4500));
        assert_eq!(item.line_cost(), Money::from_rupees(3000));
    }
}
