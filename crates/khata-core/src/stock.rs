//! # Stock Module
//!
//! Inventory availability and grouping rules.
//!
//! ## Inventory Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  There is NO separate inventory table.                                  │
//! │                                                                         │
//! │  Bill "BN-501" ── items ──┐                                             │
//! │  Bill "BN-502" ── items ──┼──► flatten ──► the shop's stock            │
//! │  Bill "BN-503" ── items ──┘                                             │
//! │                                                                         │
//! │  Sales decrement StockItem.quantity in place; deleting or shrinking     │
//! │  a sale credits the quantity back to the same item.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Availability checks run over ALL requested lines before any quantity is
//! touched, so a sale either applies completely or not at all.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Bill, Sale, StockItem};

// =============================================================================
// Flattening & Totals
// =============================================================================

/// Every stock item across all bills, in bill order.
pub fn all_stock_items(bills: &[Bill]) -> Vec<&StockItem> {
    bills.iter().flat_map(|b| b.items.iter()).collect()
}

/// Value of all remaining stock at cost.
pub fn total_inventory_value(bills: &[Bill]) -> Money {
    bills
        .iter()
        .flat_map(|b| b.items.iter())
        .map(StockItem::stock_value)
        .sum()
}

// =============================================================================
// Grouped Display View
// =============================================================================

/// One row of the inventory page: identical goods from different bills
/// merged into a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub brand: String,
    pub description: String,
    pub cost_per_unit: Money,
    /// Combined remaining quantity across the contributing items.
    pub quantity: i64,
    /// The catalog items folded into this line, in bill order.
    pub item_ids: Vec<String>,
}

/// Groups stock by `(brand, description, cost_per_unit)` and sorts the
/// result by brand then description. Items with differing unit costs stay
/// on separate lines even when the goods read the same.
pub fn grouped_stock(bills: &[Bill]) -> Vec<StockLine> {
    let mut lines: Vec<StockLine> = Vec::new();

    for item in bills.iter().flat_map(|b| b.items.iter()) {
        let existing = lines.iter_mut().find(|l| {
            l.brand == item.brand
                && l.description == item.description
                && l.cost_per_unit == item.cost_per_unit
        });
        match existing {
            Some(line) => {
                line.quantity += item.quantity;
                line.item_ids.push(item.id.clone());
            }
            None => lines.push(StockLine {
                brand: item.brand.clone(),
                description: item.description.clone(),
                cost_per_unit: item.cost_per_unit,
                quantity: item.quantity,
                item_ids: vec![item.id.clone()],
            }),
        }
    }

    lines.sort_by(|a, b| (&a.brand, &a.description).cmp(&(&b.brand, &b.description)));
    lines
}

// =============================================================================
// Availability
// =============================================================================

/// Quantity of one catalog item available to a sale.
///
/// When a sale is being edited, the quantity that sale already holds is
/// credited back first - otherwise re-saving an unchanged sale would fail
/// its own stock check.
pub fn available_quantity(item: &StockItem, editing_sale: Option<&Sale>) -> i64 {
    let credited_back: i64 = editing_sale
        .map(|sale| {
            sale.items
                .iter()
                .filter(|line| line.stock_item_id == item.id)
                .map(|line| line.quantity)
                .sum()
        })
        .unwrap_or(0);
    item.quantity + credited_back
}

/// One requested sale line, before it becomes a [`crate::types::SaleItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub stock_item_id: String,
    pub quantity: i64,
}

/// Checks every requested line against available stock.
///
/// ## Edge Cases
/// - An unknown `stock_item_id` fails with `StockItemNotFound`.
/// - The first line exceeding availability fails the whole request with
///   `InsufficientStock`; callers must not have decremented anything yet.
/// - Requests for the same item on separate lines are checked cumulatively.
pub fn check_stock(
    bills: &[Bill],
    requests: &[LineRequest],
    editing_sale: Option<&Sale>,
) -> CoreResult<()> {
    let items = all_stock_items(bills);

    for (index, request) in requests.iter().enumerate() {
        let item = items
            .iter()
            .find(|i| i.id == request.stock_item_id)
            .ok_or_else(|| CoreError::StockItemNotFound(request.stock_item_id.clone()))?;

        // Earlier lines for the same item consume availability too.
        let already_requested: i64 = requests[..index]
            .iter()
            .filter(|r| r.stock_item_id == request.stock_item_id)
            .map(|r| r.quantity)
            .sum();

        let available = available_quantity(item, editing_sale) - already_requested;
        if request.quantity > available {
            return Err(CoreError::InsufficientStock {
                brand: item.brand.clone(),
                available,
                requested: request.quantity,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleItem, SaleType};
    use chrono::Utc;

    fn stock_item(id: &str, brand: &str, desc: &str, qty: i64, cost: i64) -> StockItem {
        StockItem {
            id: id.to_string(),
            bill_id: "b1".to_string(),
            brand: brand.to_string(),
            description: desc.to_string(),
            quantity: qty,
            cost_per_unit: Money::from_rupees(cost),
        }
    }

    fn bill_with_items(items: Vec<StockItem>) -> Bill {
        Bill {
            id: "b1".to_string(),
            dealer_id: "1".to_string(),
            bill_number: "BN-501".to_string(),
            date: "2024-05-01".parse().unwrap(),
            total_amount: items.iter().map(StockItem::stock_value).sum(),
            payments: Vec::new(),
            items,
            created_at: Utc::now(),
        }
    }

    fn editing_sale_with(stock_item_id: &str, quantity: i64) -> Sale {
        Sale {
            id: "s-edit".to_string(),
            customer_id: "c1".to_string(),
            bill_no: "S-1".to_string(),
            date: "2024-06-01".parse().unwrap(),
            sale_type: SaleType::Cash,
            items: vec![SaleItem {
                id: "si1".to_string(),
                sale_id: "s-edit".to_string(),
                stock_item_id: stock_item_id.to_string(),
                quantity,
                sale_price: Money::from_rupees(100),
                cost_per_unit_snapshot: Money::from_rupees(60),
            }],
            amount_paid: Money::zero(),
            payment_method: PaymentMethod::Cash,
            paid_to: "Faisal Rehman".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_inventory_value() {
        let bills = vec![
            bill_with_items(vec![stock_item("i1", "Khaadi", "Lawn 3pc", 10, 2000)]),
            bill_with_items(vec![stock_item("i2", "Sapphire", "Silk Dupatta", 5, 1000)]),
        ];
        assert_eq!(total_inventory_value(&bills), Money::from_rupees(25_000));
        assert_eq!(total_inventory_value(&[]), Money::zero());
    }

    #[test]
    fn test_grouped_stock_merges_identical_goods() {
        let bills = vec![
            bill_with_items(vec![
                stock_item("i1", "Khaadi", "Lawn 3pc", 10, 2000),
                stock_item("i2", "Sapphire", "Silk Dupatta", 5, 1000),
            ]),
            bill_with_items(vec![
                // Same goods from a later bill.
                stock_item("i3", "Khaadi", "Lawn 3pc", 7, 2000),
                // Same name but different cost stays separate.
                stock_item("i4", "Khaadi", "Lawn 3pc", 4, 2500),
            ]),
        ];
        let lines = grouped_stock(&bills);

        assert_eq!(lines.len(), 3);
        let merged = lines
            .iter()
            .find(|l| l.brand == "Khaadi" && l.cost_per_unit == Money::from_rupees(2000))
            .unwrap();
        assert_eq!(merged.quantity, 17);
        assert_eq!(merged.item_ids, vec!["i1".to_string(), "i3".to_string()]);
        // Sorted by brand then description.
        assert_eq!(lines[0].brand, "Khaadi");
        assert_eq!(lines[2].brand, "Sapphire");
    }

    #[test]
    fn test_insufficient_stock_rejected_with_details() {
        let bills = vec![bill_with_items(vec![stock_item(
            "i1", "Sapphire", "Silk Dupatta", 3, 1000,
        )])];
        let requests = vec![LineRequest {
            stock_item_id: "i1".to_string(),
            quantity: 4,
        }];

        let err = check_stock(&bills, &requests, None).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                brand,
                available,
                requested,
            } => {
                assert_eq!(brand, "Sapphire");
                assert_eq!(available, 3);
                assert_eq!(requested, 4);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_quantity_is_allowed() {
        let bills = vec![bill_with_items(vec![stock_item(
            "i1", "Sapphire", "Silk Dupatta", 3, 1000,
        )])];
        let requests = vec![LineRequest {
            stock_item_id: "i1".to_string(),
            quantity: 3,
        }];
        assert!(check_stock(&bills, &requests, None).is_ok());
    }

    #[test]
    fn test_unknown_item_fails() {
        let bills = vec![bill_with_items(vec![stock_item(
            "i1", "Khaadi", "Lawn 3pc", 10, 2000,
        )])];
        let requests = vec![LineRequest {
            stock_item_id: "missing".to_string(),
            quantity: 1,
        }];
        assert!(matches!(
            check_stock(&bills, &requests, None),
            Err(CoreError::StockItemNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_lines_checked_cumulatively() {
        let bills = vec![bill_with_items(vec![stock_item(
            "i1", "Khaadi", "Lawn 3pc", 5, 2000,
        )])];
        let requests = vec![
            LineRequest {
                stock_item_id: "i1".to_string(),
                quantity: 3,
            },
            LineRequest {
                stock_item_id: "i1".to_string(),
                quantity: 3,
            },
        ];
        let err = check_stock(&bills, &requests, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, .. }
        ));
    }

    #[test]
    fn test_editing_sale_credits_its_own_quantity_back() {
        // Item is down to 0 because the sale under edit took all 4.
        let bills = vec![bill_with_items(vec![stock_item(
            "i1", "Sapphire", "Silk Dupatta", 0, 1000,
        )])];
        let editing = editing_sale_with("i1", 4);

        assert_eq!(available_quantity(&bills[0].items[0], Some(&editing)), 4);

        // Re-saving the same 4 succeeds; asking for 5 fails.
        let same = vec![LineRequest {
            stock_item_id: "i1".to_string(),
            quantity: 4,
        }];
        assert!(check_stock(&bills, &same, Some(&editing)).is_ok());

        let more = vec![LineRequest {
            stock_item_id: "i1".to_string(),
            quantity: 5,
        }];
        assert!(check_stock(&bills, &more, Some(&editing)).is_err());
    }
}
