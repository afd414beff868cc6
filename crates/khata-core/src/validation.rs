//! # Validation Module
//!
//! Input validation utilities for Dukaan Khata.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (form / API surface)                                  │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (users.email)                                  │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khata_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("Sana Safinaz").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Bill;
use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a dealer, customer or staff name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a contact string (phone or email, free-form).
///
/// ## Rules
/// - May be empty (contact is optional for customers)
/// - Maximum 100 characters
pub fn validate_contact(contact: &str) -> ValidationResult<()> {
    if contact.trim().len() > 100 {
        return Err(ValidationError::TooLong {
            field: "contact".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a sign-in email, which doubles as the username.
///
/// ## Rules
/// - Must not be empty
/// - Must contain an `@` with text on both sides
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a raw password before it is hashed.
///
/// ## Rules
/// - At least 8 characters
/// - At most 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a customer search query.
///
/// ## Rules
/// - Can be empty (returns all customers)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock or sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in paisa that may be zero.
///
/// Zero is legal: an unpaid credit sale records `amount_paid = 0`.
pub fn validate_amount_paisa(paisa: i64) -> ValidationResult<()> {
    if paisa < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a bill payment amount in paisa.
///
/// ## Rules
/// - Must be positive (> 0); recording a zero payment is a caller mistake
pub fn validate_payment_amount(paisa: i64) -> ValidationResult<()> {
    if paisa <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items on a bill or sale.
///
/// ## Rules
/// - Must not exceed MAX_LINE_ITEMS (100)
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 0,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

/// Checks the bill total/items invariant before a bill is stored.
///
/// ## Rules
/// - An itemless bill may state any non-negative total.
/// - When items are present, the stated total must equal the sum of the
///   items' `cost_per_unit × quantity`.
pub fn validate_bill_consistency(bill: &Bill) -> CoreResult<()> {
    validate_amount_paisa(bill.total_amount.paisa())?;
    validate_line_count(bill.items.len())?;

    if !bill.items.is_empty() {
        let computed = bill.item_total();
        if computed != bill.total_amount {
            return Err(CoreError::BillTotalMismatch {
                stated: bill.total_amount,
                computed,
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
    use crate::money::Money;
    use crate::types::StockItem;
    use chrono::Utc;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Sana Safinaz").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@shop.pk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@shop.pk").is_err());
        assert!(validate_email("admin@").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("changeme123").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount_paisa(0).is_ok());
        assert!(validate_amount_paisa(150_000).is_ok());
        assert!(validate_amount_paisa(-1).is_err());

        assert!(validate_payment_amount(100).is_ok());
        assert!(validate_payment_amount(0).is_err());
    }

    #[test]
    fn test_validate_bill_consistency() {
        let mut bill = Bill {
            id: "b1".to_string(),
            dealer_id: "1".to_string(),
            bill_number: "BN-501".to_string(),
            date: "2024-05-01".parse().unwrap(),
            total_amount: Money::from_rupees(100_000),
            payments: Vec::new(),
            items: Vec::new(),
            created_at: Utc::now(),
        };

        // Itemless bill with an explicit total is fine.
        assert!(validate_bill_consistency(&bill).is_ok());

        // Items that sum to the stated total.
        bill.items.push(StockItem {
            id: "i1".to_string(),
            bill_id: "b1".to_string(),
            brand: "Khaadi".to_string(),
            description: "Lawn 3pc".to_string(),
            quantity: 50,
            cost_per_unit: Money::from_rupees(2000),
        });
        assert!(validate_bill_consistency(&bill).is_ok());

        // Contradicting total is rejected.
        bill.total_amount = Money::from_rupees(90_000);
        assert!(matches!(
            validate_bill_consistency(&bill),
            Err(CoreError::BillTotalMismatch { .. })
        ));
    }
}
