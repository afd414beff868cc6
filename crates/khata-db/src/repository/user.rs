//! # User Repository
//!
//! Staff accounts and their capability sets.
//!
//! ## Account Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  users table                                                            │
//! │                                                                         │
//! │  email ──────── doubles as the username, UNIQUE                        │
//! │  password_hash ─ Argon2, never the raw password                        │
//! │  permissions ─── JSON array of capabilities,                           │
//! │                  e.g. ["customers","inventory"] or ["admin"]           │
//! │                                                                         │
//! │  Authorization is a flat capability set checked per action; "admin"    │
//! │  implies every other capability. There is no role hierarchy.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::validation::{validate_email, validate_name, validate_password};
use khata_core::{Permission, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    permissions: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> DbResult<User> {
        let permissions: Vec<Permission> = serde_json::from_str(&self.permissions)
            .map_err(|e| DbError::Internal(format!("Corrupt permissions column: {e}")))?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            permissions,
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, email, password_hash, permissions, created_at FROM users";

/// Repository for staff account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a staff account. The password is hashed before it touches
    /// the database.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
        permissions: Vec<Permission>,
    ) -> DbResult<User> {
        validate_name(name).map_err(khata_core::CoreError::from)?;
        validate_email(email).map_err(khata_core::CoreError::from)?;
        validate_password(password).map_err(khata_core::CoreError::from)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash: hash_password(password)?,
            permissions,
            created_at: Utc::now(),
        };

        debug!(id = %user.id, email = %user.email, "Creating user");

        let permissions_json = serde_json::to_string(&user.permissions)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, permissions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&permissions_json)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            // Surface the taken email rather than the raw constraint text.
            Err(sqlx::Error::Database(e)) if e.message().contains("UNIQUE") => {
                Err(DbError::duplicate("email", &user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Gets a user by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Gets a user by sign-in email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE email = ?1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Lists all staff accounts in creation order.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY created_at, id"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Updates an account's name and permissions, and optionally resets
    /// the password.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        permissions: Vec<Permission>,
        new_password: Option<&str>,
    ) -> DbResult<User> {
        validate_name(name).map_err(khata_core::CoreError::from)?;

        let existing = self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))?;

        let password_hash = match new_password {
            Some(password) => {
                validate_password(password).map_err(khata_core::CoreError::from)?;
                hash_password(password)?
            }
            None => existing.password_hash,
        };

        let permissions_json =
            serde_json::to_string(&permissions).map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            "UPDATE users SET name = ?2, permissions = ?3, password_hash = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(name.trim())
        .bind(&permissions_json)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: existing.id,
            name: name.trim().to_string(),
            email: existing.email,
            password_hash,
            permissions,
            created_at: existing.created_at,
        })
    }

    /// Deletes a staff account; its sessions cascade away with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        debug!(id = %id, "Deleted user");
        Ok(())
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with Argon2 and a fresh random salt.
pub(crate) fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored Argon2 hash.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> DbResult<bool> {
    use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};

    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
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

    #[tokio::test]
    async fn test_create_hashes_password() {
        let db = test_db().await;
        let user = db
            .users()
            .create("Faisal Rehman", "faisal@shop.pk", "changeme123", vec![Permission::Admin])
            .await
            .unwrap();

        assert_ne!(user.password_hash, "changeme123");
        assert!(verify_password("changeme123", &user.password_hash).unwrap());
        assert!(!verify_password("wrong", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        let users = db.users();
        users
            .create("Faisal", "faisal@shop.pk", "changeme123", vec![Permission::Admin])
            .await
            .unwrap();

        // Same email, different case: emails are stored lowercased.
        let err = users
            .create("Imposter", "FAISAL@shop.pk", "changeme123", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_permissions_round_trip() {
        let db = test_db().await;
        let users = db.users();
        let created = users
            .create(
                "Sales Staff",
                "sales@shop.pk",
                "changeme123",
                vec![Permission::Customers, Permission::Inventory],
            )
            .await
            .unwrap();

        let loaded = users.get(&created.id).await.unwrap().unwrap();
        assert!(loaded.has_permission(Permission::Customers));
        assert!(loaded.has_permission(Permission::Inventory));
        assert!(!loaded.has_permission(Permission::Dealers));
    }

    #[tokio::test]
    async fn test_update_keeps_password_unless_reset() {
        let db = test_db().await;
        let users = db.users();
        let user = users
            .create("Faisal", "faisal@shop.pk", "changeme123", vec![Permission::Admin])
            .await
            .unwrap();

        let updated = users
            .update(&user.id, "Faisal Rehman", vec![Permission::Admin], None)
            .await
            .unwrap();
        assert!(verify_password("changeme123", &updated.password_hash).unwrap());

        let reset = users
            .update(&user.id, "Faisal Rehman", vec![Permission::Admin], Some("newsecret99"))
            .await
            .unwrap();
        assert!(verify_password("newsecret99", &reset.password_hash).unwrap());
        assert!(!verify_password("changeme123", &reset.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = test_db().await;
        assert!(matches!(
            db.users().delete("no-such-id").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
