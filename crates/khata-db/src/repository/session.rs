//! # Session Repository
//!
//! Sign-in, sign-out and per-request authorization.
//!
//! ## Session Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sign_in(email, password)                                               │
//! │       │                                                                 │
//! │       ├── verify Argon2 hash ── wrong? → InvalidCredentials            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sessions (token = UUID v4) ──► (Session, User)                 │
//! │                                                                         │
//! │  Later requests:                                                        │
//! │  authorize(token, Permission::Dealers)                                  │
//! │       ├── token unknown?        → NotSignedIn                          │
//! │       ├── capability missing?   → PermissionDenied                     │
//! │       └── ok                    → User                                 │
//! │                                                                         │
//! │  One row per sign-in: several staff members can be active at once,    │
//! │  and signing out one device leaves the others signed in.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::user::{verify_password, UserRepository};
use khata_core::{Permission, Session, User};

#[derive(sqlx::FromRow)]
struct SessionRow {
    token: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token: row.token,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

/// Repository for session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Signs a staff member in, returning a fresh session and the account.
    ///
    /// Unknown email and wrong password produce the same error so the
    /// response does not reveal which accounts exist.
    pub async fn sign_in(&self, email: &str, password: &str) -> DbResult<(Session, User)> {
        let user = UserRepository::new(self.pool.clone())
            .get_by_email(email)
            .await?
            .ok_or(DbError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(DbError::InvalidCredentials);
        }

        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(&session.token)
            .bind(&session.user_id)
            .bind(session.created_at)
            .execute(&self.pool)
            .await?;

        info!(user = %user.email, "Signed in");
        Ok((session, user))
    }

    /// Removes one session. Signing out a token that is already gone is
    /// not an error.
    pub async fn sign_out(&self, token: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Signed out");
        Ok(())
    }

    /// Resolves a token to its signed-in account.
    pub async fn current_user(&self, token: &str) -> DbResult<User> {
        let session: Option<SessionRow> =
            sqlx::query_as("SELECT token, user_id, created_at FROM sessions WHERE token = ?1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        let session = session.ok_or(DbError::NotSignedIn)?;

        UserRepository::new(self.pool.clone())
            .get(&session.user_id)
            .await?
            // The account was deleted while the session row survived the
            // cascade race; treat it as signed out.
            .ok_or(DbError::NotSignedIn)
    }

    /// Checks that the token's account holds a capability, returning the
    /// account for the caller to use.
    pub async fn authorize(&self, token: &str, required: Permission, action: &str) -> DbResult<User> {
        let user = self.current_user(token).await?;

        if !user.has_permission(required) {
            return Err(DbError::PermissionDenied {
                action: action.to_string(),
                required: format!("{required:?}").to_lowercase(),
            });
        }

        Ok(user)
    }

    /// Lists the sessions currently open for one account.
    pub async fn sessions_for_user(&self, user_id: &str) -> DbResult<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT token, user_id, created_at FROM sessions WHERE user_id = ?1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Session::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
