//! User data model and API request types.
//!
//! This module defines:
//! - `User`: document stored in the `users` collection
//! - Request types for user creation and balance operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection holding user documents, keyed by the caller-supplied id.
pub const USERS_COLLECTION: &str = "users";

/// Represents a user document.
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision
/// issues. The ledger never commits a negative balance.
///
/// # Identity
///
/// The id is caller-supplied (the panel trusts its upstream identity
/// provider) and doubles as the document key. It never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Caller-supplied unique identifier
    pub id: String,

    /// Email recorded at creation; uniqueness is not enforced here
    pub email: String,

    /// Display name, set once after signup
    ///
    /// `None` until the user picks one. Once non-empty it is immutable;
    /// concurrent assignments resolve to exactly one winner.
    pub username: Option<String>,

    /// Current balance in cents (not whole currency units)
    ///
    /// Invariant: never negative after a committed mutation.
    pub balance_cents: i64,

    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh user with a zero balance and no username.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            username: None,
            balance_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the set-once username has already been assigned.
    pub fn has_username(&self) -> bool {
        self.username.as_deref().is_some_and(|name| !name.is_empty())
    }
}

/// Request body for creating a user.
///
/// ```json
/// {
///   "id": "u1",
///   "email": "u1@example.com"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
    pub email: String,
}

/// Request body for assigning the set-once username.
#[derive(Debug, Deserialize)]
pub struct SetUsernameRequest {
    pub username: String,
}

/// Discriminator for the balance endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceAction {
    /// Add the amount to the current balance
    Add,
    /// Replace the balance with the amount
    Set,
    /// Subtract the amount, failing if the balance does not cover it
    Deduct,
}

/// Request body for the balance endpoint.
///
/// ```json
/// {
///   "action": "deduct",
///   "amount_cents": 6000
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct BalanceOperationRequest {
    pub action: BalanceAction,
    pub amount_cents: i64,
}

/// Request body for moving balance between two users.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_cents: i64,
}

/// Request body for crediting several users at once.
#[derive(Debug, Deserialize)]
pub struct BulkAddRequest {
    pub user_ids: Vec<String>,
    pub amount_cents: i64,
}
