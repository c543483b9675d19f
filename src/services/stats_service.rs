//! Query and statistics service - read-only aggregation for the operator
//! dashboard.
//!
//! Everything here is a pure read over the store; no method mutates state.
//! The integrity checks at the bottom inspect the raw stored documents
//! rather than the typed models, which is what makes them useful when
//! validating migrated or hand-edited data.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{
    error::AppError,
    models::order::{MIN_ORDER_AMOUNT_CENTS, ORDERS_COLLECTION, Order, OrderStatus},
    models::user::{USERS_COLLECTION, User},
    services::decode,
    store::{Filter, OrderBy, Store},
};

/// Aggregate order counters for the dashboard.
///
/// Revenue sums the amount of every order regardless of status; the panel
/// has always reported it that way, rejected and pending orders included.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: usize,
    pub pending_orders: usize,
    pub completed_orders: usize,
    pub total_revenue_cents: i64,
}

/// Aggregate user counters for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_users: usize,
    pub total_balance_cents: i64,
}

/// Outcome of a document integrity check.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl VerifyReport {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

/// The read side of the panel.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn Store>,
}

impl StatsService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Every user. Empty when none exist.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let docs = self.store.query(USERS_COLLECTION, None, None).await?;
        docs.into_iter().map(|doc| decode(doc.body)).collect()
    }

    /// Orders, newest first, optionally restricted to one status.
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, AppError> {
        let filter = status.map(|status| Filter::equals("status", status.as_str()));
        let docs = self
            .store
            .query(ORDERS_COLLECTION, filter, Some(OrderBy::newest_first()))
            .await?;
        docs.into_iter().map(|doc| decode(doc.body)).collect()
    }

    /// One user's orders, newest first.
    pub async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        let docs = self
            .store
            .query(
                ORDERS_COLLECTION,
                Some(Filter::equals("user_id", user_id)),
                Some(OrderBy::newest_first()),
            )
            .await?;
        docs.into_iter().map(|doc| decode(doc.body)).collect()
    }

    /// Order counters and total revenue.
    pub async fn order_stats(&self) -> Result<OrderStats, AppError> {
        let orders = self.list_orders(None).await?;
        let pending = orders
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .count();
        let completed = orders
            .iter()
            .filter(|order| order.status == OrderStatus::Completed)
            .count();
        let total_revenue_cents = orders.iter().map(|order| order.amount_cents).sum();

        Ok(OrderStats {
            total_orders: orders.len(),
            pending_orders: pending,
            completed_orders: completed,
            total_revenue_cents,
        })
    }

    /// User count and the balance held across all users.
    pub async fn user_stats(&self) -> Result<UserStats, AppError> {
        let users = self.list_users().await?;
        let total_balance_cents = users.iter().map(|user| user.balance_cents).sum();

        Ok(UserStats {
            total_users: users.len(),
            total_balance_cents,
        })
    }

    /// Check a stored user document for missing or invalid fields.
    pub async fn verify_user(&self, id: &str) -> Result<VerifyReport, AppError> {
        let doc = self
            .store
            .get(USERS_COLLECTION, id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let Some(body) = doc.body.as_object() else {
            return Ok(VerifyReport::from_issues(vec![
                "document body is not an object".to_string(),
            ]));
        };

        let mut issues = Vec::new();
        if !body
            .get("email")
            .and_then(Value::as_str)
            .is_some_and(|email| !email.is_empty())
        {
            issues.push("missing email".to_string());
        }
        match body.get("balance_cents").and_then(Value::as_i64) {
            None => issues.push("missing balance".to_string()),
            Some(balance) if balance < 0 => issues.push("negative balance".to_string()),
            _ => {}
        }
        if let Some(username) = body.get("username") {
            if !(username.is_null() || username.is_string()) {
                issues.push("invalid username".to_string());
            }
        }
        for field in ["created_at", "updated_at"] {
            if !body.contains_key(field) {
                issues.push(format!("missing {field}"));
            }
        }

        Ok(VerifyReport::from_issues(issues))
    }

    /// Check a stored order document for missing or invalid fields.
    pub async fn verify_order(&self, order_id: &str) -> Result<VerifyReport, AppError> {
        let doc = self
            .store
            .get(ORDERS_COLLECTION, order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        let Some(body) = doc.body.as_object() else {
            return Ok(VerifyReport::from_issues(vec![
                "document body is not an object".to_string(),
            ]));
        };

        let mut issues = Vec::new();
        for field in ["user_id", "service"] {
            if !body
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|value| !value.is_empty())
            {
                issues.push(format!("missing {field}"));
            }
        }
        match body.get("status").and_then(Value::as_str) {
            None => issues.push("missing status".to_string()),
            Some(status) if !["pending", "completed", "rejected"].contains(&status) => {
                issues.push("invalid status".to_string());
            }
            _ => {}
        }
        match body.get("amount_cents").and_then(Value::as_i64) {
            None => issues.push("missing amount".to_string()),
            Some(amount) if amount < MIN_ORDER_AMOUNT_CENTS => issues.push(format!(
                "amount below the {MIN_ORDER_AMOUNT_CENTS} cent minimum"
            )),
            _ => {}
        }
        match body.get("quantity").and_then(Value::as_u64) {
            None => issues.push("missing quantity".to_string()),
            Some(0) => issues.push("quantity must be positive".to_string()),
            _ => {}
        }
        if !body.contains_key("created_at") {
            issues.push("missing created_at".to_string());
        }

        Ok(VerifyReport::from_issues(issues))
    }
}
