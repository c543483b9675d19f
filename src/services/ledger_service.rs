//! Ledger service - the balance-and-order core.
//!
//! This service is the only code allowed to change a balance or an order
//! status. Every balance-affecting operation runs as an atomic
//! read-modify-write: read the user document with its revision, compute the
//! new state, then commit behind a revision guard. A concurrent writer makes
//! the guard fail, and the operation re-reads and retries a bounded number
//! of times before surfacing `Conflict`.
//!
//! # Atomicity Guarantees
//!
//! Order creation debits the balance and inserts the order in one store
//! commit; there is never a debit without an order record or an order
//! without its debit. The same mechanism keeps two concurrent deducts from
//! both passing the insufficient-balance check.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::AppError,
    models::order::{CreateOrderRequest, Order, ORDERS_COLLECTION, OrderStatus},
    models::user::{BalanceAction, USERS_COLLECTION, User},
    services::decode,
    store::{Guard, Store, StoreError, WriteBatch},
};
use serde_json::json;

/// How many times a guarded commit is retried before the operation gives up
/// with `Conflict`. A write is never silently dropped.
const MAX_COMMIT_RETRIES: u32 = 5;

/// The write side of the panel.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a user with a zero balance.
    ///
    /// Idempotent: if the id is already taken the existing record is
    /// returned unmodified. A creation race has one inserter; the loser
    /// observes the winner's record.
    pub async fn create_user(&self, id: &str, email: &str) -> Result<User, AppError> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("user id must not be empty".to_string()));
        }

        if let Some(doc) = self.store.get(USERS_COLLECTION, id).await? {
            return decode(doc.body);
        }

        let user = User::new(id, email);
        let batch = WriteBatch::new().put(
            USERS_COLLECTION,
            id,
            serde_json::to_value(&user)?,
        );
        match self
            .store
            .commit(&[Guard::absent(USERS_COLLECTION, id)], batch)
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = id, "user created");
                Ok(user)
            }
            // Someone else inserted between our read and commit; their
            // record wins and this call still reports success.
            Err(StoreError::Conflict) => self.get_user(id).await,
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        let doc = self
            .store
            .get(USERS_COLLECTION, id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        decode(doc.body)
    }

    /// Assign the set-once username.
    ///
    /// Fails with `UsernameAlreadyAssigned` when the field is already
    /// non-empty. Two concurrent calls resolve to exactly one winner: the
    /// loser's commit hits a stale revision, re-reads, and then sees the
    /// winner's value.
    pub async fn set_username(&self, id: &str, username: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("username must not be empty".to_string()));
        }

        self.mutate_user(id, |user| {
            if user.has_username() {
                return Err(AppError::UsernameAlreadyAssigned);
            }
            user.username = Some(username.to_string());
            Ok(())
        })
        .await
    }

    /// Current balance in cents. Pure read, no locks.
    pub async fn get_balance(&self, id: &str) -> Result<i64, AppError> {
        Ok(self.get_user(id).await?.balance_cents)
    }

    /// Apply a balance operation and return the new balance.
    ///
    /// `deduct` fails with `InsufficientBalance` without mutating when the
    /// amount exceeds the current balance. Negative amounts are rejected for
    /// every action.
    pub async fn adjust_balance(
        &self,
        id: &str,
        amount_cents: i64,
        action: BalanceAction,
    ) -> Result<i64, AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "amount must be non-negative".to_string(),
            ));
        }

        let user = self
            .mutate_user(id, |user| {
                match action {
                    BalanceAction::Add => user.balance_cents += amount_cents,
                    BalanceAction::Set => user.balance_cents = amount_cents,
                    BalanceAction::Deduct => {
                        if amount_cents > user.balance_cents {
                            return Err(AppError::InsufficientBalance);
                        }
                        user.balance_cents -= amount_cents;
                    }
                }
                Ok(())
            })
            .await?;

        Ok(user.balance_cents)
    }

    /// Create an order, debiting the user's balance in the same commit.
    ///
    /// The balance check and the debit-plus-insert happen atomically; a
    /// failed call leaves the balance and the orders collection exactly as
    /// they were.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, AppError> {
        if request.quantity == 0 {
            return Err(AppError::InvalidInput("quantity must be positive".to_string()));
        }
        if request.amount_cents <= 0 {
            return Err(AppError::InvalidAmount("amount must be positive".to_string()));
        }

        for attempt in 0..MAX_COMMIT_RETRIES {
            let doc = self
                .store
                .get(USERS_COLLECTION, &request.user_id)
                .await?
                .ok_or(AppError::UserNotFound)?;
            let mut user: User = decode(doc.body)?;

            if user.balance_cents < request.amount_cents {
                return Err(AppError::InsufficientBalance);
            }

            let now = Utc::now();
            user.balance_cents -= request.amount_cents;
            user.updated_at = now;

            let order = Order {
                id: self.store.allocate_id(),
                user_id: user.id.clone(),
                username: user.username.clone(),
                service: request.service.clone(),
                service_id: request.service_id.clone(),
                platform: request.platform.clone(),
                plan: request.plan.clone(),
                target: request.target.clone(),
                utr: request.utr.clone(),
                amount_cents: request.amount_cents,
                quantity: request.quantity,
                status: OrderStatus::Pending,
                created_at: now,
                updated_at: now,
            };

            let batch = WriteBatch::new()
                .put(USERS_COLLECTION, user.id.as_str(), serde_json::to_value(&user)?)
                .put(ORDERS_COLLECTION, order.id.as_str(), serde_json::to_value(&order)?);
            match self
                .store
                .commit(
                    &[Guard::at(USERS_COLLECTION, user.id.as_str(), doc.revision)],
                    batch,
                )
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        order_id = %order.id,
                        user_id = %order.user_id,
                        amount_cents = order.amount_cents,
                        "order created"
                    );
                    return Ok(order);
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(user_id = %request.user_id, attempt, "order commit conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Conflict)
    }

    /// Fetch an order by id.
    pub async fn get_order(&self, order_id: &str) -> Result<Order, AppError> {
        let doc = self
            .store
            .get(ORDERS_COLLECTION, order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        decode(doc.body)
    }

    /// Set an order's status.
    ///
    /// Any of the three statuses is accepted from any current status; the
    /// panel relies on being able to move orders back to `pending`. No
    /// balance is touched on any transition, `rejected` included.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), AppError> {
        let fields = json!({
            "status": status,
            "updated_at": Utc::now(),
        });
        if !self.store.update(ORDERS_COLLECTION, order_id, fields).await? {
            return Err(AppError::OrderNotFound);
        }
        tracing::info!(order_id, status = status.as_str(), "order status updated");
        Ok(())
    }

    /// Move balance from one user to another in a single commit.
    ///
    /// Both documents are guarded, so the debit and the credit land together
    /// or not at all.
    pub async fn transfer_balance(
        &self,
        from_id: &str,
        to_id: &str,
        amount_cents: i64,
    ) -> Result<(), AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount("amount must be positive".to_string()));
        }
        if from_id == to_id {
            return Err(AppError::InvalidInput(
                "cannot transfer to the same user".to_string(),
            ));
        }

        for attempt in 0..MAX_COMMIT_RETRIES {
            let from_doc = self
                .store
                .get(USERS_COLLECTION, from_id)
                .await?
                .ok_or(AppError::UserNotFound)?;
            let to_doc = self
                .store
                .get(USERS_COLLECTION, to_id)
                .await?
                .ok_or(AppError::UserNotFound)?;

            let mut from: User = decode(from_doc.body)?;
            let mut to: User = decode(to_doc.body)?;

            if from.balance_cents < amount_cents {
                return Err(AppError::InsufficientBalance);
            }

            let now = Utc::now();
            from.balance_cents -= amount_cents;
            from.updated_at = now;
            to.balance_cents += amount_cents;
            to.updated_at = now;

            // Guards in a stable order so opposing transfers cannot deadlock
            // on the backends that lock rows.
            let mut guards = vec![
                Guard::at(USERS_COLLECTION, from_id, from_doc.revision),
                Guard::at(USERS_COLLECTION, to_id, to_doc.revision),
            ];
            guards.sort_by(|a, b| a.id.cmp(&b.id));

            let batch = WriteBatch::new()
                .put(USERS_COLLECTION, from_id, serde_json::to_value(&from)?)
                .put(USERS_COLLECTION, to_id, serde_json::to_value(&to)?);
            match self.store.commit(&guards, batch).await {
                Ok(()) => {
                    tracing::info!(from_id, to_id, amount_cents, "balance transferred");
                    return Ok(());
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(from_id, to_id, attempt, "transfer commit conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Conflict)
    }

    /// Credit several users at once.
    ///
    /// Each user is credited independently; the returned map records which
    /// ids were found. Store failures still abort the whole call.
    pub async fn bulk_add_balance(
        &self,
        user_ids: &[String],
        amount_cents: i64,
    ) -> Result<BTreeMap<String, bool>, AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "amount must be non-negative".to_string(),
            ));
        }

        let mut results = BTreeMap::new();
        for id in user_ids {
            let outcome = self
                .mutate_user(id, |user| {
                    user.balance_cents += amount_cents;
                    Ok(())
                })
                .await;
            match outcome {
                Ok(_) => {
                    results.insert(id.clone(), true);
                }
                Err(AppError::UserNotFound) => {
                    results.insert(id.clone(), false);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(results)
    }

    /// Hard-delete a user. Destructive escape hatch for admin tooling;
    /// orders referencing the user are left behind.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        if !self.store.delete(USERS_COLLECTION, id).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::warn!(user_id = id, "user hard-deleted");
        Ok(())
    }

    /// Hard-delete an order. The balance it debited is not restored.
    pub async fn delete_order(&self, order_id: &str) -> Result<(), AppError> {
        if !self.store.delete(ORDERS_COLLECTION, order_id).await? {
            return Err(AppError::OrderNotFound);
        }
        tracing::warn!(order_id, "order hard-deleted");
        Ok(())
    }

    /// Read-modify-write a user document behind a revision guard.
    ///
    /// `apply` sees the freshly read state on every attempt, so business
    /// checks inside it (insufficient balance, username taken) are evaluated
    /// against what will actually be committed.
    async fn mutate_user<F>(&self, id: &str, mut apply: F) -> Result<User, AppError>
    where
        F: FnMut(&mut User) -> Result<(), AppError>,
    {
        for attempt in 0..MAX_COMMIT_RETRIES {
            let doc = self
                .store
                .get(USERS_COLLECTION, id)
                .await?
                .ok_or(AppError::UserNotFound)?;
            let mut user: User = decode(doc.body)?;

            apply(&mut user)?;
            user.updated_at = Utc::now();

            let batch = WriteBatch::new().put(
                USERS_COLLECTION,
                id,
                serde_json::to_value(&user)?,
            );
            match self
                .store
                .commit(&[Guard::at(USERS_COLLECTION, id, doc.revision)], batch)
                .await
            {
                Ok(()) => return Ok(user),
                Err(StoreError::Conflict) => {
                    tracing::debug!(user_id = id, attempt, "balance commit conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Conflict)
    }
}
