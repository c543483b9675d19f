//! Business logic services.
//!
//! `LedgerService` owns every balance and order-status mutation;
//! `StatsService` is the read-only side. Both hold an injected
//! [`Store`](crate::store::Store) handle and nothing else.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Ledger service, the only writer
pub mod ledger_service;
/// Read-only queries, statistics, and integrity checks
pub mod stats_service;

pub use ledger_service::LedgerService;
pub use stats_service::{OrderStats, StatsService, UserStats, VerifyReport};

/// Deserialize a document body into a typed model.
pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(body)?)
}
