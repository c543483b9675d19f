//! Document store abstraction.
//!
//! The ledger treats persistence as an opaque transactional document store:
//! named collections of JSON documents addressed by an id. Two backends
//! implement the contract:
//!
//! - [`PgStore`]: PostgreSQL, documents in a single JSONB table
//! - [`MemoryStore`]: in-process map, used by tests and local development
//!
//! # Concurrency
//!
//! Every document carries a `revision` that is bumped on each write. The
//! transactional primitive is [`Store::commit`]: a batch of writes that only
//! applies if every [`Guard`] (an expected revision, or expected absence)
//! still holds at commit time. Callers that lose the race get
//! [`StoreError::Conflict`] and decide whether to retry.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Monotonically increasing per-document write counter.
pub type Revision = i64;

/// A document read from the store: its id, the revision observed at read
/// time, and the JSON body.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub revision: Revision,
    pub body: Value,
}

/// Precondition checked atomically at commit time.
///
/// `revision: Some(n)` requires the document to still be at revision `n`;
/// `revision: None` requires the document to not exist.
#[derive(Debug, Clone)]
pub struct Guard {
    pub collection: &'static str,
    pub id: String,
    pub revision: Option<Revision>,
}

impl Guard {
    /// Require the document to still be at the revision it was read at.
    pub fn at(collection: &'static str, id: impl Into<String>, revision: Revision) -> Self {
        Self {
            collection,
            id: id.into(),
            revision: Some(revision),
        }
    }

    /// Require the document to be absent.
    pub fn absent(collection: &'static str, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            revision: None,
        }
    }
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or fully replace a document.
    Put {
        collection: &'static str,
        id: String,
        body: Value,
    },
    /// Shallow-merge fields into an existing document.
    Merge {
        collection: &'static str,
        id: String,
        fields: Value,
    },
    /// Remove a document.
    Delete { collection: &'static str, id: String },
}

/// An ordered set of writes applied atomically by [`Store::commit`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, collection: &'static str, id: impl Into<String>, body: Value) -> Self {
        self.ops.push(WriteOp::Put {
            collection,
            id: id.into(),
            body,
        });
        self
    }

    pub fn merge(mut self, collection: &'static str, id: impl Into<String>, fields: Value) -> Self {
        self.ops.push(WriteOp::Merge {
            collection,
            id: id.into(),
            fields,
        });
        self
    }

    pub fn delete(mut self, collection: &'static str, id: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
        self
    }
}

/// Single-field equality filter for [`Store::query`].
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: &'static str,
    pub equals: Value,
}

impl Filter {
    pub fn equals(field: &'static str, value: impl Into<Value>) -> Self {
        Self {
            field,
            equals: value.into(),
        }
    }
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field ordering for [`Store::query`].
#[derive(Debug, Clone, Copy)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    /// Newest-first ordering on the `created_at` field.
    pub fn newest_first() -> Self {
        Self {
            field: "created_at",
            direction: Direction::Descending,
        }
    }
}

/// Errors surfaced by a store backend.
///
/// `Conflict` is an expected outcome of optimistic concurrency and is
/// handled by the caller's retry policy; `Backend` is an infrastructure
/// failure and is surfaced as-is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A [`Guard`] no longer held at commit time.
    #[error("write conflict")]
    Conflict,

    /// The backing database failed.
    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// The contract the ledger expects from its persistence collaborator.
///
/// Object safe on purpose: services hold an `Arc<dyn Store>` injected at
/// construction, never an ambient handle.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a single document, or `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert or fully replace a document, unconditionally.
    async fn put(&self, collection: &str, id: &str, body: Value) -> Result<(), StoreError>;

    /// Shallow-merge `fields` into an existing document.
    ///
    /// Returns `false` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<bool, StoreError>;

    /// Atomically apply `batch` iff every guard still holds.
    ///
    /// This is the transactional primitive behind every balance-affecting
    /// operation. All writes commit or none do.
    async fn commit(&self, guards: &[Guard], batch: WriteBatch) -> Result<(), StoreError>;

    /// List documents in a collection, optionally filtered on one field and
    /// ordered on one field.
    async fn query(
        &self,
        collection: &str,
        filter: Option<Filter>,
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Remove a document. Returns `false` when it did not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Allocate an identifier for a document about to be created.
    fn allocate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
