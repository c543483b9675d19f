//! In-memory store backend.
//!
//! Keeps every collection in a map guarded by a single lock, which makes the
//! commit batch trivially atomic. Used by the test suite and by the `memory`
//! store backend for local development. Nothing is persisted.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use super::{
    Direction, Document, Filter, Guard, OrderBy, Revision, Store, StoreError, WriteBatch, WriteOp,
};
use async_trait::async_trait;

type Collection = HashMap<String, (Revision, Value)>;

/// In-process implementation of [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Insert or replace under the lock, bumping the revision.
fn put_locked(
    collections: &mut HashMap<String, Collection>,
    collection: &str,
    id: &str,
    body: Value,
) {
    let entry = collections.entry(collection.to_string()).or_default();
    let revision = entry.get(id).map_or(1, |(rev, _)| rev + 1);
    entry.insert(id.to_string(), (revision, body));
}

/// Shallow-merge `fields` into an existing document. Returns false if absent.
fn merge_locked(
    collections: &mut HashMap<String, Collection>,
    collection: &str,
    id: &str,
    fields: &Value,
) -> bool {
    let Some(entry) = collections.get_mut(collection) else {
        return false;
    };
    let Some((revision, body)) = entry.get_mut(id) else {
        return false;
    };
    if let (Some(target), Some(updates)) = (body.as_object_mut(), fields.as_object()) {
        for (key, value) in updates {
            target.insert(key.clone(), value.clone());
        }
    }
    *revision += 1;
    true
}

/// Ordering between two field values: strings lexicographically, numbers
/// numerically, absent fields first.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().expect("store lock poisoned");
        Ok(collections
            .get(collection)
            .and_then(|entries| entries.get(id))
            .map(|(revision, body)| Document {
                id: id.to_string(),
                revision: *revision,
                body: body.clone(),
            }))
    }

    async fn put(&self, collection: &str, id: &str, body: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        put_locked(&mut collections, collection, id, body);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        Ok(merge_locked(&mut collections, collection, id, &fields))
    }

    async fn commit(&self, guards: &[Guard], batch: WriteBatch) -> Result<(), StoreError> {
        let mut collections = self.collections.write().expect("store lock poisoned");

        // Every guard is checked before any write is applied; the lock keeps
        // the whole batch atomic with respect to other writers.
        for guard in guards {
            let current = collections
                .get(guard.collection)
                .and_then(|entries| entries.get(&guard.id))
                .map(|(revision, _)| *revision);
            if current != guard.revision {
                return Err(StoreError::Conflict);
            }
        }

        for op in batch.ops {
            match op {
                WriteOp::Put { collection, id, body } => {
                    put_locked(&mut collections, collection, &id, body);
                }
                WriteOp::Merge {
                    collection,
                    id,
                    fields,
                } => {
                    // Merging a document that vanished means a guard was
                    // missing; abort rather than resurrect it.
                    if !merge_locked(&mut collections, collection, &id, &fields) {
                        return Err(StoreError::Conflict);
                    }
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(entries) = collections.get_mut(collection) {
                        entries.remove(&id);
                    }
                }
            }
        }

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<Filter>,
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().expect("store lock poisoned");
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, (_, body))| match &filter {
                        Some(filter) => body.get(filter.field) == Some(&filter.equals),
                        None => true,
                    })
                    .map(|(id, (revision, body))| Document {
                        id: id.clone(),
                        revision: *revision,
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            documents.sort_by(|a, b| {
                let ordering = compare_fields(a.body.get(order.field), b.body.get(order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().expect("store lock poisoned");
        Ok(collections
            .get_mut(collection)
            .is_some_and(|entries| entries.remove(id).is_some()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
