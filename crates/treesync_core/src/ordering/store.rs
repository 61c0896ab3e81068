//! Orderable records and the persistence collaborator behind them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{Result, TreeSyncError};

/// A user-orderable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Collection {
    Items,
    Categories,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Categories => "categories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = TreeSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "items" => Ok(Collection::Items),
            "categories" => Ok(Collection::Categories),
            other => Err(TreeSyncError::Persistence(format!(
                "Unknown collection '{}'",
                other
            ))),
        }
    }
}

/// A persisted record with a fractional position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OrderableRecord {
    /// UUID v4
    pub id: String,
    pub collection: Collection,
    pub name: String,
    /// Opaque caller data (a path, a URL, a JSON blob)
    pub payload: String,
    pub position: f64,
    pub created_at: DateTime<Utc>,
}

impl OrderableRecord {
    /// New record with a fresh id and the current time.
    pub fn new(collection: Collection, draft: RecordDraft, position: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection,
            name: draft.name,
            payload: draft.payload,
            position,
            created_at: Utc::now(),
        }
    }
}

/// Caller-supplied fields of a new record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RecordDraft {
    pub name: String,
    #[serde(default)]
    pub payload: String,
}

impl RecordDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: String::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Which records of a collection to list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    /// Records assigned to the category with this id
    InCategory(String),
    /// Records assigned to no category
    Uncategorized,
}

/// Sort into display order: position, then creation time, then id.
pub fn sort_records(records: &mut [OrderableRecord]) {
    records.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Persistence collaborator for orderable records.
///
/// Category membership links a record (usually in [`Collection::Items`]) to a
/// record in [`Collection::Categories`]; a record may belong to several
/// categories.
pub trait OrderStore: Send + Sync {
    /// Records of `collection` matching `filter`, in display order.
    fn list(&self, collection: Collection, filter: &ListFilter) -> Result<Vec<OrderableRecord>>;

    fn get(&self, id: &str) -> Result<Option<OrderableRecord>>;

    fn insert(&self, record: &OrderableRecord) -> Result<()>;

    /// Fails with `RecordNotFound` if `id` is unknown.
    fn update_position(&self, id: &str, position: f64) -> Result<()>;

    /// Write several positions at once. Either every update is applied or
    /// none is; an unknown id fails the whole batch with `RecordNotFound`.
    fn update_positions(&self, updates: &[(String, f64)]) -> Result<()>;

    /// Delete a record and its memberships. Returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Fails with `RecordNotFound` if either record is unknown.
    fn assign_category(&self, record_id: &str, category_id: &str) -> Result<()>;

    /// Returns whether the membership existed.
    fn unassign_category(&self, record_id: &str, category_id: &str) -> Result<bool>;
}

impl<S: OrderStore + ?Sized> OrderStore for &S {
    fn list(&self, collection: Collection, filter: &ListFilter) -> Result<Vec<OrderableRecord>> {
        (*self).list(collection, filter)
    }

    fn get(&self, id: &str) -> Result<Option<OrderableRecord>> {
        (*self).get(id)
    }

    fn insert(&self, record: &OrderableRecord) -> Result<()> {
        (*self).insert(record)
    }

    fn update_position(&self, id: &str, position: f64) -> Result<()> {
        (*self).update_position(id, position)
    }

    fn update_positions(&self, updates: &[(String, f64)]) -> Result<()> {
        (*self).update_positions(updates)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        (*self).delete(id)
    }

    fn assign_category(&self, record_id: &str, category_id: &str) -> Result<()> {
        (*self).assign_category(record_id, category_id)
    }

    fn unassign_category(&self, record_id: &str, category_id: &str) -> Result<bool> {
        (*self).unassign_category(record_id, category_id)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, OrderableRecord>,
    /// (record id, category id)
    memberships: HashSet<(String, String)>,
}

/// In-memory order store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl OrderStore for MemoryOrderStore {
    fn list(&self, collection: Collection, filter: &ListFilter) -> Result<Vec<OrderableRecord>> {
        let state = self.read();
        let mut records: Vec<OrderableRecord> = state
            .records
            .values()
            .filter(|r| r.collection == collection)
            .filter(|r| match filter {
                ListFilter::All => true,
                ListFilter::InCategory(category) => state
                    .memberships
                    .contains(&(r.id.clone(), category.clone())),
                ListFilter::Uncategorized => !state.memberships.iter().any(|(id, _)| *id == r.id),
            })
            .cloned()
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn get(&self, id: &str) -> Result<Option<OrderableRecord>> {
        Ok(self.read().records.get(id).cloned())
    }

    fn insert(&self, record: &OrderableRecord) -> Result<()> {
        let mut state = self.write();
        if state.records.contains_key(&record.id) {
            return Err(TreeSyncError::Persistence(format!(
                "Record '{}' already exists",
                record.id
            )));
        }
        state.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn update_position(&self, id: &str, position: f64) -> Result<()> {
        match self.write().records.get_mut(id) {
            Some(record) => {
                record.position = position;
                Ok(())
            }
            None => Err(TreeSyncError::RecordNotFound(id.to_string())),
        }
    }

    fn update_positions(&self, updates: &[(String, f64)]) -> Result<()> {
        let mut state = self.write();
        if let Some((id, _)) = updates.iter().find(|(id, _)| !state.records.contains_key(id)) {
            return Err(TreeSyncError::RecordNotFound(id.clone()));
        }
        for (id, position) in updates {
            if let Some(record) = state.records.get_mut(id) {
                record.position = *position;
            }
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.write();
        state.memberships.retain(|(r, c)| r != id && c != id);
        Ok(state.records.remove(id).is_some())
    }

    fn assign_category(&self, record_id: &str, category_id: &str) -> Result<()> {
        let mut state = self.write();
        for id in [record_id, category_id] {
            if !state.records.contains_key(id) {
                return Err(TreeSyncError::RecordNotFound(id.to_string()));
            }
        }
        state
            .memberships
            .insert((record_id.to_string(), category_id.to_string()));
        Ok(())
    }

    fn unassign_category(&self, record_id: &str, category_id: &str) -> Result<bool> {
        Ok(self
            .write()
            .memberships
            .remove(&(record_id.to_string(), category_id.to_string())))
    }
}
