//! Append and reorder on top of an [`OrderStore`].

use log::{debug, info};

use super::PositionAllocator;
use super::store::{Collection, ListFilter, OrderStore, OrderableRecord, RecordDraft};
use crate::error::{Result, TreeSyncError};

/// Ordered view over one store.
///
/// A move writes exactly one record. Only when the neighbours of the target
/// slot leave no representable midpoint is the whole collection respaced
/// before retrying.
pub struct OrderedCollection<S> {
    store: S,
    allocator: PositionAllocator,
}

impl<S: OrderStore> OrderedCollection<S> {
    pub fn new(store: S, allocator: PositionAllocator) -> Self {
        Self { store, allocator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn allocator(&self) -> PositionAllocator {
        self.allocator
    }

    /// Records in display order.
    pub fn list(&self, collection: Collection, filter: &ListFilter) -> Result<Vec<OrderableRecord>> {
        self.store.list(collection, filter)
    }

    /// Create a record after the current last one.
    pub fn append(&self, collection: Collection, draft: RecordDraft) -> Result<OrderableRecord> {
        let existing = self.store.list(collection, &ListFilter::All)?;
        let position = self
            .allocator
            .next_position(existing.iter().map(|r| r.position));
        let record = OrderableRecord::new(collection, draft, position);
        self.store.insert(&record)?;
        debug!(
            "Appended '{}' to {} at {}",
            record.name, collection, record.position
        );
        Ok(record)
    }

    /// Move `id` to `new_index` in the full collection. Returns the new position.
    pub fn reorder(&self, collection: Collection, id: &str, new_index: usize) -> Result<f64> {
        self.reorder_within(collection, &ListFilter::All, id, new_index)
    }

    /// Move `id` to `new_index` within the records matching `filter`.
    ///
    /// Indices past the end clamp to the end. Moving a record onto its
    /// current index writes nothing.
    pub fn reorder_within(
        &self,
        collection: Collection,
        filter: &ListFilter,
        id: &str,
        new_index: usize,
    ) -> Result<f64> {
        let records = self.store.list(collection, filter)?;
        let Some(current) = records.iter().position(|r| r.id == id) else {
            return Err(TreeSyncError::RecordNotFound(id.to_string()));
        };
        let others: Vec<f64> = records
            .iter()
            .filter(|r| r.id != id)
            .map(|r| r.position)
            .collect();
        let new_index = new_index.min(others.len());
        if new_index == current {
            return Ok(records[current].position);
        }

        let position = match self.allocator.reordered_position(&others, new_index) {
            Some(position) => position,
            None => {
                info!("No room between neighbours in {}, renormalizing", collection);
                self.renormalize(collection)?;
                let others: Vec<f64> = self
                    .store
                    .list(collection, filter)?
                    .iter()
                    .filter(|r| r.id != id)
                    .map(|r| r.position)
                    .collect();
                self.allocator
                    .reordered_position(&others, new_index)
                    .ok_or_else(|| {
                        TreeSyncError::Persistence(format!(
                            "No position available for '{}' after renormalizing",
                            id
                        ))
                    })?
            }
        };

        self.store.update_position(id, position)?;
        debug!("Moved '{}' in {} to index {} ({})", id, collection, new_index, position);
        Ok(position)
    }

    /// Respace the collection to `gap, 2·gap, …` keeping its order. Only
    /// records whose position changes are written, in a single batch, so a
    /// failure leaves every stored position as it was.
    pub fn renormalize(&self, collection: Collection) -> Result<Vec<OrderableRecord>> {
        let mut records = self.store.list(collection, &ListFilter::All)?;
        let positions = self.allocator.renormalized(records.len());
        let updates: Vec<(String, f64)> = records
            .iter()
            .zip(&positions)
            .filter(|(record, position)| record.position != **position)
            .map(|(record, position)| (record.id.clone(), *position))
            .collect();
        if !updates.is_empty() {
            self.store.update_positions(&updates)?;
        }
        for (record, position) in records.iter_mut().zip(positions) {
            record.position = position;
        }
        Ok(records)
    }

    /// Delete a record. Returns whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.store.delete(id)
    }
}
