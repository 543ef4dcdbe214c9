//! Client-side inventory ledger: cached quantities plus per-item pending
//! adjustments, reconciled with the server after each acknowledgment.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use schoolops_core::entity::{position_of, remove_by_id};
use schoolops_core::{Confirm, DeleteOutcome, DomainError, InventoryItemId, Quantity};

use crate::error::LedgerError;
use crate::item::{Adjustment, Direction, InventoryItem, NewInventoryItem};
use crate::service::InventoryService;

/// Where one item's adjustment flow currently is.
///
/// Validation is synchronous, so the only state that outlives a call is
/// `Submitting`: the request is out and the cache still shows the old value.
/// Rejected, applied and failed adjustments all return to `Idle`; the caller
/// learns which from the `Result` of [`Ledger::apply_adjustment`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdjustmentPhase {
    Idle,
    Submitting,
}

#[derive(Debug, Default)]
struct LedgerState {
    items: Vec<InventoryItem>,
    pending: HashMap<InventoryItemId, String>,
    /// Items with an adjustment or delete in flight.
    submitting: HashSet<InventoryItemId>,
    /// Bumped on every load and deactivation; responses tagged with an older
    /// epoch belong to a view that no longer exists.
    epoch: u64,
}

impl LedgerState {
    fn find(&self, id: InventoryItemId) -> Result<&InventoryItem, DomainError> {
        position_of(&self.items, &id)
            .map(|idx| &self.items[idx])
            .ok_or_else(DomainError::not_found)
    }

    fn find_mut(&mut self, id: InventoryItemId) -> Option<&mut InventoryItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn ensure_idle(&self, id: InventoryItemId) -> Result<(), DomainError> {
        if self.submitting.contains(&id) {
            return Err(DomainError::conflict(
                "A change to this workbook is still being saved",
            ));
        }
        Ok(())
    }
}

/// Inventory tab state, shared by cheap clones of the handle.
///
/// Every mutation is request-then-reconcile: the cache changes only after the
/// server acknowledges, so a failed request leaves it exactly as it was.
pub struct Ledger<S: ?Sized> {
    service: Arc<S>,
    state: Arc<Mutex<LedgerState>>,
}

impl<S: ?Sized> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> Ledger<S>
where
    S: InventoryService + ?Sized,
{
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    pub async fn items(&self) -> Vec<InventoryItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn item(&self, id: InventoryItemId) -> Option<InventoryItem> {
        self.state.lock().await.find(id).ok().cloned()
    }

    pub async fn pending_adjustment(&self, id: InventoryItemId) -> String {
        self.state
            .lock()
            .await
            .pending
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn phase(&self, id: InventoryItemId) -> AdjustmentPhase {
        if self.state.lock().await.submitting.contains(&id) {
            AdjustmentPhase::Submitting
        } else {
            AdjustmentPhase::Idle
        }
    }

    /// Sum of cached quantities for one grade.
    pub async fn total_quantity_for_grade(&self, grade: &str) -> u64 {
        self.state
            .lock()
            .await
            .items
            .iter()
            .filter(|item| item.grade == grade)
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Fetch the inventory for a new tab activation.
    ///
    /// Replaces the cache and drops pending text. Returns the item count.
    pub async fn load(&self) -> Result<usize, LedgerError> {
        let epoch = {
            let mut state = self.state.lock().await;
            state.epoch += 1;
            state.epoch
        };

        let items = self.service.list_inventory().await.inspect_err(|err| {
            tracing::warn!(error = %err, "inventory load failed");
        })?;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!(epoch, "discarding superseded inventory load");
            return Ok(state.items.len());
        }
        state.items = items;
        state.pending.clear();
        state.submitting.clear();
        tracing::debug!(count = state.items.len(), "inventory loaded");
        Ok(state.items.len())
    }

    /// Drop the cache when the tab closes. Late responses are ignored.
    pub async fn deactivate(&self) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        state.items.clear();
        state.pending.clear();
        state.submitting.clear();
    }

    /// Remember what the user typed for one item. Validated on apply.
    pub async fn set_pending_adjustment(&self, id: InventoryItemId, raw: &str) {
        self.state.lock().await.pending.insert(id, raw.to_string());
    }

    /// Validate the pending delta, send the new absolute quantity, and update
    /// the cache once the server acknowledges.
    ///
    /// Invalid or negative results are rejected before any request is made.
    /// On transport failure the cached quantity and the pending text are kept.
    pub async fn apply_adjustment(
        &self,
        id: InventoryItemId,
        direction: Direction,
    ) -> Result<Quantity, LedgerError> {
        let (epoch, new_quantity) = {
            let mut state = self.state.lock().await;
            state.ensure_idle(id)?;
            let item = state.find(id)?;
            let raw = state.pending.get(&id).map(String::as_str).unwrap_or("");
            let adjustment = Adjustment::parse(raw, direction)?;
            let new_quantity = item.adjusted(adjustment)?;
            state.submitting.insert(id);
            (state.epoch, new_quantity)
        };

        let result = self
            .service
            .update_inventory_quantity(id, new_quantity)
            .await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!(%id, "inventory view closed before acknowledgment");
            return result.map(|()| new_quantity).map_err(LedgerError::from);
        }
        state.submitting.remove(&id);

        match result {
            Ok(()) => {
                if let Some(item) = state.find_mut(id) {
                    item.quantity = new_quantity;
                }
                state.pending.remove(&id);
                tracing::info!(%id, ?direction, quantity = new_quantity.get(), "inventory adjusted");
                Ok(new_quantity)
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "inventory adjustment failed");
                Err(err.into())
            }
        }
    }

    /// Delete a row after the user confirms.
    pub async fn delete_item(
        &self,
        id: InventoryItemId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, LedgerError> {
        let prompt = {
            let state = self.state.lock().await;
            state.ensure_idle(id)?;
            let item = state.find(id)?;
            format!(
                "Are you sure you want to delete {} (grade {})?",
                item.workbook_name, item.grade
            )
        };

        if !confirm.confirm(&prompt) {
            return Ok(DeleteOutcome::Declined);
        }

        let epoch = {
            let mut state = self.state.lock().await;
            state.ensure_idle(id)?;
            state.find(id)?;
            state.submitting.insert(id);
            state.epoch
        };

        let result = self.service.delete_inventory_item(id).await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!(%id, "inventory view closed before delete acknowledgment");
            return result.map(|()| DeleteOutcome::Deleted).map_err(LedgerError::from);
        }
        state.submitting.remove(&id);
        result.inspect_err(|err| tracing::warn!(%id, error = %err, "inventory delete failed"))?;

        remove_by_id(&mut state.items, &id);
        state.pending.remove(&id);
        tracing::info!(%id, "inventory item deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Validate the add form, create the row, and append it with its new id.
    pub async fn add_item(
        &self,
        grade: &str,
        workbook_name: &str,
        initial_quantity: &str,
    ) -> Result<InventoryItem, LedgerError> {
        let new_item = NewInventoryItem::parse(grade, workbook_name, initial_quantity)?;
        let epoch = self.state.lock().await.epoch;

        let id = self
            .service
            .create_inventory_item(&new_item)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "inventory create failed"))?;

        let item = new_item.into_item(id);
        let mut state = self.state.lock().await;
        if state.epoch == epoch {
            state.items.push(item.clone());
        }
        tracing::info!(%id, grade = %item.grade, workbook = %item.workbook_name, "inventory item added");
        Ok(item)
    }
}
