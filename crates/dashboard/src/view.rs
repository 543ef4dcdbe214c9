//! Per-tab row cache shared by the dashboard views.

use schoolops_core::Entity;
use schoolops_core::entity::{position_of, remove_by_id};

/// Rows fetched for one tab activation.
///
/// `epoch` advances on every load and deactivation. A response is applied
/// only if the epoch it was requested under is still current.
#[derive(Debug)]
pub(crate) struct RowCache<T> {
    rows: Vec<T>,
    epoch: u64,
}

impl<T> Default for RowCache<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            epoch: 0,
        }
    }
}

impl<T: Entity + Clone> RowCache<T> {
    pub(crate) fn rows(&self) -> &[T] {
        &self.rows
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Start a load; returns the epoch to hand back to [`Self::replace`].
    pub(crate) fn begin_load(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub(crate) fn replace(&mut self, epoch: u64, rows: Vec<T>) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.rows = rows;
        true
    }

    pub(crate) fn deactivate(&mut self) {
        self.epoch += 1;
        self.rows.clear();
    }

    pub(crate) fn find(&self, id: &T::Id) -> Option<&T> {
        position_of(&self.rows, id).map(|idx| &self.rows[idx])
    }

    pub(crate) fn find_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        position_of(&self.rows, id).map(|idx| &mut self.rows[idx])
    }

    pub(crate) fn push(&mut self, epoch: u64, row: T) {
        if self.is_current(epoch) {
            self.rows.push(row);
        }
    }

    pub(crate) fn remove(&mut self, epoch: u64, id: &T::Id) -> Option<T> {
        if self.is_current(epoch) {
            remove_by_id(&mut self.rows, id)
        } else {
            None
        }
    }
}
