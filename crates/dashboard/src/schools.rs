//! School directory tab: the rows behind the form's school and location pickers.

use std::sync::Arc;

use tokio::sync::Mutex;

use schoolops_core::{Confirm, DeleteOutcome, DomainError, SchoolEntryId};

use crate::error::DashboardError;
use crate::model::{NewSchoolEntry, SchoolDraft, SchoolEntry, SchoolField};
use crate::service::SchoolDataService;
use crate::view::RowCache;

#[derive(Debug, Default)]
struct DirectoryState {
    rows: RowCache<SchoolEntry>,
    /// At most one row is in edit mode.
    draft: Option<SchoolDraft>,
}

pub struct SchoolDirectory<S: ?Sized> {
    service: Arc<S>,
    state: Arc<Mutex<DirectoryState>>,
}

impl<S: ?Sized> Clone for SchoolDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> SchoolDirectory<S>
where
    S: SchoolDataService + ?Sized,
{
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(DirectoryState::default())),
        }
    }

    pub async fn entries(&self) -> Vec<SchoolEntry> {
        self.state.lock().await.rows.rows().to_vec()
    }

    pub async fn draft(&self) -> Option<SchoolDraft> {
        self.state.lock().await.draft.clone()
    }

    pub async fn load(&self) -> Result<usize, DashboardError> {
        let epoch = {
            let mut state = self.state.lock().await;
            state.draft = None;
            state.rows.begin_load()
        };
        let rows = self
            .service
            .list_school_entries()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "school directory load failed"))?;

        let mut state = self.state.lock().await;
        if !state.rows.replace(epoch, rows) {
            tracing::debug!(epoch, "discarding superseded school directory load");
        }
        Ok(state.rows.rows().len())
    }

    pub async fn deactivate(&self) {
        let mut state = self.state.lock().await;
        state.rows.deactivate();
        state.draft = None;
    }

    /// Put a row into edit mode, dropping any other unsaved draft.
    pub async fn begin_edit(&self, id: SchoolEntryId) -> Result<SchoolDraft, DashboardError> {
        let mut state = self.state.lock().await;
        let draft = state
            .rows
            .find(&id)
            .map(SchoolDraft::from_entry)
            .ok_or_else(DomainError::not_found)?;
        state.draft = Some(draft.clone());
        Ok(draft)
    }

    pub async fn edit_field(&self, field: SchoolField, value: &str) -> Result<(), DashboardError> {
        let mut state = self.state.lock().await;
        let draft = state
            .draft
            .as_mut()
            .ok_or_else(|| DomainError::validation("No row is being edited"))?;
        draft.set(field, value);
        Ok(())
    }

    pub async fn cancel_edit(&self) {
        self.state.lock().await.draft = None;
    }

    /// Send the draft and, once acknowledged, write it into the cached row.
    ///
    /// On failure the draft stays open with the user's edits.
    pub async fn save_edit(&self) -> Result<SchoolEntry, DashboardError> {
        let (epoch, entry) = {
            let state = self.state.lock().await;
            let draft = state
                .draft
                .as_ref()
                .ok_or_else(|| DomainError::validation("No row is being edited"))?;
            (state.rows.epoch(), draft.validate()?)
        };

        self.service
            .update_school_entry(&entry)
            .await
            .inspect_err(|err| tracing::warn!(id = %entry.id, error = %err, "school update failed"))?;

        let mut state = self.state.lock().await;
        if state.rows.is_current(epoch) {
            if let Some(row) = state.rows.find_mut(&entry.id) {
                *row = entry.clone();
            }
            if state.draft.as_ref().is_some_and(|d| d.id == entry.id) {
                state.draft = None;
            }
        }
        tracing::info!(id = %entry.id, school = %entry.school_name, "school entry updated");
        Ok(entry)
    }

    pub async fn add(&self, entry: NewSchoolEntry) -> Result<SchoolEntry, DashboardError> {
        let epoch = self.state.lock().await.rows.epoch();
        let id = self
            .service
            .create_school_entry(&entry)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "school create failed"))?;

        let entry = entry.into_entry(id);
        self.state.lock().await.rows.push(epoch, entry.clone());
        tracing::info!(%id, school = %entry.school_name, "school entry added");
        Ok(entry)
    }

    pub async fn delete(
        &self,
        id: SchoolEntryId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, DashboardError> {
        let (epoch, prompt) = {
            let state = self.state.lock().await;
            let row = state.rows.find(&id).ok_or_else(DomainError::not_found)?;
            (
                state.rows.epoch(),
                format!(
                    "Are you sure you want to delete {} ({})?",
                    row.school_name, row.location
                ),
            )
        };
        if !confirm.confirm(&prompt) {
            return Ok(DeleteOutcome::Declined);
        }

        self.service
            .delete_school_entry(id)
            .await
            .inspect_err(|err| tracing::warn!(%id, error = %err, "school delete failed"))?;

        let mut state = self.state.lock().await;
        state.rows.remove(epoch, &id);
        if state.draft.as_ref().is_some_and(|d| d.id == id) {
            state.draft = None;
        }
        tracing::info!(%id, "school entry deleted");
        Ok(DeleteOutcome::Deleted)
    }
}
