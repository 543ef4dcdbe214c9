//! Submissions tab: review, delivery marking and deletion of form counts.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use schoolops_core::{Confirm, DeleteOutcome, DomainError, SubmissionId, TransportError};

use crate::error::DashboardError;
use crate::model::{DateRange, Delivery, Submission};
use crate::service::SubmissionService;
use crate::view::RowCache;

/// Outcome of deleting several submissions at once.
///
/// Every delete is attempted; the cache loses only the acknowledged ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub requested: usize,
    pub deleted: Vec<SubmissionId>,
    pub failed: Vec<(SubmissionId, TransportError)>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl core::fmt::Display for BulkDeleteReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} of {} deleted, {} failed",
            self.deleted.len(),
            self.requested,
            self.failed.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkDeleteOutcome {
    Declined,
    Finished(BulkDeleteReport),
}

/// Cached submissions for one activation of the tab.
pub struct SubmissionBook<S: ?Sized> {
    service: Arc<S>,
    cache: Arc<Mutex<RowCache<Submission>>>,
}

impl<S: ?Sized> Clone for SubmissionBook<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S> SubmissionBook<S>
where
    S: SubmissionService + ?Sized,
{
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            cache: Arc::new(Mutex::new(RowCache::default())),
        }
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.cache.lock().await.rows().to_vec()
    }

    /// Submissions whose `submitted_at` falls inside `range`, in cache order.
    pub async fn filter_by_date(&self, range: DateRange) -> Vec<Submission> {
        self.cache
            .lock()
            .await
            .rows()
            .iter()
            .filter(|s| range.contains(s.submitted_at))
            .cloned()
            .collect()
    }

    pub async fn load(&self) -> Result<usize, DashboardError> {
        let epoch = self.cache.lock().await.begin_load();
        let rows = self
            .service
            .list_submissions()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "submission load failed"))?;

        let mut cache = self.cache.lock().await;
        if !cache.replace(epoch, rows) {
            tracing::debug!(epoch, "discarding superseded submission load");
        }
        Ok(cache.rows().len())
    }

    pub async fn deactivate(&self) {
        self.cache.lock().await.deactivate();
    }

    pub async fn delete(
        &self,
        id: SubmissionId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, DashboardError> {
        let epoch = {
            let cache = self.cache.lock().await;
            cache.find(&id).ok_or_else(DomainError::not_found)?;
            cache.epoch()
        };
        if !confirm.confirm("Are you sure you want to delete this submission?") {
            return Ok(DeleteOutcome::Declined);
        }

        self.service
            .delete_submission(id)
            .await
            .inspect_err(|err| tracing::warn!(%id, error = %err, "submission delete failed"))?;

        self.cache.lock().await.remove(epoch, &id);
        tracing::info!(%id, "submission deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete every id in `ids` concurrently and wait for all of them.
    ///
    /// Duplicates are collapsed. Ids the server refused stay in the cache and
    /// are listed in the report with their error.
    pub async fn bulk_delete(
        &self,
        ids: &[SubmissionId],
        confirm: &dyn Confirm,
    ) -> Result<BulkDeleteOutcome, DashboardError> {
        let mut seen = HashSet::new();
        let ids: Vec<SubmissionId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Err(DomainError::validation("No submissions selected").into());
        }

        let prompt = format!("Are you sure you want to delete {} submissions?", ids.len());
        if !confirm.confirm(&prompt) {
            return Ok(BulkDeleteOutcome::Declined);
        }

        let epoch = self.cache.lock().await.epoch();
        let results = join_all(ids.iter().map(|id| self.service.delete_submission(*id))).await;

        let mut report = BulkDeleteReport {
            requested: ids.len(),
            deleted: Vec::new(),
            failed: Vec::new(),
        };
        let mut cache = self.cache.lock().await;
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    cache.remove(epoch, &id);
                    report.deleted.push(id);
                }
                Err(err) => report.failed.push((id, err)),
            }
        }

        if report.is_complete() {
            tracing::info!(deleted = report.deleted.len(), "submissions deleted");
        } else {
            tracing::warn!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "bulk submission delete partially failed"
            );
        }
        Ok(BulkDeleteOutcome::Finished(report))
    }

    /// Set the delivery flag on the given submissions. Returns the server's
    /// count of changed rows.
    pub async fn mark_delivered(
        &self,
        ids: &[SubmissionId],
        delivered: Delivery,
    ) -> Result<u64, DashboardError> {
        if ids.is_empty() {
            return Err(DomainError::validation("No submissions selected").into());
        }
        let epoch = self.cache.lock().await.epoch();

        let updated = self
            .service
            .mark_delivered(ids, delivered)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "mark delivered failed"))?;

        let mut cache = self.cache.lock().await;
        if cache.is_current(epoch) {
            for id in ids {
                if let Some(row) = cache.find_mut(id) {
                    row.delivered = delivered;
                }
            }
        }
        tracing::info!(updated, %delivered, "delivery status updated");
        Ok(updated)
    }
}
