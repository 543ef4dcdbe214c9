//! Ports to the admin endpoints of the service of record.

use async_trait::async_trait;

use schoolops_core::{SchoolEntryId, SubmissionId, TransportError, UserId};

use crate::model::{Delivery, NewSchoolEntry, NewUser, SchoolEntry, Submission, UserAccount};

#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Newest first.
    async fn list_submissions(&self) -> Result<Vec<Submission>, TransportError>;

    async fn delete_submission(&self, id: SubmissionId) -> Result<(), TransportError>;

    /// Returns how many rows the server changed.
    async fn mark_delivered(
        &self,
        ids: &[SubmissionId],
        delivered: Delivery,
    ) -> Result<u64, TransportError>;
}

#[async_trait]
pub trait SchoolDataService: Send + Sync {
    async fn list_school_entries(&self) -> Result<Vec<SchoolEntry>, TransportError>;

    async fn create_school_entry(
        &self,
        entry: &NewSchoolEntry,
    ) -> Result<SchoolEntryId, TransportError>;

    async fn update_school_entry(&self, entry: &SchoolEntry) -> Result<(), TransportError>;

    async fn delete_school_entry(&self, id: SchoolEntryId) -> Result<(), TransportError>;
}

#[async_trait]
pub trait UserAdminService: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserAccount>, TransportError>;

    async fn create_user(&self, user: &NewUser) -> Result<UserId, TransportError>;

    /// Overwrite name, email, role and password of an existing account.
    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<(), TransportError>;

    async fn delete_user(&self, id: UserId) -> Result<(), TransportError>;
}
