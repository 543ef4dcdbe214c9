//! In-process backend with the same observable rules as the REST service.
//!
//! Intended for tests and local demos. Every port and the authenticator are
//! served from one store, so a workbook added on the inventory tab shows up
//! in the form's workbook lookup straight away.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use schoolops_auth::{AuthError, Authenticator, Credentials, LoginGrant, Role};
use schoolops_core::{
    InventoryItemId, Quantity, SchoolEntryId, SubmissionId, TransportError, UserId,
};
use schoolops_dashboard::{
    Delivery, NewSchoolEntry, NewUser, SchoolDataService, SchoolEntry, Submission,
    SubmissionService, UserAccount, UserAdminService,
};
use schoolops_inventory::{InventoryItem, InventoryService, NewInventoryItem};
use schoolops_resolver::{CatalogService, SubmitReceipt, SubmitRecord, WorkbookQuery};

#[derive(Debug)]
struct StoredUser {
    account: UserAccount,
    password: String,
}

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    schools: Vec<SchoolEntry>,
    inventory: Vec<InventoryItem>,
    submissions: Vec<Submission>,
    users: Vec<StoredUser>,
    /// token -> email
    reset_tokens: HashMap<String, String>,
}

impl Store {
    fn issue_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Thread-safe in-memory service of record.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: RwLock<Store>,
    offline: AtomicBool,
}

fn offline_error() -> TransportError {
    TransportError::Network("backend unreachable".into())
}

fn not_found(what: &str) -> TransportError {
    TransportError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_school(self, school: &str, location: &str, reporting_branch: &str) -> Self {
        if let Ok(mut store) = self.store.write() {
            let id = SchoolEntryId::new(store.issue_id());
            store.schools.push(SchoolEntry {
                id,
                school_name: school.to_string(),
                location: location.to_string(),
                reporting_branch: reporting_branch.to_string(),
                num_students: None,
            });
        }
        self
    }

    pub fn with_workbook(self, grade: &str, workbook_name: &str, quantity: u32) -> Self {
        if let Ok(mut store) = self.store.write() {
            let id = InventoryItemId::new(store.issue_id());
            store.inventory.push(InventoryItem {
                id,
                grade: grade.to_string(),
                workbook_name: workbook_name.to_string(),
                quantity: Quantity::new(quantity),
            });
        }
        self
    }

    pub fn with_user(self, email: &str, password: &str, role: Role, name: Option<&str>) -> Self {
        if let Ok(mut store) = self.store.write() {
            let id = UserId::new(store.issue_id());
            store.users.push(StoredUser {
                account: UserAccount {
                    id,
                    name: name.map(str::to_string),
                    email: email.to_string(),
                    role,
                },
                password: password.to_string(),
            });
        }
        self
    }

    /// While offline every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// The most recent reset token issued for `email`, as the reset email would carry it.
    pub fn reset_token_for(&self, email: &str) -> Option<String> {
        let store = self.store.read().ok()?;
        store
            .reset_tokens
            .iter()
            .filter(|(_, owner)| owner.as_str() == email)
            .map(|(token, _)| token.clone())
            .max()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline_error());
        }
        self.store
            .read()
            .map_err(|_| TransportError::Network("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline_error());
        }
        self.store
            .write()
            .map_err(|_| TransportError::Network("store lock poisoned".into()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl CatalogService for InMemoryBackend {
    async fn list_schools(&self) -> Result<Vec<String>, TransportError> {
        let store = self.read()?;
        Ok(distinct(store.schools.iter().map(|s| &s.school_name)))
    }

    async fn list_locations(&self, school: &str) -> Result<Vec<String>, TransportError> {
        let store = self.read()?;
        Ok(distinct(
            store
                .schools
                .iter()
                .filter(|s| s.school_name == school)
                .map(|s| &s.location),
        ))
    }

    async fn reporting_branch(&self, school: &str, location: &str) -> Result<String, TransportError> {
        let store = self.read()?;
        Ok(store
            .schools
            .iter()
            .find(|s| s.school_name == school && s.location == location)
            .map(|s| s.reporting_branch.clone())
            .unwrap_or_default())
    }

    async fn list_grades(&self) -> Result<Vec<String>, TransportError> {
        let store = self.read()?;
        Ok(distinct(store.inventory.iter().map(|i| &i.grade)))
    }

    /// Workbooks are keyed by grade only; school and location are ignored.
    async fn list_workbook_names(&self, query: &WorkbookQuery) -> Result<Vec<String>, TransportError> {
        let store = self.read()?;
        Ok(distinct(
            store
                .inventory
                .iter()
                .filter(|i| i.grade == query.grade)
                .map(|i| &i.workbook_name),
        ))
    }

    async fn submit_record(&self, record: &SubmitRecord) -> Result<SubmitReceipt, TransportError> {
        let mut store = self.write()?;
        let id = SubmissionId::new(store.issue_id());
        store.submissions.insert(
            0,
            Submission {
                id,
                school: record.school.clone(),
                location: record.location.clone(),
                grade: record.grade.clone(),
                term: Some(record.term),
                workbook: record.workbook.clone(),
                count: record.count.get(),
                remark: record.remark.clone(),
                submitted_by: record.submitted_by.clone(),
                submitted_at: chrono::Utc::now().naive_utc(),
                delivered: Delivery::No,
            },
        );
        Ok(SubmitReceipt {
            id: Some(id),
            message: Some("Form submitted successfully".into()),
        })
    }
}

#[async_trait]
impl InventoryService for InMemoryBackend {
    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, TransportError> {
        Ok(self.read()?.inventory.clone())
    }

    async fn update_inventory_quantity(
        &self,
        id: InventoryItemId,
        quantity: Quantity,
    ) -> Result<(), TransportError> {
        let mut store = self.write()?;
        let item = store
            .inventory
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Workbook"))?;
        item.quantity = quantity;
        Ok(())
    }

    async fn create_inventory_item(
        &self,
        item: &NewInventoryItem,
    ) -> Result<InventoryItemId, TransportError> {
        let mut store = self.write()?;
        let id = InventoryItemId::new(store.issue_id());
        store.inventory.push(item.clone().into_item(id));
        Ok(id)
    }

    async fn delete_inventory_item(&self, id: InventoryItemId) -> Result<(), TransportError> {
        let mut store = self.write()?;
        store.inventory.retain(|i| i.id != id);
        Ok(())
    }
}

#[async_trait]
impl SubmissionService for InMemoryBackend {
    async fn list_submissions(&self) -> Result<Vec<Submission>, TransportError> {
        Ok(self.read()?.submissions.clone())
    }

    async fn delete_submission(&self, id: SubmissionId) -> Result<(), TransportError> {
        let mut store = self.write()?;
        store.submissions.retain(|s| s.id != id);
        Ok(())
    }

    async fn mark_delivered(
        &self,
        ids: &[SubmissionId],
        delivered: Delivery,
    ) -> Result<u64, TransportError> {
        if ids.is_empty() {
            return Err(TransportError::Rejected("No IDs provided".into()));
        }
        let mut store = self.write()?;
        let mut updated = 0;
        for submission in store.submissions.iter_mut().filter(|s| ids.contains(&s.id)) {
            submission.delivered = delivered;
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl SchoolDataService for InMemoryBackend {
    async fn list_school_entries(&self) -> Result<Vec<SchoolEntry>, TransportError> {
        let mut rows = self.read()?.schools.clone();
        rows.sort_by(|a, b| a.school_name.cmp(&b.school_name));
        Ok(rows)
    }

    async fn create_school_entry(
        &self,
        entry: &NewSchoolEntry,
    ) -> Result<SchoolEntryId, TransportError> {
        let mut store = self.write()?;
        let id = SchoolEntryId::new(store.issue_id());
        store.schools.push(entry.clone().into_entry(id));
        Ok(id)
    }

    async fn update_school_entry(&self, entry: &SchoolEntry) -> Result<(), TransportError> {
        let mut store = self.write()?;
        let row = store
            .schools
            .iter_mut()
            .find(|s| s.id == entry.id)
            .ok_or_else(|| not_found("School"))?;
        *row = entry.clone();
        Ok(())
    }

    async fn delete_school_entry(&self, id: SchoolEntryId) -> Result<(), TransportError> {
        let mut store = self.write()?;
        let before = store.schools.len();
        store.schools.retain(|s| s.id != id);
        if store.schools.len() == before {
            return Err(TransportError::Rejected("School not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserAdminService for InMemoryBackend {
    async fn list_users(&self) -> Result<Vec<UserAccount>, TransportError> {
        Ok(self.read()?.users.iter().map(|u| u.account.clone()).collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<UserId, TransportError> {
        if user.email.is_empty() || user.password.is_empty() {
            return Err(TransportError::Rejected("Email and password required".into()));
        }
        let mut store = self.write()?;
        if store.users.iter().any(|u| u.account.email == user.email) {
            return Err(TransportError::Rejected(
                "User with this email already exists".into(),
            ));
        }
        let id = UserId::new(store.issue_id());
        store.users.push(StoredUser {
            account: user.clone().into_account(id),
            password: user.password.clone(),
        });
        Ok(id)
    }

    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<(), TransportError> {
        if user.email.is_empty() || user.password.is_empty() {
            return Err(TransportError::Rejected("Email and password required".into()));
        }
        let mut store = self.write()?;
        if store
            .users
            .iter()
            .any(|u| u.account.id != id && u.account.email == user.email)
        {
            return Err(TransportError::Rejected(
                "User with this email already exists".into(),
            ));
        }
        let row = store
            .users
            .iter_mut()
            .find(|u| u.account.id == id)
            .ok_or_else(|| not_found("User"))?;
        *row = StoredUser {
            account: user.clone().into_account(id),
            password: user.password.clone(),
        };
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), TransportError> {
        let mut store = self.write()?;
        store.users.retain(|u| u.account.id != id);
        Ok(())
    }
}

fn auth_transport(err: TransportError) -> AuthError {
    AuthError::Transport(err.to_string())
}

#[async_trait]
impl Authenticator for InMemoryBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError> {
        let store = self.read().map_err(auth_transport)?;
        store
            .users
            .iter()
            .find(|u| u.account.email == credentials.email && u.password == credentials.password)
            .map(|u| LoginGrant {
                email: u.account.email.clone(),
                role: u.account.role.clone(),
            })
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn display_name(&self, email: &str) -> Result<Option<String>, AuthError> {
        let store = self.read().map_err(auth_transport)?;
        Ok(store
            .users
            .iter()
            .find(|u| u.account.email == email)
            .and_then(|u| u.account.name.clone()))
    }

    async fn request_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let mut store = self.write().map_err(auth_transport)?;
        if !store.users.iter().any(|u| u.account.email == email) {
            return Ok("If the email exists, a reset link will be sent.".into());
        }
        let token = format!("reset-{:06}", store.issue_id());
        store.reset_tokens.insert(token, email.to_string());
        Ok("Password reset link sent to your email.".into())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError> {
        let mut store = self.write().map_err(auth_transport)?;
        let email = store
            .reset_tokens
            .remove(token)
            .ok_or_else(|| AuthError::Rejected("Invalid or expired token".into()))?;
        if let Some(user) = store.users.iter_mut().find(|u| u.account.email == email) {
            user.password = new_password.to_string();
        }
        Ok("Password reset successful".into())
    }
}
