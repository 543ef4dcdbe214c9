//! Users tab.

use std::sync::Arc;

use tokio::sync::Mutex;

use schoolops_core::{Confirm, DeleteOutcome, DomainError, UserId};

use crate::error::DashboardError;
use crate::model::{NewUser, UserAccount};
use crate::service::UserAdminService;
use crate::view::RowCache;

pub struct UserRoster<S: ?Sized> {
    service: Arc<S>,
    cache: Arc<Mutex<RowCache<UserAccount>>>,
}

impl<S: ?Sized> Clone for UserRoster<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S> UserRoster<S>
where
    S: UserAdminService + ?Sized,
{
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            cache: Arc::new(Mutex::new(RowCache::default())),
        }
    }

    pub async fn users(&self) -> Vec<UserAccount> {
        self.cache.lock().await.rows().to_vec()
    }

    pub async fn load(&self) -> Result<usize, DashboardError> {
        let epoch = self.cache.lock().await.begin_load();
        let rows = self
            .service
            .list_users()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "user load failed"))?;

        let mut cache = self.cache.lock().await;
        if !cache.replace(epoch, rows) {
            tracing::debug!(epoch, "discarding superseded user load");
        }
        Ok(cache.rows().len())
    }

    pub async fn deactivate(&self) {
        self.cache.lock().await.deactivate();
    }

    pub async fn add(&self, user: NewUser) -> Result<UserAccount, DashboardError> {
        user.validate()?;
        let epoch = self.cache.lock().await.epoch();

        let id = self
            .service
            .create_user(&user)
            .await
            .inspect_err(|err| tracing::warn!(email = %user.email, error = %err, "user create failed"))?;

        let account = user.into_account(id);
        self.cache.lock().await.push(epoch, account.clone());
        tracing::info!(%id, email = %account.email, role = %account.role, "user added");
        Ok(account)
    }

    /// Overwrite the account `id`. The cached row changes only after the
    /// backend accepts the update.
    pub async fn update(&self, id: UserId, user: NewUser) -> Result<UserAccount, DashboardError> {
        user.validate()?;
        let epoch = {
            let cache = self.cache.lock().await;
            cache.find(&id).ok_or_else(DomainError::not_found)?;
            cache.epoch()
        };

        self.service
            .update_user(id, &user)
            .await
            .inspect_err(|err| tracing::warn!(%id, error = %err, "user update failed"))?;

        let account = user.into_account(id);
        let mut cache = self.cache.lock().await;
        if cache.is_current(epoch) {
            if let Some(row) = cache.find_mut(&id) {
                *row = account.clone();
            }
        }
        tracing::info!(%id, email = %account.email, role = %account.role, "user updated");
        Ok(account)
    }

    pub async fn delete(
        &self,
        id: UserId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, DashboardError> {
        let (epoch, email) = {
            let cache = self.cache.lock().await;
            let user = cache.find(&id).ok_or_else(DomainError::not_found)?;
            (cache.epoch(), user.email.clone())
        };
        if !confirm.confirm(&format!("Are you sure you want to remove user ({email})?")) {
            return Ok(DeleteOutcome::Declined);
        }

        self.service
            .delete_user(id)
            .await
            .inspect_err(|err| tracing::warn!(%id, error = %err, "user delete failed"))?;

        self.cache.lock().await.remove(epoch, &id);
        tracing::info!(%id, %email, "user removed");
        Ok(DeleteOutcome::Deleted)
    }
}
