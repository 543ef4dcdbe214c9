//! Admin dashboard shell state: which tab is showing and its view.

use std::sync::Arc;

use tokio::sync::Mutex;

use schoolops_auth::{require_admin, Session};
use schoolops_inventory::{InventoryService, Ledger};

use crate::error::DashboardError;
use crate::schools::SchoolDirectory;
use crate::service::{SchoolDataService, SubmissionService, UserAdminService};
use crate::submissions::SubmissionBook;
use crate::users::UserRoster;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DashboardTab {
    #[default]
    Schools,
    Users,
    Submissions,
    Inventory,
}

impl DashboardTab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Schools => "School Data",
            Self::Users => "User Management",
            Self::Submissions => "User Submissions",
            Self::Inventory => "Workbook Inventory",
        }
    }
}

impl core::fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Admin-only workspace over one backend.
///
/// Each tab's data lives only while the tab is showing. Switching away drops
/// it, and any response still in flight for the old tab is discarded.
pub struct Dashboard<S> {
    active: Arc<Mutex<Option<DashboardTab>>>,
    schools: SchoolDirectory<S>,
    users: UserRoster<S>,
    submissions: SubmissionBook<S>,
    inventory: Ledger<S>,
}

impl<S> Clone for Dashboard<S> {
    fn clone(&self) -> Self {
        Self {
            active: Arc::clone(&self.active),
            schools: self.schools.clone(),
            users: self.users.clone(),
            submissions: self.submissions.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

impl<S> Dashboard<S>
where
    S: SchoolDataService + UserAdminService + SubmissionService + InventoryService,
{
    /// Open the dashboard for `session`. Non-admins are turned away.
    pub fn open(session: &Session, service: Arc<S>) -> Result<Self, DashboardError> {
        require_admin(session)?;
        tracing::info!(session_id = %session.id(), email = %session.email(), "dashboard opened");
        Ok(Self {
            active: Arc::new(Mutex::new(None)),
            schools: SchoolDirectory::new(Arc::clone(&service)),
            users: UserRoster::new(Arc::clone(&service)),
            submissions: SubmissionBook::new(Arc::clone(&service)),
            inventory: Ledger::new(service),
        })
    }

    pub async fn active_tab(&self) -> Option<DashboardTab> {
        *self.active.lock().await
    }

    pub fn schools(&self) -> &SchoolDirectory<S> {
        &self.schools
    }

    pub fn users(&self) -> &UserRoster<S> {
        &self.users
    }

    pub fn submissions(&self) -> &SubmissionBook<S> {
        &self.submissions
    }

    pub fn inventory(&self) -> &Ledger<S> {
        &self.inventory
    }

    /// Show `tab`: drop the previous tab's data, then load the new one.
    ///
    /// Switching to the tab already showing reloads it. Returns the row count.
    pub async fn switch_tab(&self, tab: DashboardTab) -> Result<usize, DashboardError> {
        let previous = self.active.lock().await.replace(tab);
        if let Some(previous) = previous.filter(|p| *p != tab) {
            self.deactivate(previous).await;
        }
        tracing::debug!(?previous, %tab, "dashboard tab switched");

        match tab {
            DashboardTab::Schools => self.schools.load().await,
            DashboardTab::Users => self.users.load().await,
            DashboardTab::Submissions => self.submissions.load().await,
            DashboardTab::Inventory => Ok(self.inventory.load().await?),
        }
    }

    /// Leave the dashboard, dropping whatever tab was showing.
    pub async fn close(&self) {
        if let Some(previous) = self.active.lock().await.take() {
            self.deactivate(previous).await;
        }
    }

    async fn deactivate(&self, tab: DashboardTab) {
        match tab {
            DashboardTab::Schools => self.schools.deactivate().await,
            DashboardTab::Users => self.users.deactivate().await,
            DashboardTab::Submissions => self.submissions.deactivate().await,
            DashboardTab::Inventory => self.inventory.deactivate().await,
        }
    }
}
