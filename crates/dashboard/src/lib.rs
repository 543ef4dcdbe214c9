//! `schoolops-dashboard` — admin workflows over the service of record.
//!
//! Every view caches rows for one tab activation and changes them only after
//! the server acknowledges. Access requires an admin [`Session`](schoolops_auth::Session).

pub mod dashboard;
pub mod error;
pub mod model;
pub mod schools;
pub mod service;
pub mod submissions;
pub mod users;

mod view;

pub use dashboard::{Dashboard, DashboardTab};
pub use error::DashboardError;
pub use model::{
    DateRange, Delivery, NewSchoolEntry, NewUser, SchoolDraft, SchoolEntry, SchoolField,
    Submission, UserAccount,
};
pub use schools::SchoolDirectory;
pub use service::{SchoolDataService, SubmissionService, UserAdminService};
pub use submissions::{BulkDeleteOutcome, BulkDeleteReport, SubmissionBook};
pub use users::UserRoster;
