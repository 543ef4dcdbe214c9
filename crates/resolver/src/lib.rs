//! `schoolops-resolver` — dependent selection for the workbook entry form.
//!
//! [`SelectionState`] holds the pure cascade rules and stale-response
//! tickets. [`Resolver`] drives it against a [`CatalogService`].

pub mod catalog;
pub mod error;
pub mod resolver;
pub mod state;

pub use catalog::{CatalogService, SubmitReceipt, SubmitRecord, WorkbookQuery};
pub use error::ResolverError;
pub use resolver::{FormOptions, Resolver};
pub use state::{Lookup, LookupTicket, SelectionState};
