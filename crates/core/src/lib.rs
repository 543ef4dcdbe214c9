//! `schoolops-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no HTTP).

pub mod confirm;
pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod term;
pub mod transport;
pub mod value_object;

pub use confirm::{AlwaysConfirm, Confirm, DeleteOutcome};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{InventoryItemId, SchoolEntryId, SubmissionId, UserId};
pub use quantity::Quantity;
pub use term::Term;
pub use transport::TransportError;
pub use value_object::ValueObject;
