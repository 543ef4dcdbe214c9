//! Workbook inventory: cached stock levels and the adjustment ledger that
//! keeps them in step with the service of record.
//!
//! Quantities never go negative. Every change is validated locally, sent as
//! an absolute value, and written to the cache only after acknowledgment.

pub mod error;
pub mod item;
pub mod ledger;
pub mod service;

pub use error::LedgerError;
pub use item::{Adjustment, Direction, InventoryItem, NewInventoryItem};
pub use ledger::{AdjustmentPhase, Ledger};
pub use service::InventoryService;
