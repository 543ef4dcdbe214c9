//! Port to the inventory endpoints of the service of record.

use async_trait::async_trait;

use schoolops_core::{InventoryItemId, Quantity, TransportError};

use crate::item::{InventoryItem, NewInventoryItem};

#[async_trait]
pub trait InventoryService: Send + Sync {
    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, TransportError>;

    /// Store an absolute quantity (the client computes it from the delta).
    async fn update_inventory_quantity(
        &self,
        id: InventoryItemId,
        quantity: Quantity,
    ) -> Result<(), TransportError>;

    /// Returns the server-issued id of the new row.
    async fn create_inventory_item(
        &self,
        item: &NewInventoryItem,
    ) -> Result<InventoryItemId, TransportError>;

    async fn delete_inventory_item(&self, id: InventoryItemId) -> Result<(), TransportError>;
}
