use serde::{Deserialize, Serialize};

use schoolops_core::{DomainError, Entity, InventoryItemId, Quantity};

/// One workbook title held in stock for a grade.
///
/// The server holds the authoritative quantity; this is the client's cached
/// copy, replaced only after the server acknowledges a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub grade: String,
    pub workbook_name: String,
    pub quantity: Quantity,
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

/// A validated stock change: a strictly positive delta and its sign.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub direction: Direction,
    pub delta: u32,
}

impl Adjustment {
    /// Parse the text typed next to an item.
    pub fn parse(raw: &str, direction: Direction) -> Result<Self, DomainError> {
        let delta = raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| DomainError::validation("Enter a valid positive number"))?;
        Ok(Self { direction, delta })
    }

    pub fn signed(self) -> i64 {
        match self.direction {
            Direction::Increase => i64::from(self.delta),
            Direction::Decrease => -i64::from(self.delta),
        }
    }
}

impl InventoryItem {
    /// Quantity after `adjustment`, or why it cannot be applied.
    pub fn adjusted(&self, adjustment: Adjustment) -> Result<Quantity, DomainError> {
        self.quantity.offset(adjustment.signed())
    }
}

/// Input for a new inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub grade: String,
    pub workbook_name: String,
    pub quantity: Quantity,
}

impl NewInventoryItem {
    /// Validate the add-workbook form.
    pub fn parse(grade: &str, workbook_name: &str, quantity: &str) -> Result<Self, DomainError> {
        let grade = grade.trim();
        let workbook_name = workbook_name.trim();
        if grade.is_empty() {
            return Err(DomainError::required("Grade"));
        }
        if workbook_name.is_empty() {
            return Err(DomainError::required("Workbook name"));
        }
        let quantity = Quantity::parse(quantity, "Quantity")?;
        Ok(Self {
            grade: grade.to_string(),
            workbook_name: workbook_name.to_string(),
            quantity,
        })
    }

    pub fn into_item(self, id: InventoryItemId) -> InventoryItem {
        InventoryItem {
            id,
            grade: self.grade,
            workbook_name: self.workbook_name,
            quantity: self.quantity,
        }
    }
}
