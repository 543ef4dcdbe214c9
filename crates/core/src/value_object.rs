//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// A value object has no identity of its own: two `Quantity(5)` values are the
/// same value wherever they come from. To "change" one, build a new one.
///
/// Compare with [`crate::Entity`], where two rows with the same id are the same
/// record even if their fields differ (e.g. an inventory item before and after
/// an adjustment).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
