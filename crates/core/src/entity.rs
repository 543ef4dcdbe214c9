//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Index of the entity with `id` in a cached collection.
pub fn position_of<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Remove the entity with `id` from a cached collection, returning it.
pub fn remove_by_id<E: Entity>(items: &mut Vec<E>, id: &E::Id) -> Option<E> {
    position_of(items, id).map(|idx| items.remove(idx))
}
