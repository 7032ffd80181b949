//! Sparse-set component storage.
//!
//! Each [`ComponentStore`] keeps its values packed in a dense `Vec` for
//! cache-friendly iteration, with a sparse table mapping entity indices to
//! dense positions for O(1) lookup. Removal swaps the last element into the
//! hole, so dense order is **not** stable across removals.

use std::any::Any;

use crate::component::Component;
use crate::entity::EntityIndex;

/// Type-erased view of a [`ComponentStore`].
///
/// Covers the operations that do not need to know the component type, so
/// the registry can purge an entity from every store without knowing what
/// each one holds.
pub trait ErasedStore: Any + Send + Sync {
    /// Name of the component type held by this store.
    fn component_name(&self) -> &'static str;

    /// Returns `true` if `index` has a component in this store.
    fn contains(&self, index: EntityIndex) -> bool;

    /// Drops the component owned by `index`, if any.
    ///
    /// Returns `true` if a component was removed.
    fn remove_entity(&mut self, index: EntityIndex) -> bool;

    /// Returns the number of stored components.
    fn len(&self) -> usize;

    /// Returns `true` if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every component in the store.
    fn clear(&mut self);

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse-set storage for a single component type.
///
/// Invariant: for every entity index `e` with `sparse[e] == Some(k)`,
/// `owners[k] == e` and `values[k]` is `e`'s component. `values` and `owners`
/// always have the same length.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    /// Entity index -> dense position.
    sparse: Vec<Option<usize>>,
    /// Packed component values.
    values: Vec<T>,
    /// `owners[k]` is the entity index owning `values[k]`.
    owners: Vec<EntityIndex>,
}

impl<T: Component> ComponentStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            values: Vec::new(),
            owners: Vec::new(),
        }
    }

    /// Attach `value` to `index`.
    ///
    /// If the entity already has a component in this store, the value is
    /// overwritten in place and the previous value is returned. Otherwise the
    /// value is appended to the dense arrays.
    pub fn insert(&mut self, index: EntityIndex, value: T) -> Option<T> {
        let slot = usize::from(index);
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }

        if let Some(dense) = self.sparse[slot] {
            return Some(std::mem::replace(&mut self.values[dense], value));
        }

        self.sparse[slot] = Some(self.values.len());
        self.values.push(value);
        self.owners.push(index);
        None
    }

    /// Returns the component of `index`, if present.
    #[must_use]
    pub fn get(&self, index: EntityIndex) -> Option<&T> {
        let dense = self.dense_index(index)?;
        self.values.get(dense)
    }

    /// Returns the component of `index` mutably, if present.
    #[must_use]
    pub fn get_mut(&mut self, index: EntityIndex) -> Option<&mut T> {
        let dense = self.dense_index(index)?;
        self.values.get_mut(dense)
    }

    /// Detach and return the component of `index`.
    ///
    /// The last dense element is moved into the vacated position and its
    /// owner's sparse entry is re-pointed.
    pub fn remove(&mut self, index: EntityIndex) -> Option<T> {
        let dense = self.sparse.get_mut(usize::from(index))?.take()?;

        let last = self.values.len() - 1;
        if dense != last {
            let moved = self.owners[last];
            self.sparse[usize::from(moved)] = Some(dense);
        }

        self.owners.swap_remove(dense);
        Some(self.values.swap_remove(dense))
    }

    /// Returns `true` if `index` has a component in this store.
    #[must_use]
    pub fn contains(&self, index: EntityIndex) -> bool {
        self.dense_index(index).is_some()
    }

    /// Returns the number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops all components and the sparse table.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.values.clear();
        self.owners.clear();
    }

    /// Visits every component in dense order.
    ///
    /// Values may be mutated; the store itself is exclusively borrowed for
    /// the duration, so entries cannot be added or removed mid-traversal.
    pub fn for_each_mut(&mut self, mut visit: impl FnMut(&mut T)) {
        for value in &mut self.values {
            visit(value);
        }
    }

    /// Iterates `(entity_index, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityIndex, &T)> {
        self.owners.iter().copied().zip(self.values.iter())
    }

    /// Iterates `(entity_index, &mut component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityIndex, &mut T)> {
        self.owners.iter().copied().zip(self.values.iter_mut())
    }

    /// The packed component values.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The entity index owning each packed value.
    #[must_use]
    pub fn owners(&self) -> &[EntityIndex] {
        &self.owners
    }

    fn dense_index(&self, index: EntityIndex) -> Option<usize> {
        self.sparse.get(usize::from(index)).copied().flatten()
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn component_name(&self) -> &'static str {
        T::type_name()
    }

    fn contains(&self, index: EntityIndex) -> bool {
        ComponentStore::contains(self, index)
    }

    fn remove_entity(&mut self, index: EntityIndex) -> bool {
        self.remove(index).is_some()
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
