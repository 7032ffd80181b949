//! Type-keyed collection of component stores.
//!
//! The [`ComponentRegistry`] owns one [`ComponentStore`] per component type,
//! created lazily on the first write of that type. Stores are held behind the
//! [`ErasedStore`] trait and keyed by [`ComponentTypeId`]; typed access
//! downcasts and checks that the stored type really is the one requested.

use std::collections::HashMap;

use tracing::debug;

use crate::component::{Component, ComponentTypeId};
use crate::entity::EntityIndex;
use crate::error::ComponentError;
use crate::storage::{ComponentStore, ErasedStore};

/// Owns every component store of a world.
///
/// Lookups for a type that has never been written return "absent" rather than
/// an error. A type-id collision between two component types is a contract
/// violation: the `try_*` methods report it as [`ComponentError::TypeMismatch`]
/// and the other typed accessors panic with that error.
#[derive(Default)]
pub struct ComponentRegistry {
    stores: HashMap<ComponentTypeId, Box<dyn ErasedStore>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    // -- Typed access --

    /// Returns the store for `T`, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::TypeMismatch`] if the store registered under
    /// `T`'s type id holds a different type.
    pub fn try_store<T: Component>(&self) -> Result<Option<&ComponentStore<T>>, ComponentError> {
        let type_id = T::component_type_id();
        match self.stores.get(&type_id) {
            None => Ok(None),
            Some(store) => {
                let found = store.component_name();
                store
                    .as_any()
                    .downcast_ref::<ComponentStore<T>>()
                    .map(Some)
                    .ok_or_else(|| mismatch::<T>(type_id, found))
            }
        }
    }

    /// Mutable counterpart of [`ComponentRegistry::try_store`].
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::TypeMismatch`] on a type-id collision.
    pub fn try_store_mut<T: Component>(
        &mut self,
    ) -> Result<Option<&mut ComponentStore<T>>, ComponentError> {
        let type_id = T::component_type_id();
        match self.stores.get_mut(&type_id) {
            None => Ok(None),
            Some(store) => {
                let found = store.component_name();
                store
                    .as_any_mut()
                    .downcast_mut::<ComponentStore<T>>()
                    .map(Some)
                    .ok_or_else(|| mismatch::<T>(type_id, found))
            }
        }
    }

    /// Returns the store for `T`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::TypeMismatch`] on a type-id collision.
    pub fn try_store_or_insert<T: Component>(
        &mut self,
    ) -> Result<&mut ComponentStore<T>, ComponentError> {
        let type_id = T::component_type_id();
        let store = self.stores.entry(type_id).or_insert_with(|| {
            debug!(component = T::type_name(), %type_id, "created component store");
            Box::new(ComponentStore::<T>::new())
        });
        let found = store.component_name();
        store
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .ok_or_else(|| mismatch::<T>(type_id, found))
    }

    /// Attach `value` to `index`, creating `T`'s store if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::TypeMismatch`] on a type-id collision.
    pub fn try_insert<T: Component>(
        &mut self,
        index: EntityIndex,
        value: T,
    ) -> Result<Option<T>, ComponentError> {
        Ok(self.try_store_or_insert::<T>()?.insert(index, value))
    }

    /// Returns the store for `T`, if one has been created.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision (see [`ComponentError::TypeMismatch`]).
    #[must_use]
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        enforce(self.try_store::<T>())
    }

    /// Returns the store for `T` mutably, if one has been created.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision.
    #[must_use]
    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        enforce(self.try_store_mut::<T>())
    }

    /// Attach `value` to `index`, overwriting any existing `T`. Returns the
    /// previous value.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision.
    pub fn insert<T: Component>(&mut self, index: EntityIndex, value: T) -> Option<T> {
        enforce(self.try_insert(index, value))
    }

    /// Returns `index`'s `T`, if present.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision.
    #[must_use]
    pub fn get<T: Component>(&self, index: EntityIndex) -> Option<&T> {
        self.store::<T>()?.get(index)
    }

    /// Returns `index`'s `T` mutably, if present.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, index: EntityIndex) -> Option<&mut T> {
        self.store_mut::<T>()?.get_mut(index)
    }

    /// Detach and return `index`'s `T`, if present.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision.
    pub fn take<T: Component>(&mut self, index: EntityIndex) -> Option<T> {
        self.store_mut::<T>()?.remove(index)
    }

    /// Visits every stored `T` in dense order. Does nothing if `T` was never
    /// written.
    ///
    /// # Panics
    ///
    /// Panics on a type-id collision.
    pub fn for_each_mut<T: Component>(&mut self, visit: impl FnMut(&mut T)) {
        if let Some(store) = self.store_mut::<T>() {
            store.for_each_mut(visit);
        }
    }

    /// Drops `T`'s store entirely. Returns `true` if it existed.
    pub fn remove_store<T: Component>(&mut self) -> bool {
        let removed = self.stores.remove(&T::component_type_id()).is_some();
        if removed {
            debug!(component = T::type_name(), "removed component store");
        }
        removed
    }

    // -- Type-erased access --

    /// Returns `true` if `index` has a component of `type_id`.
    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId, index: EntityIndex) -> bool {
        self.stores
            .get(&type_id)
            .is_some_and(|store| store.contains(index))
    }

    /// Removes `index`'s component of `type_id`. Returns `true` if one was
    /// removed.
    pub fn remove(&mut self, type_id: ComponentTypeId, index: EntityIndex) -> bool {
        self.stores
            .get_mut(&type_id)
            .is_some_and(|store| store.remove_entity(index))
    }

    /// Empties the store of `type_id`, keeping the store itself.
    pub fn clear(&mut self, type_id: ComponentTypeId) {
        if let Some(store) = self.stores.get_mut(&type_id) {
            store.clear();
        }
    }

    /// Returns the number of components of `type_id`.
    #[must_use]
    pub fn len(&self, type_id: ComponentTypeId) -> usize {
        self.stores.get(&type_id).map_or(0, |store| store.len())
    }

    /// Returns `true` if a store exists for `type_id`.
    #[must_use]
    pub fn has_store(&self, type_id: ComponentTypeId) -> bool {
        self.stores.contains_key(&type_id)
    }

    /// Returns the number of distinct component types ever written (minus
    /// removed stores).
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Removes every component owned by `index` across all stores.
    ///
    /// Cost is linear in the number of registered stores, not in the number
    /// of components the entity actually has. Returns how many were removed.
    pub fn remove_all(&mut self, index: EntityIndex) -> usize {
        self.stores
            .values_mut()
            .map(|store| usize::from(store.remove_entity(index)))
            .sum()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (type_id, store) in &self.stores {
            map.entry(
                &format_args!("{} ({type_id})", store.component_name()),
                &store.len(),
            );
        }
        map.finish()
    }
}

fn mismatch<T: Component>(type_id: ComponentTypeId, found: &'static str) -> ComponentError {
    ComponentError::TypeMismatch {
        type_id,
        expected: T::type_name(),
        found,
    }
}

/// Turns a type-id collision into a panic; the typed API treats it as a
/// programmer error.
fn enforce<R>(result: Result<R, ComponentError>) -> R {
    match result {
        Ok(value) => value,
        Err(err) => panic!("component registry contract violated: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position(i32, i32);

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity(i32, i32);

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Tag;

    impl Component for Tag {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    /// Deliberately reuses `Position`'s name.
    #[derive(Debug)]
    struct Impostor;

    impl Component for Impostor {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[test]
    fn test_stores_created_lazily() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(registry.store_count(), 0);
        assert!(registry.get::<Position>(0).is_none());
        assert_eq!(registry.store_count(), 0);

        registry.insert(0, Position(1, 2));
        assert_eq!(registry.store_count(), 1);
        assert!(registry.has_store(Position::component_type_id()));
    }

    #[test]
    fn test_typed_roundtrip_and_overwrite() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(registry.insert(3, Position(1, 1)), None);
        assert_eq!(registry.get::<Position>(3), Some(&Position(1, 1)));

        assert_eq!(registry.insert(3, Position(2, 2)), Some(Position(1, 1)));
        assert_eq!(registry.get::<Position>(3), Some(&Position(2, 2)));
        assert_eq!(registry.len(Position::component_type_id()), 1);
    }

    #[test]
    fn test_get_mut_and_take() {
        let mut registry = ComponentRegistry::new();
        registry.insert(1, Velocity(0, 0));
        if let Some(v) = registry.get_mut::<Velocity>(1) {
            v.0 = 5;
        }
        assert_eq!(registry.take::<Velocity>(1), Some(Velocity(5, 0)));
        assert_eq!(registry.take::<Velocity>(1), None);
    }

    #[test]
    fn test_erased_operations() {
        let mut registry = ComponentRegistry::new();
        let pos = Position::component_type_id();
        registry.insert(1, Position(0, 0));
        registry.insert(2, Position(0, 0));

        assert!(registry.contains(pos, 1));
        assert!(!registry.contains(Velocity::component_type_id(), 1));
        assert_eq!(registry.len(pos), 2);

        assert!(registry.remove(pos, 1));
        assert!(!registry.remove(pos, 1));
        assert!(!registry.contains(pos, 1));

        registry.clear(pos);
        assert_eq!(registry.len(pos), 0);
        assert!(registry.has_store(pos));
    }

    #[test]
    fn test_unknown_type_is_absent() {
        let mut registry = ComponentRegistry::new();
        let unknown = ComponentTypeId::from_name("Nothing");
        assert!(!registry.contains(unknown, 0));
        assert!(!registry.remove(unknown, 0));
        assert_eq!(registry.len(unknown), 0);
        registry.clear(unknown);
        assert!(registry.store::<Tag>().is_none());
    }

    #[test]
    fn test_remove_all_purges_every_store() {
        let mut registry = ComponentRegistry::new();
        registry.insert(4, Position(1, 1));
        registry.insert(4, Velocity(1, 1));
        registry.insert(4, Tag);
        registry.insert(5, Position(2, 2));

        assert_eq!(registry.remove_all(4), 3);
        assert!(!registry.contains(Position::component_type_id(), 4));
        assert!(!registry.contains(Velocity::component_type_id(), 4));
        assert!(!registry.contains(Tag::component_type_id(), 4));
        assert_eq!(registry.get::<Position>(5), Some(&Position(2, 2)));
        assert_eq!(registry.remove_all(4), 0);
    }

    #[test]
    fn test_for_each_mut() {
        let mut registry = ComponentRegistry::new();
        registry.insert(0, Velocity(1, 0));
        registry.insert(1, Velocity(2, 0));
        registry.for_each_mut::<Velocity>(|v| v.1 = v.0 * 10);
        assert_eq!(registry.get::<Velocity>(1), Some(&Velocity(2, 20)));

        // Never-written type is a no-op.
        registry.for_each_mut::<Tag>(|_| panic!("no tags exist"));
    }

    #[test]
    fn test_remove_store() {
        let mut registry = ComponentRegistry::new();
        registry.insert(0, Tag);
        assert!(registry.remove_store::<Tag>());
        assert!(!registry.remove_store::<Tag>());
        assert!(registry.get::<Tag>(0).is_none());
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let mut registry = ComponentRegistry::new();
        registry.insert(0, Position(0, 0));

        let err = registry.try_store::<Impostor>().unwrap_err();
        assert_eq!(
            err,
            ComponentError::TypeMismatch {
                type_id: Position::component_type_id(),
                expected: "Position",
                found: "Position",
            }
        );
        assert!(registry.try_insert(0, Impostor).is_err());
        // The original store is untouched.
        assert_eq!(registry.get::<Position>(0), Some(&Position(0, 0)));
    }

    #[test]
    #[should_panic(expected = "contract violated")]
    fn test_type_mismatch_panics_on_typed_access() {
        let mut registry = ComponentRegistry::new();
        registry.insert(0, Position(0, 0));
        let _ = registry.get::<Impostor>(0);
    }

    #[test]
    fn test_debug_lists_stores() {
        let mut registry = ComponentRegistry::new();
        registry.insert(0, Tag);
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("Tag"));
    }
}
