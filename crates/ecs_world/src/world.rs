//! Entity and component state of one simulation.
//!
//! The [`World`] pairs an [`EntityRegistry`] with a [`ComponentRegistry`] and
//! validates every handle against the former before touching the latter, so
//! stale handles can never read or write a recycled slot's components.

use ecs_component::{Component, ComponentRegistry, Entity, EntityRegistry};
use tracing::debug;

use crate::config::WorldConfig;
use crate::error::EcsError;

/// Entities plus their components.
#[derive(Debug, Default)]
pub struct World {
    entities: EntityRegistry,
    components: ComponentRegistry,
}

impl World {
    /// Create an empty world with the full entity range.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: EntityRegistry::new(),
            components: ComponentRegistry::new(),
        }
    }

    /// Create an empty world sized by `config`.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        Self {
            entities: EntityRegistry::with_max_entities(config.max_entities),
            components: ComponentRegistry::new(),
        }
    }

    // -- Entities --

    /// Allocate a new entity with no components.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Entity`] when the entity limit is reached.
    pub fn create_entity(&mut self) -> Result<Entity, EcsError> {
        Ok(self.entities.create_entity()?)
    }

    /// Destroy `entity` and every component it owns. Returns `false` if the
    /// handle was already invalid.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.is_valid(entity) {
            return false;
        }
        let purged = self.components.remove_all(entity.index());
        debug!(%entity, purged, "purged components of destroyed entity");
        self.entities.destroy_entity(entity)
    }

    /// Returns `true` if `entity` refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_valid(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Iterates every live entity in index order.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_live()
    }

    // -- Components --

    /// Attach `value` to `entity`, overwriting any existing `T`.
    ///
    /// Returns `false` and drops `value` if the handle is stale.
    ///
    /// # Panics
    ///
    /// Panics if another component type shares `T`'s name.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        if !self.entities.is_valid(entity) {
            return false;
        }
        self.components.insert(entity.index(), value);
        true
    }

    /// Fallible counterpart of [`World::add_component`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Component`] on a component type-id collision.
    pub fn try_add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<bool, EcsError> {
        if !self.entities.is_valid(entity) {
            return Ok(false);
        }
        self.components.try_insert(entity.index(), value)?;
        Ok(true)
    }

    /// Returns `entity`'s `T`, or `None` if the handle is stale or the
    /// component is absent.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_valid(entity) {
            return None;
        }
        self.components.get(entity.index())
    }

    /// Mutable counterpart of [`World::get_component`].
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_valid(entity) {
            return None;
        }
        self.components.get_mut(entity.index())
    }

    /// Returns `true` if `entity` is live and has a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Detach and return `entity`'s `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_valid(entity) {
            return None;
        }
        self.components.take(entity.index())
    }

    /// Strip every component from `entity` without destroying it. Returns how
    /// many were removed.
    pub fn remove_all_components(&mut self, entity: Entity) -> usize {
        if !self.entities.is_valid(entity) {
            return 0;
        }
        self.components.remove_all(entity.index())
    }

    /// Visits every `T` with its owning entity, in storage order.
    pub fn for_each_component<T: Component>(&self, mut visit: impl FnMut(Entity, &T)) {
        let Some(store) = self.components.store::<T>() else {
            return;
        };
        for (index, value) in store.iter() {
            if let Some(entity) = self.entities.entity_at(index) {
                visit(entity, value);
            }
        }
    }

    /// Mutable counterpart of [`World::for_each_component`].
    pub fn for_each_component_mut<T: Component>(&mut self, mut visit: impl FnMut(Entity, &mut T)) {
        let Some(store) = self.components.store_mut::<T>() else {
            return;
        };
        for (index, value) in store.iter_mut() {
            if let Some(entity) = self.entities.entity_at(index) {
                visit(entity, value);
            }
        }
    }

    /// Number of entities that have a `T`.
    #[must_use]
    pub fn component_count<T: Component>(&self) -> usize {
        self.components.store::<T>().map_or(0, |store| store.len())
    }

    // -- Raw access --

    /// The entity registry.
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// The component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The component registry, mutably. Writes through it bypass handle
    /// validation.
    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }
}
