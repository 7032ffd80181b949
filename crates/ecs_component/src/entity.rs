//! Entity handles and the generational entity registry.
//!
//! An [`Entity`] is a lightweight `u32` handle with no inherent data. It packs
//! a 16-bit slot index (upper half) and a 16-bit generation (lower half).
//! Handles are only ever minted by an [`EntityRegistry`]; destroying an entity
//! bumps the generation stored for its slot, so every copy of the old handle
//! stops validating while the slot itself can be reissued.

use std::fmt;

use tracing::debug;

use crate::error::EntityError;

/// Slot index portion of an [`Entity`].
pub type EntityIndex = u16;

/// Generation portion of an [`Entity`].
pub type Generation = u16;

const INDEX_SHIFT: u32 = 16;
const GENERATION_MASK: u32 = 0xFFFF;

/// Generation carried by a slot the first time it is issued.
const FIRST_GENERATION: Generation = 1;

/// Number of slots addressable by the 16-bit index field.
pub const MAX_ENTITIES: u32 = 1 << 16;

/// A generational entity handle.
///
/// Entities are pure identifiers and carry no data of their own. Components
/// are attached to entities to give them meaning.
///
/// Two handles are equal iff their packed values are equal. A handle stays
/// valid until the entity is destroyed; after that, [`EntityRegistry::is_valid`]
/// reports `false` for it forever, even once the slot is reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// The null / invalid entity sentinel (index 0, generation 0).
    pub const INVALID: Entity = Entity(0);

    /// Packs an index and a generation. Only the registry mints handles.
    pub(crate) const fn from_parts(index: EntityIndex, generation: Generation) -> Self {
        Self(((index as u32) << INDEX_SHIFT) | generation as u32)
    }

    /// Returns the slot index. No validation is performed.
    #[must_use]
    pub const fn index(self) -> EntityIndex {
        (self.0 >> INDEX_SHIFT) as EntityIndex
    }

    /// Returns the generation. No validation is performed.
    #[must_use]
    pub const fn generation(self) -> Generation {
        (self.0 & GENERATION_MASK) as Generation
    }

    /// Returns the packed `u32` value.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for [`Entity::INVALID`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == Self::INVALID.0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

/// Bookkeeping for one index slot.
#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: Generation,
    alive: bool,
}

/// Issues, validates, and recycles entity handles.
///
/// Generations are bumped at destruction time: a fresh slot starts at
/// generation 1 and a destroyed slot is queued for reuse already carrying its
/// next generation. Generation arithmetic wraps, skipping 0 so the reserved
/// [`Entity::INVALID`] value is never issued; after 65,535 reuses of the same
/// slot an ancient handle can alias a new one.
///
/// Operations on stale handles are silent no-ops.
#[derive(Debug)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    /// Handles ready for reissue, most recently destroyed first.
    recycled: Vec<Entity>,
    max_entities: u32,
    live: usize,
}

impl EntityRegistry {
    /// Creates a registry that can address the full 16-bit index space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_entities(MAX_ENTITIES)
    }

    /// Creates a registry that refuses to grow past `max_entities` slots.
    ///
    /// Values above [`MAX_ENTITIES`] are clamped to it.
    #[must_use]
    pub fn with_max_entities(max_entities: u32) -> Self {
        Self {
            slots: Vec::new(),
            recycled: Vec::new(),
            max_entities: max_entities.min(MAX_ENTITIES),
            live: 0,
        }
    }

    /// Creates a new entity, reusing a destroyed slot when one is available.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::CapacityExhausted`] when every slot up to the
    /// configured limit is in use and none can be recycled.
    pub fn create_entity(&mut self) -> Result<Entity, EntityError> {
        if let Some(entity) = self.recycled.pop() {
            self.slots[usize::from(entity.index())].alive = true;
            self.live += 1;
            debug!(%entity, "reissued entity slot");
            return Ok(entity);
        }

        let next = self.slots.len();
        let index = match EntityIndex::try_from(next) {
            Ok(index) if (next as u64) < u64::from(self.max_entities) => index,
            _ => {
                return Err(EntityError::CapacityExhausted {
                    limit: self.max_entities,
                });
            }
        };

        self.slots.push(Slot {
            generation: FIRST_GENERATION,
            alive: true,
        });
        self.live += 1;

        let entity = Entity::from_parts(index, FIRST_GENERATION);
        debug!(%entity, "created entity");
        Ok(entity)
    }

    /// Destroys an entity and queues its slot for reuse.
    ///
    /// Returns `false` (and does nothing) if the handle is already stale.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_valid(entity) {
            return false;
        }

        let index = entity.index();
        let slot = &mut self.slots[usize::from(index)];
        slot.generation = next_generation(slot.generation);
        slot.alive = false;
        self.recycled.push(Entity::from_parts(index, slot.generation));
        self.live -= 1;

        debug!(%entity, "destroyed entity");
        true
    }

    /// Returns `true` iff `entity` refers to a live slot with a matching
    /// generation.
    #[must_use]
    pub fn is_valid(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        self.slots
            .get(usize::from(entity.index()))
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Returns the live handle currently occupying `index`, if any.
    #[must_use]
    pub fn entity_at(&self, index: EntityIndex) -> Option<Entity> {
        self.slots
            .get(usize::from(index))
            .filter(|slot| slot.alive)
            .map(|slot| Entity::from_parts(index, slot.generation))
    }

    /// Iterates every live entity in index order.
    ///
    /// The scan walks the whole slot table, so it is meant for diagnostics and
    /// bulk operations rather than per-frame work.
    pub fn iter_live(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .zip(0..=EntityIndex::MAX)
            .filter(|(slot, _)| slot.alive)
            .map(|(slot, index)| Entity::from_parts(index, slot.generation))
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Returns the number of slots ever allocated, live or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot limit this registry enforces.
    #[must_use]
    pub fn max_entities(&self) -> u32 {
        self.max_entities
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn next_generation(generation: Generation) -> Generation {
    match generation.wrapping_add(1) {
        0 => FIRST_GENERATION,
        next => next,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn test_entity_packing() {
        let e = Entity::from_parts(0x1234, 0x00ff);
        assert_eq!(e.index(), 0x1234);
        assert_eq!(e.generation(), 0x00ff);
        assert_eq!(e.to_raw(), 0x1234_00ff);
    }

    #[test]
    fn test_entity_invalid() {
        assert!(Entity::INVALID.is_null());
        assert_eq!(Entity::INVALID.to_raw(), 0);
        assert_eq!(Entity::default(), Entity::INVALID);
        assert!(!EntityRegistry::new().is_valid(Entity::INVALID));
    }

    #[test]
    fn test_fresh_slots_start_at_generation_one() {
        let mut registry = EntityRegistry::new();
        let e0 = registry.create_entity().unwrap();
        let e1 = registry.create_entity().unwrap();
        assert_eq!((e0.index(), e0.generation()), (0, 1));
        assert_eq!((e1.index(), e1.generation()), (1, 1));
        assert!(!e0.is_null());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_destroy_invalidates_and_recycles() {
        let mut registry = EntityRegistry::new();
        let e = registry.create_entity().unwrap();
        assert!(registry.destroy_entity(e));
        assert!(!registry.is_valid(e));

        let reissued = registry.create_entity().unwrap();
        assert_eq!(reissued.index(), e.index());
        assert_eq!(reissued.generation(), e.generation() + 1);
        assert_ne!(reissued, e);
        assert!(registry.is_valid(reissued));
        assert!(!registry.is_valid(e));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut registry = EntityRegistry::new();
        let e = registry.create_entity().unwrap();
        assert!(registry.destroy_entity(e));
        assert!(!registry.destroy_entity(e));
        assert_eq!(registry.live_count(), 0);

        // Only one reissue is queued for the slot.
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        assert_ne!(a.index(), b.index());
    }

    #[test]
    fn test_recycled_but_unissued_slot_is_not_valid() {
        let mut registry = EntityRegistry::new();
        let e = registry.create_entity().unwrap();
        registry.destroy_entity(e);
        let pending = Entity::from_parts(e.index(), e.generation() + 1);
        assert!(!registry.is_valid(pending));
        assert_eq!(registry.entity_at(e.index()), None);
        assert_eq!(registry.iter_live().count(), 0);
    }

    #[test]
    fn test_recycle_pool_is_lifo() {
        let mut registry = EntityRegistry::new();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        registry.destroy_entity(a);
        registry.destroy_entity(b);
        assert_eq!(registry.create_entity().unwrap().index(), b.index());
        assert_eq!(registry.create_entity().unwrap().index(), a.index());
    }

    #[test]
    fn test_iter_live_skips_destroyed() {
        let mut registry = EntityRegistry::new();
        let handles: Vec<_> = (0..5).map(|_| registry.create_entity().unwrap()).collect();
        registry.destroy_entity(handles[1]);
        registry.destroy_entity(handles[3]);

        let live: Vec<_> = registry.iter_live().collect();
        assert_eq!(live, vec![handles[0], handles[2], handles[4]]);
        // Restartable.
        assert_eq!(registry.iter_live().count(), 3);
    }

    #[test]
    fn test_entity_at_returns_current_handle() {
        let mut registry = EntityRegistry::new();
        let e = registry.create_entity().unwrap();
        assert_eq!(registry.entity_at(e.index()), Some(e));
        assert_eq!(registry.entity_at(42), None);
    }

    #[test]
    fn test_capacity_limit_is_enforced() {
        let mut registry = EntityRegistry::with_max_entities(2);
        let a = registry.create_entity().unwrap();
        registry.create_entity().unwrap();
        assert!(matches!(
            registry.create_entity(),
            Err(EntityError::CapacityExhausted { limit: 2 })
        ));

        // Freeing a slot makes room again.
        registry.destroy_entity(a);
        assert!(registry.create_entity().is_ok());
    }

    #[test]
    fn test_full_index_space_fails_explicitly() {
        let mut registry = EntityRegistry::new();
        for _ in 0..MAX_ENTITIES {
            registry.create_entity().unwrap();
        }
        assert_eq!(registry.slot_count(), MAX_ENTITIES as usize);
        assert!(matches!(
            registry.create_entity(),
            Err(EntityError::CapacityExhausted { limit: MAX_ENTITIES })
        ));
    }

    #[test]
    fn test_max_entities_is_clamped() {
        let registry = EntityRegistry::with_max_entities(u32::MAX);
        assert_eq!(registry.max_entities(), MAX_ENTITIES);
    }

    #[test]
    fn test_generation_wraps_and_skips_zero() {
        assert_eq!(next_generation(1), 2);
        assert_eq!(next_generation(Generation::MAX), FIRST_GENERATION);

        let mut registry = EntityRegistry::new();
        let mut e = registry.create_entity().unwrap();
        for _ in 0..u32::from(Generation::MAX) {
            registry.destroy_entity(e);
            e = registry.create_entity().unwrap();
            assert_ne!(e.generation(), 0);
        }
        // 65,535 reuses bring slot 0 back to its first generation.
        assert_eq!(e.generation(), FIRST_GENERATION);
        assert!(!e.is_null());
    }

    #[test]
    fn test_random_create_destroy_never_revalidates_stale_handles() {
        let mut registry = EntityRegistry::new();
        let mut live: Vec<Entity> = Vec::new();
        let mut dead: HashSet<Entity> = HashSet::new();
        let mut rng = StdRng::seed_from_u64(0x2545_f491_4f6c_dd1d);

        for _ in 0..5_000 {
            if rng.gen_range(0..3) == 0 && !live.is_empty() {
                let pick = rng.gen_range(0..live.len());
                let victim = live.swap_remove(pick);
                assert!(registry.destroy_entity(victim));
                dead.insert(victim);
            } else {
                let e = registry.create_entity().unwrap();
                assert!(!dead.contains(&e), "reissued a previously held handle");
                assert!(!live.contains(&e));
                live.push(e);
            }

            for stale in &dead {
                assert!(!registry.is_valid(*stale));
            }
        }

        assert_eq!(registry.live_count(), live.len());
        assert!(live.iter().all(|e| registry.is_valid(*e)));
    }
}
