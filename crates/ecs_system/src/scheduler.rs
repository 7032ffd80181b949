//! System scheduler: per-group ordering and the update pass.
//!
//! Systems are partitioned by [`SystemGroup`]. Each group caches a linear
//! execution order derived from priorities and declared dependencies, and a
//! dirty flag that is raised whenever its member set changes. The order is
//! recomputed lazily, at most once per dirty transition, before the next
//! update pass.
//!
//! The scheduler is not thread-safe; callers that need concurrent access must
//! synchronize externally.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::error::ScheduleError;
use crate::graph::topological_sort;
use crate::system::{System, SystemGroup, SystemPriority, SystemTypeId};

/// A registered system plus the scheduling data read from it at
/// registration.
struct SystemEntry<C> {
    id: SystemTypeId,
    rust_type: TypeId,
    name: &'static str,
    priority: SystemPriority,
    dependencies: Vec<&'static str>,
    /// Registration counter, the final tie-break.
    sequence: u64,
    active: bool,
    system: Box<dyn System<C>>,
}

/// Members of one group and their cached order.
struct GroupSlot<C> {
    entries: Vec<SystemEntry<C>>,
    /// Positions into `entries`, valid only while `dirty` is false.
    order: Vec<usize>,
    dirty: bool,
}

impl<C> GroupSlot<C> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            order: Vec::new(),
            dirty: false,
        }
    }
}

/// Owns every registered system and drives the per-frame update pass.
///
/// `C` is the context handed to each system hook. Systems are `'static`
/// trait objects, so the context type must be too.
pub struct SystemScheduler<C: 'static> {
    groups: [GroupSlot<C>; SystemGroup::COUNT],
    /// Which group each registered system lives in.
    index: HashMap<SystemTypeId, SystemGroup>,
    next_sequence: u64,
}

impl<C: 'static> SystemScheduler<C> {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: std::array::from_fn(|_| GroupSlot::new()),
            index: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Register `system`, call its `on_initialize` hook, and return a
    /// reference to the stored instance.
    ///
    /// Registering a type that is already present replaces the old instance,
    /// whose `on_cleanup` hook runs first. Ordering problems such as cycles
    /// are not detected here; they surface from [`SystemScheduler::resolve`]
    /// or [`SystemScheduler::update`].
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NameCollision`] if a different system type is
    /// already registered under `S::type_name()`.
    pub fn register<S: System<C>>(
        &mut self,
        system: S,
        ctx: &mut C,
    ) -> Result<&mut S, ScheduleError> {
        let name = S::type_name();
        let id = SystemTypeId::from_name(name);
        let rust_type = TypeId::of::<S>();

        if let Some(existing) = self.entry(id) {
            if existing.rust_type != rust_type {
                return Err(ScheduleError::NameCollision { name });
            }
            warn!(system = name, "system already registered, replacing");
            self.remove_by_id(id, ctx);
        }

        let group = system.group();
        let priority = system.priority();
        let entry = SystemEntry {
            id,
            rust_type,
            name,
            priority,
            dependencies: system.dependencies().to_vec(),
            sequence: self.next_sequence,
            active: true,
            system: Box::new(system),
        };
        self.next_sequence += 1;
        self.index.insert(id, group);

        let slot = &mut self.groups[group.index()];
        slot.entries.push(entry);
        slot.dirty = true;
        debug!(system = name, %group, priority, "registered system");

        let position = slot.entries.len() - 1;
        let entry = &mut slot.entries[position];
        entry.system.on_initialize(ctx);
        (*entry.system)
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(ScheduleError::NameCollision { name })
    }

    /// Remove system `S`, calling its `on_cleanup` hook. Returns `true` if it
    /// was registered.
    pub fn remove<S: System<C>>(&mut self, ctx: &mut C) -> bool {
        if !self.contains::<S>() {
            return false;
        }
        self.remove_by_id(SystemTypeId::of::<C, S>(), ctx)
    }

    /// Returns `true` if `S` is registered, active or not.
    #[must_use]
    pub fn contains<S: System<C>>(&self) -> bool {
        self.get::<S>().is_some()
    }

    /// Returns `true` if some system is registered under `name`.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(&SystemTypeId::from_name(name))
    }

    /// Returns the registered instance of `S`.
    #[must_use]
    pub fn get<S: System<C>>(&self) -> Option<&S> {
        let entry = self.entry(SystemTypeId::of::<C, S>())?;
        (*entry.system).as_any().downcast_ref::<S>()
    }

    /// Returns the registered instance of `S` mutably.
    #[must_use]
    pub fn get_mut<S: System<C>>(&mut self) -> Option<&mut S> {
        let entry = self.entry_mut(SystemTypeId::of::<C, S>())?;
        (*entry.system).as_any_mut().downcast_mut::<S>()
    }

    /// Enable or disable `S`. Inactive systems stay registered and keep their
    /// place in the order but are skipped by updates. Returns `false` if `S`
    /// is not registered.
    pub fn set_active<S: System<C>>(&mut self, active: bool) -> bool {
        if !self.contains::<S>() {
            return false;
        }
        match self.entry_mut(SystemTypeId::of::<C, S>()) {
            Some(entry) => {
                entry.active = active;
                debug!(system = entry.name, active, "changed system activity");
                true
            }
            None => false,
        }
    }

    /// Returns whether `S` is active, or `None` if it is not registered.
    #[must_use]
    pub fn is_active<S: System<C>>(&self) -> Option<bool> {
        if !self.contains::<S>() {
            return None;
        }
        self.entry(SystemTypeId::of::<C, S>()).map(|entry| entry.active)
    }

    /// Number of registered systems across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no systems are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `group`'s cached order is stale.
    #[must_use]
    pub fn is_dirty(&self, group: SystemGroup) -> bool {
        self.groups[group.index()].dirty
    }

    /// Recompute the order of every dirty group.
    ///
    /// A group that fails to sort stays dirty; groups that sorted before the
    /// failure keep their new order.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::UnresolvedDependency`] if a dependency name
    /// is not registered in the dependent's group, or
    /// [`ScheduleError::CycleDetected`] if a group's dependencies form a
    /// cycle.
    pub fn resolve(&mut self) -> Result<(), ScheduleError> {
        for group in SystemGroup::ALL {
            if !self.groups[group.index()].dirty {
                continue;
            }
            let order = self.sort_group(group)?;
            let slot = &mut self.groups[group.index()];
            slot.order = order;
            slot.dirty = false;
            debug!(%group, systems = slot.order.len(), "resolved group order");
        }
        Ok(())
    }

    /// Names of `group`'s systems in execution order, resolving first.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`SystemScheduler::resolve`].
    pub fn resolved_order(
        &mut self,
        group: SystemGroup,
    ) -> Result<Vec<&'static str>, ScheduleError> {
        self.resolve()?;
        let slot = &self.groups[group.index()];
        Ok(slot.order.iter().map(|&i| slot.entries[i].name).collect())
    }

    /// Run one update pass: resolve dirty groups, then call `on_update` on
    /// every active system, group by group in [`SystemGroup::ALL`] order.
    ///
    /// Nothing runs if any dirty group fails to sort.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`SystemScheduler::resolve`].
    pub fn update(&mut self, ctx: &mut C, dt: f32) -> Result<(), ScheduleError> {
        self.resolve()?;

        for group in SystemGroup::ALL {
            let slot = &mut self.groups[group.index()];
            for &position in &slot.order {
                let entry = &mut slot.entries[position];
                if !entry.active {
                    continue;
                }
                trace!(system = entry.name, %group, "running system");
                entry.system.on_update(ctx, dt);
            }
        }
        Ok(())
    }

    /// Remove every system, calling each `on_cleanup` hook in execution
    /// order where it is known and registration order otherwise.
    pub fn shutdown(&mut self, ctx: &mut C) {
        if self.is_empty() {
            return;
        }
        info!(systems = self.len(), "shutting down scheduler");

        for slot in &mut self.groups {
            let mut entries: Vec<Option<SystemEntry<C>>> =
                std::mem::take(&mut slot.entries).into_iter().map(Some).collect();
            let order = if slot.dirty {
                (0..entries.len()).collect()
            } else {
                std::mem::take(&mut slot.order)
            };
            for position in order {
                if let Some(mut entry) = entries[position].take() {
                    entry.system.on_cleanup(ctx);
                    debug!(system = entry.name, "cleaned up system");
                }
            }
            slot.order.clear();
            slot.dirty = false;
        }
        self.index.clear();
    }

    fn entry(&self, id: SystemTypeId) -> Option<&SystemEntry<C>> {
        let group = self.index.get(&id)?;
        self.groups[group.index()]
            .entries
            .iter()
            .find(|entry| entry.id == id)
    }

    fn entry_mut(&mut self, id: SystemTypeId) -> Option<&mut SystemEntry<C>> {
        let group = self.index.get(&id)?;
        self.groups[group.index()]
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
    }

    fn remove_by_id(&mut self, id: SystemTypeId, ctx: &mut C) -> bool {
        let Some(group) = self.index.remove(&id) else {
            return false;
        };
        let slot = &mut self.groups[group.index()];
        let Some(position) = slot.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };

        let mut entry = slot.entries.remove(position);
        slot.dirty = true;
        entry.system.on_cleanup(ctx);
        debug!(system = entry.name, %group, "removed system");
        true
    }

    fn sort_group(&self, group: SystemGroup) -> Result<Vec<usize>, ScheduleError> {
        let entries = &self.groups[group.index()].entries;
        let positions: HashMap<&str, usize> = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.name, position))
            .collect();

        let mut edges = Vec::new();
        for (after, entry) in entries.iter().enumerate() {
            for &dependency in &entry.dependencies {
                match positions.get(dependency) {
                    Some(&before) => edges.push((before, after)),
                    None => {
                        return Err(ScheduleError::UnresolvedDependency {
                            system: entry.name,
                            dependency,
                            group,
                            found_in: self
                                .index
                                .get(&SystemTypeId::from_name(dependency))
                                .copied(),
                        });
                    }
                }
            }
        }

        let keys: Vec<(SystemPriority, u64)> = entries
            .iter()
            .map(|entry| (entry.priority, entry.sequence))
            .collect();

        topological_sort(&keys, edges).map_err(|cycle| ScheduleError::CycleDetected {
            group,
            systems: cycle.unsorted.into_iter().map(|i| entries[i].name).collect(),
        })
    }
}

impl<C: 'static> Default for SystemScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> fmt::Debug for SystemScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for group in SystemGroup::ALL {
            let slot = &self.groups[group.index()];
            let names: Vec<&str> = slot.entries.iter().map(|entry| entry.name).collect();
            map.entry(&group, &names);
        }
        map.finish()
    }
}
