//! The coordinator: one world, its systems, and the tick loop.
//!
//! Each tick:
//!
//! 1. Advance the tick counter.
//! 2. Re-sort any system group whose membership changed.
//! 3. Run every active system, group by group in fixed phase order.
//!
//! [`Coordinator::run`] repeats this at a fixed rate, sleeping out the rest
//! of each tick's time budget.

use std::time::Instant;

use ecs_component::{Component, Entity};
use ecs_system::{System, SystemScheduler};
use tracing::{debug, info, warn};

use crate::config::WorldConfig;
use crate::error::EcsError;
use crate::world::World;

/// Owns a [`World`] and the [`SystemScheduler`] that runs over it.
///
/// Dropping the coordinator runs every remaining system's `on_cleanup`.
#[derive(Debug)]
pub struct Coordinator {
    /// Current tick counter.
    tick_id: u64,
    config: WorldConfig,
    world: World,
    scheduler: SystemScheduler<World>,
}

impl Coordinator {
    /// Create a coordinator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(WorldConfig::default())
    }

    /// Create a coordinator from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Config`] if `config` is out of range.
    pub fn with_config(config: WorldConfig) -> Result<Self, EcsError> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: WorldConfig) -> Self {
        Self {
            tick_id: 0,
            world: World::with_config(&config),
            config,
            scheduler: SystemScheduler::new(),
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns a reference to the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &SystemScheduler<World> {
        &self.scheduler
    }

    /// Returns a mutable reference to the scheduler.
    pub fn scheduler_mut(&mut self) -> &mut SystemScheduler<World> {
        &mut self.scheduler
    }

    // -- Entities and components --

    /// See [`World::create_entity`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Entity`] when the entity limit is reached.
    pub fn create_entity(&mut self) -> Result<Entity, EcsError> {
        self.world.create_entity()
    }

    /// See [`World::destroy_entity`].
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.world.destroy_entity(entity)
    }

    /// See [`World::is_alive`].
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.is_alive(entity)
    }

    /// See [`World::add_component`].
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        self.world.add_component(entity, value)
    }

    /// See [`World::get_component`].
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.world.get_component(entity)
    }

    /// See [`World::get_component_mut`].
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.world.get_component_mut(entity)
    }

    /// See [`World::has_component`].
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.has_component::<T>(entity)
    }

    /// See [`World::remove_component`].
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.world.remove_component(entity)
    }

    // -- Systems --

    /// Register `system` against this coordinator's world. See
    /// [`SystemScheduler::register`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Schedule`] on a system name collision.
    pub fn register_system<S: System<World>>(&mut self, system: S) -> Result<&mut S, EcsError> {
        Ok(self.scheduler.register(system, &mut self.world)?)
    }

    /// Returns `true` if `S` is registered, active or not.
    #[must_use]
    pub fn has_system<S: System<World>>(&self) -> bool {
        self.scheduler.contains::<S>()
    }

    /// Remove `S`, calling its `on_cleanup` hook. Returns `true` if it was
    /// registered.
    pub fn remove_system<S: System<World>>(&mut self) -> bool {
        self.scheduler.remove::<S>(&mut self.world)
    }

    /// Run one update pass without advancing the tick counter.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Schedule`] if a system group cannot be ordered; no
    /// system runs in that case.
    pub fn update(&mut self, dt: f32) -> Result<(), EcsError> {
        Ok(self.scheduler.update(&mut self.world, dt)?)
    }

    /// Advance the tick counter and run one update pass.
    ///
    /// # Errors
    ///
    /// As [`Coordinator::update`].
    pub fn tick(&mut self, dt: f32) -> Result<(), EcsError> {
        self.tick_id += 1;
        debug!(
            tick_id = self.tick_id,
            dt,
            entities = self.world.entity_count(),
            "tick start"
        );
        self.update(dt)
    }

    /// Run the tick loop for the configured number of ticks, or until a tick
    /// fails.
    ///
    /// Blocks the calling thread. With `max_ticks == 0` it only returns on
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Config`] if the tick period is unrepresentable,
    /// otherwise the first error from [`Coordinator::tick`].
    pub fn run(&mut self) -> Result<(), EcsError> {
        let tick_duration = self.config.tick_period()?;
        let dt = tick_duration.as_secs_f32();
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(dt)?;

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.scheduler.shutdown(&mut self.world);
    }
}

#[cfg(test)]
mod tests {
    use ecs_system::SystemGroup;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Counter(u32);

    impl Component for Counter {
        fn type_name() -> &'static str {
            "Counter"
        }
    }

    /// Increments every `Counter` once per tick.
    struct CountUp;

    impl System<World> for CountUp {
        fn type_name() -> &'static str {
            "count_up"
        }

        fn on_update(&mut self, world: &mut World, _dt: f32) {
            world.for_each_component_mut::<Counter>(|_, counter| counter.0 += 1);
        }
    }

    /// Spawns one entity on initialization and destroys it on cleanup.
    #[derive(Default)]
    struct Spawner {
        spawned: Option<Entity>,
    }

    impl System<World> for Spawner {
        fn type_name() -> &'static str {
            "spawner"
        }

        fn group(&self) -> SystemGroup {
            SystemGroup::PreUpdate
        }

        fn on_initialize(&mut self, world: &mut World) {
            if let Ok(entity) = world.create_entity() {
                world.add_component(entity, Counter(100));
                self.spawned = Some(entity);
            }
        }

        fn on_update(&mut self, _world: &mut World, _dt: f32) {}

        fn on_cleanup(&mut self, world: &mut World) {
            if let Some(entity) = self.spawned.take() {
                world.destroy_entity(entity);
            }
        }
    }

    /// Depends on itself, so its group can never be ordered.
    struct SelfLoop;

    impl System<World> for SelfLoop {
        fn type_name() -> &'static str {
            "self_loop"
        }

        fn dependencies(&self) -> &[&'static str] {
            &["self_loop"]
        }

        fn on_update(&mut self, _world: &mut World, _dt: f32) {}
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut coordinator = Coordinator::new();
        assert_eq!(coordinator.tick_id(), 0);
        coordinator.tick(1.0 / 60.0).unwrap();
        assert_eq!(coordinator.tick_id(), 1);
        coordinator.tick(1.0 / 60.0).unwrap();
        assert_eq!(coordinator.tick_id(), 2);
    }

    #[test]
    fn test_update_does_not_advance_counter() {
        let mut coordinator = Coordinator::new();
        coordinator.update(0.0).unwrap();
        assert_eq!(coordinator.tick_id(), 0);
    }

    #[test]
    fn test_systems_mutate_components() {
        let mut coordinator = Coordinator::new();
        let e = coordinator.create_entity().unwrap();
        coordinator.add_component(e, Counter(0));
        coordinator.register_system(CountUp).unwrap();

        for _ in 0..3 {
            coordinator.tick(0.0).unwrap();
        }
        assert_eq!(coordinator.get_component::<Counter>(e), Some(&Counter(3)));
    }

    #[test]
    fn test_register_runs_initialize_against_world() {
        let mut coordinator = Coordinator::new();
        let spawner = coordinator.register_system(Spawner::default()).unwrap();
        let spawned = spawner.spawned.unwrap();

        assert!(coordinator.is_alive(spawned));
        assert!(coordinator.has_system::<Spawner>());

        assert!(coordinator.remove_system::<Spawner>());
        assert!(!coordinator.is_alive(spawned));
        assert!(!coordinator.has_system::<Spawner>());
    }

    #[test]
    fn test_cycle_fails_update() {
        let mut coordinator = Coordinator::new();
        let e = coordinator.create_entity().unwrap();
        coordinator.add_component(e, Counter(0));
        coordinator.register_system(CountUp).unwrap();
        coordinator.register_system(SelfLoop).unwrap();

        let err = coordinator.tick(0.0).unwrap_err();
        assert!(matches!(err, EcsError::Schedule(_)));
        assert_eq!(coordinator.get_component::<Counter>(e), Some(&Counter(0)));
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = WorldConfig::default()
            .with_tick_rate(1000.0)
            .with_max_ticks(5);
        let mut coordinator = Coordinator::with_config(config).unwrap();
        coordinator.run().unwrap();
        assert_eq!(coordinator.tick_id(), 5);
    }

    #[test]
    fn test_run_stops_on_error() {
        let config = WorldConfig::default()
            .with_tick_rate(1000.0)
            .with_max_ticks(5);
        let mut coordinator = Coordinator::with_config(config).unwrap();
        coordinator.register_system(SelfLoop).unwrap();
        assert!(coordinator.run().is_err());
        assert_eq!(coordinator.tick_id(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = WorldConfig::default().with_tick_rate(0.0);
        assert!(matches!(
            Coordinator::with_config(config),
            Err(EcsError::Config(_))
        ));
    }

    #[test]
    fn test_tick_rate_with_unrepresentable_period_is_rejected() {
        let config = WorldConfig::from_json_str(r#"{ "max_ticks": 1 }"#)
            .unwrap()
            .with_tick_rate(1e-30);
        assert!(matches!(
            Coordinator::with_config(config),
            Err(EcsError::Config(_))
        ));
    }

    #[test]
    fn test_component_facade() {
        let mut coordinator = Coordinator::new();
        let e = coordinator.create_entity().unwrap();
        assert!(coordinator.add_component(e, Counter(1)));
        assert!(coordinator.has_component::<Counter>(e));
        if let Some(counter) = coordinator.get_component_mut::<Counter>(e) {
            counter.0 = 7;
        }
        assert_eq!(coordinator.remove_component::<Counter>(e), Some(Counter(7)));
        assert!(coordinator.destroy_entity(e));
        assert!(!coordinator.add_component(e, Counter(1)));
    }
}
