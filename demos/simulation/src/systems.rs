//! Systems for the particle simulation.
//!
//! Per tick: `spawn_particles` (PreUpdate) seeds the world once,
//! `accelerate` then `integrate_velocity` (Update) move everything,
//! `expire_lifetimes` (PostUpdate) destroys what ran out of time, and
//! `report_positions` (Render) logs a summary.

use std::f32::consts::TAU;

use ecs_component::Entity;
use ecs_system::{System, SystemGroup, SystemPriority};
use ecs_world::World;
use glam::Vec3;
use tracing::{debug, info, warn};

use crate::components::{Lifetime, Position, Velocity};

/// Spawns a ring of particles when registered.
#[derive(Debug)]
pub struct SpawnParticles {
    count: u32,
    speed: f32,
    spawned: u32,
}

impl SpawnParticles {
    /// Spawn `count` particles flying outward at `speed` units per second.
    #[must_use]
    pub fn new(count: u32, speed: f32) -> Self {
        Self {
            count,
            speed,
            spawned: 0,
        }
    }

    /// Number of particles actually created.
    #[must_use]
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    fn spawn_one(&self, world: &mut World, i: u32) -> Option<Entity> {
        let entity = match world.create_entity() {
            Ok(entity) => entity,
            Err(err) => {
                warn!(%err, spawned = i, "stopped spawning particles");
                return None;
            }
        };

        let angle = i as f32 / self.count as f32 * TAU;
        let direction = Vec3::new(angle.cos(), 1.0, angle.sin()).normalize();
        world.add_component(entity, Position::default());
        world.add_component(entity, Velocity { linear: direction * self.speed });
        // Stagger expiry so entities die over several ticks.
        world.add_component(entity, Lifetime::new(0.5 + (i % 4) as f32 * 0.25));
        Some(entity)
    }
}

impl System<World> for SpawnParticles {
    fn type_name() -> &'static str {
        "spawn_particles"
    }

    fn group(&self) -> SystemGroup {
        SystemGroup::PreUpdate
    }

    fn on_initialize(&mut self, world: &mut World) {
        for i in 0..self.count {
            if self.spawn_one(world, i).is_none() {
                break;
            }
            self.spawned += 1;
        }
        info!(count = self.spawned, "spawned particles");
    }

    fn on_update(&mut self, _world: &mut World, _dt: f32) {}
}

/// Applies a constant acceleration to every velocity.
#[derive(Debug)]
pub struct Accelerate {
    acceleration: Vec3,
}

impl Accelerate {
    /// Accelerate by `acceleration` units per second squared.
    #[must_use]
    pub fn new(acceleration: Vec3) -> Self {
        Self { acceleration }
    }
}

impl System<World> for Accelerate {
    fn type_name() -> &'static str {
        "accelerate"
    }

    fn priority(&self) -> SystemPriority {
        -10
    }

    fn on_update(&mut self, world: &mut World, dt: f32) {
        let delta = self.acceleration * dt;
        world.for_each_component_mut::<Velocity>(|_, velocity| velocity.linear += delta);
    }
}

/// Moves every entity that has both a position and a velocity.
#[derive(Debug, Default)]
pub struct IntegrateVelocity;

impl System<World> for IntegrateVelocity {
    fn type_name() -> &'static str {
        "integrate_velocity"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["accelerate"]
    }

    fn on_update(&mut self, world: &mut World, dt: f32) {
        let mut steps = Vec::with_capacity(world.component_count::<Velocity>());
        world.for_each_component::<Velocity>(|entity, velocity| {
            steps.push((entity, velocity.linear * dt));
        });
        for (entity, step) in steps {
            if let Some(position) = world.get_component_mut::<Position>(entity) {
                position.0 += step;
            }
        }
    }
}

/// Counts down lifetimes and destroys expired entities.
#[derive(Debug, Default)]
pub struct ExpireLifetimes {
    expired: usize,
}

impl ExpireLifetimes {
    /// Total entities destroyed so far.
    #[must_use]
    pub fn expired(&self) -> usize {
        self.expired
    }
}

impl System<World> for ExpireLifetimes {
    fn type_name() -> &'static str {
        "expire_lifetimes"
    }

    fn group(&self) -> SystemGroup {
        SystemGroup::PostUpdate
    }

    fn on_update(&mut self, world: &mut World, dt: f32) {
        let mut doomed = Vec::new();
        world.for_each_component_mut::<Lifetime>(|entity, lifetime| {
            lifetime.remaining -= dt;
            if lifetime.is_expired() {
                doomed.push(entity);
            }
        });
        for entity in doomed {
            if world.destroy_entity(entity) {
                debug!(%entity, "lifetime expired");
                self.expired += 1;
            }
        }
    }
}

/// Logs the live population and its centroid.
#[derive(Debug, Default)]
pub struct ReportPositions {
    frames: u64,
}

impl ReportPositions {
    /// Frames reported so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl System<World> for ReportPositions {
    fn type_name() -> &'static str {
        "report_positions"
    }

    fn group(&self) -> SystemGroup {
        SystemGroup::Render
    }

    fn on_update(&mut self, world: &mut World, _dt: f32) {
        self.frames += 1;
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        world.for_each_component::<Position>(|_, position| {
            sum += position.0;
            count += 1;
        });
        if count == 0 {
            return;
        }
        let centroid = sum / count as f32;
        info!(
            frame = self.frames,
            entities = count,
            x = centroid.x,
            y = centroid.y,
            z = centroid.z,
            "positions"
        );
    }

    fn on_cleanup(&mut self, world: &mut World) {
        info!(
            frames = self.frames,
            remaining = world.entity_count(),
            "report finished"
        );
    }
}
