//! # ecs_world
//!
//! The facade over the entity, component, and system layers.
//!
//! - [`World`] validates entity handles before every component access and
//!   purges an entity's components when it is destroyed.
//! - [`Coordinator`] owns a [`World`], a [`SystemScheduler`] over it, and a
//!   fixed-timestep tick loop configured by [`WorldConfig`].
//!
//! Everything is single-threaded. A `World` or `Coordinator` shared between
//! threads must be wrapped in external synchronization.
//!
//! [`SystemScheduler`]: ecs_system::SystemScheduler

pub mod config;
pub mod coordinator;
pub mod error;
pub mod world;

pub use config::WorldConfig;
pub use coordinator::Coordinator;
pub use error::EcsError;
pub use world::World;
