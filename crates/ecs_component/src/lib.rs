//! # ecs_component
//!
//! The "E" and "C" in ECS: entity identity, component storage, and the
//! registry that ties component types to their stores.
//!
//! This crate provides:
//!
//! - [`Entity`]: packed 16-bit index / 16-bit generation handles.
//! - [`EntityRegistry`]: issues, validates, and recycles entity handles.
//! - [`Component`] and [`ComponentTypeId`]: name-derived type keys.
//! - [`ComponentStore`]: sparse-set storage for one component type.
//! - [`ComponentRegistry`]: one lazily created store per component type.
//!
//! Nothing here is internally synchronised; every mutation takes `&mut self`.

pub mod component;
pub mod entity;
pub mod error;
pub mod registry;
pub mod storage;

pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityIndex, EntityRegistry, Generation, MAX_ENTITIES};
pub use error::{ComponentError, EntityError};
pub use registry::ComponentRegistry;
pub use storage::{ComponentStore, ErasedStore};
