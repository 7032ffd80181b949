//! World-level error type.

use ecs_component::{ComponentError, EntityError};
use ecs_system::ScheduleError;

/// Errors surfaced by the [`World`](crate::World) and
/// [`Coordinator`](crate::Coordinator) facades.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// Entity allocation failed.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// A component type-id collision.
    #[error(transparent)]
    Component(#[from] ComponentError),

    /// System ordering or registration failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
