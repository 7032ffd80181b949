//! Scheduling error types.

use crate::system::SystemGroup;

/// Errors raised while registering or ordering systems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The dependencies within a group form a cycle.
    #[error("dependency cycle in group {group} among systems {systems:?}")]
    CycleDetected {
        /// The group that could not be ordered.
        group: SystemGroup,
        /// Systems left unordered: the cycle members and anything downstream.
        systems: Vec<&'static str>,
    },

    /// A system depends on a name that is not registered in its own group.
    #[error(
        "system `{system}` in group {group} depends on `{dependency}`, {}",
        describe_missing(.found_in)
    )]
    UnresolvedDependency {
        /// The dependent system.
        system: &'static str,
        /// The missing dependency name.
        dependency: &'static str,
        /// The dependent system's group.
        group: SystemGroup,
        /// The group the dependency is registered in, if any.
        found_in: Option<SystemGroup>,
    },

    /// Two different system types share one name.
    #[error("system name `{name}` is already used by another system type")]
    NameCollision {
        /// The contested name.
        name: &'static str,
    },
}

fn describe_missing(found_in: &Option<SystemGroup>) -> String {
    match found_in {
        Some(group) => format!("which is registered in group {group}"),
        None => "which is not registered".to_string(),
    }
}
