//! Error types for entity allocation and component storage.

use crate::component::ComponentTypeId;

/// Errors raised by the [`EntityRegistry`](crate::EntityRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// Every index slot up to the limit is live and none can be recycled.
    #[error("entity index space exhausted ({limit} slots in use)")]
    CapacityExhausted {
        /// The slot limit that was hit.
        limit: u32,
    },
}

/// Errors raised by the [`ComponentRegistry`](crate::ComponentRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// The store registered under a type id holds a different Rust type than
    /// the one requested, usually because two component types share a name.
    #[error(
        "component type id {type_id} is registered for `{found}`, but `{expected}` was requested"
    )]
    TypeMismatch {
        /// The colliding type id.
        type_id: ComponentTypeId,
        /// Name of the requested component type.
        expected: &'static str,
        /// Name of the component type actually stored.
        found: &'static str,
    },
}
