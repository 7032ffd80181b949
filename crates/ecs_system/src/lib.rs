//! # ecs_system
//!
//! Behavioral units and the scheduler that runs them.
//!
//! A [`System`] declares an execution [`SystemGroup`], a priority, and the
//! names of systems in the same group that must run before it. The
//! [`SystemScheduler`] resolves each group into a deterministic linear order
//! (dependencies first, then ascending priority, then registration order),
//! rejects cycles and unresolvable dependency names, and runs every active
//! system once per update pass in fixed group order.
//!
//! The scheduler is generic over the context `C` passed to system hooks, so it
//! has no dependency on any particular world type.

pub mod error;
pub mod graph;
pub mod scheduler;
pub mod system;

pub use error::ScheduleError;
pub use scheduler::SystemScheduler;
pub use system::{AsAny, DEFAULT_PRIORITY, System, SystemGroup, SystemPriority, SystemTypeId};
