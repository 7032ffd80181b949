//! The [`System`] trait, execution groups, and system identity.

use std::any::Any;
use std::fmt;

/// Scheduling priority. Lower values run earlier within a group.
pub type SystemPriority = i32;

/// Priority used when a system does not override [`System::priority`].
pub const DEFAULT_PRIORITY: SystemPriority = 0;

/// The fixed phases of one update pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemGroup {
    /// Input gathering, spawning, anything the main update depends on.
    PreUpdate,
    /// Main simulation.
    Update,
    /// Reactions to the main simulation.
    PostUpdate,
    /// Presentation.
    Render,
    /// End-of-frame teardown and despawning.
    Cleanup,
}

impl SystemGroup {
    /// Number of groups.
    pub const COUNT: usize = 5;

    /// Every group, in execution order.
    pub const ALL: [SystemGroup; Self::COUNT] = [
        SystemGroup::PreUpdate,
        SystemGroup::Update,
        SystemGroup::PostUpdate,
        SystemGroup::Render,
        SystemGroup::Cleanup,
    ];

    /// Position of this group in [`SystemGroup::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SystemGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemGroup::PreUpdate => "PreUpdate",
            SystemGroup::Update => "Update",
            SystemGroup::PostUpdate => "PostUpdate",
            SystemGroup::Render => "Render",
            SystemGroup::Cleanup => "Cleanup",
        };
        f.write_str(name)
    }
}

/// A stable identifier for a system type, derived from its name with
/// FNV-1a 64-bit.
///
/// This is the hash `ecs_component::ComponentTypeId` uses, so a system and a
/// component with the same name get the same numeric id. The two crates do
/// not depend on each other, hence the separate copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemTypeId(pub u64);

impl SystemTypeId {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the id for a system name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the id for system type `S`.
    #[must_use]
    pub fn of<C, S: System<C>>() -> Self {
        Self::from_name(S::type_name())
    }
}

/// Object-safe access to [`Any`] for any `'static` type, so boxed systems can
/// be downcast back to their concrete type.
pub trait AsAny: Any {
    /// Upcast to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Upcast to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A behavioral unit run once per update pass.
///
/// `C` is the context handed to every hook, typically the world the system
/// operates on. Group, priority, and dependencies are read once at
/// registration.
///
/// # Examples
///
/// ```rust
/// use ecs_system::{System, SystemGroup, SystemPriority};
///
/// struct Gravity;
///
/// impl System<Vec<f32>> for Gravity {
///     fn type_name() -> &'static str { "gravity" }
///     fn group(&self) -> SystemGroup { SystemGroup::Update }
///     fn priority(&self) -> SystemPriority { -10 }
///     fn on_update(&mut self, heights: &mut Vec<f32>, dt: f32) {
///         for h in heights.iter_mut() {
///             *h -= 9.81 * dt;
///         }
///     }
/// }
/// ```
pub trait System<C>: AsAny {
    /// The name other systems use to depend on this one. Must be unique among
    /// the systems registered with one scheduler.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// The phase this system runs in.
    fn group(&self) -> SystemGroup {
        SystemGroup::Update
    }

    /// Ordering hint within the group; lower runs earlier.
    fn priority(&self) -> SystemPriority {
        DEFAULT_PRIORITY
    }

    /// Names of systems in the same group that must run before this one.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Called once, right after registration.
    fn on_initialize(&mut self, _ctx: &mut C) {}

    /// Called once per update pass while the system is active.
    fn on_update(&mut self, ctx: &mut C, dt: f32);

    /// Called once when the system is removed or the scheduler shuts down.
    fn on_cleanup(&mut self, _ctx: &mut C) {}
}
