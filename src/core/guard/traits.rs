/*!
 * Guard Traits
 *
 * Core abstractions for destructor guards and the objects they protect
 */

use super::{DestructorGuard, GuardError, GuardMetadata, GuardResult, LifecycleState};
use crate::core::types::LifecyclePhase;

/// Core guard trait
///
/// All guards must implement this to provide:
/// - Resource type identification
/// - Metadata access
/// - Manual release capability
pub trait Guard {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Get guard metadata
    fn metadata(&self) -> &GuardMetadata;

    /// Check if guard is still active
    fn is_active(&self) -> bool;

    /// Manually release the resource
    ///
    /// Returns `Err` if already released
    fn release(&mut self) -> GuardResult<()>;
}

/// Guards that can be dropped with custom cleanup
///
/// Separates Drop logic for better testability and observability
pub trait GuardDrop: Guard {
    /// Perform cleanup on drop
    ///
    /// # Panics
    ///
    /// Should NOT panic. Log errors instead.
    fn on_drop(&mut self);
}

/// Guards that can be cloned, each clone counting as one more holder
pub trait GuardRef: Guard + Clone {
    /// Get current reference count
    fn ref_count(&self) -> usize;

    /// Check if this is the last reference
    fn is_last_ref(&self) -> bool {
        self.ref_count() == 1
    }
}

/// Guards with observable lifecycle
///
/// Emits tracing events and metrics for creation and cleanup
pub trait Observable: Guard {
    /// Emit creation event
    fn emit_created(&self);

    /// Emit cleanup event
    fn emit_dropped(&self);

    /// Emit error event
    fn emit_error(&self, error: &GuardError);
}

/// Destroy hooks of a type managed by a guarded lifecycle
///
/// Both hooks have empty defaults, so `impl Destructible for Foo {}` is enough
/// for a type whose `Drop` already releases everything.
pub trait Destructible {
    /// Custom destroy behaviour: close handles, cancel registrations.
    ///
    /// Runs exactly once, when teardown actually proceeds.
    fn on_destroy(&mut self) {}

    /// Final step of the deferred-destruction path, after [`on_destroy`].
    ///
    /// `delayed` is true when teardown was postponed until the last guard was
    /// released. The undelayed wrapper never calls this: the owner's scope
    /// exit is its teardown.
    ///
    /// [`on_destroy`]: Destructible::on_destroy
    fn on_destroy_now(&mut self, delayed: bool) {
        let _ = delayed;
    }
}

/// Capability shared by delayed and undelayed objects
///
/// Callback machinery is written against this trait so it can guard either
/// variant.
pub trait GuardedLifecycle {
    /// Base lifecycle state (guard count, pending flag, phase)
    fn lifecycle(&self) -> &LifecycleState;

    /// Acquire a scoped destructor guard
    fn destructor_guard(&self) -> GuardResult<DestructorGuard>;

    /// Number of guards currently held
    #[inline]
    fn guard_count(&self) -> usize {
        self.lifecycle().guard_count()
    }

    #[inline]
    fn phase(&self) -> LifecyclePhase {
        self.lifecycle().phase()
    }
}

/// Run `f` while holding a destructor guard on `object`
///
/// The guard is released on every exit path of `f`, unwinding included.
pub fn run_guarded<L, F, R>(object: &L, f: F) -> GuardResult<R>
where
    L: GuardedLifecycle + ?Sized,
    F: FnOnce() -> R,
{
    let _guard = object.destructor_guard()?;
    Ok(f())
}

/// Whatever a destructor guard points at
///
/// The token only ever touches the shared state, and asks the target to
/// finish a pending teardown once the count drains to zero.
pub(crate) trait GuardTarget {
    fn state(&self) -> &LifecycleState;

    /// Called after the last outstanding guard has been released
    fn guards_drained(&self);
}
