/*!
 * Lifecycle State
 *
 * Guard counter and deferred-destroy flag shared by an object and its guards
 */

use super::traits::GuardTarget;
use crate::core::types::{LifecyclePhase, ObjectId};
use crate::monitoring::metrics;
use std::cell::Cell;
use std::fmt;
use tracing::debug;

/// Outcome of a destroy request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyRequest {
    /// No guards were held, teardown may run now
    Immediate,
    /// Guards are outstanding, teardown waits for the last release
    Deferred,
}

impl DestroyRequest {
    #[inline]
    pub fn is_deferred(self) -> bool {
        matches!(self, DestroyRequest::Deferred)
    }
}

/// Base state of a guarded object
///
/// Single-threaded by construction: the counter is a `Cell` and the state is
/// shared through `Rc`, so neither the state nor anything holding it can
/// cross threads.
///
/// Only guard tokens move the count. Owners read it.
pub struct LifecycleState {
    id: ObjectId,
    type_name: &'static str,
    guards: Cell<usize>,
    destroy_pending: Cell<bool>,
    phase: Cell<LifecyclePhase>,
}

impl LifecycleState {
    pub(crate) fn new(type_name: &'static str) -> Self {
        metrics().record_created();
        Self {
            id: ObjectId::next(),
            type_name,
            guards: Cell::new(0),
            destroy_pending: Cell::new(false),
            phase: Cell::new(LifecyclePhase::Active),
        }
    }

    pub(crate) fn for_type<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Name of the wrapped type
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of destructor guards currently held
    #[inline]
    pub fn guard_count(&self) -> usize {
        self.guards.get()
    }

    #[inline]
    pub fn is_destroy_pending(&self) -> bool {
        self.destroy_pending.get()
    }

    #[inline]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase.get()
    }

    /// Increment the guard count, returning the new count
    pub(crate) fn acquire(&self) -> usize {
        let count = self.guards.get() + 1;
        self.guards.set(count);
        count
    }

    /// Decrement the guard count, returning what is left
    pub(crate) fn release(&self) -> usize {
        let count = self.guards.get();
        debug_assert!(count > 0, "guard released on {} with no guards held", self.id);
        let count = count.saturating_sub(1);
        self.guards.set(count);
        count
    }

    /// Request destruction
    ///
    /// With guards held this only marks the object; whoever releases the last
    /// guard finishes the job.
    pub(crate) fn request_destroy(&self) -> DestroyRequest {
        metrics().record_destroy_requested();

        let guards = self.guards.get();
        if guards > 0 {
            self.destroy_pending.set(true);
            self.phase.set(LifecyclePhase::DestroyPending);
            metrics().record_destroy_deferred();
            debug!(
                object = %self.id,
                type_name = self.type_name,
                guards,
                "Destroy deferred until guards are released"
            );
            DestroyRequest::Deferred
        } else {
            self.phase.set(LifecyclePhase::Destroying);
            DestroyRequest::Immediate
        }
    }

    /// Consume a pending destroy request, entering `Destroying`
    pub(crate) fn take_pending(&self) -> bool {
        if self.destroy_pending.replace(false) {
            self.phase.set(LifecyclePhase::Destroying);
            true
        } else {
            false
        }
    }

    /// Mark teardown as started without going through a request
    pub(crate) fn begin_teardown(&self) {
        self.destroy_pending.set(false);
        self.phase.set(LifecyclePhase::Destroying);
    }

    /// Mark teardown as complete
    pub(crate) fn finish_destroy(&self, delayed: bool) {
        self.destroy_pending.set(false);
        self.phase.set(LifecyclePhase::Destroyed);
        metrics().record_teardown(self.type_name, delayed);
        debug!(
            object = %self.id,
            type_name = self.type_name,
            delayed,
            "Teardown complete"
        );
    }
}

impl fmt::Debug for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleState")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("guards", &self.guards.get())
            .field("destroy_pending", &self.destroy_pending.get())
            .field("phase", &self.phase.get())
            .finish()
    }
}

/// Guards on an undelayed object point straight at its state
impl GuardTarget for LifecycleState {
    fn state(&self) -> &LifecycleState {
        self
    }

    fn guards_drained(&self) {
        // Undelayed objects only request destruction from `Drop`, after the
        // count was checked to be zero, so nothing is ever pending here.
        debug_assert!(
            !self.is_destroy_pending(),
            "deferred destroy pending on undelayed object {}",
            self.id
        );
    }
}
