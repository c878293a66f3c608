/*!
 * Destructor Guards
 *
 * Scoped tokens that keep an object from being torn down while a callback
 * frame is running on it
 */

use super::traits::{Guard, GuardDrop, GuardRef, GuardTarget, Observable};
use super::{GuardError, GuardMetadata, GuardResult};
use crate::core::types::{LifecyclePhase, ObjectId};
use crate::monitoring::metrics;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

/// Destructor guard with automatic release
///
/// Acquired through [`GuardedLifecycle::destructor_guard`]. While any guard is
/// alive the object's guard count is nonzero: a delayed object postpones
/// teardown, an undelayed object must not be dropped at all.
///
/// The guard holds the object's shared state, never the object, so it is
/// safe for it to outlive the owner. Cloning acquires one more guard.
///
/// # Example
///
/// ```
/// use lifecycle_guard::{Destructible, GuardedLifecycle, UndelayedDestruction};
///
/// struct Conn;
/// impl Destructible for Conn {}
///
/// let conn = UndelayedDestruction::new(Conn);
/// {
///     let _guard = conn.guard();
///     assert_eq!(conn.guard_count(), 1);
/// }
/// assert_eq!(conn.guard_count(), 0);
/// ```
///
/// [`GuardedLifecycle::destructor_guard`]: super::GuardedLifecycle::destructor_guard
#[must_use = "a destructor guard is released as soon as it is dropped"]
pub struct DestructorGuard {
    target: Option<Rc<dyn GuardTarget>>,
    metadata: GuardMetadata,
}

impl DestructorGuard {
    pub(crate) fn acquire(target: Rc<dyn GuardTarget>) -> Self {
        let state = target.state();
        state.acquire();
        let metadata =
            GuardMetadata::new("destructor_guard").with_object(state.id(), state.type_name());

        let guard = Self {
            target: Some(target),
            metadata,
        };

        guard.emit_created();
        guard
    }

    /// Object this guard protects
    #[inline]
    pub fn object(&self) -> Option<ObjectId> {
        self.metadata.object
    }

    /// Phase of the protected object, `None` once released
    pub fn object_phase(&self) -> Option<LifecyclePhase> {
        self.target.as_ref().map(|t| t.state().phase())
    }

    /// Whether a destroy request is waiting on this guard (and its siblings)
    pub fn is_destroy_pending(&self) -> bool {
        self.target
            .as_ref()
            .map(|t| t.state().is_destroy_pending())
            .unwrap_or(false)
    }
}

impl Guard for DestructorGuard {
    fn resource_type(&self) -> &'static str {
        "destructor_guard"
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.target.is_some()
    }

    fn release(&mut self) -> GuardResult<()> {
        let target = self.target.take().ok_or(GuardError::AlreadyReleased)?;

        let remaining = target.state().release();
        self.emit_dropped();

        if remaining == 0 {
            target.guards_drained();
        }
        Ok(())
    }
}

impl GuardDrop for DestructorGuard {
    fn on_drop(&mut self) {
        if self.is_active() {
            if let Err(e) = self.release() {
                self.emit_error(&e);
            }
        }
    }
}

impl GuardRef for DestructorGuard {
    fn ref_count(&self) -> usize {
        self.target
            .as_ref()
            .map(|t| t.state().guard_count())
            .unwrap_or(0)
    }
}

impl Observable for DestructorGuard {
    fn emit_created(&self) {
        metrics().record_guard_acquired();
        trace!(
            object = ?self.metadata.object,
            type_name = ?self.metadata.object_type,
            guards = self.ref_count(),
            "Destructor guard acquired"
        );
    }

    fn emit_dropped(&self) {
        metrics().record_guard_released();
        trace!(
            object = ?self.metadata.object,
            type_name = ?self.metadata.object_type,
            held_micros = self.metadata.lifetime_micros(),
            "Destructor guard released"
        );
    }

    fn emit_error(&self, error: &GuardError) {
        warn!(
            object = ?self.metadata.object,
            type_name = ?self.metadata.object_type,
            error = %error,
            "Destructor guard error"
        );
    }
}

impl Clone for DestructorGuard {
    fn clone(&self) -> Self {
        match &self.target {
            Some(target) => Self::acquire(Rc::clone(target)),
            None => Self {
                target: None,
                metadata: self.metadata.clone(),
            },
        }
    }
}

impl fmt::Debug for DestructorGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestructorGuard")
            .field("object", &self.metadata.object)
            .field("type_name", &self.metadata.object_type)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for DestructorGuard {
    fn drop(&mut self) {
        self.on_drop();
    }
}
