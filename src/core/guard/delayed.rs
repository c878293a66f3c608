/*!
 * Delayed Destruction
 *
 * Heap-allocated objects whose destruction is a request: with guards
 * outstanding the request waits for the last guard to be released
 */

use super::state::{DestroyRequest, LifecycleState};
use super::traits::{Destructible, GuardTarget, GuardedLifecycle};
use super::{DestructorGuard, GuardError, GuardResult};
use crate::core::types::{LifecyclePhase, ObjectId};
use crate::monitoring::metrics;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace_span, warn};

/// Shared handle to a delayed-destruction object
///
/// Clones refer to the same object, the way an event loop keeps several
/// references to one connection. The object is torn down exactly once:
///
/// - on [`destroy`] when no guard is held (`on_destroy_now(false)`)
/// - when the last guard is released after [`destroy`] was requested
///   (`on_destroy_now(true)`)
/// - when the last handle is dropped without any request, as a fallback
///
/// Handles stay on the thread that created them:
///
/// ```compile_fail
/// use lifecycle_guard::{DelayedDestruction, Destructible};
///
/// struct Conn;
/// impl Destructible for Conn {}
///
/// let conn = DelayedDestruction::new(Conn);
/// std::thread::spawn(move || conn.destroy());
/// ```
///
/// [`destroy`]: DelayedDestruction::destroy
pub struct DelayedDestruction<T: Destructible + 'static> {
    cell: Rc<DelayedCell<T>>,
}

struct DelayedCell<T: Destructible> {
    state: LifecycleState,
    value: RefCell<Option<T>>,
}

impl<T: Destructible + 'static> DelayedDestruction<T> {
    /// Place a value under delayed destruction
    pub fn new(value: T) -> Self {
        let cell = Rc::new(DelayedCell {
            state: LifecycleState::for_type::<T>(),
            value: RefCell::new(Some(value)),
        });
        debug!(
            object = %cell.state.id(),
            type_name = cell.state.type_name(),
            "Delayed object created"
        );
        Self { cell }
    }

    /// Construct the value from `args` and place it under delayed destruction
    ///
    /// Any argument list `T` can be built from works, tuples included.
    pub fn from_args<A>(args: A) -> Self
    where
        T: From<A>,
    {
        Self::new(T::from(args))
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.cell.state.id()
    }

    /// Request destruction
    ///
    /// Tears the object down now if no guard is held, otherwise marks it and
    /// lets the last guard release finish the job. Requests after the first
    /// are ignored.
    pub fn destroy(&self) {
        let state = &self.cell.state;
        if state.phase() != LifecyclePhase::Active {
            debug!(
                object = %state.id(),
                phase = %state.phase(),
                "Destroy already requested"
            );
            return;
        }

        match state.request_destroy() {
            DestroyRequest::Immediate => self.cell.teardown(false),
            DestroyRequest::Deferred => {}
        }
    }

    #[inline]
    pub fn is_destroy_pending(&self) -> bool {
        self.cell.state.is_destroy_pending()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.cell.state.phase() == LifecyclePhase::Destroyed
    }

    /// Whether two handles refer to the same object
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Borrow the value under a guard
    pub fn with<F, R>(&self, f: F) -> GuardResult<R>
    where
        F: FnOnce(&T) -> R,
    {
        let _guard = self.destructor_guard()?;
        let slot = self.cell.value.try_borrow().map_err(|_| self.cell.busy())?;
        let value = slot.as_ref().ok_or_else(|| self.cell.destroyed())?;
        Ok(f(value))
    }

    /// Mutably borrow the value under a guard
    pub fn with_mut<F, R>(&self, f: F) -> GuardResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.destructor_guard()?;
        let mut slot = self
            .cell
            .value
            .try_borrow_mut()
            .map_err(|_| self.cell.busy())?;
        let value = slot.as_mut().ok_or_else(|| self.cell.destroyed())?;
        Ok(f(value))
    }

    /// Invoke a callback on the object the way an event loop does
    ///
    /// The callback runs under a guard and inside a `dispatch` span. If it
    /// requests destruction, teardown happens after it returns, once its
    /// guard and borrow are gone.
    pub fn dispatch<F, R>(&self, f: F) -> GuardResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _span = trace_span!(
            "dispatch",
            object = %self.id(),
            type_name = self.cell.state.type_name()
        )
        .entered();
        self.with_mut(f)
    }
}

impl<T: Destructible + 'static> GuardedLifecycle for DelayedDestruction<T> {
    fn lifecycle(&self) -> &LifecycleState {
        &self.cell.state
    }

    fn destructor_guard(&self) -> GuardResult<DestructorGuard> {
        if self.cell.state.phase().is_tearing_down() {
            return Err(self.cell.destroyed());
        }
        Ok(DestructorGuard::acquire(self.cell.clone()))
    }
}

impl<T: Destructible + 'static> Clone for DelayedDestruction<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: Destructible + Default + 'static> Default for DelayedDestruction<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Destructible + 'static> fmt::Debug for DelayedDestruction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedDestruction")
            .field("state", &self.cell.state)
            .finish()
    }
}

impl<T: Destructible> DelayedCell<T> {
    fn teardown(&self, delayed: bool) {
        // Every borrow of the value is taken under a guard and released
        // before it, so the slot is free whenever the guard count is zero.
        let value = self.value.borrow_mut().take();

        if let Some(mut value) = value {
            value.on_destroy();
            value.on_destroy_now(delayed);
            drop(value);
        }
        self.state.finish_destroy(delayed);
    }

    fn busy(&self) -> GuardError {
        GuardError::Busy {
            object: self.state.id(),
            type_name: self.state.type_name(),
        }
    }

    fn destroyed(&self) -> GuardError {
        GuardError::AlreadyDestroyed {
            object: self.state.id(),
            type_name: self.state.type_name(),
        }
    }
}

impl<T: Destructible> GuardTarget for DelayedCell<T> {
    fn state(&self) -> &LifecycleState {
        &self.state
    }

    fn guards_drained(&self) {
        if self.state.take_pending() {
            self.teardown(true);
        }
    }
}

impl<T: Destructible> Drop for DelayedCell<T> {
    fn drop(&mut self) {
        if self.state.phase() == LifecyclePhase::Destroyed {
            return;
        }

        // Fallback path: every handle went away without a destroy request
        warn!(
            object = %self.state.id(),
            type_name = self.state.type_name(),
            "Delayed object dropped without destroy() - tearing down now"
        );
        metrics().record_unmanaged_drop();
        self.state.begin_teardown();
        self.teardown(false);
    }
}
