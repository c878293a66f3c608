/*!
 * Undelayed Destruction
 *
 * Lets a guarded object live on the stack or inside another value. The
 * owner's scope exit is the destructor; deferral is not available, so the
 * owner must make sure no guard is held when that happens.
 */

use super::fatal::{check_protocol, fatal_fault, Fault};
use super::state::LifecycleState;
use super::traits::{Destructible, GuardedLifecycle};
use super::{DestructorGuard, GuardResult};
use crate::core::types::ObjectId;
use crate::monitoring::metrics;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tracing::debug;

/// Stack-compatible guarded object
///
/// Trades the automatic protection of [`DelayedDestruction::destroy`] for not
/// having to allocate. Dropping the wrapper while its guard count is nonzero
/// aborts the process: a callback frame still holds the object and nothing
/// after that point is safe.
///
/// Safe places to drop it are typically directly from the event loop, or
/// once the loop has stopped.
///
/// The wrapper cannot be duplicated:
///
/// ```compile_fail
/// use lifecycle_guard::{Destructible, UndelayedDestruction};
///
/// struct Conn;
/// impl Destructible for Conn {}
///
/// let conn = UndelayedDestruction::new(Conn);
/// let copy = conn.clone();
/// ```
///
/// ```compile_fail
/// use lifecycle_guard::{Destructible, UndelayedDestruction};
///
/// struct Conn;
/// impl Destructible for Conn {}
///
/// let conn = UndelayedDestruction::new(Conn);
/// let copy = conn;
/// let again = conn;
/// ```
///
/// Method-call `.clone()` auto-derefs: with `T: Clone` it compiles and returns
/// a plain, unmanaged `T`, not a second wrapper. The wrapper itself is never
/// cloneable:
///
/// ```compile_fail
/// use lifecycle_guard::{Destructible, UndelayedDestruction};
///
/// #[derive(Clone)]
/// struct Registration(u32);
/// impl Destructible for Registration {}
///
/// let reg = UndelayedDestruction::new(Registration(5));
/// let copy = UndelayedDestruction::clone(&reg);
/// ```
///
/// [`DelayedDestruction::destroy`]: super::DelayedDestruction::destroy
pub struct UndelayedDestruction<T: Destructible> {
    state: Rc<LifecycleState>,
    inner: T,
}

impl<T: Destructible> UndelayedDestruction<T> {
    pub fn new(inner: T) -> Self {
        let state = Rc::new(LifecycleState::for_type::<T>());
        debug!(
            object = %state.id(),
            type_name = state.type_name(),
            "Undelayed object created"
        );
        Self { state, inner }
    }

    /// Construct the wrapped value from `args`
    ///
    /// Accepts exactly the argument lists `T` can be built from. Unsupported
    /// ones are rejected at compile time.
    ///
    /// ```
    /// use lifecycle_guard::{Destructible, UndelayedDestruction};
    ///
    /// struct Timer { interval_ms: u64, repeat: bool }
    /// impl Destructible for Timer {}
    ///
    /// impl From<(u64, bool)> for Timer {
    ///     fn from((interval_ms, repeat): (u64, bool)) -> Self {
    ///         Self { interval_ms, repeat }
    ///     }
    /// }
    ///
    /// let timer = UndelayedDestruction::<Timer>::from_args((250, true));
    /// assert_eq!(timer.interval_ms, 250);
    /// assert!(timer.repeat);
    /// ```
    pub fn from_args<A>(args: A) -> Self
    where
        T: From<A>,
    {
        Self::new(T::from(args))
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.state.id()
    }

    /// Acquire a destructor guard
    ///
    /// Infallible: the object cannot be mid-teardown while borrowed.
    pub fn guard(&self) -> DestructorGuard {
        DestructorGuard::acquire(self.state.clone())
    }

    /// Run `f` on the wrapped value under a guard
    pub fn with_guard<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.guard();
        f(&mut self.inner)
    }

    /// Destroy-request hook
    ///
    /// Never defers. Runs the wrapped type's destroy behaviour, then finishes
    /// immediately through [`destroy_now`](Self::destroy_now).
    fn destroy(&mut self) {
        let outstanding = self.state.guard_count();
        check_protocol(outstanding == 0, || self.misuse("destroy"));

        self.inner.on_destroy();
        let request = self.state.request_destroy();
        self.destroy_now(request.is_deferred());
    }

    /// Destroy-now hook
    ///
    /// Nothing to free here: the rest of `Drop` is the teardown. Reaching it
    /// in deferred mode means the object was mixed into the request-then-defer
    /// protocol.
    fn destroy_now(&mut self, delayed: bool) {
        check_protocol(!delayed, || self.misuse("destroy_now"));
        self.state.finish_destroy(false);
    }

    fn misuse(&self, hook: &'static str) -> Fault {
        Fault::ProtocolMisuse {
            object: self.state.id(),
            type_name: self.state.type_name(),
            hook,
        }
    }
}

impl<T: Destructible> GuardedLifecycle for UndelayedDestruction<T> {
    fn lifecycle(&self) -> &LifecycleState {
        &self.state
    }

    fn destructor_guard(&self) -> GuardResult<DestructorGuard> {
        Ok(self.guard())
    }
}

impl<T: Destructible> Drop for UndelayedDestruction<T> {
    /// Public destructor
    ///
    /// Aborts if any guard is outstanding, before any teardown logic runs.
    /// Otherwise runs the destroy hook, then `T` drops as usual.
    fn drop(&mut self) {
        let outstanding = self.state.guard_count();
        if outstanding != 0 {
            fatal_fault(Fault::GuardViolation {
                object: self.state.id(),
                type_name: self.state.type_name(),
                outstanding,
            });
        }

        metrics().record_undelayed_drop();
        self.destroy();
    }
}

impl<T: Destructible + Default> Default for UndelayedDestruction<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Destructible> Deref for UndelayedDestruction<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Destructible> DerefMut for UndelayedDestruction<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Destructible + fmt::Debug> fmt::Debug for UndelayedDestruction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndelayedDestruction")
            .field("state", &*self.state)
            .field("inner", &self.inner)
            .finish()
    }
}
