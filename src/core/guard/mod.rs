/*!
 * Guarded Destruction
 *
 * Lifecycle safety for objects that an event loop calls back into.
 *
 * ## Design Principles
 *
 * 1. **Scoped Guards**: a callback frame holds a `DestructorGuard` for as
 *    long as it runs on an object; release happens on every exit path
 * 2. **Deferred Teardown**: a heap object destroyed while guarded is torn
 *    down when the last guard goes away
 * 3. **Fail Fast**: an object torn down directly while guarded aborts the
 *    process instead of leaving callbacks pointing at freed state
 * 4. **Composition**: both variants hold the same `LifecycleState` and drive
 *    the wrapped type through the `Destructible` hooks
 *
 * ## Capabilities
 *
 * - **DelayedDestruction**: heap-only, destroy is a request
 * - **UndelayedDestruction**: stack or embedded, `Drop` is the destructor and
 *   the caller guarantees no guard is held at that point
 *
 * ## Example
 *
 * ```rust
 * use lifecycle_guard::{DelayedDestruction, Destructible, GuardedLifecycle};
 *
 * struct Socket;
 * impl Destructible for Socket {}
 *
 * let socket = DelayedDestruction::new(Socket);
 * let handle = socket.clone();
 * socket
 *     .dispatch(|_socket| {
 *         // Inside a callback: the request is deferred
 *         handle.destroy();
 *         assert!(!handle.is_destroyed());
 *     })
 *     .unwrap();
 * // Callback returned, its guard went away, teardown ran
 * assert!(socket.is_destroyed());
 * ```
 */

mod delayed;
mod destructor;
pub mod fatal;
mod state;
mod traits;
mod undelayed;

pub use crate::core::errors::{GuardError, GuardResult};
pub use delayed::DelayedDestruction;
pub use destructor::DestructorGuard;
pub use fatal::{fatal_fault, protocol_checks_enabled, Fault};
pub use state::{DestroyRequest, LifecycleState};
pub use traits::{
    run_guarded, Destructible, Guard, GuardDrop, GuardRef, GuardedLifecycle, Observable,
};
pub use undelayed::UndelayedDestruction;

use crate::core::types::ObjectId;

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
    pub object: Option<ObjectId>,
    pub object_type: Option<&'static str>,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
            object: None,
            object_type: None,
        }
    }

    #[inline]
    pub fn with_object(mut self, object: ObjectId, object_type: &'static str) -> Self {
        self.object = Some(object);
        self.object_type = Some(object_type);
        self
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
