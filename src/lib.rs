/*!
 * Lifecycle Guard
 *
 * Destruction safety for objects an event loop calls back into: destructor
 * guards, deferred teardown for heap objects, and a stack-compatible wrapper
 * that aborts instead of tearing down under an active guard.
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::{
    run_guarded, DelayedDestruction, Destructible, DestroyRequest, DestructorGuard, Fault, Guard,
    GuardDrop, GuardError, GuardMetadata, GuardRef, GuardResult, GuardedLifecycle,
    LifecyclePhase, LifecycleState, ObjectId, Observable, UndelayedDestruction,
};
pub use monitoring::{init_tracing, metrics, LifecycleMetrics, MetricsSnapshot};
