/*!
 * Core Module
 * Lifecycle types, guards and error handling
 */

pub mod errors;
pub mod guard;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use guard::{
    run_guarded, DelayedDestruction, Destructible, DestroyRequest, DestructorGuard, Fault, Guard,
    GuardDrop, GuardMetadata, GuardRef, GuardedLifecycle, LifecycleState, Observable,
    UndelayedDestruction,
};
pub use types::*;
