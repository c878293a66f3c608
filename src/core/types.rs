/*!
 * Core Types
 * Identifiers and lifecycle phases shared by every guarded object
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of a lifecycle-managed object
///
/// Used for diagnostics only. The object itself is still its own identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

impl ObjectId {
    /// Allocate the next identifier
    #[inline]
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Observable lifecycle phase of a guarded object
///
/// Construction lands directly in `Active`. A process that aborts on a guard
/// violation never gets to observe a phase past `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Guards may be acquired and released freely
    Active,
    /// Destroy was requested while guards were outstanding
    DestroyPending,
    /// Teardown is running
    Destroying,
    /// Terminal
    Destroyed,
}

impl LifecyclePhase {
    /// Whether teardown has started or finished
    #[inline]
    pub fn is_tearing_down(self) -> bool {
        matches!(self, LifecyclePhase::Destroying | LifecyclePhase::Destroyed)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Active => "active",
            LifecyclePhase::DestroyPending => "destroy_pending",
            LifecyclePhase::Destroying => "destroying",
            LifecyclePhase::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
