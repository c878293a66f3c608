/*!
 * Fatal Faults
 *
 * Contract violations of the guarded lifecycle. None of these is an error a
 * caller can handle: a guard violation aborts the process, a protocol misuse
 * fails an assertion.
 */

use crate::core::types::ObjectId;
use thiserror::Error;
use tracing::error;

/// Broken lifecycle invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Destruction started while callback frames still held guards
    #[error(
        "{object} ({type_name}) destroyed with {outstanding} outstanding destructor guard(s)"
    )]
    GuardViolation {
        object: ObjectId,
        type_name: &'static str,
        outstanding: usize,
    },

    /// An undelayed object reached a destroy hook in deferred mode
    #[error("{object} ({type_name}) reached `{hook}` in deferred mode")]
    ProtocolMisuse {
        object: ObjectId,
        type_name: &'static str,
        hook: &'static str,
    },
}

/// Terminate the process on a broken invariant
///
/// Never unwinds: no further destructor logic runs on the object, and
/// nothing after this call executes.
#[cold]
#[inline(never)]
pub fn fatal_fault(fault: Fault) -> ! {
    error!(fault = %fault, "Fatal lifecycle fault, aborting");
    // Also on stderr, a subscriber may not be installed
    eprintln!("fatal lifecycle fault: {fault}");
    std::process::abort()
}

/// Whether protocol-misuse checks are compiled in
#[inline(always)]
pub const fn protocol_checks_enabled() -> bool {
    cfg!(any(debug_assertions, feature = "release-checks"))
}

/// Assertion for the deferred-mode hooks
///
/// Compiled out unless debug assertions or the `release-checks` feature are
/// on, in which case the caller must still uphold the invariant.
#[inline]
#[track_caller]
pub(crate) fn check_protocol<F>(holds: bool, fault: F)
where
    F: FnOnce() -> Fault,
{
    if protocol_checks_enabled() && !holds {
        let fault = fault();
        error!(fault = %fault, "Lifecycle protocol misuse");
        panic!("lifecycle protocol misuse: {fault}");
    }
}
