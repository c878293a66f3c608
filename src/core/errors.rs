/*!
 * Error Types
 * Recoverable guard errors with thiserror and miette support
 *
 * Contract violations (destroying a guarded object, deferring an undelayed
 * one) are not errors. They are fatal faults, see `core::guard::fatal`.
 */

use crate::core::types::ObjectId;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors returned by guard and lifecycle operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum GuardError {
    #[error("Destructor guard already released")]
    #[diagnostic(
        code(guard::already_released),
        help("A guard releases exactly once, either explicitly or when dropped.")
    )]
    AlreadyReleased,

    #[error("Object {object} ({type_name}) is already destroyed")]
    #[diagnostic(
        code(guard::already_destroyed),
        help("Teardown has started. Stop scheduling callbacks against this object.")
    )]
    AlreadyDestroyed {
        object: ObjectId,
        type_name: &'static str,
    },

    #[error("Object {object} ({type_name}) is busy in another callback")]
    #[diagnostic(
        code(guard::busy),
        help("The value is already borrowed by an enclosing dispatch on this object.")
    )]
    Busy {
        object: ObjectId,
        type_name: &'static str,
    },
}
