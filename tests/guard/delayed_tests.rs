/*!
 * Delayed Destruction Tests
 */

use lifecycle_guard::{
    metrics, run_guarded, DelayedDestruction, Destructible, GuardError, GuardedLifecycle,
    LifecyclePhase,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
struct Connection {
    peer: String,
    log: Log,
}

impl Connection {
    fn to(peer: &str, log: &Log) -> Self {
        Self {
            peer: peer.to_string(),
            log: log.clone(),
        }
    }
}

impl Destructible for Connection {
    fn on_destroy(&mut self) {
        self.log.borrow_mut().push(format!("close({})", self.peer));
    }

    fn on_destroy_now(&mut self, delayed: bool) {
        self.log.borrow_mut().push(format!("free(delayed={delayed})"));
    }
}

#[test]
fn test_destroy_inside_callback_is_deferred() {
    let log = Log::default();
    let conn = DelayedDestruction::new(Connection::to("10.0.0.1", &log));
    let handle = conn.clone();

    let pending_inside = conn
        .dispatch(|c| {
            c.log.borrow_mut().push("on_readable".into());
            handle.destroy();
            handle.is_destroy_pending()
        })
        .unwrap();

    assert!(pending_inside);
    assert!(conn.is_destroyed());
    assert_eq!(
        *log.borrow(),
        vec![
            "on_readable".to_string(),
            "close(10.0.0.1)".to_string(),
            "free(delayed=true)".to_string(),
        ]
    );
}

#[test]
fn test_destroy_outside_callback_is_immediate() {
    let log = Log::default();
    let conn = DelayedDestruction::new(Connection::to("peer", &log));

    conn.destroy();

    assert_eq!(conn.phase(), LifecyclePhase::Destroyed);
    assert_eq!(log.borrow().last().map(String::as_str), Some("free(delayed=false)"));
}

#[test]
fn test_guards_acquirable_while_destroy_pending() {
    let log = Log::default();
    let conn = DelayedDestruction::new(Connection::to("peer", &log));

    let first = conn.destructor_guard().unwrap();
    conn.destroy();
    assert_eq!(conn.phase(), LifecyclePhase::DestroyPending);

    let second = conn.destructor_guard().unwrap();
    assert_eq!(conn.guard_count(), 2);

    drop(first);
    assert!(log.borrow().is_empty());
    assert!(second.is_destroy_pending());

    drop(second);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_guard_refused_after_teardown() {
    let conn = DelayedDestruction::new(Connection::default());
    conn.destroy();

    let err = conn.destructor_guard().unwrap_err();
    assert!(matches!(err, GuardError::AlreadyDestroyed { object, .. } if object == conn.id()));

    let result = conn.with(|c| c.peer.clone());
    assert!(matches!(result, Err(GuardError::AlreadyDestroyed { .. })));
}

#[test]
fn test_teardown_runs_exactly_once() {
    let log = Log::default();
    let conn = DelayedDestruction::new(Connection::to("once", &log));
    let guard = conn.destructor_guard().unwrap();

    conn.destroy();
    conn.destroy();
    drop(guard);
    conn.destroy();
    drop(conn);

    assert_eq!(
        *log.borrow(),
        vec!["close(once)".to_string(), "free(delayed=true)".to_string()]
    );
}

#[test]
fn test_with_reads_value_under_guard() {
    let conn = DelayedDestruction::new(Connection::to("reader", &Log::default()));
    let other = conn.clone();

    let (peer, guards) = conn.with(|c| (c.peer.clone(), other.guard_count())).unwrap();

    assert_eq!(peer, "reader");
    assert_eq!(guards, 1);
    assert_eq!(conn.guard_count(), 0);
    conn.destroy();
}

#[test]
fn test_shared_reads_nest() {
    let conn = DelayedDestruction::new(Connection::to("nested", &Log::default()));
    let inner = conn.clone();

    let nested = conn
        .with(|outer| inner.with(|c| c.peer.len() + outer.peer.len()))
        .unwrap();

    assert_eq!(nested, Ok(12));
    conn.destroy();
}

#[test]
fn test_dropping_all_handles_without_destroy_still_tears_down() {
    struct Forgotten;
    impl Destructible for Forgotten {}

    let name = std::any::type_name::<Forgotten>();
    let before = metrics().teardowns_of(name);

    let object = DelayedDestruction::new(Forgotten);
    let clone = object.clone();
    assert!(object.ptr_eq(&clone));
    drop(object);
    assert_eq!(metrics().teardowns_of(name), before);
    drop(clone);

    assert_eq!(metrics().teardowns_of(name), before + 1);
}

#[test]
fn test_last_handle_dropped_while_guard_held() {
    let log = Log::default();
    let conn = DelayedDestruction::new(Connection::to("held", &log));
    let guard = conn.destructor_guard().unwrap();
    conn.destroy();

    // The guard keeps the object alive after the handle is gone
    drop(conn);
    assert!(log.borrow().is_empty());
    assert_eq!(guard.object_phase(), Some(LifecyclePhase::DestroyPending));

    drop(guard);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_run_guarded_defers_destroy_requested_inside() {
    let log = Log::default();
    let conn = DelayedDestruction::new(Connection::to("runner", &log));

    run_guarded(&conn, || {
        conn.destroy();
        assert_eq!(conn.phase(), LifecyclePhase::DestroyPending);
    })
    .unwrap();

    assert_eq!(log.borrow().last().map(String::as_str), Some("free(delayed=true)"));
}

#[test]
fn test_from_args_and_default() {
    let built = DelayedDestruction::<Connection>::from_args(Connection::to("x", &Log::default()));
    let defaulted = DelayedDestruction::<Connection>::default();

    assert_ne!(built.id(), defaulted.id());
    assert_eq!(built.phase(), defaulted.phase());
    built.destroy();
    defaulted.destroy();
}
