/*!
 * Undelayed Destruction Tests
 */

use lifecycle_guard::{
    metrics, run_guarded, Destructible, Guard, GuardError, GuardedLifecycle, LifecyclePhase,
    UndelayedDestruction,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
struct Timer {
    interval_ms: u64,
    repeat: bool,
    log: Log,
}

impl Destructible for Timer {
    fn on_destroy(&mut self) {
        self.log.borrow_mut().push(format!("cancel({})", self.interval_ms));
    }

    fn on_destroy_now(&mut self, delayed: bool) {
        self.log.borrow_mut().push(format!("destroy_now({delayed})"));
    }
}

impl From<(u64, bool, Log)> for Timer {
    fn from((interval_ms, repeat, log): (u64, bool, Log)) -> Self {
        Self {
            interval_ms,
            repeat,
            log,
        }
    }
}

impl From<Log> for Timer {
    fn from(log: Log) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }
}

#[test]
fn test_default_constructed_object_is_destroyed_cleanly() {
    let timer = UndelayedDestruction::<Timer>::default();
    let log = timer.log.clone();

    assert_eq!(timer.phase(), LifecyclePhase::Active);
    assert_eq!(timer.guard_count(), 0);
    drop(timer);

    assert_eq!(*log.borrow(), vec!["cancel(0)".to_string()]);
}

#[test]
fn test_destroy_now_is_never_reached() {
    let log = Log::default();
    {
        let _timer = UndelayedDestruction::<Timer>::from_args((100, true, log.clone()));
    }

    assert!(log.borrow().iter().all(|entry| !entry.starts_with("destroy_now")));
}

#[test]
fn test_guard_acquired_and_released_before_drop() {
    let log = Log::default();
    let timer = UndelayedDestruction::<Timer>::from_args(log.clone());

    {
        let guard = timer.guard();
        assert_eq!(timer.guard_count(), 1);
        assert_eq!(guard.object(), Some(timer.id()));
        assert_eq!(guard.object_phase(), Some(LifecyclePhase::Active));
    }
    assert_eq!(timer.guard_count(), 0);

    drop(timer);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_guard_outlives_object_state_after_drop() {
    let timer = UndelayedDestruction::<Timer>::default();
    let id = timer.id();
    let mut guard = timer.guard();
    guard.release().unwrap();

    drop(timer);

    // A released guard no longer refers to anything
    assert_eq!(guard.object(), Some(id));
    assert_eq!(guard.object_phase(), None);
    assert_eq!(guard.release(), Err(GuardError::AlreadyReleased));
}

#[test]
fn test_forwarded_arguments_reach_inner_value() {
    let log = Log::default();
    let timer = UndelayedDestruction::<Timer>::from_args((250, true, log.clone()));

    assert_eq!(timer.interval_ms, 250);
    assert!(timer.repeat);
    drop(timer);
    assert_eq!(*log.borrow(), vec!["cancel(250)".to_string()]);
}

#[test]
fn test_deref_mut_reaches_inner_value() {
    let mut timer = UndelayedDestruction::<Timer>::default();
    timer.interval_ms = 30;

    let doubled = timer.with_guard(|t| {
        t.interval_ms *= 2;
        t.interval_ms
    });

    assert_eq!(doubled, 60);
    assert_eq!(timer.interval_ms, 60);
    assert_eq!(timer.guard_count(), 0);
}

#[test]
fn test_embedded_in_owning_struct() {
    struct Session {
        idle: UndelayedDestruction<Timer>,
        keepalive: UndelayedDestruction<Timer>,
    }

    let log = Log::default();
    let session = Session {
        idle: UndelayedDestruction::from_args((10, false, log.clone())),
        keepalive: UndelayedDestruction::from_args((20, true, log.clone())),
    };
    assert_ne!(session.idle.id(), session.keepalive.id());

    drop(session);

    // Fields drop in declaration order
    assert_eq!(
        *log.borrow(),
        vec!["cancel(10)".to_string(), "cancel(20)".to_string()]
    );
}

#[test]
fn test_run_guarded_over_undelayed_object() {
    let timer = UndelayedDestruction::<Timer>::default();

    let inside = run_guarded(&timer, || timer.guard_count()).unwrap();

    assert_eq!(inside, 1);
    assert_eq!(timer.guard_count(), 0);
}

#[test]
fn test_undelayed_teardown_is_counted() {
    struct CountedTimer;
    impl Destructible for CountedTimer {}

    let name = std::any::type_name::<CountedTimer>();
    let before = metrics().teardowns_of(name);

    drop(UndelayedDestruction::new(CountedTimer));
    drop(UndelayedDestruction::new(CountedTimer));

    assert_eq!(metrics().teardowns_of(name), before + 2);
}
