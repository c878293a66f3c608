/*!
 * Lifecycle Demo - Main Entry Point
 *
 * Runs one guarded-destruction scenario per invocation:
 * - stack: undelayed object destroyed with no guard held
 * - guard-held: undelayed object destroyed under a guard (aborts)
 * - guard-released: guard acquired and released before destruction
 * - deferred: delayed object destroyed from inside its own callback
 * - metrics: prints the lifecycle counters as JSON
 */

use std::error::Error as StdError;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use lifecycle_guard::{
    init_tracing, metrics, DelayedDestruction, Destructible, GuardedLifecycle,
    UndelayedDestruction,
};

/// Stand-in for an event-loop registered socket
#[derive(Debug, Default)]
struct Socket {
    fd: i32,
    readable: bool,
}

impl From<(i32, bool)> for Socket {
    fn from((fd, readable): (i32, bool)) -> Self {
        Self { fd, readable }
    }
}

impl Destructible for Socket {
    fn on_destroy(&mut self) {
        println!("teardown:socket fd={}", self.fd);
    }

    fn on_destroy_now(&mut self, delayed: bool) {
        println!("destroy_now:socket fd={} delayed={}", self.fd, delayed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Stack,
    GuardHeld,
    GuardReleased,
    Deferred,
    Metrics,
}

#[derive(Error, Debug)]
#[error(
    "unknown scenario '{0}' (expected stack, guard-held, guard-released, deferred or metrics)"
)]
struct UnknownScenario(String);

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stack" => Ok(Self::Stack),
            "guard-held" => Ok(Self::GuardHeld),
            "guard-released" => Ok(Self::GuardReleased),
            "deferred" => Ok(Self::Deferred),
            "metrics" => Ok(Self::Metrics),
            other => Err(UnknownScenario(other.to_string())),
        }
    }
}

fn run_stack() {
    let socket = UndelayedDestruction::<Socket>::default();
    println!("active:{} phase={}", socket.id(), socket.phase());
    drop(socket);
    println!("destroyed");
}

fn run_guard_held() {
    let socket = UndelayedDestruction::<Socket>::from_args((7, true));
    let guard = socket.guard();
    println!("guard-held:{} guards={}", socket.id(), socket.guard_count());

    // Aborts here: the guard outlives the object
    drop(socket);
    drop(guard);
    println!("destroyed");
}

fn run_guard_released() {
    let socket = UndelayedDestruction::<Socket>::from_args((8, false));
    let guard = socket.guard();
    println!("guard-held:{} guards={}", socket.id(), socket.guard_count());
    drop(guard);
    println!("guard-released:{} guards={}", socket.id(), socket.guard_count());
    drop(socket);
    println!("destroyed");
}

fn run_deferred() -> Result<(), Box<dyn StdError>> {
    let socket = DelayedDestruction::<Socket>::from_args((9, true));
    let handle = socket.clone();

    socket.dispatch(|sock| {
        if sock.readable {
            // Peer hung up: close from inside the callback
            handle.destroy();
            println!("destroy-requested pending={}", handle.is_destroy_pending());
        }
    })?;

    println!("destroyed={}", socket.is_destroyed());
    Ok(())
}

fn run_metrics() -> Result<(), Box<dyn StdError>> {
    run_stack();
    run_guard_released();
    run_deferred()?;

    let snapshot = metrics().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn StdError>> {
    // Initialize structured tracing
    init_tracing();

    let scenario: Scenario = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "stack".to_string())
        .parse()?;

    info!(scenario = ?scenario, "Lifecycle demo starting");

    match scenario {
        Scenario::Stack => run_stack(),
        Scenario::GuardHeld => run_guard_held(),
        Scenario::GuardReleased => run_guard_released(),
        Scenario::Deferred => run_deferred()?,
        Scenario::Metrics => run_metrics()?,
    }

    info!(scenario = ?scenario, "Lifecycle demo finished");
    Ok(())
}
