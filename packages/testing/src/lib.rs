#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples of the deferred package.

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::mpsc;
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::Duration;

use futures::executor::{LocalPool, LocalSpawner};

/// Runs a test on a separate thread and fails it if it does not finish in time.
///
/// A deferred instance whose initializer never completes leaves its observers pending forever,
/// so tests that await deferred instances are wrapped in this to turn a hang into a failure.
///
/// The timeout is 10 seconds, or 60 seconds under Miri.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test runs directly on the calling thread, so the mutation testing tool can detect
/// mutations that cause hangs by itself.
///
/// # Panics
///
/// Panics if the test exceeds the timeout. A panic inside the test is propagated as-is.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let timeout = watchdog_timeout();
    let (tx, rx) = mpsc::channel();

    let worker = thread::spawn(move || {
        // If the receiver is gone, the watchdog already gave up on us.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            worker.join().expect("test thread finished without panicking");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {timeout:?}");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match worker.join() {
            Ok(()) => panic!("test thread exited without reporting a result"),
            Err(payload) => std::panic::resume_unwind(payload),
        },
    }
}

fn watchdog_timeout() -> Duration {
    // Miri is dramatically slower for thread synchronization.
    if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    }
}

/// Creates a single-threaded executor, hands its spawner to `entrypoint` and drives the future
/// it returns to completion.
///
/// Tasks spawned onto the executor run whenever the entrypoint future is pending. Tasks that are
/// still incomplete when the entrypoint future completes are dropped together with the executor.
///
/// # Example
///
/// ```rust
/// use futures::task::LocalSpawnExt;
///
/// let value = testing::run_local(async |spawner| {
///     spawner.spawn_local_with_handle(async { 5 }).unwrap().await
/// });
///
/// assert_eq!(value, 5);
/// ```
pub fn run_local<F, R>(entrypoint: F) -> R
where
    F: AsyncFnOnce(LocalSpawner) -> R,
{
    let mut pool = LocalPool::new();
    let future = entrypoint(pool.spawner());

    pool.run_until(future)
}

/// Returns a future that is pending on its first poll and ready on the second.
///
/// Awaiting it gives every other task on the same executor a chance to run.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now()`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// A single-threaded signal that tests open by hand.
///
/// Every future obtained from [`Gate::opened()`] stays pending until some clone of the gate is
/// opened, which lets a test decide exactly when an initializer may proceed.
#[derive(Clone, Debug, Default)]
pub struct Gate {
    inner: Rc<RefCell<GateInner>>,
}

#[derive(Debug, Default)]
struct GateInner {
    open: bool,
    waiters: Vec<Waker>,
}

impl Gate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate, releasing everything waiting on it. Opening twice has no further effect.
    pub fn open(&self) {
        let waiters = {
            let mut inner = self.inner.borrow_mut();
            inner.open = true;
            std::mem::take(&mut inner.waiters)
        };

        for waker in waiters {
            waker.wake();
        }
    }

    /// Whether the gate has been opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.borrow().open
    }

    /// Returns a future that completes once the gate is open.
    pub fn opened(&self) -> GateOpened {
        GateOpened { gate: self.clone() }
    }
}

/// Future returned by [`Gate::opened()`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct GateOpened {
    gate: Gate,
}

impl Future for GateOpened {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut inner = self.gate.inner.borrow_mut();

        if inner.open {
            return Poll::Ready(());
        }

        if !inner.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            inner.waiters.push(cx.waker().clone());
        }

        Poll::Pending
    }
}
