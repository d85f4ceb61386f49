//! Initialization state machine of a deferred instance.
//!
//! The following phases exist:
//!
//! * not started - the instance has been constructed but the executor has not yet polled the
//!   driver task that runs the initializer.
//! * running - the driver has invoked the initializer and is awaiting it.
//! * succeeded - the initializer returned `Ok(())`.
//! * failed - the initializer returned `Err(e)`; the error is kept for every observer.
//! * abandoned - the driver was dropped before the initializer completed, which only happens
//!   when the executor shuts down (or rejects the spawn) while the instance is still pending.
//!
//! The only transitions are `not started -> running -> succeeded | failed` plus
//! `not started | running -> abandoned`. Terminal phases never change again.
//!
//! Everything here is single-threaded, so the phase lives in a `RefCell` and observers register
//! their wakers in a plain list that is drained when the phase becomes terminal.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::task::{Poll, Waker};

/// Snapshot of the initialization progress of a [`Deferred`][crate::Deferred].
///
/// This carries no payload; the outcome itself is only available by awaiting the instance.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Status {
    /// The initializer has been scheduled but the executor has not started it yet.
    NotStarted,

    /// The initializer is executing.
    Running,

    /// The initializer completed successfully.
    Succeeded,

    /// The initializer returned an error.
    Failed,

    /// The executor dropped the initializer before it completed.
    Abandoned,
}

impl Status {
    /// Whether the instance has reached a phase that will never change again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Abandoned)
    }
}

enum Phase<E> {
    NotStarted,
    Running,
    Succeeded,
    Failed(E),
    Abandoned,
}

impl<E> Phase<E> {
    fn status(&self) -> Status {
        match self {
            Self::NotStarted => Status::NotStarted,
            Self::Running => Status::Running,
            Self::Succeeded => Status::Succeeded,
            Self::Failed(_) => Status::Failed,
            Self::Abandoned => Status::Abandoned,
        }
    }
}

pub(crate) struct InitState<E> {
    phase: RefCell<Phase<E>>,

    // Wakers of observers that polled before the phase became terminal.
    waiters: RefCell<Vec<Waker>>,
}

impl<E> InitState<E> {
    pub(crate) fn new() -> Self {
        Self {
            phase: RefCell::new(Phase::NotStarted),
            waiters: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn status(&self) -> Status {
        self.phase.borrow().status()
    }

    /// Marks the initializer as started.
    ///
    /// # Panics
    ///
    /// Panics if the initializer has already been started. Only the driver task calls this,
    /// exactly once, so a second call means the instance was scheduled twice.
    pub(crate) fn begin(&self) {
        let mut phase = self.phase.borrow_mut();

        assert!(
            matches!(*phase, Phase::NotStarted),
            "initializer started twice for the same instance (current status: {:?})",
            phase.status()
        );

        *phase = Phase::Running;
    }

    /// Records the outcome returned by the initializer and wakes every observer.
    ///
    /// # Panics
    ///
    /// Panics if the initializer is not running.
    pub(crate) fn finish(&self, outcome: Result<(), E>) {
        {
            let mut phase = self.phase.borrow_mut();

            assert!(
                matches!(*phase, Phase::Running),
                "initializer finished while not running (current status: {:?})",
                phase.status()
            );

            *phase = match outcome {
                Ok(()) => Phase::Succeeded,
                Err(error) => Phase::Failed(error),
            };
        }

        self.wake_all();
    }

    /// Moves a pending instance into the abandoned phase.
    ///
    /// Returns `false` and does nothing if the phase is already terminal.
    pub(crate) fn abandon(&self) -> bool {
        {
            let mut phase = self.phase.borrow_mut();

            if !matches!(*phase, Phase::NotStarted | Phase::Running) {
                return false;
            }

            *phase = Phase::Abandoned;
        }

        self.wake_all();
        true
    }

    fn wake_all(&self) {
        // Wakers may re-enter and poll us synchronously, so we must not hold the borrow.
        let waiters = mem::take(&mut *self.waiters.borrow_mut());

        for waker in waiters {
            waker.wake();
        }
    }
}

impl<E: Clone> InitState<E> {
    /// Checks for a terminal outcome, registering the waker if there is none yet.
    ///
    /// Every caller observes the same outcome; failures are cloned out unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the instance was abandoned by its executor.
    pub(crate) fn poll_outcome(&self, waker: &Waker) -> Poll<Result<(), E>> {
        match &*self.phase.borrow() {
            Phase::Succeeded => return Poll::Ready(Ok(())),
            Phase::Failed(error) => return Poll::Ready(Err(error.clone())),
            Phase::Abandoned => panic!(
                "initialization was abandoned because the executor dropped it before it completed"
            ),
            Phase::NotStarted | Phase::Running => {}
        }

        let mut waiters = self.waiters.borrow_mut();

        // The same task tends to poll repeatedly; keep one waker per task.
        if !waiters.iter().any(|existing| existing.will_wake(waker)) {
            waiters.push(waker.clone());
        }

        Poll::Pending
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<E> fmt::Debug for InitState<E> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("status", &self.status())
            .field("waiter_count", &self.waiters.borrow().len())
            .finish()
    }
}
