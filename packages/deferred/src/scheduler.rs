//! Starts initializers on the executor supplied at construction time.
//!
//! The initializer never runs inside the constructor. Construction hands a driver task to the
//! executor, which polls it on a later turn, after the constructing call stack has unwound.
//! Only the driver moves the state machine out of the "not started" phase, so observers that
//! poll before the executor got around to the driver simply wait on the same state as everyone
//! else.

use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use tracing::{Instrument, debug, debug_span, error, trace, warn};

use crate::{AsyncInit, Core};

/// Spawns the driver task that runs the initializer of `core` with `args`.
///
/// If the executor rejects the task, the instance becomes abandoned right away; construction
/// itself never fails.
pub(crate) fn schedule<T, S>(spawner: &S, core: &Rc<Core<T>>, args: T::Args)
where
    T: AsyncInit,
    S: LocalSpawn,
{
    let guard = DriverGuard {
        core: Rc::clone(core),
    };

    let span = debug_span!("deferred_init", name = %core.name);
    let driver = drive(guard, args).instrument(span);

    if let Err(spawn_error) = spawner.spawn_local(driver) {
        // The rejected driver has already been dropped, which abandoned the instance.
        error!(
            name = %core.name,
            error = %spawn_error,
            "executor rejected the initializer"
        );
        return;
    }

    trace!(name = %core.name, "initializer scheduled");
}

async fn drive<T: AsyncInit>(guard: DriverGuard<T>, args: T::Args) {
    let core = &guard.core;

    core.state.begin();
    debug!("initializer started");

    let outcome = T::init(core.facade.target(), args).await;

    if outcome.is_ok() {
        debug!("initializer succeeded");
    } else {
        debug!("initializer failed");
    }

    core.state.finish(outcome);
}

/// Abandons the instance if the driver is dropped before the initializer completed.
///
/// This happens when the executor is dropped with the driver still queued or suspended, or when
/// the executor refuses to accept the driver in the first place.
struct DriverGuard<T: AsyncInit> {
    core: Rc<Core<T>>,
}

impl<T: AsyncInit> Drop for DriverGuard<T> {
    fn drop(&mut self) {
        if self.core.state.abandon() {
            warn!(
                name = %self.core.name,
                "initializer dropped by its executor before completing"
            );
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::future::{self, Future};

    use futures::executor::LocalPool;
    use futures::task::{LocalFutureObj, SpawnError};

    use super::*;
    use crate::{Deferred, Status};

    struct Probe {
        runs: Cell<u32>,
    }

    impl AsyncInit for Probe {
        type Args = ();
        type Error = ();

        fn init(self: Rc<Self>, (): ()) -> impl Future<Output = Result<(), ()>> + 'static {
            self.runs.set(self.runs.get() + 1);
            future::ready(Ok(()))
        }
    }

    fn probe() -> Probe {
        Probe { runs: Cell::new(0) }
    }

    struct ShutDownSpawner;

    impl LocalSpawn for ShutDownSpawner {
        fn spawn_local_obj(&self, _future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            Err(SpawnError::shutdown())
        }
    }

    #[test]
    fn initializer_waits_for_the_executor() {
        let mut pool = LocalPool::new();
        let instance = Deferred::new(&pool.spawner(), probe(), ());

        assert_eq!(instance.status(), Status::NotStarted);

        pool.run_until_stalled();

        assert_eq!(instance.status(), Status::Succeeded);
    }

    #[test]
    fn rejected_spawn_abandons_the_instance() {
        let instance = Deferred::new(&ShutDownSpawner, probe(), ());

        assert_eq!(instance.status(), Status::Abandoned);
    }

    #[test]
    fn dropped_executor_abandons_the_instance() {
        let pool = LocalPool::new();
        let instance = Deferred::new(&pool.spawner(), probe(), ());

        drop(pool);

        assert_eq!(instance.status(), Status::Abandoned);
    }

    #[test]
    fn initializer_runs_once_even_if_executor_is_driven_repeatedly() {
        let mut pool = LocalPool::new();
        let instance = Deferred::new(&pool.spawner(), probe(), ());

        pool.run_until_stalled();
        pool.run_until_stalled();

        let resolved = pool.run_until(instance.into_future()).unwrap();
        assert_eq!(resolved.runs.get(), 1);
    }
}
