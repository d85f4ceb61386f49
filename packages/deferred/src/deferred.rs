//! The deferred handle and the trait that domain types implement to opt in.
//!
//! A [`Deferred<T>`] owns one shared core holding the name, the initialization state and the
//! resolved view. Every clone of the handle, every verb future and the driver task point at the
//! same core.

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{self, Poll};

use futures::task::LocalSpawn;

use crate::{InitState, OnCompletion, OnFailure, Resolved, Status, Wait, WaitOrElse, schedule};

/// A type whose instances finish their construction asynchronously.
///
/// The synchronous part of construction is ordinary Rust: build the value with all its fields.
/// The asynchronous part is [`init()`][AsyncInit::init], which [`Deferred`] runs on an executor
/// after construction returns. Fields that `init()` assigns need interior mutability because the
/// instance is already shared at that point.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::future::Future;
/// use std::rc::Rc;
///
/// use deferred::AsyncInit;
///
/// struct Connection {
///     peer: RefCell<String>,
/// }
///
/// impl AsyncInit for Connection {
///     type Args = (String, u16);
///     type Error = String;
///
///     fn init(
///         self: Rc<Self>,
///         (host, port): (String, u16),
///     ) -> impl Future<Output = Result<(), String>> + 'static {
///         async move {
///             if port == 0 {
///                 return Err(format!("invalid port for {host}"));
///             }
///
///             *self.peer.borrow_mut() = format!("{host}:{port}");
///             Ok(())
///         }
///     }
/// }
/// ```
pub trait AsyncInit: Sized + 'static {
    /// The construction arguments, forwarded unchanged to [`init()`][AsyncInit::init].
    type Args: 'static;

    /// The error the initializer may fail with.
    ///
    /// Every observer of a failed instance receives its own clone of the original error.
    type Error: Clone + 'static;

    /// Completes the construction of the instance.
    ///
    /// Called exactly once per [`Deferred`], on the executor it was constructed with.
    fn init(
        self: Rc<Self>,
        args: Self::Args,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'static;
}

/// State shared by every handle to the same deferred instance and by its driver task.
pub(crate) struct Core<T: AsyncInit> {
    pub(crate) name: Cow<'static, str>,
    pub(crate) state: InitState<T::Error>,
    pub(crate) facade: Resolved<T>,
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: AsyncInit> fmt::Debug for Core<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// An instance of `T` that is usable as soon as it is constructed and that can be awaited to
/// obtain the initialized instance.
///
/// Construction returns immediately and schedules [`T::init()`][AsyncInit::init] on the
/// provided executor. The handle is itself the asynchronous operation: `.await` it (by value
/// or by reference), pass it to `futures::future::join_all()` and friends, or use one of the
/// callback-style verbs ([`wait()`][Self::wait], [`wait_or_else()`][Self::wait_or_else],
/// [`on_failure()`][Self::on_failure], [`on_completion()`][Self::on_completion]).
///
/// Success yields a [`Resolved<T>`], the view of the initialized instance. It is the same
/// instance for every observer, no matter how many times or through which verb it is awaited.
/// Failure yields the error returned by the initializer, unchanged.
///
/// Polling the handle after it completed returns the same outcome again. Cloning the handle
/// does not create a new instance.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::future::Future;
/// use std::rc::Rc;
///
/// use deferred::{AsyncInit, Deferred, Resolved};
/// use futures::executor::LocalPool;
///
/// struct Greeting {
///     value: RefCell<String>,
/// }
///
/// impl AsyncInit for Greeting {
///     type Args = Option<String>;
///     type Error = String;
///
///     fn init(
///         self: Rc<Self>,
///         input: Option<String>,
///     ) -> impl Future<Output = Result<(), String>> + 'static {
///         async move {
///             *self.value.borrow_mut() = input.unwrap_or_else(|| "asd".to_string());
///             Ok(())
///         }
///     }
/// }
///
/// let mut pool = LocalPool::new();
///
/// let greeting = Deferred::new(
///     &pool.spawner(),
///     Greeting {
///         value: RefCell::new(String::new()),
///     },
///     Some("abc".to_string()),
/// );
///
/// let first = pool.run_until(async { (&greeting).await }).unwrap();
/// let second = pool.run_until(async { greeting.await }).unwrap();
///
/// assert_eq!(*first.value.borrow(), "abc");
/// assert!(Resolved::ptr_eq(&first, &second));
/// ```
pub struct Deferred<T: AsyncInit> {
    core: Rc<Core<T>>,
}

impl<T: AsyncInit> Deferred<T> {
    /// Wraps `value` and schedules its initializer with `args` on `spawner`.
    ///
    /// The initializer starts on a later turn of the executor, never inside this call.
    ///
    /// Use [`Deferred::builder()`] to configure the instance.
    #[must_use]
    pub fn new<S: LocalSpawn>(spawner: &S, value: T, args: T::Args) -> Self {
        Self::builder().build(spawner, value, args)
    }

    /// Creates a builder for configuring a deferred instance.
    #[must_use]
    pub fn builder() -> DeferredBuilder<T> {
        DeferredBuilder::new()
    }

    /// The name of the instance, used in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// The current initialization progress.
    #[must_use]
    pub fn status(&self) -> Status {
        self.core.state.status()
    }

    /// Waits for initialization and maps the initialized instance through `on_success`.
    ///
    /// The returned future resolves to `Ok` with the return value of `on_success`, or to `Err`
    /// with the initializer's error, in which case `on_success` is never called.
    pub fn wait<R, F>(&self, on_success: F) -> Wait<T, F>
    where
        F: FnOnce(Resolved<T>) -> R,
    {
        Wait::new(self.clone(), on_success)
    }

    /// Waits for initialization and handles both outcomes.
    ///
    /// The returned future resolves to the return value of whichever handler was called.
    pub fn wait_or_else<R, F, G>(&self, on_success: F, on_failure: G) -> WaitOrElse<T, F, G>
    where
        F: FnOnce(Resolved<T>) -> R,
        G: FnOnce(T::Error) -> R,
    {
        WaitOrElse::new(self.clone(), on_success, on_failure)
    }

    /// Waits for initialization, calling `handler` only if it failed.
    ///
    /// The returned future resolves to `Ok` with the initialized instance if initialization
    /// succeeded, or to `Err` with the return value of `handler`.
    pub fn on_failure<R, G>(&self, handler: G) -> OnFailure<T, G>
    where
        G: FnOnce(T::Error) -> R,
    {
        OnFailure::new(self.clone(), handler)
    }

    /// Waits for initialization and calls `handler` once, whatever the outcome.
    ///
    /// The returned future resolves to the same outcome as awaiting the instance directly:
    /// failures are passed on after `handler` returns.
    pub fn on_completion<H>(&self, handler: H) -> OnCompletion<T, H>
    where
        H: FnOnce(),
    {
        OnCompletion::new(self.clone(), handler)
    }
}

impl<T: AsyncInit> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: AsyncInit> Future for Deferred<T> {
    type Output = Result<Resolved<T>, T::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let core = &self.core;

        core.state
            .poll_outcome(cx.waker())
            .map(|outcome| outcome.map(|()| core.facade.clone()))
    }
}

// Awaiting by reference observes the same instance through a new handle.
impl<T: AsyncInit> IntoFuture for &Deferred<T> {
    type Output = Result<Resolved<T>, T::Error>;
    type IntoFuture = Deferred<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.clone()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: AsyncInit> fmt::Debug for Deferred<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.core.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a [`Deferred`] instance.
pub struct DeferredBuilder<T> {
    name: Option<Cow<'static, str>>,

    _instance: PhantomData<fn() -> T>,
}

impl<T: AsyncInit> DeferredBuilder<T> {
    fn new() -> Self {
        Self {
            name: None,
            _instance: PhantomData,
        }
    }

    /// Sets the name that identifies the instance in log output.
    ///
    /// Default is the type name of `T`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the instance and schedules its initializer with `args` on `spawner`.
    #[must_use]
    pub fn build<S: LocalSpawn>(self, spawner: &S, value: T, args: T::Args) -> Deferred<T> {
        let core = Rc::new(Core {
            name: self.name.unwrap_or(Cow::Borrowed(type_name::<T>())),
            state: InitState::new(),
            facade: Resolved::new(value),
        });

        schedule(spawner, &core, args);

        Deferred { core }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T> fmt::Debug for DeferredBuilder<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .finish()
    }
}
