//! Futures returned by the callback-style awaiting verbs of [`Deferred`].
//!
//! Each of them polls its own clone of the [`Deferred`] handle and applies its handler to the
//! outcome, so they are `'static` and can outlive the handle they were created from.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{self, Poll, ready};

use crate::{AsyncInit, Deferred, Resolved};

/// Future returned by [`Deferred::wait()`][crate::Deferred::wait].
pub struct Wait<T: AsyncInit, F> {
    instance: Deferred<T>,

    // `None` once the handler has been consumed.
    on_success: Option<F>,
}

impl<T: AsyncInit, F> Wait<T, F> {
    pub(crate) fn new(instance: Deferred<T>, on_success: F) -> Self {
        Self {
            instance,
            on_success: Some(on_success),
        }
    }
}

// The handler is only ever moved out, never pinned, so pinning `Wait` pins nothing structurally.
impl<T: AsyncInit, F> Unpin for Wait<T, F> {}

impl<T, F, R> Future for Wait<T, F>
where
    T: AsyncInit,
    F: FnOnce(Resolved<T>) -> R,
{
    type Output = Result<R, T::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let outcome = ready!(Pin::new(&mut this.instance).poll(cx));

        let on_success = this
            .on_success
            .take()
            .expect("Wait polled after completion");

        Poll::Ready(outcome.map(on_success))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: AsyncInit, F> fmt::Debug for Wait<T, F> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("instance", &self.instance)
            .field("completed", &self.on_success.is_none())
            .finish()
    }
}

/// Future returned by [`Deferred::wait_or_else()`][crate::Deferred::wait_or_else].
pub struct WaitOrElse<T: AsyncInit, F, G> {
    instance: Deferred<T>,

    // `None` once one of the handlers has been consumed.
    handlers: Option<(F, G)>,
}

impl<T: AsyncInit, F, G> WaitOrElse<T, F, G> {
    pub(crate) fn new(instance: Deferred<T>, on_success: F, on_failure: G) -> Self {
        Self {
            instance,
            handlers: Some((on_success, on_failure)),
        }
    }
}

// The handlers are only ever moved out, never pinned.
impl<T: AsyncInit, F, G> Unpin for WaitOrElse<T, F, G> {}

impl<T, F, G, R> Future for WaitOrElse<T, F, G>
where
    T: AsyncInit,
    F: FnOnce(Resolved<T>) -> R,
    G: FnOnce(T::Error) -> R,
{
    type Output = R;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let outcome = ready!(Pin::new(&mut this.instance).poll(cx));

        let (on_success, on_failure) = this
            .handlers
            .take()
            .expect("WaitOrElse polled after completion");

        Poll::Ready(match outcome {
            Ok(resolved) => on_success(resolved),
            Err(error) => on_failure(error),
        })
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: AsyncInit, F, G> fmt::Debug for WaitOrElse<T, F, G> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("instance", &self.instance)
            .field("completed", &self.handlers.is_none())
            .finish()
    }
}

/// Future returned by [`Deferred::on_failure()`][crate::Deferred::on_failure].
pub struct OnFailure<T: AsyncInit, G> {
    instance: Deferred<T>,

    // `None` once the instance has settled, whichever way.
    handler: Option<G>,
}

impl<T: AsyncInit, G> OnFailure<T, G> {
    pub(crate) fn new(instance: Deferred<T>, handler: G) -> Self {
        Self {
            instance,
            handler: Some(handler),
        }
    }
}

// The handler is only ever moved out, never pinned.
impl<T: AsyncInit, G> Unpin for OnFailure<T, G> {}

impl<T, G, R> Future for OnFailure<T, G>
where
    T: AsyncInit,
    G: FnOnce(T::Error) -> R,
{
    type Output = Result<Resolved<T>, R>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let outcome = ready!(Pin::new(&mut this.instance).poll(cx));

        let handler = this
            .handler
            .take()
            .expect("OnFailure polled after completion");

        Poll::Ready(outcome.map_err(handler))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: AsyncInit, G> fmt::Debug for OnFailure<T, G> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("instance", &self.instance)
            .field("completed", &self.handler.is_none())
            .finish()
    }
}

/// Future returned by [`Deferred::on_completion()`][crate::Deferred::on_completion].
pub struct OnCompletion<T: AsyncInit, H> {
    instance: Deferred<T>,

    // `None` once the handler has run.
    handler: Option<H>,
}

impl<T: AsyncInit, H> OnCompletion<T, H> {
    pub(crate) fn new(instance: Deferred<T>, handler: H) -> Self {
        Self {
            instance,
            handler: Some(handler),
        }
    }
}

// The handler is only ever moved out, never pinned.
impl<T: AsyncInit, H> Unpin for OnCompletion<T, H> {}

impl<T, H> Future for OnCompletion<T, H>
where
    T: AsyncInit,
    H: FnOnce(),
{
    type Output = Result<Resolved<T>, T::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let outcome = ready!(Pin::new(&mut this.instance).poll(cx));

        let handler = this
            .handler
            .take()
            .expect("OnCompletion polled after completion");

        handler();

        Poll::Ready(outcome)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: AsyncInit, H> fmt::Debug for OnCompletion<T, H> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("instance", &self.instance)
            .field("completed", &self.handler.is_none())
            .finish()
    }
}
