#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Objects that are constructed synchronously, finish their initialization asynchronously and
//! can be awaited like any other asynchronous operation.
//!
//! A type opts in by implementing [`AsyncInit`]. Wrapping a value in [`Deferred`] returns a
//! handle immediately and schedules [`AsyncInit::init()`] on a single-threaded executor. The
//! handle is the asynchronous operation: awaiting it yields a [`Resolved`] view of the
//! initialized instance, or the initializer's error.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::future::Future;
//! use std::rc::Rc;
//!
//! use deferred::{AsyncInit, Deferred};
//! use futures::executor::LocalPool;
//! use futures::future::join_all;
//! use futures::task::LocalSpawn;
//!
//! struct Greeting {
//!     value: RefCell<String>,
//! }
//!
//! impl Greeting {
//!     fn new(spawner: &impl LocalSpawn, input: Option<&str>) -> Deferred<Self> {
//!         let value = Self {
//!             value: RefCell::new(String::new()),
//!         };
//!
//!         Deferred::new(spawner, value, input.map(str::to_string))
//!     }
//!
//!     fn name(&self) -> String {
//!         self.value.borrow().clone()
//!     }
//! }
//!
//! impl AsyncInit for Greeting {
//!     type Args = Option<String>;
//!     type Error = String;
//!
//!     fn init(
//!         self: Rc<Self>,
//!         input: Option<String>,
//!     ) -> impl Future<Output = Result<(), String>> + 'static {
//!         async move {
//!             *self.value.borrow_mut() = input.unwrap_or_else(|| "asd".to_string());
//!             Ok(())
//!         }
//!     }
//! }
//!
//! let mut pool = LocalPool::new();
//! let spawner = pool.spawner();
//!
//! pool.run_until(async {
//!     let greeting = Greeting::new(&spawner, Some("abc")).await.unwrap();
//!     assert_eq!(greeting.name(), "abc");
//!
//!     let all = join_all([Greeting::new(&spawner, None), Greeting::new(&spawner, Some("x"))]).await;
//!     let names: Vec<_> = all.into_iter().map(|g| g.unwrap().name()).collect();
//!     assert_eq!(names, ["asd", "x"]);
//! });
//! ```
//!
//! # Scheduling
//!
//! The initializer never runs inside construction. It starts on a later turn of the executor
//! passed to [`Deferred::new()`], after the code that constructed the instance has returned.
//! Every way of awaiting the instance observes the same state machine, so none of them can see
//! an outcome before the initializer has actually run. The initializer runs exactly once, no
//! matter how many times the instance is awaited.
//!
//! There is no cancellation: dropping every handle leaves the initializer running to completion.
//! If the executor itself is dropped before the initializer completed, the instance becomes
//! [`Status::Abandoned`] and awaiting it panics.
//!
//! # Resolved instances
//!
//! [`Resolved<T>`] dereferences to `T`, so the domain type is used as usual. The awaiting
//! protocol lives on [`Deferred`] and is not reachable from a resolved instance. Types that
//! expose their members by name via [`Members`] get the same filtering at runtime: the names
//! in [`HIDDEN_MEMBERS`] are never readable, writable or listed through [`Resolved`].
//!
//! # Logging
//!
//! State transitions are reported via `tracing` under a `deferred_init` span that carries the
//! instance name (see [`DeferredBuilder::name()`]).

mod deferred;
mod error;
mod facade;
mod observe;
mod scheduler;
mod state;

pub(crate) use deferred::Core;
pub use deferred::{AsyncInit, Deferred, DeferredBuilder};
pub use error::*;
pub use facade::*;
pub use observe::*;
pub(crate) use scheduler::schedule;
pub(crate) use state::InitState;
pub use state::Status;
