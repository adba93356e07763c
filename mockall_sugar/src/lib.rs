// vim: tw=80
//! A terser way to stub and verify [Mockall](https://docs.rs/mockall) mocks.
//!
//! Mockall generates the mocks.  This crate layers some conveniences on top:
//!
//! * [`mock`], [`mock_with`] and [`Mocked`] for building a mock and stubbing
//!   it in one expression.
//! * [`on!`] and [`verify!`], which stub or expect a call written the way it
//!   will be made: `on!(m.foo(eq(5), _) => returns 42)`.
//! * Matchers for `Option` arguments, like [`any_or_none`] and [`is_some`],
//!   plus [`same`], [`arg_that`] and [`check`].
//! * [`Captor`], which records the arguments of matching calls.
//! * [`run_blocking`] and [`verify_blocking!`] for `async` methods.
//!
//! # Stubbing
//!
//! The argument of [`on!`] is a method call on a [`Mocked`], with each
//! argument replaced by a matcher, followed by `=>` and a verb:
//!
//! ```
//! # use mockall::automock;
//! # use mockall_sugar::*;
//! #[automock]
//! trait Repo {
//!     fn load(&self, id: u32) -> Option<String>;
//!     fn save(&self, id: u32, body: Option<String>) -> bool;
//! }
//!
//! let m = mock_with::<MockRepo, _>(|m| {
//!     on!(m.load(_) => returns None);
//!     on!(m.load(eq(1)) => returns Some(String::from("one")));
//!     on!(m.save(_, is_some()) => returns true);
//!     on!(m.save(_, is_none()) => panics "no body");
//! });
//! assert_eq!(m.load(1).as_deref(), Some("one"));
//! assert_eq!(m.load(2), None);
//! assert!(m.save(1, Some(String::new())));
//! ```
//!
//! When several stubs of a method match a call, the most recent one answers
//! it, so put general stubs before specific ones.  Stubbing the same call
//! again replaces the earlier stub.
//!
//! # Verification
//!
//! Like everything in Mockall, [`verify!`] is declared before the calls it
//! counts.  Counts are checked when the mock is dropped, or earlier with
//! `checkpoint`.  A verification never changes what a call returns: when a
//! stub matches the call, the stub answers it and the verification just counts
//! it.
//!
//! ```should_panic
//! # use mockall::automock;
//! # use mockall_sugar::*;
//! #[automock]
//! trait Repo {
//!     fn delete(&self, id: u32);
//! }
//!
//! let mut m: Mocked<MockRepo> = mock();
//! verify!(m.delete(eq(3)), times(2));
//! m.delete(3);
//! m.checkpoint();     // panics: delete was called only once
//! ```
//!
//! Failure messages name the mock, which is its type name unless set with
//! [`MockSettings::name`] or [`mock_named`].
//!
//! # Async methods
//!
//! Async methods are stubbed with the value their future resolves to, and
//! driven to completion with [`run_blocking`]:
//!
//! ```
//! # use async_trait::async_trait;
//! # use mockall::automock;
//! # use mockall_sugar::*;
//! #[automock]
//! #[async_trait]
//! trait Remote {
//!     async fn fetch(&self) -> u32;
//! }
//!
//! let mut m: Mocked<MockRemote> = mock();
//! verify!(m.fetch() => returns 7);
//! assert_eq!(verify_blocking!(m, m.fetch()), 7);
//! ```
//!
//! # Logging
//!
//! Mock creation, stubbing, and every stubbed invocation emit
//! [`tracing`](https://docs.rs/tracing) events with the target
//! `mockall_sugar`.  Invocations are logged at `TRACE`, or at `DEBUG` for mocks
//! created with [`MockSettings::verbose_logging`].

use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError}
};

mod answer;
mod captor;
mod ledger;
mod matchers;
mod mocked;
mod verification;

pub use answer::Consecutive;
pub use captor::{
    argument_captor,
    nullable_argument_captor,
    Captor,
    CaptorError,
    Capture,
    CaptureSome
};
pub use matchers::{
    any,
    any_or_none,
    arg_that,
    check,
    is_none,
    is_some,
    same,
    some,
    AnyOrNone,
    IsNone,
    IsSome,
    Matcher,
    Recorder,
    Same,
    SomeMatching
};
#[doc(hidden)]
pub use ledger::Entry;
pub use mocked::{
    clear_invocations,
    mock,
    mock_named,
    mock_with,
    mock_with_settings,
    stub,
    with_settings,
    Invocation,
    MockSettings,
    MockState,
    Mocked
};
pub use verification::{
    at_least,
    at_least_once,
    at_most,
    in_order,
    never,
    times,
    InOrder,
    Verification,
    VerificationMode
};

pub use mockall::{predicate::eq, Predicate, Sequence};
pub use mockall_sugar_derive::{on, verify};
/// Same as [`on!`]
pub use mockall_sugar_derive::on as whenever;

/// Lock a mutex, ignoring poison left by a panicking test.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drive a future to completion on the current thread.
///
/// This is how tests call `async` methods of a mock.
pub fn run_blocking<F: Future>(future: F) -> F::Output {
    tracing::trace!(target: "mockall_sugar", "running future to completion");
    futures::executor::block_on(future)
}

/// Run a future to completion, then verify the mock's expectations.
///
/// Evaluates to the future's output.  Afterwards, the mock has no expectations
/// left, as with `checkpoint`.
#[macro_export]
macro_rules! verify_blocking {
    ($mock:expr, $future:expr) => {{
        let __mockall_sugar_output = $crate::run_blocking($future);
        $mock.checkpoint();
        __mockall_sugar_output
    }}
}

/// Verify every expectation set so far, and reject any further calls.
#[macro_export]
macro_rules! verify_no_more_interactions {
    ($mock:expr) => {
        $mock.checkpoint()
    }
}
