// vim: tw=80
//! Argument captors.
//!
//! A [`Captor`] collects the arguments of every call handled by the
//! expectations it was passed to, in invocation order.

use std::{
    borrow::ToOwned,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

use thiserror::Error;

use crate::{Matcher, Recorder};

/// Errors returned when reading from a [`Captor`]
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum CaptorError {
    #[error("no argument value captured at index {index}: only {captured} invocation(s) recorded")]
    IndexOutOfRange {
        index: usize,
        captured: usize
    },
    #[error("no argument values were captured")]
    NoValues
}

/// Collects the arguments of matching calls.
///
/// Clones share the same list of values.
///
/// # Examples
/// ```
/// # use mockall::automock;
/// # use mockall_sugar::*;
/// #[automock]
/// trait Foo {
///     fn foo(&self, x: u32);
/// }
///
/// let captor = argument_captor::<u32>();
/// let mut m: Mocked<MockFoo> = mock();
/// on!(m.foo(captor.capture()) => does_nothing);
/// m.foo(5);
/// m.foo(6);
/// assert_eq!(captor.first_value(), 5);
/// assert_eq!(captor.last_value(), 6);
/// assert_eq!(captor.value(2), Err(CaptorError::IndexOutOfRange {
///     index: 2,
///     captured: 2
/// }));
/// ```
pub struct Captor<T: ?Sized + ToOwned> {
    values: Arc<Mutex<Vec<T::Owned>>>
}

impl<T: ?Sized + ToOwned> Captor<T> {
    pub fn new() -> Self {
        Captor {
            values: Arc::new(Mutex::new(Vec::new()))
        }
    }

    /// A matcher that matches any argument, and records it if its
    /// expectation handles the call.
    pub fn capture(&self) -> Capture<T> {
        Capture {
            values: Arc::clone(&self.values),
            pending: Mutex::new(None)
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T::Owned>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T: ToOwned> Captor<T> {
    /// A matcher for `Option` arguments that matches `Some`, and records the
    /// value inside.
    pub fn capture_some(&self) -> CaptureSome<T> {
        CaptureSome(self.capture())
    }
}

impl<T> Captor<T>
    where T: ?Sized + ToOwned,
          T::Owned: Clone
{
    /// The value captured by the `index`th handled call, counting from 0.
    pub fn value(&self, index: usize) -> Result<T::Owned, CaptorError> {
        let values = self.lock();
        values.get(index)
            .cloned()
            .ok_or(CaptorError::IndexOutOfRange {
                index,
                captured: values.len()
            })
    }

    pub fn try_last_value(&self) -> Result<T::Owned, CaptorError> {
        self.lock().last().cloned().ok_or(CaptorError::NoValues)
    }

    /// Every captured value, oldest first
    pub fn all_values(&self) -> Vec<T::Owned> {
        self.lock().clone()
    }

    fn nth_value(&self, index: usize) -> T::Owned {
        self.value(index).unwrap_or_else(|e| panic!("{}", e))
    }

    /// # Panics
    ///
    /// If nothing was captured
    pub fn first_value(&self) -> T::Owned {
        self.nth_value(0)
    }

    /// # Panics
    ///
    /// If fewer than two values were captured
    pub fn second_value(&self) -> T::Owned {
        self.nth_value(1)
    }

    /// # Panics
    ///
    /// If fewer than three values were captured
    pub fn third_value(&self) -> T::Owned {
        self.nth_value(2)
    }

    /// # Panics
    ///
    /// If nothing was captured
    pub fn last_value(&self) -> T::Owned {
        self.try_last_value().unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: ?Sized + ToOwned> Clone for Captor<T> {
    fn clone(&self) -> Self {
        Captor {
            values: Arc::clone(&self.values)
        }
    }
}

impl<T: ?Sized + ToOwned> Default for Captor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Captor<T>
    where T: ?Sized + ToOwned,
          T::Owned: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Captor")
            .field(&*self.lock())
            .finish()
    }
}

/// Create a captor for arguments of type `T`.
///
/// For reference arguments, name the referent: `argument_captor::<str>()`
/// captures `&str` arguments as `String`s.
pub fn argument_captor<T: ?Sized + ToOwned>() -> Captor<T> {
    Captor::new()
}

/// Create a captor for `Option<T>` arguments, which also records `None`s.
pub fn nullable_argument_captor<T: Clone>() -> Captor<Option<T>> {
    Captor::new()
}

/// Matcher returned by [`Captor::capture`]
pub struct Capture<T: ?Sized + ToOwned> {
    values: Arc<Mutex<Vec<T::Owned>>>,
    /// The argument last seen by `matches`, not yet known to be handled
    pending: Mutex<Option<T::Owned>>
}

impl<T: ?Sized + ToOwned> Capture<T> {
    fn stage(&self, value: T::Owned) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(value);
    }

    fn commit(&self) {
        let pending = self.pending.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(value) = pending {
            self.values.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(value);
        }
    }
}

impl<T> Matcher<T> for Capture<T>
    where T: ?Sized + ToOwned,
          T::Owned: Send
{
    fn matches(&self, actual: &T) -> bool {
        self.stage(actual.to_owned());
        true
    }
}

impl<T> Recorder for Capture<T>
    where T: ?Sized + ToOwned,
          T::Owned: Send
{
    fn record(&self) {
        self.commit();
    }
}

/// Matcher returned by [`Captor::capture_some`]
pub struct CaptureSome<T: ToOwned>(Capture<T>);

impl<T> Matcher<Option<T>> for CaptureSome<T>
    where T: ToOwned,
          T::Owned: Send
{
    fn matches(&self, actual: &Option<T>) -> bool {
        match actual {
            Some(v) => {
                self.0.stage(v.to_owned());
                true
            },
            None => false
        }
    }
}

impl<T> Recorder for CaptureSome<T>
    where T: ToOwned,
          T::Owned: Send
{
    fn record(&self) {
        self.0.commit();
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn commit_only_after_record() {
        let captor = argument_captor::<u32>();
        let capture = captor.capture();
        assert!(capture.matches(&1));
        assert!(captor.is_empty());
        capture.record();
        assert_eq!(captor.all_values(), vec![1]);
    }

    #[test]
    fn later_match_replaces_pending() {
        let captor = argument_captor::<u32>();
        let capture = captor.capture();
        capture.matches(&1);
        capture.matches(&2);
        capture.record();
        capture.record();
        assert_eq!(captor.all_values(), vec![2]);
    }

    #[test]
    fn capture_some_rejects_none() {
        let captor = argument_captor::<String>();
        let capture = captor.capture_some();
        assert!(!capture.matches(&None));
        assert!(capture.matches(&Some("x".to_owned())));
        capture.record();
        assert_eq!(captor.first_value(), "x");
    }

    #[test]
    fn display_index_out_of_range() {
        let e = CaptorError::IndexOutOfRange { index: 1, captured: 1 };
        assert_eq!(e.to_string(),
            "no argument value captured at index 1: only 1 invocation(s) recorded");
    }

    #[test]
    fn empty_last_value() {
        let captor = argument_captor::<str>();
        assert_eq!(captor.try_last_value(), Err(CaptorError::NoValues));
    }

    #[test]
    fn unsized_arg() {
        let captor = argument_captor::<str>();
        let capture = captor.capture();
        capture.matches("abc");
        capture.record();
        assert_eq!(captor.value(0), Ok(String::from("abc")));
    }
}
