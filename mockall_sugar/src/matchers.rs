// vim: tw=80
//! Argument matchers.
//!
//! Anything that implements Mockall's [`Predicate`] is a [`Matcher`], so
//! every function in [`mockall::predicate`] can be used as an argument of
//! [`on!`](crate::on) or [`verify!`](crate::verify).  This module adds the
//! matchers that are awkward to spell with predicates alone, mostly around
//! `Option` arguments.

use std::{
    fmt,
    marker::PhantomData,
    mem
};

use predicates::{
    constant::{always, BooleanPredicate},
    function::{function, FnPredicate},
    reflection::PredicateReflection,
    Predicate
};

/// Decides whether an argument is acceptable to an expectation.
pub trait Matcher<T: ?Sized>: Send + Sync {
    fn matches(&self, actual: &T) -> bool;
}

impl<T, P> Matcher<T> for P
    where T: ?Sized,
          P: Predicate<T> + Send + Sync
{
    fn matches(&self, actual: &T) -> bool {
        self.eval(actual)
    }
}

/// Notified once the expectation owning this matcher has been selected to
/// handle a call.
///
/// Matching happens before Mockall picks an expectation, so a matcher with
/// side effects, like an argument captor, stages its work in
/// [`Matcher::matches`] and commits it here.
pub trait Recorder: Send + Sync {
    fn record(&self) {}
}

impl<P: PredicateReflection + Send + Sync> Recorder for P {}

/// Matches any value at all.
///
/// For `Option` arguments this includes `None`.  `_` in a stubbed call is
/// shorthand for `any()`.
pub fn any() -> BooleanPredicate {
    always()
}

macro_rules! option_predicate {
    ($(#[$attr:meta])* $name:ident, $ctor:ident, $desc:expr, $pat:pat) => {
        $(#[$attr])*
        pub struct $name<T>(PhantomData<fn(&T)>);

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }

        impl<T> fmt::Display for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str($desc)
            }
        }

        impl<T> PredicateReflection for $name<T> {}

        impl<T> Predicate<Option<T>> for $name<T> {
            fn eval(&self, actual: &Option<T>) -> bool {
                matches!(actual, $pat)
            }
        }

        $(#[$attr])*
        pub fn $ctor<T>() -> $name<T> {
            $name(PhantomData)
        }
    }
}

option_predicate!(
    /// Matches an `Option` argument whether or not it holds a value.
    AnyOrNone, any_or_none, "any_or_none()", _
);
option_predicate!(
    /// Matches only `None`.
    IsNone, is_none, "is_none()", None
);
option_predicate!(
    /// Matches any `Some` value, but never `None`.
    IsSome, is_some, "is_some()", Some(_)
);

/// Matches `Some(v)` when the inner predicate matches `v`.
#[derive(Debug)]
pub struct SomeMatching<P>(P);

impl<P: fmt::Display> fmt::Display for SomeMatching<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "some({})", self.0)
    }
}

impl<P: PredicateReflection> PredicateReflection for SomeMatching<P> {}

impl<T, P: Predicate<T>> Predicate<Option<T>> for SomeMatching<P> {
    fn eval(&self, actual: &Option<T>) -> bool {
        actual.as_ref().map_or(false, |v| self.0.eval(v))
    }
}

/// # Examples
/// ```
/// # use mockall_sugar::*;
/// let m = some(eq(5i32));
/// assert!(Matcher::matches(&m, &Some(5i32)));
/// assert!(!Matcher::matches(&m, &Some(4i32)));
/// assert!(!Matcher::matches(&m, &None::<i32>));
/// ```
pub fn some<P>(inner: P) -> SomeMatching<P> {
    SomeMatching(inner)
}

/// Matches only the very object given, by address.
#[derive(Debug)]
pub struct Same<T: ?Sized> {
    addr: usize,
    size: usize,
    _t: PhantomData<fn(&T)>
}

impl<T: ?Sized> fmt::Display for Same<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "same({:#x})", self.addr)
    }
}

impl<T: ?Sized> PredicateReflection for Same<T> {}

impl<T: ?Sized> Predicate<T> for Same<T> {
    fn eval(&self, actual: &T) -> bool {
        actual as *const T as *const () as usize == self.addr &&
            mem::size_of_val(actual) == self.size
    }
}

/// # Examples
/// ```
/// # use mockall_sugar::*;
/// let s = String::from("x");
/// let m = same(&*s);
/// assert!(Matcher::matches(&m, &*s));
/// assert!(!Matcher::matches(&m, "x"));
/// ```
pub fn same<T: ?Sized>(expected: &T) -> Same<T> {
    Same {
        addr: expected as *const T as *const () as usize,
        size: mem::size_of_val(expected),
        _t: PhantomData
    }
}

/// Matches when the closure returns `true`.
pub fn arg_that<F, T>(f: F) -> FnPredicate<F, T>
    where F: Fn(&T) -> bool,
          T: ?Sized
{
    function(f)
}

/// Runs an assertion closure on the argument, and matches if it returns.
///
/// The assertions run every time Mockall evaluates the expectation, so `check`
/// belongs on calls that have only one candidate expectation.
///
/// # Examples
/// ```
/// # use mockall_sugar::*;
/// let m = check(|s: &String| assert_eq!(s.len(), 3));
/// assert!(Matcher::matches(&m, &String::from("abc")));
/// ```
pub fn check<F, T>(f: F) -> FnPredicate<impl Fn(&T) -> bool, T>
    where F: Fn(&T),
          T: ?Sized
{
    function(move |actual: &T| {
        f(actual);
        true
    })
}
