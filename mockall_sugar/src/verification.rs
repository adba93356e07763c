// vim: tw=80
//! How many times a call is expected, and in what order.
//!
//! Each [`verify!`](crate::verify) owns a tally of the calls that matched it.
//! A call is counted by every verification it matches, whichever stub ends
//! up answering it.  Counts are checked when the mock is checkpointed or
//! dropped.

use std::{
    fmt,
    ops::Range,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
        Weak
    }
};

use crate::lock;

/// An expected call count, from `min` up to and including `max`.
///
/// Pass one as the second argument of [`verify!`](crate::verify) or
/// [`on!`](crate::on).  A bare `usize` works too, and means [`times`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VerificationMode {
    min: usize,
    max: Option<usize>
}

impl VerificationMode {
    /// The half-open range of call counts, as Mockall's `times` wants it.
    pub fn range(&self) -> Range<usize> {
        match self.max {
            Some(max) => self.min..max.saturating_add(1),
            None => self.min..usize::MAX
        }
    }

    /// Is `count` calls acceptable?
    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    pub fn minimum(&self) -> usize {
        self.min
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (_, Some(0)) => write!(f, "never"),
            (min, Some(max)) if min == max => write!(f, "exactly {} time(s)", min),
            (0, Some(max)) => write!(f, "at most {} time(s)", max),
            (min, Some(max)) => write!(f, "{} to {} time(s)", min, max),
            (min, None) => write!(f, "at least {} time(s)", min)
        }
    }
}

impl From<usize> for VerificationMode {
    fn from(n: usize) -> Self {
        times(n)
    }
}

/// Exactly `n` calls
pub fn times(n: usize) -> VerificationMode {
    VerificationMode { min: n, max: Some(n) }
}

/// No calls at all
pub fn never() -> VerificationMode {
    times(0)
}

pub fn at_least(n: usize) -> VerificationMode {
    VerificationMode { min: n, max: None }
}

pub fn at_least_once() -> VerificationMode {
    at_least(1)
}

pub fn at_most(n: usize) -> VerificationMode {
    VerificationMode { min: 0, max: Some(n) }
}

/// The calls counted by one `verify!`
#[doc(hidden)]
pub struct Tally {
    mock: String,
    call: String,
    mode: VerificationMode,
    count: AtomicUsize,
    description: Mutex<Option<String>>,
    order: Mutex<Option<(InOrder, usize)>>,
    /// Commits the argument captures staged by the verification's matchers
    recorder: Box<dyn Fn() + Send + Sync>
}

impl Tally {
    pub(crate) fn new(
        mock: &str,
        call: &str,
        mode: VerificationMode,
        recorder: Box<dyn Fn() + Send + Sync>) -> Self
    {
        Tally {
            mock: mock.to_owned(),
            call: call.to_owned(),
            mode,
            count: AtomicUsize::new(0),
            description: Mutex::new(None),
            order: Mutex::new(None),
            recorder
        }
    }

    pub(crate) fn hit(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        (self.recorder)();
        let order = lock(&self.order).clone();
        if let Some((seq, index)) = order {
            if !seq.advance(index) {
                panic!("{}.{}: Method sequence violation", self.mock, self.call);
            }
        }
    }

    pub(crate) fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    fn is_satisfied(&self) -> bool {
        self.count() >= self.mode.minimum()
    }

    /// Panic unless the call count is acceptable
    pub(crate) fn check(&self) {
        let count = self.count();
        if !self.mode.contains(count) {
            panic!("{}", self.failure(count));
        }
    }

    fn failure(&self, count: usize) -> String {
        let details = format!("{}.{}: expected {}, but it was called {} time(s)",
            self.mock, self.call, self.mode, count);
        match &*lock(&self.description) {
            Some(description) => format!("{}\n{}", description, details),
            None => details
        }
    }
}

/// Handle to a call verification, returned by [`verify!`](crate::verify).
///
/// # Examples
/// ```should_panic(expected = "saves the report")
/// # use mockall::automock;
/// # use mockall_sugar::*;
/// #[automock]
/// trait Store {
///     fn save(&self, report: &str);
/// }
///
/// let mut m: Mocked<MockStore> = mock();
/// verify!(m.save(_)).description("saves the report");
/// m.checkpoint();
/// ```
#[derive(Clone)]
pub struct Verification {
    tally: Arc<Tally>
}

impl Verification {
    pub(crate) fn new(tally: Arc<Tally>) -> Self {
        Verification { tally }
    }

    /// Add a description to the failure message
    pub fn description<S: Into<String>>(&self, description: S) -> &Self {
        *lock(&self.tally.description) = Some(description.into());
        self
    }

    /// Require the counted calls to happen after those of every verification
    /// added to `seq` before this one.
    pub fn in_sequence(&self, seq: &mut InOrder) -> &Self {
        let index = seq.push(&self.tally);
        *lock(&self.tally.order) = Some((seq.clone(), index));
        self
    }

    /// How many calls have been counted so far
    pub fn count(&self) -> usize {
        self.tally.count()
    }
}

impl fmt::Debug for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verification")
            .field("call", &self.tally.call)
            .field("mode", &self.tally.mode)
            .field("count", &self.tally.count())
            .finish()
    }
}

#[derive(Debug, Default)]
struct Steps {
    steps: Vec<Weak<Tally>>,
    position: usize
}

/// An ordering constraint between verifications, possibly on different mocks.
///
/// # Examples
/// ```
/// # use mockall::automock;
/// # use mockall_sugar::*;
/// #[automock]
/// trait Foo {
///     fn foo(&self);
///     fn bar(&self);
/// }
///
/// let mut seq = in_order();
/// let mut m: Mocked<MockFoo> = mock();
/// verify!(m.foo()).in_sequence(&mut seq);
/// verify!(m.bar()).in_sequence(&mut seq);
/// m.foo();
/// m.bar();
/// ```
#[derive(Clone, Debug, Default)]
pub struct InOrder {
    steps: Arc<Mutex<Steps>>
}

impl InOrder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, tally: &Arc<Tally>) -> usize {
        let mut steps = lock(&self.steps);
        steps.steps.push(Arc::downgrade(tally));
        steps.steps.len() - 1
    }

    /// Move to step `index`, if every step before it is satisfied and no later
    /// step has been reached yet.
    fn advance(&self, index: usize) -> bool {
        let mut guard = lock(&self.steps);
        let steps = &mut *guard;
        if index < steps.position {
            return false;
        }
        let ready = steps.steps[steps.position..index].iter()
            .all(|step| step.upgrade().map_or(true, |t| t.is_satisfied()));
        if ready {
            steps.position = index;
        }
        ready
    }
}

/// Start an ordering constraint.
///
/// Chain `.in_sequence(&mut seq)` onto each `verify!` that must happen in
/// order.
pub fn in_order() -> InOrder {
    InOrder::new()
}

#[cfg(test)]
mod t {
    use super::*;

    fn tally(mode: VerificationMode) -> Arc<Tally> {
        Arc::new(Tally::new("m", "foo()", mode, Box::new(|| ())))
    }

    #[test]
    fn display() {
        assert_eq!(never().to_string(), "never");
        assert_eq!(times(2).to_string(), "exactly 2 time(s)");
        assert_eq!(at_most(3).to_string(), "at most 3 time(s)");
        assert_eq!(at_least_once().to_string(), "at least 1 time(s)");
    }

    #[test]
    fn failure_message() {
        let t = tally(times(1));
        Verification::new(Arc::clone(&t)).description("Test");
        assert_eq!(t.failure(0),
            "Test\nm.foo(): expected exactly 1 time(s), but it was called 0 time(s)");
    }

    #[test]
    fn from_usize() {
        assert_eq!(VerificationMode::from(4), times(4));
    }

    #[test]
    fn contains() {
        assert!(at_most(2).contains(0));
        assert!(!at_most(2).contains(3));
        assert!(at_least(2).contains(usize::MAX));
        assert!(!never().contains(1));
    }

    #[test]
    fn ranges() {
        assert_eq!(times(2).range(), 2..3);
        assert_eq!(never().range(), 0..1);
        assert_eq!(at_least(2).range(), 2..usize::MAX);
        assert_eq!(at_most(2).range(), 0..3);
    }

    #[test]
    fn clear() {
        let t = tally(never());
        t.hit();
        t.clear();
        t.check();
    }

    #[test]
    #[should_panic(expected = "Method sequence violation")]
    fn out_of_order() {
        let mut seq = in_order();
        let first = tally(times(1));
        let second = tally(times(1));
        Verification::new(Arc::clone(&first)).in_sequence(&mut seq);
        Verification::new(Arc::clone(&second)).in_sequence(&mut seq);
        second.hit();
    }
}
