// vim: tw=80
//! Mock construction and per-mock state.
//!
//! [`Mocked`] wraps any Mockall mock.  It derefs to the mock, so every
//! generated method, `expect_*` method, and `checkpoint` stays reachable, and
//! it carries the state that [`on!`](crate::on) and [`verify!`](crate::verify)
//! need: the mock's name, its settings, and the ledger of its stubs and
//! verifications.
//!
//! `Mocked`'s own functions are associated functions, called like
//! `Mocked::name(&m)`, so that they never hide a method of the mock.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
        Weak
    }
};

use crate::{ledger::Ledgers, lock, verification::Tally, VerificationMode};

const TARGET: &str = "mockall_sugar";

/// One call handled by a stub or verification, as seen by an invocation
/// listener.
#[derive(Clone, Copy, Debug)]
pub struct Invocation<'a> {
    mock: &'a str,
    method: &'a str,
    sequence_number: usize
}

impl<'a> Invocation<'a> {
    /// Name of the mock that was called
    pub fn mock(&self) -> &'a str {
        self.mock
    }

    pub fn method(&self) -> &'a str {
        self.method
    }

    /// Position of this call among all of the mock's calls, starting at 1
    pub fn sequence_number(&self) -> usize {
        self.sequence_number
    }
}

type Listener = Arc<dyn Fn(&Invocation<'_>) + Send + Sync>;

/// Settings applied when a mock is created
///
/// # Examples
/// ```
/// # use mockall_sugar::*;
/// let settings = with_settings()
///     .name("database")
///     .verbose_logging(true);
/// assert_eq!(settings.get_name(), Some("database"));
/// ```
#[derive(Clone, Default)]
pub struct MockSettings {
    name: Option<String>,
    verbose_logging: bool,
    stub_only: bool,
    listeners: Vec<Listener>
}

impl MockSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the mock.
    ///
    /// The name appears in log events and in verification failures.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Log every stubbed invocation at `DEBUG` instead of `TRACE`.
    pub fn verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// Forbid `verify!` on this mock.
    pub fn stub_only(mut self) -> Self {
        self.stub_only = true;
        self
    }

    /// Call `listener` for every call handled by a stub or verification.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::{Arc, Mutex};
    /// # use mockall::automock;
    /// # use mockall_sugar::*;
    /// #[automock]
    /// trait Foo {
    ///     fn foo(&self) -> u32;
    /// }
    ///
    /// let calls = Arc::new(Mutex::new(Vec::new()));
    /// let log = Arc::clone(&calls);
    /// let settings = with_settings().invocation_listener(move |i| {
    ///     log.lock().unwrap().push(i.method().to_owned());
    /// });
    /// let m = mock_with_settings::<MockFoo, _>(settings, |m| {
    ///     on!(m.foo() => returns 1);
    /// });
    /// m.foo();
    /// assert_eq!(*calls.lock().unwrap(), ["foo"]);
    /// ```
    pub fn invocation_listener<F>(mut self, listener: F) -> Self
        where F: Fn(&Invocation<'_>) + Send + Sync + 'static
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose_logging
    }

    pub fn is_stub_only(&self) -> bool {
        self.stub_only
    }
}

impl fmt::Debug for MockSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSettings")
            .field("name", &self.name)
            .field("verbose_logging", &self.verbose_logging)
            .field("stub_only", &self.stub_only)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Start building a [`MockSettings`]
pub fn with_settings() -> MockSettings {
    MockSettings::new()
}

/// State shared between a [`Mocked`] and the expectations set on it.
#[doc(hidden)]
pub struct MockState {
    pub(crate) name: String,
    verbose: bool,
    pub(crate) stub_only: bool,
    listeners: Vec<Listener>,
    pub(crate) ledgers: Ledgers,
    tallies: Mutex<Vec<Weak<Tally>>>,
    next_id: AtomicUsize,
    invocations: AtomicUsize
}

impl MockState {
    pub(crate) fn new(name: String, settings: MockSettings) -> Self {
        MockState {
            name,
            verbose: settings.verbose_logging,
            stub_only: settings.stub_only,
            listeners: settings.listeners,
            ledgers: Ledgers::default(),
            tallies: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0)
        }
    }

    /// Ids grow with every `on!` or `verify!`, so newer means larger.
    pub(crate) fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn track(&self, tally: &Arc<Tally>) {
        let mut tallies = lock(&self.tallies);
        tallies.retain(|t| t.strong_count() > 0);
        tallies.push(Arc::downgrade(tally));
    }

    pub(crate) fn stubbed(&self, call: &str) {
        tracing::debug!(target: TARGET, mock = %self.name, call, "stubbed");
    }

    pub(crate) fn expecting(&self, call: &str, mode: &VerificationMode) {
        tracing::debug!(target: TARGET, mock = %self.name, call,
            %mode, "expecting");
    }

    pub(crate) fn invoked(&self, method: &str) {
        let sequence_number = self.invocations.fetch_add(1, Ordering::Relaxed)
            + 1;
        if self.verbose {
            tracing::debug!(target: TARGET, mock = %self.name, method,
                sequence_number, "invoked");
        } else {
            tracing::trace!(target: TARGET, mock = %self.name, method,
                sequence_number, "invoked");
        }
        let invocation = Invocation {
            mock: &self.name,
            method,
            sequence_number
        };
        for listener in self.listeners.iter() {
            listener(&invocation);
        }
    }

    fn clear_invocations(&self) {
        tracing::debug!(target: TARGET, mock = %self.name,
            "invocations cleared");
        for tally in lock(&self.tallies).iter().filter_map(Weak::upgrade) {
            tally.clear();
        }
    }
}

/// A Mockall mock, plus what the stubbing macros need to know about it.
///
/// # Examples
/// ```
/// # use mockall::automock;
/// # use mockall_sugar::*;
/// #[automock]
/// trait Foo {
///     fn foo(&self, x: u32) -> u32;
/// }
///
/// let mut m: Mocked<MockFoo> = mock();
/// on!(m.foo(eq(4)) => returns 42);
/// assert_eq!(m.foo(4), 42);
/// ```
pub struct Mocked<M> {
    mock: M,
    state: Arc<MockState>
}

impl<M> Mocked<M> {
    /// Wrap a mock built by hand
    pub fn new(mock: M) -> Self {
        Self::with_settings(mock, MockSettings::default())
    }

    pub fn with_settings(mock: M, settings: MockSettings) -> Self {
        let name = settings.name.clone().unwrap_or_else(short_type_name::<M>);
        tracing::debug!(target: TARGET, mock = %name, "created");
        let state = Arc::new(MockState::new(name, settings));
        Mocked { mock, state }
    }

    /// Unwrap the underlying Mockall mock.
    ///
    /// Stubs and verifications already set keep working.
    pub fn into_inner(this: Self) -> M {
        this.mock
    }

    pub fn name(this: &Self) -> &str {
        &this.state.name
    }

    /// Add stubs to an existing mock.
    ///
    /// # Examples
    /// ```
    /// # use mockall::automock;
    /// # use mockall_sugar::*;
    /// #[automock]
    /// trait Foo {
    ///     fn foo(&self) -> u32;
    /// }
    ///
    /// let mut m: Mocked<MockFoo> = mock_with(|m: &mut Mocked<MockFoo>| {
    ///     on!(m.foo() => returns 1);
    /// });
    /// Mocked::stub(&mut m, |m| {
    ///     on!(m.foo() => returns 2);
    /// });
    /// assert_eq!(m.foo(), 2);
    /// ```
    pub fn stub<F>(this: &mut Self, configure: F) -> &mut Self
        where F: FnOnce(&mut Self)
    {
        configure(this);
        this
    }

    /// Forget every call counted so far by this mock's verifications.
    ///
    /// # Examples
    /// ```
    /// # use mockall::automock;
    /// # use mockall_sugar::*;
    /// #[automock]
    /// trait Foo {
    ///     fn foo(&self);
    /// }
    ///
    /// let mut m: Mocked<MockFoo> = mock();
    /// verify!(m.foo(), never());
    /// m.foo();
    /// Mocked::clear_invocations(&m);
    /// m.checkpoint();
    /// ```
    pub fn clear_invocations(this: &Self) {
        this.state.clear_invocations();
    }

    #[doc(hidden)]
    pub fn __mockall_sugar_mock(&mut self) -> &mut Self {
        self
    }

    #[doc(hidden)]
    pub fn __mockall_sugar_state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }
}

impl<M> Deref for Mocked<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.mock
    }
}

impl<M> DerefMut for Mocked<M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.mock
    }
}

impl<M: fmt::Debug> fmt::Debug for Mocked<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mocked")
            .field("name", &self.state.name)
            .field("mock", &self.mock)
            .finish()
    }
}

/// The type's name without its module path, but keeping generic arguments.
fn short_type_name<M: ?Sized>() -> String {
    let full = std::any::type_name::<M>();
    let (path, generics) = match full.find('<') {
        Some(i) => full.split_at(i),
        None => (full, "")
    };
    let base = path.rsplit("::").next().unwrap_or(path);
    format!("{}{}", base, generics)
}

/// Create a mock with default settings
pub fn mock<M: Default>() -> Mocked<M> {
    Mocked::new(M::default())
}

/// Create a mock with the given name
pub fn mock_named<M: Default, S: Into<String>>(name: S) -> Mocked<M> {
    Mocked::with_settings(M::default(), with_settings().name(name))
}

/// Create a mock and stub it in one go.
///
/// # Examples
/// ```
/// # use mockall::automock;
/// # use mockall_sugar::*;
/// #[automock]
/// trait Foo {
///     fn foo(&self, x: u32) -> u32;
/// }
///
/// let m = mock_with::<MockFoo, _>(|m| {
///     on!(m.foo(_) => answers |x| x + 1);
/// });
/// assert_eq!(m.foo(1), 2);
/// ```
pub fn mock_with<M, F>(configure: F) -> Mocked<M>
    where M: Default,
          F: FnOnce(&mut Mocked<M>)
{
    mock_with_settings(MockSettings::default(), configure)
}

pub fn mock_with_settings<M, F>(settings: MockSettings, configure: F)
    -> Mocked<M>
    where M: Default,
          F: FnOnce(&mut Mocked<M>)
{
    let mut mocked = Mocked::with_settings(M::default(), settings);
    configure(&mut mocked);
    mocked
}

/// Add stubs to an existing mock.  Same as [`Mocked::stub`].
pub fn stub<M, F>(mocked: &mut Mocked<M>, configure: F) -> &mut Mocked<M>
    where F: FnOnce(&mut Mocked<M>)
{
    Mocked::stub(mocked, configure)
}

/// Same as [`Mocked::clear_invocations`].
pub fn clear_invocations<M>(mocked: &Mocked<M>) {
    Mocked::clear_invocations(mocked)
}
