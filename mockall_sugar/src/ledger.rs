// vim: tw=80
//! Which stub or verification handles a call.
//!
//! Every `on!` and `verify!` becomes one Mockall expectation, and registers its
//! argument matcher here, keyed by method.  When a call arrives, each
//! expectation consults the ledger before accepting it:
//!
//! * A stub accepts the call only if no newer stub of the same method also
//!   matches it, so the most recent matching stub answers.
//! * A verification accepts the call only if no stub matches it and no newer
//!   verification does.  It then answers with its own verb, or the default.
//!
//! Whichever expectation accepts the call, every verification whose matcher
//! matches it counts it.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    mem,
    sync::{Arc, Mutex},
    thread
};

use crate::{
    lock,
    mocked::MockState,
    verification::Tally,
    Verification,
    VerificationMode
};

type Key = (&'static str, TypeId);

/// The live stubs and verifications of one method.
///
/// `E` is the erased matcher type, `dyn Fn(&A0, &A1, ..) -> bool`.
struct Ledger<E: ?Sized> {
    stubs: Vec<(usize, Arc<E>)>,
    verifications: Vec<(usize, Arc<E>, Arc<Tally>)>
}

impl<E: ?Sized> Clone for Ledger<E> {
    fn clone(&self) -> Self {
        Ledger {
            stubs: self.stubs.clone(),
            verifications: self.verifications.clone()
        }
    }
}

impl<E: ?Sized> Default for Ledger<E> {
    fn default() -> Self {
        Ledger {
            stubs: Vec::new(),
            verifications: Vec::new()
        }
    }
}

/// Every method's [`Ledger`], type-erased.
#[derive(Default)]
pub(crate) struct Ledgers(Mutex<HashMap<Key, Box<dyn Any + Send + Sync>>>);

impl Ledgers {
    fn with<E, R, F>(&self, method: &'static str, f: F) -> R
        where E: ?Sized + Send + Sync + 'static,
              F: FnOnce(&mut Ledger<E>) -> R
    {
        let mut ledgers = lock(&self.0);
        let ledger = ledgers.entry((method, TypeId::of::<E>()))
            .or_insert_with(|| Box::new(Ledger::<E>::default()));
        f((**ledger).downcast_mut::<Ledger<E>>()
            .expect("ledgers are keyed by their own type"))
    }
}

/// One `on!` or `verify!`, shared by the closures of its Mockall expectation.
#[doc(hidden)]
pub struct Entry<E: ?Sized + Send + Sync + 'static> {
    state: Arc<MockState>,
    method: &'static str,
    id: usize,
    matcher: Arc<E>,
    /// `Some` for a verification
    tally: Option<Arc<Tally>>,
    /// Verifications that will count the call, if this entry handles it
    staged: Mutex<Vec<Arc<Tally>>>
}

impl<E: ?Sized + Send + Sync + 'static> Entry<E> {
    fn new(
        state: &Arc<MockState>,
        method: &'static str,
        id: usize,
        matcher: Arc<E>,
        tally: Option<Arc<Tally>>) -> Arc<Self>
    {
        Arc::new(Entry {
            state: Arc::clone(state),
            method,
            id,
            matcher,
            tally,
            staged: Mutex::new(Vec::new())
        })
    }

    /// Should this entry handle the call?
    ///
    /// `accepts` applies a matcher to the call's arguments.
    pub fn selects<P>(&self, accepts: P) -> bool
        where P: Fn(&E) -> bool
    {
        if !accepts(&*self.matcher) {
            return false;
        }
        // Matchers run without the lock held
        let ledger = self.state.ledgers.with(self.method,
            |ledger: &mut Ledger<E>| ledger.clone());
        let shadowed = match self.tally {
            None => ledger.stubs.iter()
                .any(|(id, m)| *id > self.id && accepts(&**m)),
            Some(_) => {
                ledger.stubs.iter().any(|(_, m)| accepts(&**m)) ||
                    ledger.verifications.iter()
                        .any(|(id, m, _)| *id > self.id && accepts(&**m))
            }
        };
        if shadowed {
            return false;
        }
        *lock(&self.staged) = ledger.verifications.iter()
            .filter(|(_, m, _)| accepts(&**m))
            .map(|(_, _, tally)| Arc::clone(tally))
            .collect();
        true
    }

    /// Record a call handled by this entry
    pub fn commit(&self) {
        let hits = mem::take(&mut *lock(&self.staged));
        self.state.invoked(self.method);
        for tally in hits {
            tally.hit();
        }
    }
}

impl<E: ?Sized + Send + Sync + 'static> Drop for Entry<E> {
    fn drop(&mut self) {
        let id = self.id;
        self.state.ledgers.with(self.method, |ledger: &mut Ledger<E>| {
            ledger.stubs.retain(|(i, _)| *i != id);
            ledger.verifications.retain(|(i, _, _)| *i != id);
        });
        if let Some(tally) = &self.tally {
            if !thread::panicking() {
                tally.check();
            }
        }
    }
}

impl MockState {
    /// Register the matcher of an `on!`
    #[doc(hidden)]
    pub fn stub<E>(self: &Arc<Self>, method: &'static str, call: &str,
        matcher: Arc<E>) -> Arc<Entry<E>>
        where E: ?Sized + Send + Sync + 'static
    {
        let id = self.next_id();
        self.ledgers.with(method, |ledger: &mut Ledger<E>| {
            ledger.stubs.push((id, Arc::clone(&matcher)))
        });
        self.stubbed(call);
        Entry::new(self, method, id, matcher, None)
    }

    /// Register the matcher of a `verify!`
    ///
    /// `recorder` commits the argument captures of the verification's
    /// matchers.
    #[doc(hidden)]
    pub fn verification<E, R>(
        self: &Arc<Self>,
        method: &'static str,
        call: &str,
        mode: VerificationMode,
        matcher: Arc<E>,
        recorder: R) -> (Arc<Entry<E>>, Verification)
        where E: ?Sized + Send + Sync + 'static,
              R: Fn() + Send + Sync + 'static
    {
        if self.stub_only {
            panic!("{} is a stub_only() mock, so its calls can't be verified",
                self.name);
        }
        let tally = Arc::new(Tally::new(&self.name, call, mode,
            Box::new(recorder)));
        self.track(&tally);
        let id = self.next_id();
        self.ledgers.with(method, |ledger: &mut Ledger<E>| {
            ledger.verifications.push((id, Arc::clone(&matcher),
                Arc::clone(&tally)))
        });
        self.expecting(call, &mode);
        let verification = Verification::new(Arc::clone(&tally));
        (Entry::new(self, method, id, matcher, Some(tally)), verification)
    }
}
