//! Observable value with change notification and version tracking.
//!
//! [`Observable<T>`] wraps a value in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). When the value changes (by `PartialEq`), live
//! subscribers are notified in registration order. Setting an equal value is
//! a no-op, which gives every stream distinct-until-changed semantics for free.
//!
//! Subscribers are held weakly; the strong side lives in the [`Subscription`]
//! guard returned by [`Observable::subscribe`]. Dropping the guard detaches the
//! callback, and dead entries are pruned lazily on the next notification.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replaces the value and notifies subscribers if it changed.
    ///
    /// Safe to call re-entrantly from subscriber callbacks: no borrow is held
    /// while callbacks run.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutates the value in place; notifies only if the result differs.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value != old {
                inner.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Registers a change callback. The callback is not invoked for the
    /// current value, only for subsequent changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().subscribers.push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Number of subscribers whose guard is still alive.
    #[must_use]
    pub fn live_subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    fn notify(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(|w| w.upgrade())
                .collect()
        };

        if callbacks.is_empty() {
            return;
        }

        let value = self.inner.borrow().value.clone();
        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong `Rc` to the callback, so the
/// observable's weak entry stops upgrading.
#[must_use = "dropping a Subscription detaches its callback"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// An owner's bag of subscriptions.
///
/// Disposing the bag (explicitly or by dropping it) is the owner's
/// "destroyed" signal: every subscription it holds is torn down at once.
#[derive(Debug, Default)]
pub struct Subscriptions {
    held: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self { held: Vec::new() }
    }

    pub fn hold(&mut self, subscription: Subscription) {
        self.held.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Tears down every held subscription. The bag can be reused afterwards.
    pub fn dispose(&mut self) {
        self.held.clear();
    }
}

impl Extend<Subscription> for Subscriptions {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.held.extend(iter);
    }
}

/// Derives an observable from `source` through `f`.
///
/// The derived value is computed immediately and recomputed on every source
/// change. The returned subscription keeps the derivation alive.
pub fn derive<S, T>(
    source: &Observable<S>,
    f: impl Fn(&S) -> T + 'static,
) -> (Observable<T>, Subscription)
where
    S: Clone + PartialEq + 'static,
    T: Clone + PartialEq + 'static,
{
    let derived = Observable::new(source.with(&f));
    let target = derived.clone();
    let subscription = source.subscribe(move |value| target.set(f(value)));
    (derived, subscription)
}

/// Keeps `target` equal to `compute()` whenever any of `sources` changes.
///
/// `compute` is evaluated once up front. Returns one subscription per source.
pub fn combine_into<S, T>(
    sources: &[Observable<S>],
    target: &Observable<T>,
    compute: impl Fn() -> T + 'static,
) -> Vec<Subscription>
where
    S: Clone + PartialEq + 'static,
    T: Clone + PartialEq + 'static,
{
    target.set(compute());
    let compute = Rc::new(compute);
    sources
        .iter()
        .map(|source| {
            let target = target.clone();
            let compute = Rc::clone(&compute);
            source.subscribe(move |_| target.set(compute()))
        })
        .collect()
}
