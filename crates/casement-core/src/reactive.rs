//! Reactive primitives: signals and observers.
//!
//! A [`Signal`] holds a value and remembers which observers read it. An
//! [`Observer`] wraps a computation (a component render, in practice) and is
//! notified whenever one of the signals it read changes.
//!
//! # Example
//!
//! ```ignore
//! use casement_core::reactive::*;
//!
//! let width = Signal::new(800.0);
//! let observer = Observer::new(|| println!("width changed"));
//!
//! observer.track(|| width.get());
//! width.set(1024.0); // Prints: "width changed"
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

// ============================================================================
// Runtime Context
// ============================================================================

// Global runtime state for tracking reactive subscriptions.
//
// The runtime maintains:
// - A stack of observers currently tracking reads
// - A queue of observers waiting to be notified
// - Batching depth
thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
    static OBSERVERS: RefCell<HashMap<ObserverId, Rc<ObserverInner>>> = RefCell::new(HashMap::new());
}

struct Runtime {
    /// Stack of currently tracking observers
    observer_stack: Vec<ObserverId>,

    /// Observers that need to be notified
    pending: Vec<ObserverId>,

    /// Nesting depth of `batch` calls
    batch_depth: usize,

    /// Counter for generating unique IDs
    next_id: usize,
}

impl Runtime {
    fn new() -> Self {
        Self {
            observer_stack: Vec::new(),
            pending: Vec::new(),
            batch_depth: 0,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Unique identifier for an observer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObserverId(usize);

// ============================================================================
// Signal
// ============================================================================

/// A reactive container that holds a value and notifies observers when it changes.
///
/// Reading a signal inside [`Observer::track`] subscribes that observer.
/// Setting the signal notifies every subscribed observer that is still alive.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<HashSet<ObserverId>>,
}

impl<T> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                subscribers: RefCell::new(HashSet::new()),
            }),
        }
    }

    /// Subscribe the current observer (if any) to this signal.
    fn track(&self) {
        RUNTIME.with(|rt| {
            if let Some(&observer) = rt.borrow().observer_stack.last() {
                self.inner.subscribers.borrow_mut().insert(observer);
            }
        });
    }

    /// Queue every live subscriber, dropping the ones that were disposed.
    fn notify(&self) {
        let subscribers: Vec<_> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|id| is_alive(*id));
            subscribers.iter().copied().collect()
        };

        let flush = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            for observer in subscribers {
                if !rt.pending.contains(&observer) {
                    rt.pending.push(observer);
                }
            }
            rt.batch_depth == 0
        });

        if flush {
            flush_pending();
        }
    }

    /// Get a reference to the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Set the signal to a new value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Update the signal's value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    /// Number of observers currently subscribed (for debugging).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: Clone> Signal<T> {
    /// Get the current value of the signal.
    ///
    /// If called inside [`Observer::track`], this subscribes the observer.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Read the current value without subscribing anyone.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ============================================================================
// Observer
// ============================================================================

struct ObserverInner {
    on_notify: Box<dyn Fn()>,
}

/// A subscriber that is notified when any signal read inside [`track`](Self::track) changes.
///
/// Dropping the observer (or calling [`dispose`](Self::dispose)) stops all
/// further notifications.
pub struct Observer {
    id: ObserverId,
}

impl Observer {
    /// Create an observer that runs `on_notify` whenever a tracked signal changes.
    pub fn new(on_notify: impl Fn() + 'static) -> Self {
        let id = RUNTIME.with(|rt| rt.borrow_mut().next_id());
        OBSERVERS.with(|observers| {
            observers.borrow_mut().insert(
                id,
                Rc::new(ObserverInner {
                    on_notify: Box::new(on_notify),
                }),
            );
        });
        Self { id }
    }

    /// The observer's id.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Run `f`, subscribing this observer to every signal it reads.
    pub fn track<R>(&self, f: impl FnOnce() -> R) -> R {
        RUNTIME.with(|rt| rt.borrow_mut().observer_stack.push(self.id));
        let result = f();
        RUNTIME.with(|rt| {
            rt.borrow_mut().observer_stack.pop();
        });
        result
    }

    /// Stop receiving notifications.
    pub fn dispose(&self) {
        OBSERVERS.with(|observers| {
            observers.borrow_mut().remove(&self.id);
        });
    }

    /// Whether the observer still receives notifications.
    pub fn is_alive(&self) -> bool {
        is_alive(self.id)
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("id", &self.id).finish()
    }
}

fn is_alive(id: ObserverId) -> bool {
    OBSERVERS.with(|observers| observers.borrow().contains_key(&id))
}

/// Notify all pending observers, in the order they were queued.
fn flush_pending() {
    loop {
        let next = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            if rt.pending.is_empty() {
                None
            } else {
                Some(rt.pending.remove(0))
            }
        });

        let Some(id) = next else { break };

        // Clone out of the map so the callback may create or drop observers.
        let observer = OBSERVERS.with(|observers| observers.borrow().get(&id).cloned());
        if let Some(observer) = observer {
            (observer.on_notify)();
        }
    }
}

// ============================================================================
// Batching
// ============================================================================

/// Batch multiple signal updates so each observer is notified once.
///
/// Batches nest; observers are notified when the outermost batch ends.
///
/// # Example
///
/// ```ignore
/// let width = Signal::new(0.0);
/// let height = Signal::new(0.0);
///
/// batch(|| {
///     width.set(1024.0);
///     height.set(768.0);
///     // Observers are notified once, after this batch
/// });
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    RUNTIME.with(|rt| rt.borrow_mut().batch_depth += 1);

    let result = f();

    let outermost = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.batch_depth -= 1;
        rt.batch_depth == 0
    });

    if outermost {
        flush_pending();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_observer() -> (Observer, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let observer = Observer::new(move || count_clone.set(count_clone.get() + 1));
        (observer, count)
    }

    #[test]
    fn signal_basic() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(5);
        assert_eq!(signal.get(), 5);

        signal.update(|n| *n += 1);
        assert_eq!(signal.get(), 6);
    }

    #[test]
    fn observer_notified_for_tracked_reads() {
        let width = Signal::new(800);
        let (observer, notified) = counting_observer();

        let seen = observer.track(|| width.get());
        assert_eq!(seen, 800);
        assert_eq!(notified.get(), 0);

        width.set(1024);
        assert_eq!(notified.get(), 1);

        width.set(1280);
        assert_eq!(notified.get(), 2);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let width = Signal::new(800);
        let (observer, notified) = counting_observer();

        observer.track(|| width.get_untracked());
        width.set(1024);

        assert_eq!(notified.get(), 0);
        assert_eq!(width.subscriber_count(), 0);
    }

    #[test]
    fn disposed_observer_is_not_notified() {
        let width = Signal::new(800);
        let (observer, notified) = counting_observer();

        observer.track(|| width.get());
        observer.dispose();
        assert!(!observer.is_alive());

        width.set(1024);
        assert_eq!(notified.get(), 0);
        assert_eq!(width.subscriber_count(), 0);
    }

    #[test]
    fn batch_notifies_once() {
        let width = Signal::new(0);
        let height = Signal::new(0);
        let (observer, notified) = counting_observer();

        observer.track(|| {
            let _ = width.get();
            let _ = height.get();
        });

        batch(|| {
            width.set(1024);
            batch(|| height.set(768));
            width.set(1280);
            assert_eq!(notified.get(), 0);
        });

        assert_eq!(notified.get(), 1);
        assert_eq!(width.get_untracked(), 1280);
    }
}
