//! Event target capability and listener bookkeeping.
//!
//! Anything that can attach and detach listeners implements [`EventTarget`].
//! Hosts that need to store listeners themselves can embed a
//! [`ListenerRegistry`], which implements the add/remove/dispatch rules
//! browsers use.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique identifier for an event listener.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(pub usize);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Global counter for generating unique listener IDs.
static NEXT_LISTENER_ID: AtomicUsize = AtomicUsize::new(0);

fn next_listener_id() -> ListenerId {
    ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Flags forwarded verbatim to attach and detach.
///
/// `From<bool>` is the capture shorthand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
    pub once: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self {
            capture: true,
            ..Self::default()
        }
    }

    pub fn passive() -> Self {
        Self {
            passive: true,
            ..Self::default()
        }
    }

    pub fn once() -> Self {
        Self {
            once: true,
            ..Self::default()
        }
    }
}

impl From<bool> for ListenerOptions {
    fn from(capture: bool) -> Self {
        Self {
            capture,
            ..Self::default()
        }
    }
}

/// A callback attached to an event target.
///
/// Two listeners are the same listener only if one was cloned from the other,
/// which is what removal matches on.
pub struct EventListener<E> {
    id: ListenerId,
    callback: Rc<dyn Fn(&E)>,
}

impl<E> EventListener<E> {
    /// Wrap a callback in a new listener with a fresh identity.
    pub fn new(callback: impl Fn(&E) + 'static) -> Self {
        Self {
            id: next_listener_id(),
            callback: Rc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback.
    pub fn handle_event(&self, event: &E) {
        (self.callback)(event)
    }
}

impl<E> Clone for EventListener<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<E> PartialEq for EventListener<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for EventListener<E> {}

impl<E> fmt::Debug for EventListener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventListener({})", self.id)
    }
}

/// The add/remove-event-listener capability.
///
/// Implementations must treat `(event_type, listener, options.capture)` as
/// the identity of a registration, so removal with the pair used at attach
/// time always detaches the listener.
pub trait EventTarget {
    /// The event object passed to listeners.
    type Event: 'static;

    fn add_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<Self::Event>,
        options: ListenerOptions,
    );

    fn remove_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<Self::Event>,
        options: ListenerOptions,
    );
}

impl<T: EventTarget + ?Sized> EventTarget for Rc<T> {
    type Event = T::Event;

    fn add_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<Self::Event>,
        options: ListenerOptions,
    ) {
        (**self).add_event_listener(event_type, listener, options)
    }

    fn remove_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<Self::Event>,
        options: ListenerOptions,
    ) {
        (**self).remove_event_listener(event_type, listener, options)
    }
}

struct Registration<E> {
    event_type: String,
    listener: EventListener<E>,
    options: ListenerOptions,
}

impl<E> Registration<E> {
    fn matches(&self, event_type: &str, listener: &EventListener<E>, capture: bool) -> bool {
        self.event_type == event_type
            && self.listener == *listener
            && self.options.capture == capture
    }
}

/// Listener storage for host event targets.
///
/// - Registering the same `(type, listener, capture)` twice is a no-op.
/// - `once` listeners are removed before they run.
/// - Dispatch works on a snapshot, so listeners may add or remove listeners
///   while an event is being delivered.
pub struct ListenerRegistry<E> {
    registrations: RefCell<Vec<Registration<E>>>,
}

impl<E> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            registrations: RefCell::new(Vec::new()),
        }
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add(&self, event_type: &str, listener: &EventListener<E>, options: ListenerOptions) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        if registrations
            .iter()
            .any(|r| r.matches(event_type, listener, options.capture))
        {
            return false;
        }
        registrations.push(Registration {
            event_type: event_type.to_owned(),
            listener: listener.clone(),
            options,
        });
        true
    }

    /// Remove a listener. Returns `false` if nothing matched.
    pub fn remove(&self, event_type: &str, listener: &EventListener<E>, options: ListenerOptions) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|r| !r.matches(event_type, listener, options.capture));
        registrations.len() != before
    }

    /// Deliver `event` to every listener registered for `event_type`.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event_type: &str, event: &E) -> usize {
        let targets: Vec<EventListener<E>> = {
            let mut registrations = self.registrations.borrow_mut();
            let targets = registrations
                .iter()
                .filter(|r| r.event_type == event_type)
                .map(|r| r.listener.clone())
                .collect();
            registrations.retain(|r| !(r.event_type == event_type && r.options.once));
            targets
        };

        for listener in &targets {
            listener.handle_event(event);
        }
        targets.len()
    }

    /// Number of listeners registered for `event_type`.
    pub fn count(&self, event_type: &str) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.registrations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.registrations.borrow_mut().clear();
    }
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ListenerRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}
