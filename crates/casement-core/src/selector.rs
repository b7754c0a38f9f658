//! Target and value selectors, and the listener configuration built from them.
//!
//! Selectors compare by identity: two selectors are equal only when one was
//! cloned from the other. A binding re-subscribes whenever a selector's
//! identity changes between renders, so selectors must be created once and
//! reused (e.g. with `use_memo`) rather than rebuilt on every render.

use crate::events::{EventTarget, ListenerOptions};
use std::fmt;
use std::rc::Rc;

fn same_rc<A: ?Sized, B: ?Sized>(a: &Rc<A>, b: &Rc<B>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Maps the global window-like object to the concrete event target.
pub struct TargetSelector<W, T> {
    select: Rc<dyn Fn(&Rc<W>) -> Rc<T>>,
    identity: bool,
}

impl<W: 'static> TargetSelector<W, W> {
    /// The window itself. All identity selectors compare equal.
    pub fn window() -> Self {
        Self {
            select: Rc::new(|window: &Rc<W>| Rc::clone(window)),
            identity: true,
        }
    }
}

impl<W, T> TargetSelector<W, T> {
    pub fn new(select: impl Fn(&Rc<W>) -> Rc<T> + 'static) -> Self {
        Self {
            select: Rc::new(select),
            identity: false,
        }
    }

    /// Resolve the target for `window`.
    pub fn resolve(&self, window: &Rc<W>) -> Rc<T> {
        (self.select)(window)
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }
}

impl<W, T> Clone for TargetSelector<W, T> {
    fn clone(&self) -> Self {
        Self {
            select: Rc::clone(&self.select),
            identity: self.identity,
        }
    }
}

impl<W, T> PartialEq for TargetSelector<W, T> {
    fn eq(&self, other: &Self) -> bool {
        (self.identity && other.identity) || same_rc(&self.select, &other.select)
    }
}

impl<W, T> fmt::Debug for TargetSelector<W, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identity {
            f.write_str("TargetSelector(window)")
        } else {
            write!(f, "TargetSelector({:p})", Rc::as_ptr(&self.select))
        }
    }
}

/// Derives a value from a target, optionally looking at the triggering event.
///
/// Called with `None` to seed a value before any event has fired, and with
/// `Some(event)` for each event. It must be a plain read.
pub struct ValueSelector<T: EventTarget, V> {
    select: Rc<dyn Fn(&T, Option<&T::Event>) -> V>,
}

impl<T: EventTarget, V> ValueSelector<T, V> {
    pub fn new(select: impl Fn(&T, Option<&T::Event>) -> V + 'static) -> Self {
        Self {
            select: Rc::new(select),
        }
    }

    /// A selector that only reads the target.
    pub fn from_target(select: impl Fn(&T) -> V + 'static) -> Self {
        Self::new(move |target, _| select(target))
    }

    pub fn select(&self, target: &T, event: Option<&T::Event>) -> V {
        (self.select)(target, event)
    }
}

impl<T: EventTarget, V> Clone for ValueSelector<T, V> {
    fn clone(&self) -> Self {
        Self {
            select: Rc::clone(&self.select),
        }
    }
}

impl<T: EventTarget, V> PartialEq for ValueSelector<T, V> {
    fn eq(&self, other: &Self) -> bool {
        same_rc(&self.select, &other.select)
    }
}

impl<T: EventTarget, V> fmt::Debug for ValueSelector<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueSelector({:p})", Rc::as_ptr(&self.select))
    }
}

/// What to listen on and how to derive a value from it.
///
/// # Example
///
/// ```ignore
/// let scroll_y = ValueSelector::from_target(|w: &HostWindow| w.scroll_y());
/// let config = ListenerConfig::on_window("scroll", scroll_y)
///     .fallback(0.0)
///     .options(ListenerOptions::passive());
/// ```
pub struct ListenerConfig<W, T: EventTarget, V> {
    event_type: String,
    target: TargetSelector<W, T>,
    value: ValueSelector<T, V>,
    fallback: Option<V>,
    options: ListenerOptions,
}

impl<W: EventTarget + 'static, V> ListenerConfig<W, W, V> {
    /// Listen on the window itself.
    pub fn on_window(event_type: impl Into<String>, value: ValueSelector<W, V>) -> Self {
        Self::on_target(event_type, TargetSelector::window(), value)
    }
}

impl<W, T: EventTarget, V> ListenerConfig<W, T, V> {
    /// Listen on whatever `target` resolves to.
    pub fn on_target(
        event_type: impl Into<String>,
        target: TargetSelector<W, T>,
        value: ValueSelector<T, V>,
    ) -> Self {
        let event_type = event_type.into();
        assert!(!event_type.is_empty(), "casement error: event type must not be empty");
        Self {
            event_type,
            target,
            value,
            fallback: None,
            options: ListenerOptions::default(),
        }
    }

    /// Value used where no live window exists (server rendering).
    pub fn fallback(mut self, value: V) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Options forwarded verbatim to attach and detach.
    pub fn options(mut self, options: impl Into<ListenerOptions>) -> Self {
        self.options = options.into();
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target_selector(&self) -> &TargetSelector<W, T> {
        &self.target
    }

    pub fn value_selector(&self) -> &ValueSelector<T, V> {
        &self.value
    }

    pub fn fallback_value(&self) -> Option<&V> {
        self.fallback.as_ref()
    }

    pub fn listener_options(&self) -> ListenerOptions {
        self.options
    }

    /// The inputs whose identity decides when a subscription is re-established.
    pub fn key(&self) -> SubscriptionKey<W, T, V> {
        SubscriptionKey {
            event_type: self.event_type.clone(),
            target: self.target.clone(),
            value: self.value.clone(),
            options: self.options,
        }
    }
}

impl<W, T: EventTarget, V: Clone> Clone for ListenerConfig<W, T, V> {
    fn clone(&self) -> Self {
        Self {
            event_type: self.event_type.clone(),
            target: self.target.clone(),
            value: self.value.clone(),
            fallback: self.fallback.clone(),
            options: self.options,
        }
    }
}

impl<W, T: EventTarget, V: fmt::Debug> fmt::Debug for ListenerConfig<W, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerConfig")
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("value", &self.value)
            .field("fallback", &self.fallback)
            .field("options", &self.options)
            .finish()
    }
}

/// Identity of a subscription: event type, both selectors and the options.
///
/// The fallback is not part of it.
pub struct SubscriptionKey<W, T: EventTarget, V> {
    event_type: String,
    target: TargetSelector<W, T>,
    value: ValueSelector<T, V>,
    options: ListenerOptions,
}

impl<W, T: EventTarget, V> Clone for SubscriptionKey<W, T, V> {
    fn clone(&self) -> Self {
        Self {
            event_type: self.event_type.clone(),
            target: self.target.clone(),
            value: self.value.clone(),
            options: self.options,
        }
    }
}

impl<W, T: EventTarget, V> PartialEq for SubscriptionKey<W, T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.event_type == other.event_type
            && self.target == other.target
            && self.value == other.value
            && self.options == other.options
    }
}

impl<W, T: EventTarget, V> fmt::Debug for SubscriptionKey<W, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionKey")
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("value", &self.value)
            .field("options", &self.options)
            .finish()
    }
}
