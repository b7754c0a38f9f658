//! The external store behind the synchronized binding.

use crate::events::EventTarget;
use crate::hooks::ExternalStore;
use crate::host;
use crate::selector::ListenerConfig;
use crate::subscription::{attach, Subscription};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Caches the latest value derived from a window listener.
///
/// Every reader of one store reads the same cache. Only the store's own
/// listener writes to it.
pub struct ListenerStore<W, T: EventTarget, V> {
    config: ListenerConfig<W, T, V>,
    cache: Rc<RefCell<Option<V>>>,
}

impl<W, T, V> ListenerStore<W, T, V>
where
    W: 'static,
    T: EventTarget + 'static,
    V: Clone + 'static,
{
    pub fn new(config: ListenerConfig<W, T, V>) -> Self {
        Self {
            config,
            cache: Rc::new(RefCell::new(None)),
        }
    }

    pub fn config(&self) -> &ListenerConfig<W, T, V> {
        &self.config
    }

    /// The cached value, if anything has been read yet.
    pub fn cached(&self) -> Option<V> {
        self.cache.borrow().clone()
    }

    /// Read the target as it is now, if a window is installed.
    fn live_read(&self) -> Option<V> {
        let window = host::window::<W>()?;
        let target = self.config.target_selector().resolve(&window);
        Some(self.config.value_selector().select(&target, None))
    }
}

impl<W, T, V> ExternalStore for ListenerStore<W, T, V>
where
    W: 'static,
    T: EventTarget + 'static,
    V: Clone + PartialEq + 'static,
{
    type Snapshot = Option<V>;

    /// Resolve the target, seed the cache and attach the listener, all before
    /// returning, so the next snapshot reflects the target as it is now.
    ///
    /// Tearing the subscription down discards the cached value.
    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        let window = host::require_window::<W>(self.config.event_type());

        let cache = Rc::clone(&self.cache);
        let (seed, subscription) = attach(&window, &self.config, move |value| {
            *cache.borrow_mut() = Some(value);
            on_change();
        });
        *self.cache.borrow_mut() = Some(seed);

        let cache = Rc::clone(&self.cache);
        Subscription::new(move || {
            subscription.unsubscribe();
            cache.borrow_mut().take();
        })
    }

    fn snapshot(&self) -> Option<V> {
        let empty = self.cache.borrow().is_none();
        if empty && let Some(value) = self.live_read() {
            *self.cache.borrow_mut() = Some(value);
        }
        self.cached().or_else(|| self.config.fallback_value().cloned())
    }

    fn server_snapshot(&self) -> Option<V> {
        self.config.fallback_value().cloned()
    }
}

impl<W, T: EventTarget, V: fmt::Debug> fmt::Debug for ListenerStore<W, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerStore")
            .field("config", &self.config)
            .field("cache", &*self.cache.borrow())
            .finish()
    }
}
