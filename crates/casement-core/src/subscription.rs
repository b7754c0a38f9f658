//! Subscription lifecycle shared by both binding families.

use crate::events::{EventListener, EventTarget};
use crate::selector::ListenerConfig;
use std::fmt;
use std::rc::Rc;

/// A live binding that releases its resources exactly once.
///
/// Dropping the subscription detaches it, so the handler is released on
/// every exit path including unwinding.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Detach now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    fn release(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Resolve the target, seed a value and attach one listener that feeds `sink`.
///
/// Returns the seed (the value selector applied with no event) together with
/// the subscription. The target is resolved here and nowhere else, so each
/// call observes the window as it is now. The listener only holds the target
/// weakly; the subscription keeps it alive until teardown, which detaches
/// with the same `(type, options)` pair used to attach.
pub fn attach<W, T, V>(
    window: &Rc<W>,
    config: &ListenerConfig<W, T, V>,
    sink: impl Fn(V) + 'static,
) -> (V, Subscription)
where
    W: 'static,
    T: EventTarget + 'static,
    V: 'static,
{
    let target = config.target_selector().resolve(window);
    let seed = config.value_selector().select(&target, None);

    let event_type = config.event_type().to_owned();
    let options = config.listener_options();

    let listener = {
        let target = Rc::downgrade(&target);
        let value_selector = config.value_selector().clone();
        let event_type = event_type.clone();
        EventListener::new(move |event: &T::Event| {
            let Some(target) = target.upgrade() else {
                return;
            };
            tracing::trace!("Handling `{}` event", event_type);
            sink(value_selector.select(&target, Some(event)));
        })
    };

    target.add_event_listener(&event_type, &listener, options);
    tracing::debug!("Attached `{}` listener {}", event_type, listener.id());

    let subscription = Subscription::new(move || {
        target.remove_event_listener(&event_type, &listener, options);
        tracing::debug!("Detached `{}` listener {}", event_type, listener.id());
    });

    (seed, subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ListenerOptions, ListenerRegistry};
    use crate::selector::{TargetSelector, ValueSelector};
    use std::cell::{Cell, RefCell};

    struct Pane {
        offset: Cell<i32>,
        listeners: ListenerRegistry<i32>,
    }

    impl Pane {
        fn new(offset: i32) -> Rc<Self> {
            Rc::new(Self {
                offset: Cell::new(offset),
                listeners: ListenerRegistry::new(),
            })
        }

        fn scroll(&self, offset: i32) {
            self.offset.set(offset);
            self.listeners.dispatch("scroll", &offset);
        }
    }

    impl EventTarget for Pane {
        type Event = i32;

        fn add_event_listener(&self, event_type: &str, listener: &EventListener<i32>, options: ListenerOptions) {
            self.listeners.add(event_type, listener, options);
        }

        fn remove_event_listener(&self, event_type: &str, listener: &EventListener<i32>, options: ListenerOptions) {
            self.listeners.remove(event_type, listener, options);
        }
    }

    fn offset_config() -> ListenerConfig<Pane, Pane, i32> {
        ListenerConfig::on_window(
            "scroll",
            ValueSelector::new(|pane: &Pane, event: Option<&i32>| {
                event.copied().unwrap_or_else(|| pane.offset.get())
            }),
        )
    }

    #[test]
    fn seed_reads_target_before_any_event() {
        let pane = Pane::new(42);
        let (seed, subscription) = attach(&pane, &offset_config(), |_| {});

        assert_eq!(seed, 42);
        assert_eq!(pane.listeners.count("scroll"), 1);
        drop(subscription);
        assert!(pane.listeners.is_empty());
    }

    #[test]
    fn events_feed_the_sink_in_dispatch_order() {
        let pane = Pane::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);

        let (_, subscription) = attach(&pane, &offset_config(), move |v| seen_clone.borrow_mut().push(v));
        for offset in [10, 20, 5] {
            pane.scroll(offset);
        }

        assert_eq!(*seen.borrow(), vec![10, 20, 5]);
        subscription.unsubscribe();

        pane.scroll(99);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn detach_uses_attach_options() {
        let pane = Pane::new(0);
        let config = offset_config().options(true);

        let (_, subscription) = attach(&pane, &config, |_| {});
        assert_eq!(pane.listeners.len(), 1);

        subscription.unsubscribe();
        assert!(pane.listeners.is_empty());
    }

    #[test]
    fn target_selector_runs_per_attach() {
        let pane = Pane::new(0);
        let resolutions = Rc::new(Cell::new(0));
        let resolutions_clone = Rc::clone(&resolutions);
        let target = TargetSelector::new(move |pane: &Rc<Pane>| {
            resolutions_clone.set(resolutions_clone.get() + 1);
            Rc::clone(pane)
        });
        let config = ListenerConfig::on_target(
            "scroll",
            target,
            ValueSelector::from_target(|pane: &Pane| pane.offset.get()),
        );

        let (_, first) = attach(&pane, &config, |_| {});
        let (_, second) = attach(&pane, &config, |_| {});
        assert_eq!(resolutions.get(), 2);
        assert_eq!(pane.listeners.len(), 2);

        drop((first, second));
        assert!(pane.listeners.is_empty());
    }

    #[test]
    fn empty_subscription_is_inactive() {
        let subscription = Subscription::empty();
        assert!(!subscription.is_active());
        subscription.unsubscribe();
    }
}
