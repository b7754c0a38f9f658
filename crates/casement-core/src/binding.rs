//! Hooks that bind a window listener's latest value into render state.
//!
//! Two families implement the same contract:
//!
//! - [`use_window_listener`] keeps the value in hook state and subscribes
//!   from an effect. Simple, but during a render different components can
//!   observe different values if an event lands mid-render.
//! - [`use_sync_window_listener`] keeps the value in a [`ListenerStore`] read
//!   through [`use_sync_external_store`], so every reader in a render sees the
//!   same value, and server renders see the fallback.
//!
//! Both are available generically through the [`Binding`] trait.
//!
//! # Example
//!
//! ```ignore
//! fn scroll_indicator(scroll_y: &ValueSelector<HostWindow, f64>) -> String {
//!     let config = ListenerConfig::on_window("scroll", scroll_y.clone()).fallback(0.0);
//!     let offset = use_sync_window_listener(config);
//!     format!("<div data-offset=\"{:?}\"></div>", offset)
//! }
//! ```

use crate::events::EventTarget;
use crate::hooks::{use_effect_cleanup, use_memo, use_state, use_sync_external_store};
use crate::host;
use crate::selector::ListenerConfig;
use crate::store::ListenerStore;
use crate::subscription::attach;
use std::rc::Rc;

/// A strategy for publishing a listener's value to render state.
pub trait Binding {
    /// Subscribe per `config` and return the latest value, or the fallback
    /// where none is available.
    fn bind<W, T, V>(config: ListenerConfig<W, T, V>) -> Option<V>
    where
        W: 'static,
        T: EventTarget + 'static,
        V: Clone + PartialEq + 'static;
}

/// Local state updated from an effect-managed subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateBinding;

/// A shared store read through [`use_sync_external_store`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncBinding;

impl Binding for StateBinding {
    fn bind<W, T, V>(config: ListenerConfig<W, T, V>) -> Option<V>
    where
        W: 'static,
        T: EventTarget + 'static,
        V: Clone + PartialEq + 'static,
    {
        use_window_listener(config)
    }
}

impl Binding for SyncBinding {
    fn bind<W, T, V>(config: ListenerConfig<W, T, V>) -> Option<V>
    where
        W: 'static,
        T: EventTarget + 'static,
        V: Clone + PartialEq + 'static,
    {
        use_sync_window_listener(config)
    }
}

/// Bind a listener's latest value through local state.
///
/// Renders the fallback until the first commit. The subscription is made
/// at commit: the target is resolved, the value is seeded from it and
/// published, and the listener is attached. Each event publishes a new value
/// and schedules a re-render. The subscription is re-established whenever the
/// event type, either selector or the options change identity.
pub fn use_window_listener<W, T, V>(config: ListenerConfig<W, T, V>) -> Option<V>
where
    W: 'static,
    T: EventTarget + 'static,
    V: Clone + 'static,
{
    let (value, set_value) = use_state(|| config.fallback_value().cloned());

    let key = config.key();
    use_effect_cleanup(
        move || {
            let window = host::require_window::<W>(config.event_type());

            let publish = set_value.clone();
            let (seed, subscription) = attach(&window, &config, move |value| publish(Some(value)));
            set_value(Some(seed));

            move || subscription.unsubscribe()
        },
        key,
    );

    value
}

/// Bind a listener's latest value through a shared external store.
///
/// - Server renders return the fallback, whatever has been cached.
/// - The first client render reads the target live, before anything is
///   subscribed.
/// - Re-renders happen only when the value actually changes, and never
///   mix old and new values within one render.
pub fn use_sync_window_listener<W, T, V>(config: ListenerConfig<W, T, V>) -> Option<V>
where
    W: 'static,
    T: EventTarget + 'static,
    V: Clone + PartialEq + 'static,
{
    let key = config.key();
    let store = use_memo(move || Rc::new(ListenerStore::new(config)), key);
    use_sync_external_store(store)
}

/// Former name of [`use_sync_window_listener`].
#[deprecated(note = "renamed to `use_sync_window_listener`")]
pub fn use_sync_external_store_window_listener<W, T, V>(config: ListenerConfig<W, T, V>) -> Option<V>
where
    W: 'static,
    T: EventTarget + 'static,
    V: Clone + PartialEq + 'static,
{
    use_sync_window_listener(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventListener, ListenerOptions, ListenerRegistry};
    use crate::root::{render_on_server, Root};
    use crate::selector::{TargetSelector, ValueSelector};
    use std::cell::Cell;

    /// Scroll event carrying the modifier state at dispatch time.
    struct ScrollEvent {
        shift: bool,
    }

    struct Viewport {
        scroll_y: Cell<f64>,
        listeners: ListenerRegistry<ScrollEvent>,
    }

    impl Viewport {
        fn install(scroll_y: f64) -> Rc<Self> {
            let viewport = Rc::new(Self {
                scroll_y: Cell::new(scroll_y),
                listeners: ListenerRegistry::new(),
            });
            host::install_window(Rc::clone(&viewport));
            viewport
        }

        fn scroll_to(&self, y: f64) {
            self.scroll_y.set(y);
            self.listeners.dispatch("scroll", &ScrollEvent { shift: false });
        }
    }

    impl EventTarget for Viewport {
        type Event = ScrollEvent;

        fn add_event_listener(&self, event_type: &str, listener: &EventListener<ScrollEvent>, options: ListenerOptions) {
            self.listeners.add(event_type, listener, options);
        }

        fn remove_event_listener(&self, event_type: &str, listener: &EventListener<ScrollEvent>, options: ListenerOptions) {
            self.listeners.remove(event_type, listener, options);
        }
    }

    fn scroll_y() -> ValueSelector<Viewport, f64> {
        ValueSelector::from_target(|viewport: &Viewport| viewport.scroll_y.get())
    }

    #[test]
    fn state_binding_seeds_after_commit_and_follows_events() {
        let viewport = Viewport::install(120.0);
        let selector = scroll_y();
        let root = Root::new(move || use_window_listener(ListenerConfig::on_window("scroll", selector.clone())));

        // Fallback until the effect has run
        assert_eq!(root.render(), None);
        assert_eq!(root.flush(), Some(Some(120.0)));

        viewport.scroll_to(900.0);
        assert_eq!(root.flush(), Some(Some(900.0)));

        viewport.scroll_to(450.0);
        viewport.scroll_to(30.0);
        assert_eq!(root.flush(), Some(Some(30.0)));
        host::uninstall_window();
    }

    #[test]
    fn sync_binding_reads_live_value_on_first_render() {
        let viewport = Viewport::install(120.0);
        let selector = scroll_y();
        let root = Root::new(move || {
            use_sync_window_listener(ListenerConfig::on_window("scroll", selector.clone()).fallback(0.0))
        });

        assert_eq!(root.render(), Some(120.0));
        assert!(!root.needs_render());

        viewport.scroll_to(900.0);
        assert_eq!(root.flush(), Some(Some(900.0)));
        host::uninstall_window();
    }

    #[test]
    fn sync_binding_ignores_events_that_do_not_change_the_value() {
        let viewport = Viewport::install(10.0);
        let selector = scroll_y();
        let root = Root::new(move || use_sync_window_listener(ListenerConfig::on_window("scroll", selector.clone())));

        root.render();
        viewport.scroll_to(10.0);
        assert!(!root.needs_render());
        host::uninstall_window();
    }

    #[test]
    fn event_data_reaches_the_value_selector() {
        let viewport = Viewport::install(0.0);
        let shifted = ValueSelector::new(|_: &Viewport, event: Option<&ScrollEvent>| {
            event.is_some_and(|event| event.shift)
        });
        let root = Root::new(move || use_sync_window_listener(ListenerConfig::on_window("scroll", shifted.clone())));

        assert_eq!(root.render(), Some(false));
        viewport.listeners.dispatch("scroll", &ScrollEvent { shift: true });
        assert_eq!(root.flush(), Some(Some(true)));
        host::uninstall_window();
    }

    #[test]
    fn server_render_returns_fallback_for_both_families() {
        let selector = scroll_y();
        let config = ListenerConfig::on_window("scroll", selector).fallback(3201.0);

        let state = render_on_server({
            let config = config.clone();
            move || use_window_listener(config)
        });
        let sync = render_on_server(move || use_sync_window_listener(config));

        assert_eq!(state, Some(3201.0));
        assert_eq!(sync, Some(3201.0));
    }

    #[test]
    fn server_render_ignores_client_state() {
        let viewport = Viewport::install(0.0);
        let selector = scroll_y();
        let config = ListenerConfig::on_window("scroll", selector).fallback(3201.0);

        let client = Root::new({
            let config = config.clone();
            move || use_sync_window_listener(config.clone())
        });
        client.render();
        viewport.scroll_to(77.0);
        assert_eq!(client.flush(), Some(Some(77.0)));

        let server = render_on_server(move || use_sync_window_listener(config));
        assert_eq!(server, Some(3201.0));
        host::uninstall_window();
    }

    #[test]
    fn unmount_detaches_and_freezes_value() {
        let viewport = Viewport::install(5.0);
        let selector = scroll_y();
        let sync = Root::new({
            let selector = selector.clone();
            move || use_sync_window_listener(ListenerConfig::on_window("scroll", selector.clone()))
        });
        let state = Root::new(move || use_window_listener(ListenerConfig::on_window("scroll", selector.clone())));

        sync.render();
        state.render();
        state.flush();
        assert_eq!(viewport.listeners.count("scroll"), 2);

        sync.unmount();
        state.unmount();
        assert!(viewport.listeners.is_empty());

        viewport.scroll_to(600.0);
        assert!(!sync.needs_render());
        assert!(!state.needs_render());

        // Second unmount is a no-op
        sync.unmount();
        host::uninstall_window();
    }

    #[test]
    fn changed_inputs_resubscribe_once() {
        let viewport = Viewport::install(0.0);
        let selector = scroll_y();
        let capture = Rc::new(Cell::new(false));

        let capture_clone = Rc::clone(&capture);
        let root = Root::new(move || {
            let config = ListenerConfig::on_window("scroll", selector.clone()).options(capture_clone.get());
            use_sync_window_listener(config)
        });

        root.render();
        root.render();
        assert_eq!(viewport.listeners.len(), 1);

        capture.set(true);
        root.render();
        assert_eq!(viewport.listeners.len(), 1);

        viewport.scroll_to(64.0);
        assert_eq!(root.flush(), Some(Some(64.0)));
        host::uninstall_window();
    }

    #[test]
    fn state_binding_changed_inputs_detach_old_listener() {
        let viewport = Viewport::install(0.0);
        let selector = scroll_y();
        let capture = Rc::new(Cell::new(false));

        let capture_clone = Rc::clone(&capture);
        let root = Root::new(move || {
            let config = ListenerConfig::on_window("scroll", selector.clone()).options(capture_clone.get());
            use_window_listener(config)
        });

        root.render();
        root.flush();
        assert_eq!(viewport.listeners.len(), 1);

        capture.set(true);
        root.render();
        assert_eq!(viewport.listeners.len(), 1);
        assert_eq!(viewport.listeners.count("scroll"), 1);

        viewport.scroll_to(64.0);
        assert_eq!(root.flush(), Some(Some(64.0)));
        assert_eq!(viewport.listeners.len(), 1);
        host::uninstall_window();
    }

    #[test]
    fn state_binding_new_selector_replaces_listener() {
        let viewport = Viewport::install(3.0);
        let halved = Rc::new(Cell::new(false));

        let halved_clone = Rc::clone(&halved);
        let root = Root::new(move || {
            let selector = use_memo(
                || {
                    if halved_clone.get() {
                        ValueSelector::from_target(|viewport: &Viewport| viewport.scroll_y.get() / 2.0)
                    } else {
                        scroll_y()
                    }
                },
                halved_clone.get(),
            );
            use_window_listener(ListenerConfig::on_window("scroll", selector))
        });

        root.render();
        assert_eq!(root.flush(), Some(Some(3.0)));

        halved.set(true);
        root.render();
        assert_eq!(viewport.listeners.len(), 1);
        assert_eq!(root.flush(), Some(Some(1.5)));

        viewport.scroll_to(10.0);
        assert_eq!(root.flush(), Some(Some(5.0)));
        assert_eq!(viewport.listeners.len(), 1);
        host::uninstall_window();
    }

    #[test]
    fn sync_binding_settles_on_nan_values() {
        let viewport = Viewport::install(0.0);
        let progress = ValueSelector::from_target(|viewport: &Viewport| viewport.scroll_y.get() / 0.0);
        let root = Root::new(move || use_sync_window_listener(ListenerConfig::on_window("scroll", progress.clone())));

        assert!(root.render().is_some_and(f64::is_nan));
        assert_eq!(root.render_count(), 1);
        assert!(!root.needs_render());

        viewport.scroll_to(0.0);
        assert!(!root.needs_render());

        viewport.scroll_to(4.0);
        assert_eq!(root.flush(), Some(Some(f64::INFINITY)));
        host::uninstall_window();
    }

    #[test]
    fn target_resolved_only_when_subscribing() {
        let viewport = Viewport::install(0.0);
        let resolutions = Rc::new(Cell::new(0));
        let resolutions_clone = Rc::clone(&resolutions);
        let target = TargetSelector::new(move |window: &Rc<Viewport>| {
            resolutions_clone.set(resolutions_clone.get() + 1);
            Rc::clone(window)
        });
        let selector = scroll_y();

        let root = Root::new(move || {
            use_window_listener(ListenerConfig::on_target("scroll", target.clone(), selector.clone()))
        });

        root.render();
        root.flush();
        viewport.scroll_to(10.0);
        root.flush();
        assert_eq!(resolutions.get(), 1);
        host::uninstall_window();
    }

    #[test]
    fn sync_binding_does_not_tear_when_event_lands_mid_render() {
        let viewport = Viewport::install(0.0);
        let selector = scroll_y();
        let scroll_mid_render = Rc::new(Cell::new(false));

        let trigger = Rc::clone(&scroll_mid_render);
        let window = Rc::clone(&viewport);
        let root = Root::new(move || {
            let first = use_sync_window_listener(ListenerConfig::on_window("scroll", selector.clone()));
            if trigger.replace(false) {
                window.scroll_to(900.0);
            }
            let second = use_sync_window_listener(ListenerConfig::on_window("scroll", selector.clone()));
            (first, second)
        });

        assert_eq!(root.render(), (Some(0.0), Some(0.0)));

        scroll_mid_render.set(true);
        assert_eq!(root.render(), (Some(900.0), Some(900.0)));
        host::uninstall_window();
    }

    #[test]
    fn state_binding_can_tear_when_event_lands_mid_render() {
        let viewport = Viewport::install(0.0);
        let selector = scroll_y();
        let scroll_mid_render = Rc::new(Cell::new(false));

        let trigger = Rc::clone(&scroll_mid_render);
        let window = Rc::clone(&viewport);
        let root = Root::new(move || {
            let first = use_window_listener(ListenerConfig::on_window("scroll", selector.clone()));
            if trigger.replace(false) {
                window.scroll_to(900.0);
            }
            let second = use_window_listener(ListenerConfig::on_window("scroll", selector.clone()));
            (first, second)
        });

        root.render();
        assert_eq!(root.flush(), Some((Some(0.0), Some(0.0))));

        scroll_mid_render.set(true);
        assert_eq!(root.render(), (Some(0.0), Some(900.0)));
        assert_eq!(root.flush(), Some((Some(900.0), Some(900.0))));
        host::uninstall_window();
    }

    #[test]
    fn independent_consumers_agree_after_an_event() {
        let viewport = Viewport::install(0.0);
        let selector = scroll_y();
        let make_root = |selector: ValueSelector<Viewport, f64>| {
            Root::new(move || use_sync_window_listener(ListenerConfig::on_window("scroll", selector.clone())))
        };
        let (a, b) = (make_root(selector.clone()), make_root(selector));

        a.render();
        b.render();
        viewport.scroll_to(321.0);

        assert_eq!(a.flush(), b.flush());
        assert_eq!(a.render(), Some(321.0));
        host::uninstall_window();
    }

    #[test]
    fn bindings_are_interchangeable_through_the_trait() {
        fn offset<B: Binding + 'static>(selector: ValueSelector<Viewport, f64>) -> Root<Option<f64>> {
            Root::new(move || B::bind(ListenerConfig::on_window("scroll", selector.clone()).fallback(-1.0)))
        }

        let viewport = Viewport::install(8.0);
        let (state, sync) = (offset::<StateBinding>(scroll_y()), offset::<SyncBinding>(scroll_y()));

        assert_eq!(state.render(), Some(-1.0));
        assert_eq!(sync.render(), Some(8.0));
        state.flush();

        viewport.scroll_to(16.0);
        assert_eq!(state.flush(), sync.flush());
        host::uninstall_window();
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_alias_behaves_like_sync_binding() {
        let _viewport = Viewport::install(42.0);
        let selector = scroll_y();
        let root = Root::new(move || {
            use_sync_external_store_window_listener(ListenerConfig::on_window("scroll", selector.clone()))
        });
        assert_eq!(root.render(), Some(42.0));
        host::uninstall_window();
    }

    #[test]
    #[should_panic(expected = "cannot subscribe to `scroll`")]
    fn client_subscription_without_window_panics() {
        host::uninstall_window();
        let selector = scroll_y();
        let root = Root::new(move || use_window_listener(ListenerConfig::on_window("scroll", selector.clone())));
        root.render();
    }
}
