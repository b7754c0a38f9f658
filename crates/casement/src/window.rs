//! Window capabilities and the in-process host that implements them.
//!
//! [`Window`] and [`MediaQueryList`] describe what the preconfigured hooks
//! need from a window-like object. [`HostWindow`] implements both without a
//! browser: an embedding shell feeds it sizes and scroll positions and it
//! fans the matching events out to registered listeners.

use crate::media::{MediaQuery, Viewport};
use casement_core::events::{EventListener, EventTarget, ListenerOptions, ListenerRegistry};
use casement_core::{batch, host};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A global window-like object.
pub trait Window: EventTarget<Event = WindowEvent> + 'static {
    type MediaQueryList: MediaQueryList;

    /// Viewport width in CSS pixels.
    fn inner_width(&self) -> f64;

    /// Viewport height in CSS pixels.
    fn inner_height(&self) -> f64;

    fn scroll_x(&self) -> f64;

    fn scroll_y(&self) -> f64;

    /// Evaluate `query` against this window and keep evaluating it while the
    /// returned list is alive.
    fn match_media(&self, query: &str) -> Rc<Self::MediaQueryList>;
}

/// A live media query evaluation that fires `change` when its match flips.
pub trait MediaQueryList: EventTarget<Event = MediaQueryListEvent> + 'static {
    /// The query text as given to `match_media`.
    fn media(&self) -> &str;

    fn matches(&self) -> bool;
}

/// Events delivered to window listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Resize { width: f64, height: f64 },
    Scroll { x: f64, y: f64 },
    /// Any other event, dispatched by name.
    Other(String),
}

impl WindowEvent {
    /// The event type listeners are registered under.
    pub fn event_type(&self) -> &str {
        match self {
            WindowEvent::Resize { .. } => "resize",
            WindowEvent::Scroll { .. } => "scroll",
            WindowEvent::Other(event_type) => event_type,
        }
    }
}

/// Delivered to `change` listeners of a [`MediaQueryList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQueryListEvent {
    pub media: String,
    pub matches: bool,
}

/// An in-process window.
///
/// Holds viewport, scroll and scale state. Mutators update the state first
/// and then dispatch, so listeners always read the new values.
///
/// # Example
///
/// ```ignore
/// let window = HostWindow::with_size(1280.0, 720.0).install();
/// window.scroll_to(0.0, 900.0);
/// ```
pub struct HostWindow {
    width: Cell<f64>,
    height: Cell<f64>,
    scroll_x: Cell<f64>,
    scroll_y: Cell<f64>,
    scale_factor: Cell<f64>,
    listeners: ListenerRegistry<WindowEvent>,
    media_lists: RefCell<Vec<Weak<HostMediaQueryList>>>,
}

impl Default for HostWindow {
    fn default() -> Self {
        Self::with_size(1024.0, 768.0)
    }
}

impl HostWindow {
    /// A 1024x768 window scrolled to the origin.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width: Cell::new(width.max(0.0)),
            height: Cell::new(height.max(0.0)),
            scroll_x: Cell::new(0.0),
            scroll_y: Cell::new(0.0),
            scale_factor: Cell::new(1.0),
            listeners: ListenerRegistry::new(),
            media_lists: RefCell::new(Vec::new()),
        }
    }

    /// Make this the window hooks subscribe to on the current thread.
    pub fn install(self) -> Rc<Self> {
        let window = Rc::new(self);
        host::install_window(Rc::clone(&window));
        window
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width.get(), self.height.get())
    }

    /// Resize the viewport, dispatch `resize`, then dispatch `change` on
    /// every live media query list whose match flipped.
    pub fn resize_to(&self, width: f64, height: f64) {
        let (width, height) = (width.max(0.0), height.max(0.0));
        self.width.set(width);
        self.height.set(height);
        tracing::trace!("Window resized to {}x{}", width, height);

        batch(|| {
            self.listeners
                .dispatch("resize", &WindowEvent::Resize { width, height });

            let viewport = self.viewport();
            for list in self.live_media_lists() {
                list.reevaluate(viewport);
            }
        });
    }

    /// Scroll to an absolute position. Negative offsets clamp to zero.
    pub fn scroll_to(&self, x: f64, y: f64) {
        let (x, y) = (x.max(0.0), y.max(0.0));
        self.scroll_x.set(x);
        self.scroll_y.set(y);
        tracing::trace!("Window scrolled to ({}, {})", x, y);

        self.listeners.dispatch("scroll", &WindowEvent::Scroll { x, y });
    }

    pub fn scroll_by(&self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll_x.get() + dx, self.scroll_y.get() + dy);
    }

    /// Dispatch `event` under its own event type. Returns how many listeners
    /// ran.
    pub fn dispatch_event(&self, event: &WindowEvent) -> usize {
        self.listeners.dispatch(event.event_type(), event)
    }

    /// Physical pixels per CSS pixel.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor.get()
    }

    pub fn set_scale_factor(&self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor.set(scale_factor);
        } else {
            tracing::warn!("Ignoring non-positive scale factor {}", scale_factor);
        }
    }

    /// Number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.count(event_type)
    }

    /// Media query lists that are still referenced somewhere.
    pub(crate) fn live_media_lists(&self) -> Vec<Rc<HostMediaQueryList>> {
        let mut lists = self.media_lists.borrow_mut();
        lists.retain(|list| list.strong_count() > 0);
        lists.iter().filter_map(Weak::upgrade).collect()
    }
}

impl EventTarget for HostWindow {
    type Event = WindowEvent;

    fn add_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<WindowEvent>,
        options: ListenerOptions,
    ) {
        self.listeners.add(event_type, listener, options);
    }

    fn remove_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<WindowEvent>,
        options: ListenerOptions,
    ) {
        self.listeners.remove(event_type, listener, options);
    }
}

impl Window for HostWindow {
    type MediaQueryList = HostMediaQueryList;

    fn inner_width(&self) -> f64 {
        self.width.get()
    }

    fn inner_height(&self) -> f64 {
        self.height.get()
    }

    fn scroll_x(&self) -> f64 {
        self.scroll_x.get()
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    /// An unparseable query yields a list that never matches.
    fn match_media(&self, query: &str) -> Rc<HostMediaQueryList> {
        let parsed = match MediaQuery::parse(query) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!("Media query {:?} never matches: {}", query, err);
                None
            }
        };
        let matches = parsed
            .as_ref()
            .is_some_and(|parsed| parsed.matches(self.viewport()));

        let list = Rc::new(HostMediaQueryList {
            media: query.to_string(),
            query: parsed,
            matches: Cell::new(matches),
            listeners: ListenerRegistry::new(),
        });
        self.media_lists.borrow_mut().push(Rc::downgrade(&list));
        list
    }
}

impl fmt::Debug for HostWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostWindow")
            .field("width", &self.width.get())
            .field("height", &self.height.get())
            .field("scroll_x", &self.scroll_x.get())
            .field("scroll_y", &self.scroll_y.get())
            .field("scale_factor", &self.scale_factor.get())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A media query list created by [`HostWindow::match_media`].
pub struct HostMediaQueryList {
    media: String,
    query: Option<MediaQuery>,
    matches: Cell<bool>,
    listeners: ListenerRegistry<MediaQueryListEvent>,
}

impl HostMediaQueryList {
    fn reevaluate(&self, viewport: Viewport) {
        let Some(query) = &self.query else {
            return;
        };
        let matches = query.matches(viewport);
        if self.matches.replace(matches) != matches {
            tracing::trace!("Media query {:?} now {}", self.media, matches);
            let event = MediaQueryListEvent {
                media: self.media.clone(),
                matches,
            };
            self.listeners.dispatch("change", &event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.count("change")
    }
}

impl EventTarget for HostMediaQueryList {
    type Event = MediaQueryListEvent;

    fn add_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<MediaQueryListEvent>,
        options: ListenerOptions,
    ) {
        self.listeners.add(event_type, listener, options);
    }

    fn remove_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener<MediaQueryListEvent>,
        options: ListenerOptions,
    ) {
        self.listeners.remove(event_type, listener, options);
    }
}

impl MediaQueryList for HostMediaQueryList {
    fn media(&self) -> &str {
        &self.media
    }

    fn matches(&self) -> bool {
        self.matches.get()
    }
}

impl fmt::Debug for HostMediaQueryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMediaQueryList")
            .field("media", &self.media)
            .field("matches", &self.matches.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<E: Clone + 'static>() -> (EventListener<E>, Rc<RefCell<Vec<E>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let listener = EventListener::new(move |event: &E| seen_clone.borrow_mut().push(event.clone()));
        (listener, seen)
    }

    #[test]
    fn resize_updates_state_before_dispatch() {
        let window = Rc::new(HostWindow::new());
        let observed = Rc::new(Cell::new(0.0));

        let weak = Rc::downgrade(&window);
        let observed_clone = Rc::clone(&observed);
        let listener = EventListener::new(move |_: &WindowEvent| {
            if let Some(window) = weak.upgrade() {
                observed_clone.set(window.inner_width());
            }
        });
        window.add_event_listener("resize", &listener, ListenerOptions::default());

        window.resize_to(640.0, 480.0);
        assert_eq!(observed.get(), 640.0);
        assert_eq!(window.inner_height(), 480.0);
    }

    #[test]
    fn scroll_clamps_negative_offsets() {
        let window = HostWindow::new();
        let (listener, seen) = recorder::<WindowEvent>();
        window.add_event_listener("scroll", &listener, ListenerOptions::passive());

        window.scroll_to(-10.0, 900.0);
        window.scroll_by(5.0, -1000.0);

        assert_eq!(
            *seen.borrow(),
            vec![
                WindowEvent::Scroll { x: 0.0, y: 900.0 },
                WindowEvent::Scroll { x: 5.0, y: 0.0 },
            ]
        );
    }

    #[test]
    fn dispatch_event_uses_event_type() {
        let window = HostWindow::new();
        let (listener, seen) = recorder::<WindowEvent>();
        window.add_event_listener("focus", &listener, ListenerOptions::default());

        assert_eq!(window.dispatch_event(&WindowEvent::Other("focus".into())), 1);
        assert_eq!(window.dispatch_event(&WindowEvent::Other("blur".into())), 0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn media_query_change_fires_only_on_flip() {
        let window = HostWindow::with_size(600.0, 800.0);
        let list = window.match_media("(min-width: 768px)");
        assert!(!list.matches());

        let (listener, seen) = recorder::<MediaQueryListEvent>();
        list.add_event_listener("change", &listener, ListenerOptions::default());

        window.resize_to(700.0, 800.0);
        assert!(seen.borrow().is_empty());

        window.resize_to(1024.0, 800.0);
        window.resize_to(1280.0, 800.0);
        assert!(list.matches());
        assert_eq!(
            *seen.borrow(),
            vec![MediaQueryListEvent {
                media: "(min-width: 768px)".into(),
                matches: true,
            }]
        );
    }

    #[test]
    fn unparseable_query_never_matches() {
        let window = HostWindow::new();
        let list = window.match_media("(min-width: wide)");
        assert!(!list.matches());
        assert_eq!(list.media(), "(min-width: wide)");

        window.resize_to(4000.0, 4000.0);
        assert!(!list.matches());
    }

    #[test]
    fn dropped_lists_are_forgotten() {
        let window = HostWindow::new();
        let kept = window.match_media("(orientation: landscape)");
        drop(window.match_media("print"));

        assert_eq!(window.live_media_lists().len(), 1);
        assert_eq!(window.media_lists.borrow().len(), 1);
        drop(kept);
    }

    #[test]
    fn scale_factor_rejects_non_positive() {
        let window = HostWindow::new();
        window.set_scale_factor(2.0);
        window.set_scale_factor(0.0);
        assert_eq!(window.scale_factor(), 2.0);
    }

    #[test]
    fn install_makes_window_available() {
        let window = HostWindow::with_size(320.0, 480.0).install();
        let installed = host::window::<HostWindow>().expect("window installed");
        assert!(Rc::ptr_eq(&window, &installed));
        assert!(host::uninstall_window());
    }
}
