//! Preconfigured window bindings.
//!
//! Each hook is generic over the window type and the [`Binding`] family:
//!
//! ```ignore
//! let width = use_window_width::<HostWindow, SyncBinding>(Some(1024.0));
//! let tablet = use_media_query::<HostWindow, StateBinding>("(min-width: 768px)", Some(false));
//! ```
//!
//! The selectors are memoized per hook call, so the subscription survives
//! re-renders and is only re-established when the media query text changes.

use crate::window::{MediaQueryList, Window};
use casement_core::{
    use_memo, Binding, EventTarget, ListenerConfig, ListenerOptions, TargetSelector, ValueSelector,
};
use std::rc::Rc;

/// Scroll position of a window, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

fn with_fallback<W, T, V>(config: ListenerConfig<W, T, V>, fallback: Option<V>) -> ListenerConfig<W, T, V>
where
    T: EventTarget,
{
    match fallback {
        Some(value) => config.fallback(value),
        None => config,
    }
}

/// The window's inner width, updated on `resize`.
pub fn use_window_width<W, B>(fallback: Option<f64>) -> Option<f64>
where
    W: Window,
    B: Binding,
{
    let width = use_memo(|| ValueSelector::from_target(|window: &W| window.inner_width()), ());
    let config = ListenerConfig::on_window("resize", width).options(ListenerOptions::passive());
    B::bind(with_fallback(config, fallback))
}

/// The window's scroll offset, updated on `scroll`.
pub fn use_scroll_offset<W, B>(fallback: Option<ScrollOffset>) -> Option<ScrollOffset>
where
    W: Window,
    B: Binding,
{
    let offset = use_memo(
        || {
            ValueSelector::from_target(|window: &W| ScrollOffset {
                x: window.scroll_x(),
                y: window.scroll_y(),
            })
        },
        (),
    );
    let config = ListenerConfig::on_window("scroll", offset).options(ListenerOptions::passive());
    B::bind(with_fallback(config, fallback))
}

/// Whether `query` matches, updated on the query list's `change`.
///
/// The list is created by `match_media` when the subscription is made.
pub fn use_media_query<W, B>(query: &str, fallback: Option<bool>) -> Option<bool>
where
    W: Window,
    B: Binding,
{
    let target = use_memo(
        || {
            let query = query.to_string();
            TargetSelector::new(move |window: &Rc<W>| window.match_media(&query))
        },
        query.to_string(),
    );
    let matches = use_memo(
        || ValueSelector::from_target(|list: &W::MediaQueryList| list.matches()),
        (),
    );
    let config = ListenerConfig::on_target("change", target, matches);
    B::bind(with_fallback(config, fallback))
}
