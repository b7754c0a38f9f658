//! Casement - render hooks bound to window events.
//!
//! Casement subscribes render functions to a window-like object and hands
//! them the latest value derived from its events: the viewport width, the
//! scroll offset or whether a media query matches.
//!
//! # Quick Start
//!
//! ```ignore
//! use casement::prelude::*;
//!
//! fn main() {
//!     casement::init_tracing();
//!
//!     let window = HostWindow::with_size(1280.0, 720.0).install();
//!     let root = Root::new(|| {
//!         let wide = use_media_query::<HostWindow, SyncBinding>("(min-width: 1024px)", Some(false));
//!         format!("<nav class=\"{}\"></nav>", if wide == Some(true) { "full" } else { "compact" })
//!     });
//!
//!     println!("{}", root.render());
//!     window.resize_to(800.0, 720.0);
//!     if let Some(html) = root.flush() {
//!         println!("{html}");
//!     }
//! }
//! ```
//!
//! ## Binding families
//!
//! | Family | Hook | Behaviour |
//! |--------|------|-----------|
//! | [`StateBinding`] | [`use_window_listener`] | Hook state, subscribed at commit. Renders the fallback first. |
//! | [`SyncBinding`] | [`use_sync_window_listener`] | Shared store. Reads live on the first render and never tears. |
//!
//! Both render the fallback under [`render_on_server`].
//!
//! ## Rules of Hooks
//!
//! Hooks must be called in the **same order** on every render:
//!
//! - ✅ Call hooks at the top level of your render function
//! - ❌ Don't call hooks inside conditionals (`if`/`match`)
//! - ❌ Don't call hooks inside loops
//! - ❌ Don't call hooks in event handlers
//!
//! [`StateBinding`]: prelude::StateBinding
//! [`SyncBinding`]: prelude::SyncBinding
//! [`use_window_listener`]: prelude::use_window_listener
//! [`use_sync_window_listener`]: prelude::use_sync_window_listener
//! [`render_on_server`]: prelude::render_on_server

pub mod media;
pub mod presets;
pub mod window;

#[cfg(feature = "winit")]
pub mod shell;

pub mod prelude {
    //! Common imports for casement applications.
    pub use crate::media::{MediaQuery, Viewport};
    pub use crate::presets::{use_media_query, use_scroll_offset, use_window_width, ScrollOffset};
    pub use crate::window::{HostWindow, MediaQueryList, Window, WindowEvent};
    pub use casement_core::{batch, render_on_server, Root, Signal};
    pub use casement_core::{
        use_callback, use_effect, use_effect_cleanup, use_memo, use_mount, use_ref, use_signal,
        use_state, use_sync_external_store, ExternalStore,
    };
    pub use casement_core::{
        use_sync_window_listener, use_window_listener, Binding, ListenerConfig, ListenerOptions,
        StateBinding, SyncBinding, TargetSelector, ValueSelector,
    };
}

pub use casement_core::{render_on_server, Root};
pub use media::{MediaQuery, MediaQueryError, Viewport};
pub use presets::{use_media_query, use_scroll_offset, use_window_width, ScrollOffset};
pub use window::{HostMediaQueryList, HostWindow, MediaQueryList, MediaQueryListEvent, Window, WindowEvent};

pub use casement_core as core;

/// Install the default `tracing` subscriber.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
