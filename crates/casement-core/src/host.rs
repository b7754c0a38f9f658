//! The process-wide window slot.
//!
//! The embedding shell installs its window-like object here once it exists.
//! Bindings never cache what they read from it: every subscription resolves
//! the window again, so swapping the installed window takes effect on the next
//! subscription.
//!
//! While nothing is installed the environment counts as "not live", which is
//! how server rendering looks from the bindings' point of view.

use crate::error::{HostError, HostResult};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static WINDOW: RefCell<Option<Rc<dyn Any>>> = const { RefCell::new(None) };
}

/// Install `window` as the global window-like object, replacing any previous one.
pub fn install_window<W: 'static>(window: Rc<W>) {
    tracing::debug!("Installing window of type {}", type_name::<W>());
    WINDOW.with(|slot| *slot.borrow_mut() = Some(window));
}

/// Remove the installed window. Returns `true` if one was installed.
pub fn uninstall_window() -> bool {
    WINDOW.with(|slot| slot.borrow_mut().take().is_some())
}

/// Whether any window is installed.
pub fn has_window() -> bool {
    WINDOW.with(|slot| slot.borrow().is_some())
}

/// The installed window, if it exists and has type `W`.
pub fn window<W: 'static>() -> Option<Rc<W>> {
    try_window().ok()
}

/// The installed window, with the reason when it cannot be had.
pub fn try_window<W: 'static>() -> HostResult<Rc<W>> {
    let window = WINDOW.with(|slot| slot.borrow().clone()).ok_or(HostError::NoWindow)?;
    window
        .downcast::<W>()
        .map_err(|_| HostError::WrongWindowType {
            expected: type_name::<W>(),
        })
}

/// Fetch the window for a client-side subscription.
///
/// Absence here is a contract violation: client bindings may only subscribe
/// where a window exists.
pub(crate) fn require_window<W: 'static>(event_type: &str) -> Rc<W> {
    match try_window::<W>() {
        Ok(window) => window,
        Err(err) => panic!(
            "\n\n\x1b[1;31mcasement error: cannot subscribe to `{}`: {}\x1b[0m\n\
            Client bindings need a window installed with `host::install_window`.\n\
            Render with `render_on_server` when no window exists.\n",
            event_type, err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeWindow(u32);

    #[test]
    fn install_and_fetch() {
        assert!(!has_window());
        assert_eq!(try_window::<FakeWindow>().err(), Some(HostError::NoWindow));

        install_window(Rc::new(FakeWindow(7)));
        assert!(has_window());
        assert_eq!(window::<FakeWindow>().map(|w| w.0), Some(7));

        assert!(uninstall_window());
        assert!(!uninstall_window());
        assert!(window::<FakeWindow>().is_none());
    }

    #[test]
    fn wrong_type_is_reported() {
        install_window(Rc::new(FakeWindow(1)));
        let err = try_window::<String>().err();
        assert!(matches!(err, Some(HostError::WrongWindowType { .. })));
        uninstall_window();
    }

    #[test]
    #[should_panic(expected = "cannot subscribe to `resize`")]
    fn require_window_panics_without_window() {
        uninstall_window();
        let _ = require_window::<FakeWindow>("resize");
    }
}
