//! Render roots: where hook state lives between renders.
//!
//! A [`Root`] wraps a render function. Each [`render`](Root::render) runs it
//! with the root's hooks, commits queued effects and reports whether another
//! render has been requested since. The host decides when to
//! [`flush`](Root::flush) pending renders.
//!
//! ```ignore
//! let root = Root::new(|| {
//!     let width = use_window_width::<HostWindow, SyncBinding>(Some(1024.0));
//!     format!("<p>{width:?}</p>")
//! });
//!
//! let html = root.render();
//! window.resize_to(800.0, 600.0);
//! let html = root.flush();
//! ```

use crate::hooks::{self, HookMeta, HookRegistry, RenderHandle, RenderMode};
use crate::reactive::Observer;
use std::cell::RefCell;
use std::rc::Rc;

/// Consecutive synchronous re-renders allowed before giving up.
const MAX_SYNC_RENDERS: usize = 50;

/// A mounted render function and its hook state.
pub struct Root<O> {
    registry: Rc<RefCell<HookRegistry>>,
    app: Box<dyn Fn() -> O>,
    handle: RenderHandle,
    observer: Observer,
}

impl<O> Root<O> {
    /// Create a client-side root. Nothing renders until [`render`](Self::render).
    pub fn new<F>(app: F) -> Self
    where
        F: Fn() -> O + 'static,
    {
        let handle = RenderHandle::new();
        let observer = {
            let handle = handle.clone();
            Observer::new(move || handle.request_render())
        };

        Self {
            registry: Rc::new(RefCell::new(HookRegistry::new(
                RenderMode::Client,
                handle.clone(),
            ))),
            app: Box::new(app),
            handle,
            observer,
        }
    }

    /// Render, commit effects and return the output.
    ///
    /// If a store snapshot changed while rendering, the render is repeated
    /// before returning, so the output never mixes old and new values of a
    /// store.
    pub fn render(&self) -> O {
        for pass in 1..=MAX_SYNC_RENDERS {
            self.handle.clear();

            let previous = hooks::begin_render(&self.registry);
            let output = self.observer.track(|| (self.app)());
            let effects = hooks::end_render(&self.registry, previous);
            hooks::commit(effects);

            if !hooks::has_stale_snapshot(&self.registry) {
                return output;
            }
            tracing::debug!("Snapshot changed during render pass {}, rendering again", pass);
        }

        panic!(
            "\n\n\x1b[1;31mcasement error: Maximum update depth exceeded!\x1b[0m\n\
            A store changed during {} consecutive renders.\n\
            Make sure snapshots are not changed by rendering itself.\n",
            MAX_SYNC_RENDERS
        );
    }

    /// Whether something requested a re-render since the last one.
    pub fn needs_render(&self) -> bool {
        self.handle.needs_render()
    }

    /// Render again if a re-render is pending.
    pub fn flush(&self) -> Option<O> {
        self.needs_render().then(|| self.render())
    }

    /// Release every subscription and effect, and forget all hook state.
    ///
    /// Safe to call more than once. Rendering afterwards mounts afresh.
    pub fn unmount(&self) {
        if self.registry.borrow().has_hooks() {
            tracing::debug!("Unmounting root");
        }
        hooks::unmount(&self.registry);
        self.handle.clear();
    }

    /// Number of completed renders.
    pub fn render_count(&self) -> usize {
        self.registry.borrow().render_count()
    }

    /// Get debug information about this root's hooks.
    pub fn hooks_debug_info(&self) -> Vec<HookMeta> {
        self.registry.borrow().debug_info()
    }
}

impl<O> Drop for Root<O> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Render once without a live window.
///
/// Effects are not run and external stores report their server snapshot, so
/// the output only depends on fallbacks, whatever state the process is in.
pub fn render_on_server<O>(app: impl FnOnce() -> O) -> O {
    let registry = Rc::new(RefCell::new(HookRegistry::new(
        RenderMode::Server,
        RenderHandle::new(),
    )));

    let previous = hooks::begin_render(&registry);
    let output = app();
    let effects = hooks::end_render(&registry, previous);
    debug_assert!(effects.is_empty(), "server renders queue no effects");
    hooks::unmount(&registry);
    output
}
