//! Core types and hooks for casement.

pub mod binding;
pub mod error;
pub mod events;
pub mod hooks;
pub mod host;
pub mod reactive;
pub mod root;
pub mod selector;
pub mod store;
pub mod subscription;

// Re-export reactive types for convenience
pub use reactive::{batch, Observer, Signal};

// Re-export hooks and the render root
pub use hooks::{
    use_callback, use_effect, use_effect_cleanup, use_memo, use_mount, use_ref, use_render_mode,
    use_signal, use_state, use_sync_external_store, ExternalStore, HookMeta, RefHandle,
    RenderHandle, RenderMode,
};
pub use root::{render_on_server, Root};

// Re-export listener plumbing and bindings
#[allow(deprecated)]
pub use binding::use_sync_external_store_window_listener;
pub use binding::{use_sync_window_listener, use_window_listener, Binding, StateBinding, SyncBinding};
pub use error::{HostError, HostResult};
pub use events::{EventListener, EventTarget, ListenerId, ListenerOptions, ListenerRegistry};
pub use selector::{ListenerConfig, SubscriptionKey, TargetSelector, ValueSelector};
pub use store::ListenerStore;
pub use subscription::{attach, Subscription};
