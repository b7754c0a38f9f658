//! Drive a [`HostWindow`] from winit window events.
//!
//! ```ignore
//! fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
//!     if casement::shell::apply_window_event(&self.host, &event) {
//!         if let Some(html) = self.root.flush() {
//!             self.paint(html);
//!         }
//!     }
//! }
//! ```

use crate::window::HostWindow;
use winit::event::{MouseScrollDelta, WindowEvent};

/// Pixels scrolled per wheel line.
const LINE_HEIGHT_PX: f64 = 40.0;

/// Apply a winit event to `window`. Returns whether the event was relevant.
///
/// Sizes and pixel deltas arrive in physical pixels and are converted with
/// the window's scale factor. A positive wheel delta scrolls towards the top.
pub fn apply_window_event(window: &HostWindow, event: &WindowEvent) -> bool {
    match event {
        WindowEvent::Resized(size) => {
            let logical = size.to_logical::<f64>(window.scale_factor());
            window.resize_to(logical.width, logical.height);
            true
        }
        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            tracing::debug!("Scale factor changed to {}", scale_factor);
            window.set_scale_factor(*scale_factor);
            true
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let (dx, dy) = match delta {
                MouseScrollDelta::LineDelta(x, y) => {
                    (f64::from(*x) * LINE_HEIGHT_PX, f64::from(*y) * LINE_HEIGHT_PX)
                }
                MouseScrollDelta::PixelDelta(position) => {
                    let logical = position.to_logical::<f64>(window.scale_factor());
                    (logical.x, logical.y)
                }
            };
            window.scroll_by(-dx, -dy);
            true
        }
        _ => false,
    }
}
