//! GPU wiring shared by every example.
//!
//! - `context` owns the wgpu instance/device/queue and the presentation
//!   target (window surface or offscreen texture) and knows how to rebuild it
//!   when the window resizes.
//! - `frame` wraps a texture acquired for one draw and the offscreen readback.
//! - `blit` copies a sampled texture onto a frame with filtering.

mod blit;
mod context;
mod frame;

use anyhow::{anyhow, Result};

pub use blit::Blitter;
pub use context::GpuContext;
pub use frame::Frame;

/// Creates a GPU object inside a validation error scope.
///
/// wgpu reports invalid descriptors through the device error handler, which
/// panics by default. Wrapping creation lets examples fail with an error the
/// runner can log instead.
pub fn checked<T>(
    device: &wgpu::Device,
    what: &str,
    create: impl FnOnce(&wgpu::Device) -> T,
) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create(device);
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => Err(anyhow!("failed to create {what}: {err}")),
    }
}
