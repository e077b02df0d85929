//! Shared harness for the GPU example gallery.
//!
//! Every example implements [`Example`] and is driven through the same
//! `init → (update → draw)* → quit` lifecycle, either in a window or
//! offscreen:
//!
//! ```text
//!   gallery CLI
//!        │ HarnessConfig + ExampleRegistry
//!        ▼
//!   window::run ── winit loop ──▶ Example::update / Example::draw
//!   headless::capture ─────────▶ Example::update / Example::draw ─▶ RgbaImage
//!                                        │
//!                                        ▼
//!                     Context (common_init, load_shader, gpu())
//! ```
//!
//! [`Context`] owns the wgpu device and presentation target for exactly one
//! example at a time: `common_init` creates them, `common_quit` drops them.
//! Shaders are read from `<base_path>/Content/Shaders/...` and compiled with
//! naga (default) or shaderc when the `shaderc` feature is enabled.

pub mod assets;
pub mod compile;
pub mod context;
pub mod example;
pub mod gpu;
pub mod headless;
pub mod runtime;
mod types;
pub mod window;

pub use assets::{load_asset, AssetError};
pub use compile::{load_shader, LoadedShader, ShaderFormat, ShaderLoadError, ShaderStage};
pub use context::{Context, RenderTarget};
pub use example::{Example, ExampleEntry, ExampleRegistry, RegistryError};
pub use gpu::{checked, Blitter, Frame, GpuContext};
pub use types::{
    ColorSpaceMode, GpuPowerPreference, HarnessConfig, InputState, ShaderCompiler,
    DEFAULT_WINDOW_SIZE,
};
