//! Examples shown by the gallery.
//!
//! Each example is a self-contained [`harness::Example`]; [`entries`] lists
//! them in the order the window cycles through. Shaders live under
//! [`content_dir`] in `Content/Shaders/Source`.

use std::path::PathBuf;

use harness::{ExampleEntry, ExampleRegistry, RegistryError};

pub mod basic_stencil;
pub mod compute_uniforms;

pub use basic_stencil::BasicStencil;
pub use compute_uniforms::ComputeUniforms;

pub fn entries() -> [ExampleEntry; 2] {
    [
        ExampleEntry {
            name: "BasicStencil",
            summary: "stencil mask cuts a triangular hole out of an RGB triangle",
            build: || Box::new(BasicStencil::new()),
        },
        ExampleEntry {
            name: "ComputeUniforms",
            summary: "compute shader writes an animated gradient driven by a uniform",
            build: || Box::new(ComputeUniforms::new()),
        },
    ]
}

pub fn registry() -> Result<ExampleRegistry, RegistryError> {
    ExampleRegistry::new(entries())
}

/// Content root shipped with this crate.
pub fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content")
}
