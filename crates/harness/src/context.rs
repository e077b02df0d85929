use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::assets::{self, AssetError};
use crate::compile::{self, LoadedShader};
use crate::gpu::GpuContext;
use crate::types::{HarnessConfig, InputState, ShaderCompiler};

/// Where an example's frames end up.
#[derive(Debug, Clone)]
pub enum RenderTarget {
    /// A winit window presented through a wgpu surface.
    Window(Arc<Window>),
    /// An offscreen texture of the given size, readable after drawing.
    Offscreen { width: u32, height: u32 },
}

/// Per-example state handed to every `init/update/draw/quit` call.
///
/// The GPU side is created by [`Context::common_init`] and torn down by
/// [`Context::common_quit`], so every example starts with a fresh device.
pub struct Context {
    pub example_name: &'static str,
    pub base_path: PathBuf,
    pub input: InputState,
    /// Seconds elapsed since the previous frame.
    pub delta_time: f32,
    pub shader_compiler: ShaderCompiler,
    target: RenderTarget,
    config: HarnessConfig,
    gpu: Option<GpuContext>,
}

impl Context {
    pub fn new(example_name: &'static str, target: RenderTarget, config: &HarnessConfig) -> Self {
        Self {
            example_name,
            base_path: config.base_path.clone(),
            input: InputState::default(),
            delta_time: 0.0,
            shader_compiler: config.shader_compiler,
            target,
            config: config.clone(),
            gpu: None,
        }
    }

    /// Creates the device and claims the render target for this example.
    pub fn common_init(&mut self) -> Result<()> {
        if self.gpu.is_some() {
            tracing::debug!(example = self.example_name, "re-initialising GPU context");
            self.common_quit();
        }

        let gpu = GpuContext::new(&self.target, &self.config).inspect_err(|err| {
            tracing::error!(example = self.example_name, error = %err, "GPU initialisation failed");
        })?;

        if let RenderTarget::Window(window) = &self.target {
            window.set_title(self.example_name);
        }

        tracing::info!(
            example = self.example_name,
            adapter = %gpu.adapter_info.name,
            backend = ?gpu.adapter_info.backend,
            format = ?gpu.swapchain_format(),
            "initialised example context"
        );
        self.gpu = Some(gpu);
        Ok(())
    }

    /// Releases the device and surface. Calling it twice is a no-op.
    pub fn common_quit(&mut self) {
        if self.gpu.take().is_some() {
            tracing::debug!(example = self.example_name, "released GPU context");
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn gpu(&self) -> Result<&GpuContext> {
        self.gpu
            .as_ref()
            .ok_or_else(|| anyhow!("{}: GPU context used before common_init", self.example_name))
    }

    pub fn gpu_mut(&mut self) -> Result<&mut GpuContext> {
        let name = self.example_name;
        self.gpu
            .as_mut()
            .ok_or_else(|| anyhow!("{name}: GPU context used before common_init"))
    }

    pub fn window(&self) -> Option<&Window> {
        match &self.target {
            RenderTarget::Window(window) => Some(window.as_ref()),
            RenderTarget::Offscreen { .. } => None,
        }
    }

    /// Resizes the render target. Zero-sized requests are ignored.
    ///
    /// Offscreen targets keep the new size across a later `common_init`.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if let RenderTarget::Offscreen {
            width: target_width,
            height: target_height,
        } = &mut self.target
        {
            *target_width = width;
            *target_height = height;
        }
        self.gpu_mut()?.resize(PhysicalSize::new(width, height));
        Ok(())
    }

    /// Reads a file relative to the example content root.
    pub fn load_asset(&self, relative: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
        assets::load_asset(&self.base_path, relative)
    }

    /// Loads a shader from the content root with the configured compiler.
    pub fn load_shader(&self, file_name: &str) -> Result<LoadedShader> {
        let gpu = self.gpu()?;
        compile::load_shader(&gpu.device, &self.base_path, file_name, self.shader_compiler)
            .inspect_err(|err| {
                tracing::error!(
                    example = self.example_name,
                    shader = file_name,
                    error = %err,
                    "failed to load shader"
                );
            })
            .map_err(Into::into)
    }
}
