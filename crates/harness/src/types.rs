use std::path::PathBuf;
use std::time::Duration;

/// Default window size used by every example unless overridden.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (640, 480);

/// Shader compilation backend requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderCompiler {
    /// Compile GLSL through shaderc into SPIR-V before handing it to wgpu.
    Shaderc,
    /// Hand GLSL to naga's built-in frontend.
    NagaGlsl,
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        ShaderCompiler::NagaGlsl
    }
}

impl std::fmt::Display for ShaderCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderCompiler::Shaderc => f.write_str("shaderc"),
            ShaderCompiler::NagaGlsl => f.write_str("naga"),
        }
    }
}

/// Output color handling for the presentation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Present shader output unchanged (non-sRGB swapchain when available).
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

impl ColorSpaceMode {
    pub(crate) fn prefers_srgb(self) -> bool {
        matches!(self, ColorSpaceMode::Linear)
    }
}

/// Adapter selection hint forwarded to wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl GpuPowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Immutable configuration shared by the windowed and headless runners.
///
/// `HarnessConfig` mirrors the CLI flags and settings file: window size,
/// swapchain preferences, shader compiler and the content root every example
/// loads its shaders from.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Window (or offscreen target) size in physical pixels.
    pub window_size: (u32, u32),
    /// Root directory containing `Content/Shaders/...`.
    pub base_path: PathBuf,
    /// Desired swapchain color handling.
    pub color_space: ColorSpaceMode,
    /// Backend used for GLSL shader sources.
    pub shader_compiler: ShaderCompiler,
    /// Adapter power preference.
    pub power: GpuPowerPreference,
    /// Prefer a FIFO (vsync) present mode.
    pub vsync: bool,
    /// Optional FPS cap for the windowed loop; None = render every redraw.
    pub target_fps: Option<f32>,
    /// Fixed delta reported to examples instead of wall-clock time.
    pub fixed_delta: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            base_path: PathBuf::new(),
            color_space: ColorSpaceMode::default(),
            shader_compiler: ShaderCompiler::default(),
            power: GpuPowerPreference::default(),
            vsync: true,
            target_fps: None,
            fixed_delta: None,
        }
    }
}

/// One-frame "pressed" flags for the arrow keys.
///
/// The runner sets a flag when the key goes down and clears every flag once
/// the frame has been drawn, so examples observe each press exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
}

impl InputState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        self.left_pressed || self.right_pressed || self.up_pressed || self.down_pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_clear_resets_every_flag() {
        let mut input = InputState {
            left_pressed: true,
            right_pressed: false,
            up_pressed: true,
            down_pressed: true,
        };
        assert!(input.any());
        input.clear();
        assert!(!input.any());
        assert_eq!(input, InputState::default());
    }

    #[test]
    fn only_linear_mode_prefers_srgb() {
        assert!(!ColorSpaceMode::Auto.prefers_srgb());
        assert!(!ColorSpaceMode::Gamma.prefers_srgb());
        assert!(ColorSpaceMode::Linear.prefers_srgb());
    }
}
