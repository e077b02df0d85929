use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::assets::{load_asset, AssetError, SHADER_COMPILED_DIR, SHADER_SOURCE_DIR};
use crate::types::ShaderCompiler;

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Pipeline stage a shader file targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Infers the stage from a file name such as `PositionColor.vert` or
    /// `GradientTexture.comp.spv`.
    pub fn from_file_name(file_name: &str) -> Result<Self, ShaderLoadError> {
        if file_name.contains(".vert") {
            Ok(ShaderStage::Vertex)
        } else if file_name.contains(".frag") {
            Ok(ShaderStage::Fragment)
        } else if file_name.contains(".comp") {
            Ok(ShaderStage::Compute)
        } else {
            Err(ShaderLoadError::UnknownStage(file_name.to_string()))
        }
    }

    /// Checks that a shader loaded from `name` targets `expected`.
    pub fn require(self, name: &str, expected: ShaderStage) -> Result<(), ShaderLoadError> {
        if self == expected {
            Ok(())
        } else {
            Err(ShaderLoadError::WrongStage {
                name: name.to_string(),
                expected,
                found: self,
            })
        }
    }

    fn to_naga(self) -> wgpu::naga::ShaderStage {
        match self {
            ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
            ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
            ShaderStage::Compute => wgpu::naga::ShaderStage::Compute,
        }
    }

    fn wgsl_entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
            ShaderStage::Compute => "cs_main",
        }
    }

    #[cfg(feature = "shaderc")]
    fn to_shaderc(self) -> shaderc::ShaderKind {
        match self {
            ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
            ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
            ShaderStage::Compute => shaderc::ShaderKind::Compute,
        }
    }
}

/// Encoding of a shader file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderFormat {
    Glsl,
    Wgsl,
    SpirV,
}

impl ShaderFormat {
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("spv") => ShaderFormat::SpirV,
            Some("wgsl") => ShaderFormat::Wgsl,
            _ => ShaderFormat::Glsl,
        }
    }

    /// Content sub-directory the format is stored in.
    pub fn directory(self) -> &'static str {
        match self {
            ShaderFormat::SpirV => SHADER_COMPILED_DIR,
            ShaderFormat::Glsl | ShaderFormat::Wgsl => SHADER_SOURCE_DIR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderLoadError {
    #[error("invalid shader stage for '{0}' (expected .vert, .frag or .comp in the file name)")]
    UnknownStage(String),
    #[error("shader '{name}' is a {found:?} shader, expected {expected:?}")]
    WrongStage {
        name: String,
        expected: ShaderStage,
        found: ShaderStage,
    },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("shader '{0}' is not valid UTF-8")]
    Utf8(String),
    #[error("SPIR-V blob '{name}' is malformed: {reason}")]
    InvalidSpirv { name: String, reason: &'static str },
    #[error("shaderc support is not enabled in this build")]
    ShadercUnavailable,
    #[error("shaderc failed to compile '{name}': {message}")]
    Shaderc { name: String, message: String },
    #[error("failed to create shader module '{name}': {message}")]
    Module { name: String, message: String },
}

/// A compiled shader module plus the metadata pipelines need to use it.
#[derive(Debug)]
pub struct LoadedShader {
    pub module: wgpu::ShaderModule,
    pub stage: ShaderStage,
    pub entry_point: &'static str,
}

/// Loads and compiles a shader from the content directory.
///
/// The stage comes from the file name, the format from its extension. GLSL is
/// compiled with `compiler`; SPIR-V blobs are checked for a valid header
/// before they reach wgpu.
pub fn load_shader(
    device: &wgpu::Device,
    base_path: &Path,
    file_name: &str,
    compiler: ShaderCompiler,
) -> Result<LoadedShader, ShaderLoadError> {
    let stage = ShaderStage::from_file_name(file_name)?;
    let format = ShaderFormat::from_file_name(file_name);
    let relative: PathBuf = Path::new(format.directory()).join(file_name);
    let bytes = load_asset(base_path, &relative)?;

    let (source, entry_point) = match format {
        ShaderFormat::SpirV => (
            wgpu::ShaderSource::SpirV(Cow::Owned(spirv_words(file_name, &bytes)?)),
            "main",
        ),
        ShaderFormat::Wgsl => (
            wgpu::ShaderSource::Wgsl(Cow::Owned(utf8_source(file_name, bytes)?)),
            stage.wgsl_entry_point(),
        ),
        ShaderFormat::Glsl => {
            let code = utf8_source(file_name, bytes)?;
            (glsl_source(file_name, code, stage, compiler)?, "main")
        }
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(file_name),
        source,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(ShaderLoadError::Module {
            name: file_name.to_string(),
            message: err.to_string(),
        });
    }

    tracing::debug!(shader = file_name, ?stage, ?format, %compiler, "loaded shader");
    Ok(LoadedShader {
        module,
        stage,
        entry_point,
    })
}

/// Reinterprets a SPIR-V blob as words after checking its length and magic.
pub fn spirv_words(name: &str, bytes: &[u8]) -> Result<Vec<u32>, ShaderLoadError> {
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return Err(ShaderLoadError::InvalidSpirv {
            name: name.to_string(),
            reason: "length is not a non-zero multiple of 4 bytes",
        });
    }
    let words: Vec<u32> = bytemuck::pod_collect_to_vec(bytes);
    if words[0] != SPIRV_MAGIC {
        return Err(ShaderLoadError::InvalidSpirv {
            name: name.to_string(),
            reason: "missing SPIR-V magic number",
        });
    }
    Ok(words)
}

fn utf8_source(name: &str, bytes: Vec<u8>) -> Result<String, ShaderLoadError> {
    String::from_utf8(bytes).map_err(|_| ShaderLoadError::Utf8(name.to_string()))
}

fn glsl_source(
    name: &str,
    code: String,
    stage: ShaderStage,
    compiler: ShaderCompiler,
) -> Result<wgpu::ShaderSource<'static>, ShaderLoadError> {
    match compiler {
        ShaderCompiler::NagaGlsl => Ok(wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(code),
            stage: stage.to_naga(),
            defines: &[],
        }),
        ShaderCompiler::Shaderc => compile_with_shaderc(name, &code, stage)
            .map(|words| wgpu::ShaderSource::SpirV(Cow::Owned(words))),
    }
}

#[cfg(feature = "shaderc")]
fn compile_with_shaderc(
    name: &str,
    code: &str,
    stage: ShaderStage,
) -> Result<Vec<u32>, ShaderLoadError> {
    let failure = |message: String| ShaderLoadError::Shaderc {
        name: name.to_string(),
        message,
    };
    let compiler = shaderc::Compiler::new().map_err(|err| failure(err.to_string()))?;
    let mut options = shaderc::CompileOptions::new().map_err(|err| failure(err.to_string()))?;
    options.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    let artifact = compiler
        .compile_into_spirv(code, stage.to_shaderc(), name, "main", Some(&options))
        .map_err(|err| failure(err.to_string()))?;
    if artifact.get_num_warnings() > 0 {
        tracing::warn!(shader = name, warnings = %artifact.get_warning_messages(), "shaderc warnings");
    }
    Ok(artifact.as_binary().to_vec())
}

#[cfg(not(feature = "shaderc"))]
fn compile_with_shaderc(
    _name: &str,
    _code: &str,
    _stage: ShaderStage,
) -> Result<Vec<u32>, ShaderLoadError> {
    Err(ShaderLoadError::ShadercUnavailable)
}

/// Compiles the static full-screen triangle vertex shader used by the blitter.
pub(crate) fn compile_fullscreen_vertex(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(FULLSCREEN_VERTEX_GLSL),
            stage: wgpu::naga::ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Minimal full-screen triangle; `v_uv` is top-left based for texture sampling.
pub(crate) const FULLSCREEN_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";
