use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use harness::{
    ColorSpaceMode, GpuPowerPreference, HarnessConfig, ShaderCompiler, DEFAULT_WINDOW_SIZE,
};
use settings::{ColorSpace, GallerySettings, PowerPreference, ShaderBackend};
use tracing_subscriber::EnvFilter;

use crate::cli::{CaptureArgs, RunArgs};
use crate::paths::{resolve_content_dir, GalleryPaths, ENV_CONTENT_DIR};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings file location and its parsed contents.
struct LoadedSettings {
    path: PathBuf,
    settings: GallerySettings,
}

fn load_settings(args: &RunArgs) -> Result<LoadedSettings> {
    let path = match &args.config {
        Some(path) => {
            if !path.is_file() {
                bail!("settings file {} does not exist", path.display());
            }
            path.clone()
        }
        None => GalleryPaths::discover()?.settings_file(),
    };
    let settings = GallerySettings::load_or_default(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?settings, "loaded settings");
    Ok(LoadedSettings { path, settings })
}

/// Merges CLI flags over the settings file over built-in defaults.
pub fn harness_config(args: &RunArgs, settings: &GallerySettings) -> HarnessConfig {
    let window_size = args
        .size
        .unwrap_or((settings.window.width, settings.window.height));
    let gpu = &settings.gpu;
    HarnessConfig {
        window_size,
        base_path: resolve_content_dir(
            args.content_dir.as_deref(),
            settings.run.content_dir.as_deref(),
        ),
        color_space: color_space(args.color_space.unwrap_or(gpu.color_space)),
        shader_compiler: shader_compiler(args.shader_compiler.unwrap_or(gpu.shader_compiler)),
        power: power(args.power.unwrap_or(gpu.power)),
        vsync: gpu.vsync && !args.no_vsync,
        target_fps: args.fps.or(settings.run.fps),
        fixed_delta: settings.run.fixed_delta,
    }
}

fn color_space(value: ColorSpace) -> ColorSpaceMode {
    match value {
        ColorSpace::Auto => ColorSpaceMode::Auto,
        ColorSpace::Gamma => ColorSpaceMode::Gamma,
        ColorSpace::Linear => ColorSpaceMode::Linear,
    }
}

fn shader_compiler(value: ShaderBackend) -> ShaderCompiler {
    match value {
        ShaderBackend::Naga => ShaderCompiler::NagaGlsl,
        ShaderBackend::Shaderc => ShaderCompiler::Shaderc,
    }
}

fn power(value: PowerPreference) -> GpuPowerPreference {
    match value {
        PowerPreference::Low => GpuPowerPreference::Low,
        PowerPreference::High => GpuPowerPreference::High,
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let loaded = load_settings(&args)?;
    let config = harness_config(&args, &loaded.settings);
    let registry = samples::registry()?;
    let start = args
        .example
        .as_deref()
        .or(loaded.settings.run.start.as_deref());
    let start_index = match start {
        Some(name) => registry.position(name)?,
        None => 0,
    };

    tracing::info!(
        example = registry.get(start_index).name,
        content = %config.base_path.display(),
        width = config.window_size.0,
        height = config.window_size.1,
        compiler = %config.shader_compiler,
        "starting gallery (D/A switch examples, Esc quits)"
    );
    harness::window::run(&registry, start_index, &config)
}

pub fn list() -> Result<()> {
    let registry = samples::registry()?;
    for entry in registry.entries() {
        println!("{:<18} {}", entry.name, entry.summary);
    }
    Ok(())
}

pub fn capture(run: &RunArgs, args: CaptureArgs) -> Result<()> {
    let registry = samples::registry()?;
    let entry = registry.get(registry.position(&args.example)?);

    let loaded = load_settings(run)?;
    let mut config = harness_config(run, &loaded.settings);
    if let Some(size) = args.size {
        config.window_size = size;
    }

    let image = harness::headless::capture(entry, &config, args.frames)?;
    harness::headless::save_png(&image, &args.output)?;
    tracing::info!(
        example = entry.name,
        frames = args.frames.max(1),
        path = %args.output.display(),
        "capture written"
    );
    println!("{}", args.output.display());
    Ok(())
}

pub fn print_paths(run: &RunArgs) -> Result<()> {
    let loaded = load_settings(run)?;
    let config = harness_config(run, &loaded.settings);
    let status = if loaded.path.is_file() {
        "present"
    } else {
        "missing, using defaults"
    };
    if let Ok(paths) = GalleryPaths::discover() {
        println!("Config dir:    {}", paths.config_dir().display());
    }
    println!("Settings file: {} ({status})", loaded.path.display());
    println!("Content dir:   {}", config.base_path.display());
    println!(
        "Shader dir:    {}",
        config
            .base_path
            .join(harness::assets::SHADER_SOURCE_DIR)
            .display()
    );
    println!("Override the content dir with --content-dir or {ENV_CONTENT_DIR}.");
    if config.window_size != DEFAULT_WINDOW_SIZE {
        println!(
            "Window size:   {}x{}",
            config.window_size.0, config.window_size.1
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn defaults_without_flags_or_settings() {
        let config = harness_config(&RunArgs::default(), &GallerySettings::default());
        assert_eq!(config.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(config.base_path, samples::content_dir());
        assert_eq!(config.shader_compiler, ShaderCompiler::NagaGlsl);
        assert_eq!(config.color_space, ColorSpaceMode::Auto);
        assert!(config.vsync);
        assert_eq!(config.target_fps, None);
    }

    #[test]
    fn flags_override_settings() {
        let settings = GallerySettings::from_toml_str(
            r#"
[window]
width = 800
height = 600

[gpu]
color_space = "linear"
power = "low"

[run]
fps = 30
fixed_delta = "10ms"
content_dir = "/srv/content"
"#,
        )
        .unwrap();

        let config = harness_config(&RunArgs::default(), &settings);
        assert_eq!(config.window_size, (800, 600));
        assert_eq!(config.color_space, ColorSpaceMode::Linear);
        assert_eq!(config.power, GpuPowerPreference::Low);
        assert_eq!(config.target_fps, Some(30.0));
        assert_eq!(config.fixed_delta, Some(Duration::from_millis(10)));
        assert_eq!(config.base_path, Path::new("/srv/content"));

        let args = RunArgs {
            size: Some((320, 200)),
            fps: Some(0.0),
            color_space: Some(ColorSpace::Gamma),
            no_vsync: true,
            content_dir: Some(PathBuf::from("/tmp/content")),
            ..RunArgs::default()
        };
        let config = harness_config(&args, &settings);
        assert_eq!(config.window_size, (320, 200));
        assert_eq!(config.color_space, ColorSpaceMode::Gamma);
        assert_eq!(config.power, GpuPowerPreference::Low);
        assert_eq!(config.target_fps, Some(0.0));
        assert!(!config.vsync);
        assert_eq!(config.base_path, Path::new("/tmp/content"));
    }
}
