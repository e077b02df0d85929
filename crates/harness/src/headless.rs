use std::path::Path;

use anyhow::{Context as AnyhowContext, Result};
use image::RgbaImage;

use crate::context::{Context, RenderTarget};
use crate::example::{Example, ExampleEntry};
use crate::runtime::{FixedStep, TimeSource, DEFAULT_FIXED_DELTA};
use crate::types::HarnessConfig;

/// Renders `frames` frames of an example offscreen and returns the last one.
///
/// Every frame advances by `config.fixed_delta` (1/60 s when unset), so two
/// captures of the same example produce the same pixels. `quit` runs even
/// when a step fails.
pub fn capture(entry: &ExampleEntry, config: &HarnessConfig, frames: u32) -> Result<RgbaImage> {
    let (width, height) = config.window_size;
    let mut context = Context::new(
        entry.name,
        RenderTarget::Offscreen {
            width: width.max(1),
            height: height.max(1),
        },
        config,
    );
    let mut example = (entry.build)();
    let mut clock = FixedStep::new(config.fixed_delta.unwrap_or(DEFAULT_FIXED_DELTA));
    let frames = frames.max(1);

    tracing::info!(example = entry.name, frames, width, height, "capturing offscreen");
    let result = run_frames(example.as_mut(), &mut context, &mut clock, frames);
    example.quit(&mut context);
    result.with_context(|| format!("{}: capture failed", entry.name))
}

fn run_frames(
    example: &mut dyn Example,
    context: &mut Context,
    clock: &mut dyn TimeSource,
    frames: u32,
) -> Result<RgbaImage> {
    example.init(context)?;
    for frame in 0..frames {
        context.delta_time = clock.delta();
        example.update(context)?;
        example.draw(context)?;
        context.input.clear();
        tracing::trace!(frame, "offscreen frame drawn");
    }
    context.gpu()?.read_target()
}

/// Writes a captured frame as PNG, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Whether any wgpu adapter can be created on this machine.
pub fn adapter_available() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).is_ok()
}
