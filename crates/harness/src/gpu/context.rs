use std::cell::Cell;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use image::RgbaImage;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::context::RenderTarget;
use crate::types::{ColorSpaceMode, HarnessConfig};

use super::frame::{Frame, OffscreenTarget};

enum Presenter {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        window: Arc<Window>,
    },
    Offscreen(OffscreenTarget),
}

/// Device, queue and presentation target for one example run.
pub struct GpuContext {
    _instance: wgpu::Instance,
    pub adapter_info: wgpu::AdapterInfo,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    presenter: Presenter,
    needs_reconfigure: Cell<bool>,
}

impl GpuContext {
    pub(crate) fn new(target: &RenderTarget, config: &HarnessConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = match target {
            RenderTarget::Window(window) => Some((
                instance
                    .create_surface(window.clone())
                    .context("failed to create rendering surface")?,
                window.clone(),
            )),
            RenderTarget::Offscreen { .. } => None,
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power.to_wgpu(),
            compatible_surface: surface.as_ref().map(|(surface, _)| surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let size = target_size(target);
        let max_dimension = limits.max_texture_dimension_2d;
        if size.width > max_dimension || size.height > max_dimension {
            bail!(
                "GPU max texture dimension is {max_dimension}, requested target is {width}x{height}",
                width = size.width,
                height = size.height
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gallery device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let presenter = match surface {
            Some((surface, window)) => {
                let caps = surface.get_capabilities(&adapter);
                if caps.formats.is_empty() {
                    bail!("surface reports no supported formats for this adapter");
                }
                let format = choose_surface_format(&caps.formats, config.color_space);
                let present_mode = choose_present_mode(&caps.present_modes, config.vsync);
                tracing::debug!(?format, ?present_mode, "configuring surface");
                let surface_config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width: size.width,
                    height: size.height,
                    present_mode,
                    alpha_mode: caps.alpha_modes[0],
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(&device, &surface_config);
                Presenter::Surface {
                    surface,
                    config: surface_config,
                    window,
                }
            }
            None => Presenter::Offscreen(OffscreenTarget::new(
                &device,
                size,
                offscreen_format(config.color_space),
            )),
        };

        Ok(Self {
            _instance: instance,
            adapter_info,
            device,
            queue,
            presenter,
            needs_reconfigure: Cell::new(false),
        })
    }

    /// Texture format of the presentation target.
    pub fn swapchain_format(&self) -> wgpu::TextureFormat {
        match &self.presenter {
            Presenter::Surface { config, .. } => config.format,
            Presenter::Offscreen(target) => target.format,
        }
    }

    /// Current size of the presentation target in pixels.
    pub fn target_size(&self) -> PhysicalSize<u32> {
        match &self.presenter {
            Presenter::Surface { config, .. } => PhysicalSize::new(config.width, config.height),
            Presenter::Offscreen(target) => target.size,
        }
    }

    /// Acquires the texture to draw into this frame.
    ///
    /// `Ok(None)` means no texture is available right now (surface lost,
    /// outdated or timed out); the caller should skip its render passes but
    /// still submit.
    pub fn acquire_frame(&self) -> Result<Option<Frame>> {
        match &self.presenter {
            Presenter::Surface {
                surface, config, ..
            } => match surface.get_current_texture() {
                Ok(texture) => {
                    if texture.suboptimal {
                        self.needs_reconfigure.set(true);
                    }
                    Ok(Some(Frame::from_surface(texture, config.format)))
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    tracing::debug!("surface lost or outdated; skipping frame");
                    self.needs_reconfigure.set(true);
                    Ok(None)
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    tracing::warn!("surface timeout; retrying next frame");
                    Ok(None)
                }
                Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("surface out of memory")),
                Err(other) => Err(anyhow!("surface error: {other:?}")),
            },
            Presenter::Offscreen(target) => Ok(Some(target.frame())),
        }
    }

    /// Submits the recorded commands and presents `frame` if one was acquired.
    pub fn submit(&self, encoder: wgpu::CommandEncoder, frame: Option<Frame>) {
        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        match &mut self.presenter {
            Presenter::Surface {
                surface, config, ..
            } => {
                config.width = new_size.width;
                config.height = new_size.height;
                surface.configure(&self.device, config);
            }
            Presenter::Offscreen(target) => {
                *target = OffscreenTarget::new(&self.device, new_size, target.format);
            }
        }
        self.needs_reconfigure.set(false);
    }

    /// Reconfigures the surface if a previous acquire reported it stale.
    ///
    /// Window targets are reconfigured at the window's current size, which
    /// may already differ from the last configuration.
    pub(crate) fn reconfigure_if_needed(&mut self) -> bool {
        if !self.needs_reconfigure.replace(false) {
            return false;
        }
        let size = match &self.presenter {
            Presenter::Surface { window, .. } => {
                stale_surface_size(window.inner_size(), self.target_size())
            }
            Presenter::Offscreen(target) => target.size,
        };
        self.resize(size);
        true
    }

    /// Copies the offscreen target back to the CPU.
    pub fn read_target(&self) -> Result<RgbaImage> {
        match &self.presenter {
            Presenter::Offscreen(target) => target.read(&self.device, &self.queue),
            Presenter::Surface { .. } => bail!("only offscreen targets can be read back"),
        }
    }
}

fn target_size(target: &RenderTarget) -> PhysicalSize<u32> {
    match target {
        RenderTarget::Window(window) => {
            let size = window.inner_size();
            PhysicalSize::new(size.width.max(1), size.height.max(1))
        }
        RenderTarget::Offscreen { width, height } => {
            PhysicalSize::new((*width).max(1), (*height).max(1))
        }
    }
}

/// Size to reconfigure a stale surface at: the window's size unless the
/// window is minimised.
fn stale_surface_size(window: PhysicalSize<u32>, configured: PhysicalSize<u32>) -> PhysicalSize<u32> {
    if window.width == 0 || window.height == 0 {
        configured
    } else {
        window
    }
}

fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    color_space: ColorSpaceMode,
) -> wgpu::TextureFormat {
    let want_srgb = color_space.prefers_srgb();
    formats
        .iter()
        .copied()
        .find(|format| format.is_srgb() == want_srgb)
        .unwrap_or_else(|| {
            let fallback = formats[0];
            tracing::warn!(
                ?fallback,
                want_srgb,
                "preferred surface format class unavailable; falling back"
            );
            fallback
        })
}

fn choose_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    let find = |wanted: wgpu::PresentMode| modes.iter().copied().find(|mode| *mode == wanted);
    if vsync {
        find(wgpu::PresentMode::Fifo).unwrap_or(modes[0])
    } else {
        find(wgpu::PresentMode::Immediate)
            .or_else(|| find(wgpu::PresentMode::Mailbox))
            .unwrap_or(modes[0])
    }
}

fn offscreen_format(color_space: ColorSpaceMode) -> wgpu::TextureFormat {
    if color_space.prefers_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_mode_prefers_linear_format() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(
            choose_surface_format(&formats, ColorSpaceMode::Auto),
            wgpu::TextureFormat::Bgra8Unorm
        );
        assert_eq!(
            choose_surface_format(&formats, ColorSpaceMode::Linear),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
    }

    #[test]
    fn stale_surface_follows_window_size() {
        let configured = PhysicalSize::new(640, 480);
        assert_eq!(
            stale_surface_size(PhysicalSize::new(800, 600), configured),
            PhysicalSize::new(800, 600)
        );
        assert_eq!(stale_surface_size(PhysicalSize::new(0, 600), configured), configured);
    }

    #[test]
    fn format_falls_back_to_first_entry() {
        let formats = [wgpu::TextureFormat::Bgra8UnormSrgb];
        assert_eq!(
            choose_surface_format(&formats, ColorSpaceMode::Gamma),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
    }

    #[test]
    fn present_mode_honours_vsync() {
        let modes = [
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Immediate,
        ];
        assert_eq!(choose_present_mode(&modes, true), wgpu::PresentMode::Fifo);
        assert_eq!(
            choose_present_mode(&modes, false),
            wgpu::PresentMode::Immediate
        );
        assert_eq!(
            choose_present_mode(&[wgpu::PresentMode::Mailbox, wgpu::PresentMode::Fifo], false),
            wgpu::PresentMode::Mailbox
        );
    }

    #[test]
    fn offscreen_format_tracks_color_space() {
        assert_eq!(
            offscreen_format(ColorSpaceMode::Gamma),
            wgpu::TextureFormat::Rgba8Unorm
        );
        assert_eq!(
            offscreen_format(ColorSpaceMode::Linear),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
    }
}
