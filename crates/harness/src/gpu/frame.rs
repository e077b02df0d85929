use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use winit::dpi::PhysicalSize;

/// A texture acquired for a single draw.
///
/// Surface frames are presented by [`super::GpuContext::submit`]; offscreen
/// frames simply alias the persistent offscreen texture.
pub struct Frame {
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl Frame {
    pub(crate) fn from_surface(texture: wgpu::SurfaceTexture, format: wgpu::TextureFormat) -> Self {
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            width: texture.texture.width(),
            height: texture.texture.height(),
            format,
            surface_texture: Some(texture),
        }
    }

    pub(crate) fn present(self) {
        if let Some(texture) = self.surface_texture {
            texture.present();
        }
    }
}

/// Render target used when no window is available.
pub(crate) struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub size: PhysicalSize<u32>,
    pub format: wgpu::TextureFormat,
}

impl OffscreenTarget {
    pub(crate) fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        Self {
            texture,
            size,
            format,
        }
    }

    pub(crate) fn frame(&self) -> Frame {
        Frame {
            view: self
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            width: self.size.width,
            height: self.size.height,
            format: self.format,
            surface_texture: None,
        }
    }

    pub(crate) fn read(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<RgbaImage> {
        let width = self.size.width;
        let height = self.size.height;
        let unpadded_bytes_per_row = width * 4;
        let padded_bytes_per_row = padded_row_bytes(width);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| anyhow!("failed to wait for GPU readback: {err}"))?;
        rx.recv()
            .context("readback callback was dropped")?
            .context("failed to map readback buffer")?;

        let data = slice.get_mapped_range();
        let pixels = strip_row_padding(
            &data,
            unpadded_bytes_per_row as usize,
            padded_bytes_per_row as usize,
        );
        drop(data);
        buffer.unmap();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("readback size does not match {width}x{height}"))
    }
}

fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

fn strip_row_padding(data: &[u8], unpadded: usize, padded: usize) -> Vec<u8> {
    let rows = data.len() / padded;
    let mut pixels = Vec::with_capacity(unpadded * rows);
    for row in data.chunks_exact(padded) {
        pixels.extend_from_slice(&row[..unpadded]);
    }
    pixels
}
