//! Animated gradient written by a compute shader and blitted to the screen.

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use harness::{checked, Blitter, Context, Example, ShaderStage};
use wgpu::util::DeviceExt;

pub const GRADIENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const WORKGROUP_SIZE: u32 = 8;
pub const TIME_STEP: f32 = 0.01;

/// Uniform block read by `GradientTexture.comp`, padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GradientUniforms {
    pub time: f32,
    _padding: [f32; 3],
}

impl GradientUniforms {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            _padding: [0.0; 3],
        }
    }
}

/// Workgroups needed to cover a `width`×`height` texture.
pub fn workgroup_count(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE))
}

/// Colour the compute shader writes at pixel `(x, y)` for `time`.
pub fn gradient_color(x: u32, y: u32, width: u32, height: u32, time: f32) -> [f32; 3] {
    let u = x as f32 / width as f32;
    let v = y as f32 / height as f32;
    let channel = |offset: f32, phase: f32| 0.5 + 0.5 * (time + phase + offset).cos();
    [channel(0.0, u), channel(2.0, v), channel(4.0, u)]
}

struct GradientTexture {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

impl GradientTexture {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ComputeUniforms gradient"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: GRADIENT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ComputeUniforms bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        });
        Self {
            view,
            bind_group,
            width,
            height,
        }
    }
}

struct GradientResources {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    gradient: GradientTexture,
    blitter: Blitter,
}

impl GradientResources {
    fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.gradient.width != width || self.gradient.height != height {
            tracing::debug!(width, height, "recreating gradient texture");
            self.gradient = GradientTexture::new(
                device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                width,
                height,
            );
        }
    }
}

#[derive(Default)]
pub struct ComputeUniforms {
    time: f32,
    resources: Option<GradientResources>,
}

impl ComputeUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("ComputeUniforms layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: GRADIENT_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

impl Example for ComputeUniforms {
    fn name(&self) -> &'static str {
        "ComputeUniforms"
    }

    fn init(&mut self, context: &mut Context) -> Result<()> {
        context.common_init()?;
        let shader = context.load_shader("GradientTexture.comp")?;
        shader.stage.require("GradientTexture.comp", ShaderStage::Compute)?;

        let gpu = context.gpu()?;
        let device = &gpu.device;
        let bind_group_layout = bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ComputeUniforms pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = checked(device, "gradient compute pipeline", |device| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("ComputeUniforms pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader.module,
                entry_point: Some(shader.entry_point),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        })
        .inspect_err(|err| tracing::error!(error = %err, "failed to create compute pipeline"))?;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ComputeUniforms uniforms"),
            contents: bytemuck::bytes_of(&GradientUniforms::new(0.0)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let size = gpu.target_size();
        let gradient = GradientTexture::new(
            device,
            &bind_group_layout,
            &uniform_buffer,
            size.width,
            size.height,
        );

        self.time = 0.0;
        self.resources = Some(GradientResources {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            gradient,
            blitter: Blitter::new(device, wgpu::FilterMode::Linear),
        });
        Ok(())
    }

    fn update(&mut self, _context: &mut Context) -> Result<()> {
        self.time += TIME_STEP;
        Ok(())
    }

    fn draw(&mut self, context: &mut Context) -> Result<()> {
        let gpu = context.gpu()?;
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| anyhow!("ComputeUniforms drawn before init"))?;

        let frame = gpu.acquire_frame()?;
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ComputeUniforms encoder"),
            });

        if let Some(frame) = frame.as_ref() {
            resources.ensure_size(&gpu.device, frame.width, frame.height);
            gpu.queue.write_buffer(
                &resources.uniform_buffer,
                0,
                bytemuck::bytes_of(&GradientUniforms::new(self.time)),
            );

            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("ComputeUniforms gradient pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&resources.pipeline);
                pass.set_bind_group(0, &resources.gradient.bind_group, &[]);
                let (groups_x, groups_y) = workgroup_count(frame.width, frame.height);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }

            resources.blitter.blit(
                &gpu.device,
                &mut encoder,
                &resources.gradient.view,
                &frame.view,
                frame.format,
            );
        }

        gpu.submit(encoder, frame);
        Ok(())
    }

    fn quit(&mut self, context: &mut Context) {
        self.resources = None;
        context.common_quit();
    }
}
