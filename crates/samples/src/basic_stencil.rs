//! Stencil masking with two pipelines.
//!
//! The masker draws a small triangle that always fails the stencil test and
//! writes 1 into the stencil buffer. The maskee then draws a large RGB
//! triangle only where the stencil is still 0, leaving a triangular hole.

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use harness::{checked, Context, Example, LoadedShader, ShaderStage};
use wgpu::util::DeviceExt;

pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

const MASKER_REFERENCE: u32 = 1;
const MASKEE_REFERENCE: u32 = 0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PositionColorVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

impl PositionColorVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Unorm8x4];

    pub const fn new(x: f32, y: f32, color: [u8; 4]) -> Self {
        Self {
            position: [x, y, 0.0],
            color,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const YELLOW: [u8; 4] = [255, 255, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Masker triangle first, maskee triangle second.
pub const VERTICES: [PositionColorVertex; 6] = [
    PositionColorVertex::new(-0.5, -0.5, YELLOW),
    PositionColorVertex::new(0.5, -0.5, YELLOW),
    PositionColorVertex::new(0.0, 0.5, YELLOW),
    PositionColorVertex::new(-1.0, -1.0, RED),
    PositionColorVertex::new(1.0, -1.0, GREEN),
    PositionColorVertex::new(0.0, 1.0, BLUE),
];

pub fn masker_stencil() -> wgpu::StencilState {
    let face = wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Never,
        fail_op: wgpu::StencilOperation::Replace,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    };
    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: 0xFF,
        write_mask: 0xFF,
    }
}

pub fn maskee_stencil() -> wgpu::StencilState {
    let face = wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Equal,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    };
    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: 0xFF,
        write_mask: 0,
    }
}

/// Depth and stencil are cleared to zero and only live for the pass.
fn depth_stencil_ops() -> (wgpu::Operations<f32>, wgpu::Operations<u32>) {
    (
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(0.0),
            store: wgpu::StoreOp::Discard,
        },
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(0),
            store: wgpu::StoreOp::Discard,
        },
    )
}

struct DepthStencilTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl DepthStencilTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("BasicStencil depth-stencil"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            width,
            height,
        }
    }

    fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.width != width || self.height != height {
            tracing::debug!(width, height, "recreating depth-stencil texture");
            *self = Self::new(device, width, height);
        }
    }
}

struct StencilResources {
    masker: wgpu::RenderPipeline,
    maskee: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    depth_stencil: DepthStencilTarget,
}

#[derive(Default)]
pub struct BasicStencil {
    resources: Option<StencilResources>,
}

impl BasicStencil {
    pub fn new() -> Self {
        Self::default()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex: &LoadedShader,
    fragment: &LoadedShader,
    color_format: wgpu::TextureFormat,
    stencil: wgpu::StencilState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &vertex.module,
            entry_point: Some(vertex.entry_point),
            buffers: &[PositionColorVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_STENCIL_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil,
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment.module,
            entry_point: Some(fragment.entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}

impl Example for BasicStencil {
    fn name(&self) -> &'static str {
        "BasicStencil"
    }

    fn init(&mut self, context: &mut Context) -> Result<()> {
        context.common_init()?;
        let vertex = context.load_shader("PositionColor.vert")?;
        vertex.stage.require("PositionColor.vert", ShaderStage::Vertex)?;
        let fragment = context.load_shader("SolidColor.frag")?;
        fragment.stage.require("SolidColor.frag", ShaderStage::Fragment)?;

        let gpu = context.gpu()?;
        let device = &gpu.device;
        let color_format = gpu.swapchain_format();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BasicStencil layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let masker = checked(device, "masker pipeline", |device| {
            create_pipeline(
                device,
                "BasicStencil masker",
                &layout,
                &vertex,
                &fragment,
                color_format,
                masker_stencil(),
            )
        })
        .inspect_err(|err| tracing::error!(error = %err, "failed to create masker pipeline"))?;
        let maskee = checked(device, "maskee pipeline", |device| {
            create_pipeline(
                device,
                "BasicStencil maskee",
                &layout,
                &vertex,
                &fragment,
                color_format,
                maskee_stencil(),
            )
        })
        .inspect_err(|err| tracing::error!(error = %err, "failed to create maskee pipeline"))?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("BasicStencil vertices"),
            contents: bytemuck::cast_slice(&VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let size = gpu.target_size();
        self.resources = Some(StencilResources {
            masker,
            maskee,
            vertex_buffer,
            depth_stencil: DepthStencilTarget::new(device, size.width, size.height),
        });
        Ok(())
    }

    fn update(&mut self, _context: &mut Context) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, context: &mut Context) -> Result<()> {
        let gpu = context.gpu()?;
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| anyhow!("BasicStencil drawn before init"))?;

        let frame = gpu.acquire_frame()?;
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("BasicStencil encoder"),
            });

        if let Some(frame) = frame.as_ref() {
            resources
                .depth_stencil
                .ensure_size(&gpu.device, frame.width, frame.height);

            let (depth_ops, stencil_ops) = depth_stencil_ops();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("BasicStencil pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &resources.depth_stencil.view,
                    depth_ops: Some(depth_ops),
                    stencil_ops: Some(stencil_ops),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_vertex_buffer(0, resources.vertex_buffer.slice(..));

            pass.set_pipeline(&resources.masker);
            pass.set_stencil_reference(MASKER_REFERENCE);
            pass.draw(0..3, 0..1);

            pass.set_pipeline(&resources.maskee);
            pass.set_stencil_reference(MASKEE_REFERENCE);
            pass.draw(3..6, 0..1);
        }

        gpu.submit(encoder, frame);
        Ok(())
    }

    fn quit(&mut self, context: &mut Context) {
        self.resources = None;
        context.common_quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_shader_inputs() {
        assert_eq!(std::mem::size_of::<PositionColorVertex>(), 16);
        let layout = PositionColorVertex::layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(layout.attributes[1].shader_location, 1);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Unorm8x4);
    }

    #[test]
    fn masker_triangle_sits_inside_maskee_triangle() {
        let (masker, maskee) = VERTICES.split_at(3);
        assert!(masker.iter().all(|vertex| vertex.color == YELLOW));
        assert_eq!(
            maskee.iter().map(|vertex| vertex.color).collect::<Vec<_>>(),
            vec![RED, GREEN, BLUE]
        );
        assert_eq!(maskee[0].position, [-1.0, -1.0, 0.0]);
        assert_eq!(maskee[1].position, [1.0, -1.0, 0.0]);
        assert_eq!(maskee[2].position, [0.0, 1.0, 0.0]);
        for vertex in masker {
            let [x, y, z] = vertex.position;
            assert_eq!(z, 0.0);
            assert!(x.abs() <= 0.5 && y.abs() <= 0.5);
        }
    }

    #[test]
    fn stencil_states_write_then_test() {
        let masker = masker_stencil();
        assert_eq!(masker.front.compare, wgpu::CompareFunction::Never);
        assert_eq!(masker.front.fail_op, wgpu::StencilOperation::Replace);
        assert_eq!(masker.front, masker.back);
        assert_eq!(masker.write_mask, 0xFF);

        let maskee = maskee_stencil();
        assert_eq!(maskee.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(maskee.front, maskee.back);
        assert_eq!(maskee.read_mask, 0xFF);
        assert_eq!(maskee.write_mask, 0);
        assert_eq!(MASKEE_REFERENCE, 0);
        assert_eq!(MASKER_REFERENCE, 1);
    }

    #[test]
    fn depth_stencil_contents_are_discarded_after_the_pass() {
        let (depth, stencil) = depth_stencil_ops();
        assert_eq!(depth.load, wgpu::LoadOp::Clear(0.0));
        assert_eq!(depth.store, wgpu::StoreOp::Discard);
        assert_eq!(stencil.load, wgpu::LoadOp::Clear(0));
        assert_eq!(stencil.store, wgpu::StoreOp::Discard);
    }
}
