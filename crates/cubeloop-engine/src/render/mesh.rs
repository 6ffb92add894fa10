use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{Mesh, PerspectiveCamera, Scene, Vertex};

/// Directional lights beyond this count are ignored by the shader.
pub const MAX_LIGHTS: usize = 4;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Lit, depth-tested mesh renderer.
///
/// Draws every mesh of a [`Scene`] in one pass, clearing to the scene
/// background first. With a sample count above one the pass renders into an
/// internal multisampled target and resolves into `RenderTarget::color_view`.
///
/// Geometry is uploaded once per mesh; it is re-uploaded only when the number
/// of meshes or their vertex/index counts change. Transforms and materials are
/// rewritten every frame.
#[derive(Default)]
pub struct MeshRenderer {
    pipeline_key: Option<(wgpu::TextureFormat, u32)>,
    pipeline: Option<wgpu::RenderPipeline>,

    frame_bgl: Option<wgpu::BindGroupLayout>,
    mesh_bgl: Option<wgpu::BindGroupLayout>,

    frame_ubo: Option<wgpu::Buffer>,
    frame_bind_group: Option<wgpu::BindGroup>,

    meshes: Vec<MeshGpu>,
    attachments: Option<Attachments>,

    warned_light_overflow: bool,
}

struct MeshGpu {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    vertex_count: usize,
    index_count: u32,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Size-dependent render attachments.
struct Attachments {
    key: (wgpu::TextureFormat, u32, u32, u32),
    depth: wgpu::TextureView,
    msaa_color: Option<wgpu::TextureView>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the target to `scene.background` and draws all meshes as seen by `camera`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        self.ensure_pipeline(ctx);
        self.ensure_frame_bindings(ctx);
        self.ensure_attachments(ctx);
        self.ensure_meshes(ctx, scene);

        if scene.lights().len() > MAX_LIGHTS && !self.warned_light_overflow {
            log::warn!(
                "scene has {} lights; only the first {MAX_LIGHTS} are shaded",
                scene.lights().len()
            );
            self.warned_light_overflow = true;
        }

        // Mutating methods must happen before borrowing pipeline/buffers immutably.
        let Some(frame_ubo) = self.frame_ubo.as_ref() else { return };
        let frame = FrameUniform::new(scene, camera);
        ctx.queue.write_buffer(frame_ubo, 0, bytemuck::bytes_of(&frame));

        for (gpu, mesh) in self.meshes.iter().zip(scene.meshes()) {
            let u = MeshUniform::new(mesh);
            ctx.queue.write_buffer(&gpu.ubo, 0, bytemuck::bytes_of(&u));
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(frame_bind_group) = self.frame_bind_group.as_ref() else { return };
        let Some(attachments) = self.attachments.as_ref() else { return };

        let (view, resolve_target, store) = match attachments.msaa_color.as_ref() {
            Some(msaa) => (msaa, Some(target.color_view), wgpu::StoreOp::Discard),
            None => (target.color_view, None, wgpu::StoreOp::Store),
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cubeloop mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &attachments.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, frame_bind_group, &[]);

        for gpu in &self.meshes {
            if gpu.index_count == 0 {
                continue;
            }
            rpass.set_bind_group(1, &gpu.bind_group, &[]);
            rpass.set_vertex_buffer(0, gpu.vbo.slice(..));
            rpass.set_index_buffer(gpu.ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        let key = (ctx.surface_format, ctx.sample_count);
        if self.pipeline_key == Some(key) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cubeloop mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let frame_bgl = uniform_layout(
            ctx.device,
            "cubeloop mesh frame bgl",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            std::mem::size_of::<FrameUniform>(),
        );
        let mesh_bgl = uniform_layout(
            ctx.device,
            "cubeloop mesh object bgl",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            std::mem::size_of::<MeshUniform>(),
        );

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("cubeloop mesh pipeline layout"),
                bind_group_layouts: &[&frame_bgl, &mesh_bgl],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cubeloop mesh pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: ctx.sample_count,
                ..Default::default()
            },

            multiview_mask: None,
            cache: None,
        });

        self.pipeline_key = Some(key);
        self.pipeline = Some(pipeline);
        self.frame_bgl = Some(frame_bgl);
        self.mesh_bgl = Some(mesh_bgl);

        // Bind groups reference the old layouts.
        self.frame_ubo = None;
        self.frame_bind_group = None;
        self.meshes.clear();
        self.attachments = None;
    }

    fn ensure_frame_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.frame_bind_group.is_some() && self.frame_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.frame_bgl.as_ref() else { return };

        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cubeloop mesh frame ubo"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cubeloop mesh frame bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.frame_ubo = Some(ubo);
        self.frame_bind_group = Some(bind_group);
    }

    fn ensure_attachments(&mut self, ctx: &RenderCtx<'_>) {
        let key = (
            ctx.surface_format,
            ctx.viewport.width.max(1),
            ctx.viewport.height.max(1),
            ctx.sample_count,
        );
        if self.attachments.as_ref().is_some_and(|a| a.key == key) {
            return;
        }

        let (format, width, height, samples) = key;
        log::debug!("mesh attachments {width}x{height}, {samples}x MSAA");

        let depth = attachment_view(ctx.device, "cubeloop depth", DEPTH_FORMAT, width, height, samples);
        let msaa_color = (samples > 1)
            .then(|| attachment_view(ctx.device, "cubeloop msaa color", format, width, height, samples));

        self.attachments = Some(Attachments {
            key,
            depth,
            msaa_color,
        });
    }

    fn ensure_meshes(&mut self, ctx: &RenderCtx<'_>, scene: &Scene) {
        let up_to_date = self.meshes.len() == scene.meshes().len()
            && self.meshes.iter().zip(scene.meshes()).all(|(gpu, mesh)| {
                gpu.vertex_count == mesh.geometry.vertices.len()
                    && gpu.index_count == mesh.geometry.index_count()
            });
        if up_to_date {
            return;
        }
        let Some(bgl) = self.mesh_bgl.as_ref() else { return };

        self.meshes = scene
            .meshes()
            .iter()
            .map(|mesh| upload_mesh(ctx.device, bgl, mesh))
            .collect();
        log::debug!("uploaded {} mesh(es)", self.meshes.len());
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size as u64),
            },
            count: None,
        }],
    })
}

fn attachment_view(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn upload_mesh(device: &wgpu::Device, bgl: &wgpu::BindGroupLayout, mesh: &Mesh) -> MeshGpu {
    let geometry = &mesh.geometry;

    let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cubeloop mesh vbo"),
        contents: bytemuck::cast_slice(&geometry.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    // Index buffers must be a multiple of 4 bytes.
    let mut indices = geometry.indices.clone();
    if indices.len() % 2 == 1 {
        indices.push(0);
    }
    let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cubeloop mesh ibo"),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("cubeloop mesh ubo"),
        size: std::mem::size_of::<MeshUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("cubeloop mesh bind group"),
        layout: bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.as_entire_binding(),
        }],
    });

    MeshGpu {
        vbo,
        ibo,
        vertex_count: geometry.vertices.len(),
        index_count: geometry.index_count(),
        ubo,
        bind_group,
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
struct LightUniform {
    direction: [f32; 4],
    color: [f32; 4],
}

/// Per-frame data, laid out to match `FrameUniform` in `mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    light_count: u32,
    _pad: [u32; 3],
    lights: [LightUniform; MAX_LIGHTS],
}

impl FrameUniform {
    fn new(scene: &Scene, camera: &PerspectiveCamera) -> Self {
        let mut lights = [LightUniform::default(); MAX_LIGHTS];
        let used = scene.lights().len().min(MAX_LIGHTS);
        for (slot, light) in lights.iter_mut().zip(scene.lights()) {
            *slot = LightUniform {
                direction: light.to_light().extend(0.0).to_array(),
                color: light.radiance().to_array(),
            };
        }

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            ambient: scene.ambient.to_array(),
            light_count: used as u32,
            _pad: [0; 3],
            lights,
        }
    }
}

/// Per-mesh data, laid out to match `MeshUniform` in `mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MeshUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    color: [f32; 4],
    specular: [f32; 4],
}

impl MeshUniform {
    fn new(mesh: &Mesh) -> Self {
        let material = &mesh.material;
        let [sr, sg, sb, _] = material.specular.to_array();

        Self {
            model: mesh.transform.matrix().to_cols_array_2d(),
            normal: Mat4::from_mat3(mesh.transform.normal_matrix()).to_cols_array_2d(),
            color: material.color.to_array(),
            specular: [sr, sg, sb, material.shininess],
        }
    }
}
