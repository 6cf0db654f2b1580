//! wgpu implementation of [`RenderSurface`].
//!
//! Every surface call records and submits its own encoder, so views can
//! interleave scene renders and fullscreen passes freely. The host brackets
//! each frame with [`GpuSurface::begin_frame`] and [`GpuSurface::end_frame`].

use rustc_hash::FxHashMap;

use super::dynamic_buffer::TypedBuffer;
use super::pipeline_helpers::{
    create_scene_pipeline, create_screen_space_pipeline, filtering_sampler,
    mirror_sampler, texture_2d, uniform_buffer, uniform_layout, SceneState,
    ADDITIVE_BLENDING,
};
use super::render_context::RenderContext;
use super::texture::RenderTexture;
use crate::camera::{Camera, CameraUniform};
use crate::scene::{Geometry, MeshVertex, NodeId, Scene, SceneNode, StarPoint};
use crate::surface::{
    FullscreenPass, OffscreenId, PassUniforms, RenderSurface, RenderTarget,
};

const STAR_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x4];
const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

/// Per-node uniform block (`Node` in the scene shaders).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct NodeUniform {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
}

impl NodeUniform {
    fn from_node(node: &SceneNode) -> Self {
        Self {
            model: node.transform.to_cols_array_2d(),
            tint: node.tint,
        }
    }
}

enum NodeGeometry {
    Points(TypedBuffer<StarPoint>),
    Mesh {
        vertices: TypedBuffer<MeshVertex>,
        indices: TypedBuffer<u32>,
        lit: bool,
    },
}

impl NodeGeometry {
    fn upload(device: &wgpu::Device, queue: &wgpu::Queue, geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Points(cloud) => Self::Points(TypedBuffer::with_data(
                device,
                queue,
                "Star Instances",
                &cloud.points,
                wgpu::BufferUsages::VERTEX,
            )),
            Geometry::Mesh(mesh) => Self::Mesh {
                vertices: TypedBuffer::with_data(
                    device,
                    queue,
                    "Mesh Vertices",
                    &mesh.vertices,
                    wgpu::BufferUsages::VERTEX,
                ),
                indices: TypedBuffer::with_data(
                    device,
                    queue,
                    "Mesh Indices",
                    &mesh.indices,
                    wgpu::BufferUsages::INDEX,
                ),
                lit: mesh.lit,
            },
        }
    }

    /// Rewrite in place when the kind matches, otherwise re-upload.
    fn update(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, geometry: &Geometry) {
        match (&mut *self, geometry) {
            (Self::Points(buffer), Geometry::Points(cloud)) => {
                let _ = buffer.write(device, queue, &cloud.points);
            }
            (Self::Mesh { vertices, indices, lit }, Geometry::Mesh(mesh)) => {
                let _ = vertices.write(device, queue, &mesh.vertices);
                let _ = indices.write(device, queue, &mesh.indices);
                *lit = mesh.lit;
            }
            _ => *self = Self::upload(device, queue, geometry),
        }
    }
}

/// GPU copy of one scene node.
struct NodeResources {
    revision: u64,
    geometry: NodeGeometry,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct Offscreen {
    label: String,
    target: RenderTexture,
}

struct PassResources {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    sampled: bool,
}

struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Which node kinds a draw loop handles.
#[derive(Clone, Copy, PartialEq, Eq)]
enum DrawPhase {
    Opaque,
    Translucent,
}

/// The shared wgpu drawing surface.
pub struct GpuSurface {
    context: RenderContext,
    logical: (u32, u32),
    pixel_ratio: f32,
    depth: RenderTexture,
    sampler: wgpu::Sampler,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    node_layout: wgpu::BindGroupLayout,
    points_pipeline: wgpu::RenderPipeline,
    lit_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,

    plain_pass_layout: wgpu::BindGroupLayout,
    sampled_pass_layout: wgpu::BindGroupLayout,
    passes: FxHashMap<&'static str, PassResources>,
    pass_bindings: FxHashMap<(&'static str, Option<OffscreenId>), wgpu::BindGroup>,

    offscreens: FxHashMap<OffscreenId, Offscreen>,
    next_offscreen: u32,
    nodes: FxHashMap<NodeId, NodeResources>,

    frame: Option<Frame>,
    clear_pending: bool,
}

impl GpuSurface {
    /// Build pipelines for the context's surface format. The logical size
    /// starts equal to the physical size.
    pub fn new(context: RenderContext) -> Self {
        let device = &context.device;
        let format = context.format();
        let size = context.size();

        let camera_layout = uniform_layout(device, "Camera Layout");
        let node_layout = uniform_layout(device, "Node Layout");
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let layouts = [&camera_layout, &node_layout];

        let points_shader = device
            .create_shader_module(wgpu::include_wgsl!("../../assets/shaders/points.wgsl"));
        let mesh_shader = device
            .create_shader_module(wgpu::include_wgsl!("../../assets/shaders/mesh.wgsl"));

        let star_buffers = [wgpu::VertexBufferLayout {
            array_stride: size_of::<StarPoint>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &STAR_ATTRIBUTES,
        }];
        let mesh_buffers = [wgpu::VertexBufferLayout {
            array_stride: size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &MESH_ATTRIBUTES,
        }];

        let points_pipeline = create_scene_pipeline(
            device,
            "Points",
            &points_shader,
            format,
            &SceneState {
                fs_entry: "fs_main",
                buffers: &star_buffers,
                blend: ADDITIVE_BLENDING,
                depth_write: false,
            },
            &layouts,
        );
        let lit_pipeline = create_scene_pipeline(
            device,
            "Lit Mesh",
            &mesh_shader,
            format,
            &SceneState {
                fs_entry: "fs_lit",
                buffers: &mesh_buffers,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
            &layouts,
        );
        let glow_pipeline = create_scene_pipeline(
            device,
            "Glow Mesh",
            &mesh_shader,
            format,
            &SceneState {
                fs_entry: "fs_glow",
                buffers: &mesh_buffers,
                blend: ADDITIVE_BLENDING,
                depth_write: false,
            },
            &layouts,
        );

        let plain_pass_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Fullscreen Pass Layout"),
                entries: &[uniform_buffer(0)],
            });
        let sampled_pass_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Sampled Fullscreen Pass Layout"),
                entries: &[uniform_buffer(0), texture_2d(1), filtering_sampler(2)],
            });

        Self {
            depth: RenderTexture::depth(device, size),
            sampler: mirror_sampler(device, "Pass Sampler"),
            camera_buffer,
            camera_bind_group,
            node_layout,
            points_pipeline,
            lit_pipeline,
            glow_pipeline,
            plain_pass_layout,
            sampled_pass_layout,
            passes: FxHashMap::default(),
            pass_bindings: FxHashMap::default(),
            offscreens: FxHashMap::default(),
            next_offscreen: 0,
            nodes: FxHashMap::default(),
            frame: None,
            clear_pending: true,
            logical: size,
            pixel_ratio: 1.0,
            context,
        }
    }

    /// Acquire the swapchain texture for this frame. Returns `false` (and
    /// screen draws become no-ops) if the surface is unavailable.
    pub fn begin_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }
        match self.context.get_next_frame() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some(Frame { texture, view });
                self.clear_pending = true;
                true
            }
            Err(wgpu::SurfaceError::Outdated) => {
                log::debug!("surface outdated, reconfiguring");
                self.context.reconfigure();
                false
            }
            Err(wgpu::SurfaceError::Lost) => {
                log::warn!("surface lost, reconfiguring");
                self.context.reconfigure();
                false
            }
            Err(e) => {
                log::warn!("skipping frame: {e}");
                false
            }
        }
    }

    /// Present the frame acquired by [`Self::begin_frame`].
    pub fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.texture.present();
        }
    }

    /// The underlying GPU context.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.logical.0), scale(self.logical.1))
    }

    fn apply_size(&mut self) {
        let (width, height) = self.physical_size();
        if !self.context.resize(width, height) {
            return;
        }
        // A held swapchain texture is the old size.
        self.frame = None;

        let device = &self.context.device;
        let format = self.context.format();
        self.depth = RenderTexture::depth(device, (width, height));
        for offscreen in self.offscreens.values_mut() {
            offscreen.target =
                RenderTexture::color(device, &offscreen.label, (width, height), format);
        }
        self.pass_bindings.clear();
        log::debug!("surface resized to {width}x{height}");
    }

    fn sync_nodes(&mut self, scene: &Scene) {
        let device = &self.context.device;
        let queue = &self.context.queue;
        for node in scene.nodes().iter().filter(|n| n.visible) {
            if let Some(resources) = self.nodes.get_mut(&node.id()) {
                if resources.revision != node.revision() {
                    resources.geometry.update(device, queue, node.geometry());
                    resources.revision = node.revision();
                }
            } else {
                let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Node Uniforms"),
                    size: size_of::<NodeUniform>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Node Bind Group"),
                    layout: &self.node_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    }],
                });
                let _ = self.nodes.insert(
                    node.id(),
                    NodeResources {
                        revision: node.revision(),
                        geometry: NodeGeometry::upload(device, queue, node.geometry()),
                        uniforms,
                        bind_group,
                    },
                );
            }

            if let Some(resources) = self.nodes.get(&node.id()) {
                queue.write_buffer(
                    &resources.uniforms,
                    0,
                    bytemuck::bytes_of(&NodeUniform::from_node(node)),
                );
            }
        }
    }

    fn target_view(&self, target: RenderTarget) -> Option<&wgpu::TextureView> {
        match target {
            RenderTarget::Screen => self.frame.as_ref().map(|f| &f.view),
            RenderTarget::Offscreen(id) => self.offscreens.get(&id).map(|o| &o.target.view),
        }
    }

    /// Load op for the next draw to `target`. Screen draws clear once per
    /// frame (or after a reset); offscreen renders always start clean.
    fn load_op(&mut self, target: RenderTarget, clear: [f32; 4]) -> wgpu::LoadOp<wgpu::Color> {
        let clear_now = match target {
            RenderTarget::Screen => std::mem::replace(&mut self.clear_pending, false),
            RenderTarget::Offscreen(_) => true,
        };
        if clear_now {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(clear[0]),
                g: f64::from(clear[1]),
                b: f64::from(clear[2]),
                a: f64::from(clear[3]),
            })
        } else {
            wgpu::LoadOp::Load
        }
    }

    fn draw_nodes(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        scene: &Scene,
        phase: DrawPhase,
    ) {
        for node in scene.nodes().iter().filter(|n| n.visible) {
            let Some(resources) = self.nodes.get(&node.id()) else {
                continue;
            };
            match &resources.geometry {
                NodeGeometry::Points(instances) => {
                    if phase != DrawPhase::Translucent || instances.is_empty() {
                        continue;
                    }
                    pass.set_pipeline(&self.points_pipeline);
                    pass.set_bind_group(1, &resources.bind_group, &[]);
                    pass.set_vertex_buffer(0, instances.slice());
                    pass.draw(0..6, 0..instances.count() as u32);
                }
                NodeGeometry::Mesh { vertices, indices, lit } => {
                    let wanted = if *lit { DrawPhase::Opaque } else { DrawPhase::Translucent };
                    if phase != wanted || indices.is_empty() {
                        continue;
                    }
                    let pipeline = if *lit { &self.lit_pipeline } else { &self.glow_pipeline };
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(1, &resources.bind_group, &[]);
                    pass.set_vertex_buffer(0, vertices.slice());
                    pass.set_index_buffer(indices.slice(), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..indices.count() as u32, 0, 0..1);
                }
            }
        }
    }

    fn create_pass(&self, pass: &FullscreenPass, sampled: bool) -> PassResources {
        let device = &self.context.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(pass.label),
            source: wgpu::ShaderSource::Wgsl(pass.source.into()),
        });
        let layout = if sampled {
            &self.sampled_pass_layout
        } else {
            &self.plain_pass_layout
        };
        let pipeline = create_screen_space_pipeline(
            device,
            pass.label,
            &shader,
            self.context.format(),
            None,
            &[layout],
        );
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(pass.label),
            size: size_of::<PassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!("compiled fullscreen pass {}", pass.label);
        PassResources {
            pipeline,
            uniforms,
            sampled,
        }
    }

    fn pass_binding(
        &self,
        pass: &PassResources,
        source: Option<OffscreenId>,
    ) -> Option<wgpu::BindGroup> {
        let device = &self.context.device;
        let Some(id) = source else {
            return Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Fullscreen Pass Bind Group"),
                layout: &self.plain_pass_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pass.uniforms.as_entire_binding(),
                }],
            }));
        };
        let offscreen = self.offscreens.get(&id)?;
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sampled Fullscreen Pass Bind Group"),
            layout: &self.sampled_pass_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pass.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&offscreen.target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }))
    }
}

impl RenderSurface for GpuSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.logical = (width.max(1), height.max(1));
        self.apply_size();
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio.is_finite() && ratio > 0.0 {
            self.pixel_ratio = ratio;
            self.apply_size();
        }
    }

    fn size(&self) -> (u32, u32) {
        self.context.size()
    }

    fn reset_state(&mut self) {
        self.clear_pending = true;
        self.pass_bindings.clear();
    }

    fn render(&mut self, scene: &Scene, camera: &Camera, target: RenderTarget) {
        if self.target_view(target).is_none() {
            log::trace!("no view for {target:?}, skipping render");
            return;
        }
        self.sync_nodes(scene);

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);
        self.context
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        let load = self.load_op(target, scene.clear_color);
        let Some(view) = self.target_view(target) else {
            return;
        };

        let mut encoder = self.context.create_encoder("Scene Encoder");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            self.draw_nodes(&mut pass, scene, DrawPhase::Opaque);
            self.draw_nodes(&mut pass, scene, DrawPhase::Translucent);
        }
        self.context.submit(encoder);
    }

    fn create_offscreen(&mut self, label: &str) -> OffscreenId {
        self.next_offscreen += 1;
        let id = OffscreenId(self.next_offscreen);
        let target = RenderTexture::color(
            &self.context.device,
            label,
            self.context.size(),
            self.context.format(),
        );
        let _ = self.offscreens.insert(
            id,
            Offscreen {
                label: label.to_owned(),
                target,
            },
        );
        id
    }

    fn draw_fullscreen(
        &mut self,
        pass: &FullscreenPass,
        source: Option<OffscreenId>,
        uniforms: &PassUniforms,
    ) {
        if self.frame.is_none() {
            return;
        }
        if !self.passes.contains_key(pass.label) {
            let resources = self.create_pass(pass, source.is_some());
            let _ = self.passes.insert(pass.label, resources);
        }
        let Some(resources) = self.passes.get(pass.label) else {
            return;
        };
        if resources.sampled != source.is_some() {
            log::warn!("pass {} used with and without a source", pass.label);
            return;
        }
        self.context
            .queue
            .write_buffer(&resources.uniforms, 0, bytemuck::bytes_of(uniforms));

        let key = (pass.label, source);
        if !self.pass_bindings.contains_key(&key) {
            let Some(binding) = self.pass_binding(resources, source) else {
                log::warn!("pass {} samples unknown target {source:?}", pass.label);
                return;
            };
            let _ = self.pass_bindings.insert(key, binding);
        }

        let load = self.load_op(RenderTarget::Screen, [0.0, 0.0, 0.0, 1.0]);
        let (Some(frame), Some(resources), Some(binding)) = (
            self.frame.as_ref(),
            self.passes.get(pass.label),
            self.pass_bindings.get(&key),
        ) else {
            return;
        };

        let mut encoder = self.context.create_encoder("Fullscreen Encoder");
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            render_pass.set_pipeline(&resources.pipeline);
            render_pass.set_bind_group(0, binding, &[]);
            render_pass.draw(0..3, 0..1);
        }
        self.context.submit(encoder);
    }
}
