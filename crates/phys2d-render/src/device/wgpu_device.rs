use std::collections::HashMap;
use std::num::NonZeroU64;

use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use crate::coords::ColorRgba;
use crate::geometry::{GeometryData, Topology, VertexLayout};

use super::shader::{validate_program, ProgramLayout, ShaderError, MAX_UNIFORM_BLOCK_SIZE};
use super::{
    DeviceStats, GeometryHandle, GraphicsDevice, ProgramHandle, RenderTarget, UniformValue,
};

type PipelineKey = (VertexLayout, Topology);

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    layout: VertexLayout,
    topology: Topology,
}

struct GpuProgram {
    layout: ProgramLayout,
    /// Current uniform values, laid out as the program's uniform block.
    block: Vec<u8>,

    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    bind_group: Option<wgpu::BindGroup>,
}

impl GpuProgram {
    #[inline]
    fn has_block(&self) -> bool {
        !self.block.is_empty()
    }
}

#[derive(Debug, Copy, Clone)]
struct PendingDraw {
    program: ProgramHandle,
    geometry: GeometryHandle,
    uniform_offset: u32,
}

/// [`GraphicsDevice`] backed by wgpu.
///
/// Draw calls are recorded with a snapshot of the program's uniform block.
/// [`WgpuDevice::encode`] uploads all snapshots into one dynamic-offset
/// uniform buffer and replays the draws into a single render pass.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,

    /// Distance between uniform snapshots in the uniform buffer.
    uniform_stride: u64,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_capacity: u64,

    geometries: SlotMap<GeometryHandle, GpuGeometry>,
    programs: SlotMap<ProgramHandle, GpuProgram>,
    current: Option<ProgramHandle>,

    clear_color: ColorRgba,
    clear_requested: bool,
    draws: Vec<PendingDraw>,
    staging: Vec<u8>,
}

impl WgpuDevice {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment).max(1);
        let uniform_stride = u64::from(MAX_UNIFORM_BLOCK_SIZE).div_ceil(alignment) * alignment;

        Self {
            device: device.clone(),
            queue: queue.clone(),
            format,
            uniform_stride,
            uniform_buffer: None,
            uniform_capacity: 0,
            geometries: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            current: None,
            clear_color: ColorRgba::black(),
            clear_requested: false,
            draws: Vec::new(),
            staging: Vec::new(),
        }
    }

    /// Target format the pipelines are built for.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Encodes the draws recorded since the last call into one render pass.
    ///
    /// The pass clears to the clear color when [`GraphicsDevice::clear`] was
    /// called in between, and loads the existing contents otherwise.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>) {
        if self.draws.is_empty() && !self.clear_requested {
            return;
        }

        let draws = std::mem::take(&mut self.draws);

        self.ensure_uniform_capacity(self.staging.len() as u64);
        if !self.staging.is_empty() {
            if let Some(buffer) = self.uniform_buffer.as_ref() {
                self.queue.write_buffer(buffer, 0, &self.staging);
            }
        }

        for draw in &draws {
            let Some(geometry) = self.geometries.get(draw.geometry) else { continue };
            let key = (geometry.layout, geometry.topology);
            self.ensure_pipeline(draw.program, key);
            self.ensure_bind_group(draw.program);
        }

        let load = if self.clear_requested {
            wgpu::LoadOp::Clear(self.clear_color.into())
        } else {
            wgpu::LoadOp::Load
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("phys2d scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in &draws {
            // Geometry released after the draw was recorded: nothing to replay.
            let Some(geometry) = self.geometries.get(draw.geometry) else { continue };
            let Some(program) = self.programs.get(draw.program) else { continue };
            let key = (geometry.layout, geometry.topology);
            let Some(pipeline) = program.pipelines.get(&key) else { continue };
            let Some(bind_group) = program.bind_group.as_ref() else { continue };
            if geometry.index_count == 0 {
                continue;
            }

            rpass.set_pipeline(pipeline);
            if program.has_block() {
                rpass.set_bind_group(0, bind_group, &[draw.uniform_offset]);
            } else {
                rpass.set_bind_group(0, bind_group, &[]);
            }
            rpass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            rpass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }

        drop(rpass);

        self.staging.clear();
        self.clear_requested = false;
    }

    /// Drops the recorded draws without encoding them, e.g. when no surface
    /// texture could be acquired for the frame.
    pub fn discard(&mut self) {
        self.draws.clear();
        self.staging.clear();
        self.clear_requested = false;
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_uniform_capacity(&mut self, required: u64) {
        let required = required.max(self.uniform_stride);
        if required <= self.uniform_capacity && self.uniform_buffer.is_some() {
            return;
        }

        let capacity = required.next_power_of_two().max(self.uniform_stride * 64);
        self.uniform_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("phys2d uniform buffer"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.uniform_capacity = capacity;

        // Existing bind groups point at the old buffer.
        for (_, program) in self.programs.iter_mut() {
            program.bind_group = None;
        }
    }

    fn ensure_bind_group(&mut self, handle: ProgramHandle) {
        let Some(buffer) = self.uniform_buffer.as_ref() else { return };
        let Some(program) = self.programs.get_mut(handle) else { return };
        if program.bind_group.is_some() {
            return;
        }

        let entries: Vec<wgpu::BindGroupEntry<'_>> = match NonZeroU64::new(program.block.len() as u64) {
            Some(size) => vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: Some(size),
                }),
            }],
            None => Vec::new(),
        };

        program.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("phys2d program bind group"),
            layout: &program.bind_group_layout,
            entries: &entries,
        }));
    }

    fn ensure_pipeline(&mut self, handle: ProgramHandle, key: PipelineKey) {
        let Some(program) = self.programs.get_mut(handle) else { return };
        if program.pipelines.contains_key(&key) {
            return;
        }

        let (layout, topology) = key;
        log::debug!("building pipeline for {layout:?} {topology:?}");

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("phys2d pipeline"),
            layout: Some(&program.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_buffer_layout(layout)],
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: match topology {
                    Topology::Lines => wgpu::PrimitiveTopology::LineList,
                    Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
                },
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        program.pipelines.insert(key, pipeline);
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_geometry(&mut self, data: &GeometryData) -> GeometryHandle {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("phys2d geometry vbo"),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("phys2d geometry ibo"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.geometries.insert(GpuGeometry {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            layout: data.layout,
            topology: data.topology,
        })
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        let Some(g) = self.geometries.remove(geometry) else { return };
        g.vertex_buffer.destroy();
        g.index_buffer.destroy();
    }

    fn create_program(
        &mut self,
        vertex: &str,
        fragment: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        // Both stages are validated before any GPU object exists, so a failure
        // leaves nothing behind.
        let layout = validate_program(vertex, fragment)?;

        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phys2d vertex shader"),
            source: wgpu::ShaderSource::Wgsl(vertex.into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phys2d fragment shader"),
            source: wgpu::ShaderSource::Wgsl(fragment.into()),
        });

        let block_size = layout.block_size();
        let entries: Vec<wgpu::BindGroupLayoutEntry> = match NonZeroU64::new(u64::from(block_size)) {
            Some(size) => vec![wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(size),
                },
                count: None,
            }],
            None => Vec::new(),
        };

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("phys2d program bgl"),
                entries: &entries,
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("phys2d pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        Ok(self.programs.insert(GpuProgram {
            layout,
            block: vec![0; block_size as usize],
            vertex,
            fragment,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            bind_group: None,
        }))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(program);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current = self.programs.contains_key(program).then_some(program);
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(p) = self.programs.get_mut(program) else { return };
        let Some(slot) = p.layout.slot(name) else { return };
        if slot.kind != value.kind() {
            log::debug!("uniform `{name}` expects {:?}, got {:?}", slot.kind, value.kind());
            return;
        }

        let start = slot.offset as usize;
        value.write_to(&mut p.block[start..start + slot.kind.size() as usize]);
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        let Some(program) = self.current else { return };
        let Some(p) = self.programs.get(program) else { return };
        if !self.geometries.contains_key(geometry) {
            return;
        }

        let uniform_offset = if p.has_block() {
            let offset = self.staging.len();
            self.staging.extend_from_slice(&p.block);
            self.staging.resize(offset + self.uniform_stride as usize, 0);
            offset as u32
        } else {
            0
        };

        self.draws.push(PendingDraw {
            program,
            geometry,
            uniform_offset,
        });
    }

    fn clear(&mut self) {
        self.clear_requested = true;
    }

    fn set_clear_color(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            geometries: self.geometries.len(),
            programs: self.programs.len(),
        }
    }
}

const PLAIN_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const COLORED_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

fn vertex_buffer_layout(layout: VertexLayout) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: layout.stride(),
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: match layout {
            VertexLayout::Plain => &PLAIN_ATTRS,
            VertexLayout::Colored => &COLORED_ATTRS,
        },
    }
}
