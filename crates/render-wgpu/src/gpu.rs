use crate::shaders;
use crate::uniforms::{Globals, InstanceData};
use backdrop_common::SurfaceSize;
use backdrop_render::{OutputSurface, PerspectiveCamera, RenderError, SurfaceOptions};
use backdrop_scene::{DrawItem, Scene};
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MSAA_SAMPLES: u32 = 4;
const MAX_INSTANCES: u32 = 256;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// Prefer an sRGB format so linear shading output is encoded on store.
pub fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
    formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb)
}

/// Choose how the compositor blends the window with what is behind it.
pub fn pick_alpha_mode(
    available: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    use wgpu::CompositeAlphaMode as Mode;
    if transparent {
        for preferred in [Mode::PreMultiplied, Mode::PostMultiplied, Mode::Inherit] {
            if available.contains(&preferred) {
                return preferred;
            }
        }
    }
    if available.contains(&Mode::Opaque) {
        Mode::Opaque
    } else {
        available.first().copied().unwrap_or(Mode::Auto)
    }
}

/// Linear, premultiplied clear color. Opaque surfaces ignore `clear_alpha`.
pub fn clear_color(options: &SurfaceOptions) -> wgpu::Color {
    let [r, g, b] = options.clear_color.linear();
    let a = if options.transparent {
        options.clear_alpha.clamp(0.0, 1.0)
    } else {
        1.0
    };
    wgpu::Color {
        r: (r * a) as f64,
        g: (g * a) as f64,
        b: (b * a) as f64,
        a: a as f64,
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

enum Target {
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

struct Resources {
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    meshes: Vec<GpuMesh>,
    depth_texture: wgpu::TextureView,
    msaa_texture: Option<wgpu::TextureView>,
    target: Target,
}

/// wgpu output surface.
///
/// Starts out rendering into an offscreen texture; [`WgpuSurface::attach`]
/// switches it to a window surface. Part meshes are uploaded on first render
/// and reused, since part geometry never changes.
pub struct WgpuSurface {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    format: wgpu::TextureFormat,
    size: SurfaceSize,
    sample_count: u32,
    clear: wgpu::Color,
    resources: Option<Resources>,
}

impl WgpuSurface {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        options: &SurfaceOptions,
    ) -> Self {
        let sample_count = if options.antialias { MSAA_SAMPLES } else { 1 };
        let size = options.size;
        let extent = size.non_zero();

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phong_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PHONG_SHADER.into()),
        });

        let opaque_pipeline =
            Self::create_pipeline(&device, &pipeline_layout, &shader, format, sample_count, false);
        let transparent_pipeline =
            Self::create_pipeline(&device, &pipeline_layout, &shader, format, sample_count, true);

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: MAX_INSTANCES as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let resources = Resources {
            opaque_pipeline,
            transparent_pipeline,
            globals_buffer,
            globals_bind_group,
            instance_buffer,
            meshes: Vec::new(),
            depth_texture: Self::create_attachment(&device, DEPTH_FORMAT, extent, sample_count),
            msaa_texture: (sample_count > 1)
                .then(|| Self::create_attachment(&device, format, extent, sample_count)),
            target: Target::Offscreen {
                texture: Self::create_offscreen(&device, format, extent),
            },
        };

        Self {
            device,
            queue,
            format,
            size,
            sample_count,
            clear: clear_color(options),
            resources: Some(resources),
        }
    }

    /// Present to `surface` from now on instead of the offscreen texture.
    pub fn attach(&mut self, surface: wgpu::Surface<'static>, alpha_mode: wgpu::CompositeAlphaMode) {
        let Some(resources) = &mut self.resources else {
            return;
        };
        let extent = self.size.non_zero();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width: extent.width,
            height: extent.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&self.device, &config);
        resources.target = Target::Window { surface, config };
    }

    pub fn is_attached(&self) -> bool {
        matches!(
            self.resources.as_ref().map(|r| &r.target),
            Some(Target::Window { .. })
        )
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        sample_count: u32,
        transparent: bool,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if transparent {
                "transparent_pipeline"
            } else {
                "opaque_pipeline"
            }),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                            8 => Float32x4,
                            9 => Float32x4,
                            10 => Float32x4,
                            11 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(if transparent {
                        wgpu::BlendState::ALPHA_BLENDING
                    } else {
                        wgpu::BlendState::REPLACE
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: !transparent,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_attachment(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: SurfaceSize,
        sample_count: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(if format == DEPTH_FORMAT {
                "depth_texture"
            } else {
                "msaa_texture"
            }),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
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

    fn create_offscreen(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: SurfaceSize,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
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
        })
    }

    fn upload_meshes(device: &wgpu::Device, items: &[DrawItem<'_>]) -> Vec<GpuMesh> {
        items
            .iter()
            .map(|item| {
                let mesh = item.geometry.tessellate();
                let vertices: Vec<Vertex> = mesh
                    .vertices
                    .iter()
                    .map(|v| Vertex {
                        position: v.position,
                        normal: v.normal,
                    })
                    .collect();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(item.name),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(item.name),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                }
            })
            .collect()
    }
}

impl OutputSurface for WgpuSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        if size == self.size {
            return;
        }
        self.size = size;
        let Some(resources) = &mut self.resources else {
            return;
        };
        let extent = size.non_zero();
        match &mut resources.target {
            Target::Window { surface, config } => {
                config.width = extent.width;
                config.height = extent.height;
                surface.configure(&self.device, config);
            }
            Target::Offscreen { texture } => {
                *texture = Self::create_offscreen(&self.device, self.format, extent);
            }
        }
        resources.depth_texture =
            Self::create_attachment(&self.device, DEPTH_FORMAT, extent, self.sample_count);
        if self.sample_count > 1 {
            resources.msaa_texture = Some(Self::create_attachment(
                &self.device,
                self.format,
                extent,
                self.sample_count,
            ));
        }
    }

    /// Render one frame: opaque parts, then transparent parts back to front.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let Some(resources) = &mut self.resources else {
            return Err(RenderError::Disposed);
        };

        let items = scene.draw_list();
        if items.len() > MAX_INSTANCES as usize {
            return Err(RenderError::Backend(format!(
                "{} parts exceed the instance budget of {MAX_INSTANCES}",
                items.len()
            )));
        }
        if resources.meshes.len() != items.len() {
            resources.meshes = Self::upload_meshes(&self.device, &items);
        }

        self.queue.write_buffer(
            &resources.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals::pack(scene, camera)),
        );
        let instances: Vec<InstanceData> = items.iter().map(InstanceData::from_item).collect();
        if !instances.is_empty() {
            self.queue
                .write_buffer(&resources.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let view_matrix = camera.view_matrix();
        let depth_of = |i: usize| view_matrix.transform_point3(items[i].world.w_axis.truncate()).z;
        let opaque: Vec<usize> = (0..items.len())
            .filter(|&i| !items[i].material.transparent)
            .collect();
        let mut transparent: Vec<usize> = (0..items.len())
            .filter(|&i| items[i].material.transparent)
            .collect();
        // Most negative view-space z is farthest away.
        transparent.sort_by(|&a, &b| depth_of(a).total_cmp(&depth_of(b)));

        let (frame, target_view) = match &resources.target {
            Target::Window { surface, config } => match surface.get_current_texture() {
                Ok(frame) => {
                    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
                    (Some(frame), view)
                }
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    surface.configure(&self.device, config);
                    tracing::debug!("surface reconfigured, frame skipped");
                    return Ok(());
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    tracing::warn!("surface timed out, frame skipped");
                    return Ok(());
                }
                Err(e) => return Err(RenderError::Backend(e.to_string())),
            },
            Target::Offscreen { texture } => (None, texture.create_view(&Default::default())),
        };

        let (color_view, resolve_target) = match &resources.msaa_texture {
            Some(msaa) => (msaa, Some(&target_view)),
            None => (&target_view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &resources.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &resources.globals_bind_group, &[]);
            pass.set_vertex_buffer(1, resources.instance_buffer.slice(..));

            for (pipeline, order) in [
                (&resources.opaque_pipeline, &opaque),
                (&resources.transparent_pipeline, &transparent),
            ] {
                if order.is_empty() {
                    continue;
                }
                pass.set_pipeline(pipeline);
                for &i in order {
                    let mesh = &resources.meshes[i];
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                    let instance = i as u32;
                    pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(resources) = self.resources.take() {
            for mesh in &resources.meshes {
                mesh.vertex_buffer.destroy();
                mesh.index_buffer.destroy();
            }
            resources.instance_buffer.destroy();
            resources.globals_buffer.destroy();
            if let Target::Offscreen { texture } = &resources.target {
                texture.destroy();
            }
            tracing::debug!("wgpu surface disposed");
        }
    }

    fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_common::Color;
    use backdrop_render::SurfaceConfig;

    #[test]
    fn prefers_srgb_formats() {
        let formats = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(pick_surface_format(&formats), wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(
            pick_surface_format(&[wgpu::TextureFormat::Rgba16Float]),
            wgpu::TextureFormat::Rgba16Float
        );
        assert_eq!(pick_surface_format(&[]), wgpu::TextureFormat::Bgra8UnormSrgb);
    }

    #[test]
    fn transparent_surfaces_prefer_premultiplied_alpha() {
        use wgpu::CompositeAlphaMode as Mode;
        let all = [Mode::Opaque, Mode::PostMultiplied, Mode::PreMultiplied];
        assert_eq!(pick_alpha_mode(&all, true), Mode::PreMultiplied);
        assert_eq!(pick_alpha_mode(&all, false), Mode::Opaque);
        assert_eq!(pick_alpha_mode(&[Mode::Opaque], true), Mode::Opaque);
        assert_eq!(pick_alpha_mode(&[Mode::Inherit], true), Mode::Inherit);
    }

    #[test]
    fn clear_color_is_premultiplied() {
        let size = SurfaceSize::new(8, 8);
        let options = SurfaceOptions::from_config(size, &SurfaceConfig::default());
        let c = clear_color(&options);
        assert_eq!((c.r, c.g, c.b), (0.0, 0.0, 0.0));
        assert!((c.a - 0.1).abs() < 1e-6);

        let white = SurfaceOptions {
            clear_color: Color::WHITE,
            clear_alpha: 0.5,
            ..options
        };
        let c = clear_color(&white);
        assert!((c.r - 0.5).abs() < 1e-6 && (c.a - 0.5).abs() < 1e-6);

        let opaque = SurfaceOptions {
            transparent: false,
            ..white
        };
        assert_eq!(clear_color(&opaque).a, 1.0);
    }
}
