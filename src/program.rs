use crate::{context::GraphicsContext, core::*, geometry::Quad};
use bytemuck::{Pod, Zeroable};
use std::{borrow::Cow, collections::HashMap, fs, path::PathBuf};
use wgpu::util::DeviceExt;

/// The resampling program bundled with the crate.
pub const BUILTIN_PROGRAM: &str = include_str!("shaders/mipgen.wgsl");

/// Where [`Mipmapper`](crate::Mipmapper) loads its resampling program from.
///
/// A program is a WGSL module with a `vs_main` vertex entry point and one
/// fragment entry point per technique (`fs_point`, `fs_linear`, `fs_sharpen`,
/// `fs_smoothen`, `fs_bicubic`, `fs_lanczos` and `fs_blit`), reading the
/// bindings declared by the bundled program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProgramSource {
    #[default]
    Builtin,
    Path(PathBuf),
}

/// A fragment entry point of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Technique {
    Resample(Kernel),
    /// Copies level `level` of the image texel by texel.
    Blit,
}

impl Technique {
    const ALL: [Technique; 7] = [
        Technique::Resample(Kernel::Point),
        Technique::Resample(Kernel::Linear),
        Technique::Resample(Kernel::Sharpen),
        Technique::Resample(Kernel::Smoothen),
        Technique::Resample(Kernel::Bicubic),
        Technique::Resample(Kernel::Lanczos),
        Technique::Blit,
    ];

    pub fn entry_point(self) -> &'static str {
        match self {
            Technique::Resample(Kernel::Point) => "fs_point",
            Technique::Resample(Kernel::Linear) => "fs_linear",
            Technique::Resample(Kernel::Sharpen) => "fs_sharpen",
            Technique::Resample(Kernel::Smoothen) => "fs_smoothen",
            Technique::Resample(Kernel::Bicubic) => "fs_bicubic",
            Technique::Resample(Kernel::Lanczos) => "fs_lanczos",
            Technique::Blit => "fs_blit",
        }
    }
}

/// The named parameters of the program, laid out as its uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Parameters {
    pub image_texel: [f32; 2],
    pub level: i32,
    pub strength: f32,
}

impl Parameters {
    pub fn resample(image_texel: [f32; 2], level: u32, strength: f32) -> Self {
        Self {
            image_texel,
            level: level as i32,
            strength,
        }
    }

    pub fn blit(width: u32, height: u32) -> Self {
        Self::resample([1.0 / width as f32, 1.0 / height as f32], 0, 1.0)
    }
}

/// Format every technique is compiled against when a program is loaded.
const CHECK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A compiled resampling program with its pipelines, cached per target
/// format and technique.
#[derive(Debug)]
pub(crate) struct ResampleProgram {
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    pipelines: HashMap<(wgpu::TextureFormat, Technique), wgpu::RenderPipeline>,
}

impl ResampleProgram {
    /// Loads and compiles the program, then builds every technique once so a
    /// broken program fails here rather than halfway through a chain.
    pub fn load(context: &GraphicsContext, source: &ProgramSource) -> Result<Self, Error> {
        let code: Cow<'static, str> = match source {
            ProgramSource::Builtin => Cow::Borrowed(BUILTIN_PROGRAM),
            ProgramSource::Path(path) => {
                let code = fs::read_to_string(path).map_err(|e| Error::ProgramLoad {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                log::debug!("[ResampleProgram::load] loaded {}", path.display());
                Cow::Owned(code)
            }
        };
        let device = context.device();
        let scope = context.enter();
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("wgpu-mipmapper-program"),
            source: wgpu::ShaderSource::Wgsl(code),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("wgpu-mipmapper-bg-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("wgpu-mipmapper-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        // Clamp to edge so kernels reaching past the border repeat it.
        // Mip selection is explicit in every technique.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("wgpu-mipmapper-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let mut program = Self {
            module,
            bind_group_layout,
            pipeline_layout,
            sampler,
            pipelines: HashMap::new(),
        };
        for technique in Technique::ALL.iter() {
            program.pipeline(device, CHECK_FORMAT, *technique);
        }
        match scope.close() {
            Some(error) => Err(Error::ProgramCompile(error.to_string())),
            None => Ok(program),
        }
    }

    /// Returns the pipeline running `technique` into a target of `format`.
    pub fn pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        technique: Technique,
    ) -> &wgpu::RenderPipeline {
        let Self {
            ref module,
            ref pipeline_layout,
            ref mut pipelines,
            ..
        } = *self;
        pipelines.entry((format, technique)).or_insert_with(|| {
            log::debug!(
                "[ResampleProgram::pipeline] building {} for {:?}",
                technique.entry_point(),
                format
            );
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!(
                    "wgpu-mipmapper-{}-{:?}",
                    technique.entry_point(),
                    format
                )),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: "vs_main",
                    buffers: &[Quad::layout()],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: technique.entry_point(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview: None,
            })
        })
    }

    /// Binds `image` and `parameters` for one pass.
    pub fn bind(
        &self,
        device: &wgpu::Device,
        image: &wgpu::TextureView,
        parameters: &Parameters,
    ) -> wgpu::BindGroup {
        // Every pass of a chain is recorded before the submit, so each one
        // gets its own parameter buffer.
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("wgpu-mipmapper-parameters"),
            contents: bytemuck::bytes_of(parameters),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("wgpu-mipmapper-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(image),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
        })
    }
}
