/// utilities used throughout the project. Not part of the official API.
use crate::{chain::mip_extent, context::GraphicsContext, core::*, mipmapper::Mipmapper};
use futures::FutureExt;

#[derive(Debug)]
pub struct MipBuffer {
    pub buffer: Vec<u8>,
    pub dimensions: MipBufferDimensions,
    pub level: u32,
}

#[derive(Debug, Copy, Clone)]
pub struct MipBufferDimensions {
    pub width: usize,
    pub height: usize,
    pub bytes_per_channel: usize,
    pub unpadded_bytes_per_row: usize,
    pub padded_bytes_per_row: usize,
}

impl MipBufferDimensions {
    pub fn new(width: usize, height: usize, bytes_per_channel: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let unpadded_bytes_per_row = width * bytes_per_channel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
        let padded_bytes_per_row_padding = (align - unpadded_bytes_per_row % align) % align;
        let padded_bytes_per_row = unpadded_bytes_per_row + padded_bytes_per_row_padding;
        Self {
            width,
            height,
            bytes_per_channel,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
        }
    }
}

/// Usage that lets a texture serve as a destination on every backend and be
/// read back afterwards.
pub fn destination_usage() -> wgpu::TextureUsages {
    wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::RENDER_ATTACHMENT
        | wgpu::TextureUsages::COPY_SRC
        | wgpu::TextureUsages::COPY_DST
}

/// Creates a texture from `texture_descriptor` and uploads `data` to level 0.
pub fn create_texture_with_data(
    context: &GraphicsContext,
    texture_descriptor: &wgpu::TextureDescriptor,
    data: &[u8],
) -> wgpu::Texture {
    let texture = context.device().create_texture(texture_descriptor);
    let bytes_per_channel = format_bytes_per_channel(&texture_descriptor.format);
    context.queue().write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(texture_descriptor.size.width * bytes_per_channel as u32),
            rows_per_image: Some(texture_descriptor.size.height),
        },
        texture_descriptor.size,
    );
    texture
}

/// Uploads `data` into a source texture, generates the chain of a destination
/// created from `texture_descriptor`, and reads every level back.
pub fn generate_and_copy_to_cpu(
    context: &GraphicsContext,
    mipmapper: &mut Mipmapper,
    data: &[u8],
    texture_descriptor: &wgpu::TextureDescriptor<'_>,
    options: &GenerateOptions,
) -> Result<(Outcome, Vec<MipBuffer>), Error> {
    let source_descriptor = wgpu::TextureDescriptor {
        mip_level_count: 1,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST,
        ..texture_descriptor.clone()
    };
    let source = create_texture_with_data(context, &source_descriptor, data);
    let destination = context.device().create_texture(texture_descriptor);
    let outcome = mipmapper.generate(context, Some(&source), Some(&destination), options)?;
    Ok((outcome, read_mip_levels(context, &destination)))
}

/// Copies every mip level of the first layer of `texture` to the CPU.
pub fn read_mip_levels(context: &GraphicsContext, texture: &wgpu::Texture) -> Vec<MipBuffer> {
    let device = context.device();
    let bytes_per_channel = format_bytes_per_channel(&texture.format());
    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    let buffers = (0..texture.mip_level_count())
        .map(|level| {
            let (mip_width, mip_height) = mip_extent(texture.width(), texture.height(), level);
            let mip_dimensions = MipBufferDimensions::new(
                mip_width as usize,
                mip_height as usize,
                bytes_per_channel,
            );
            let size = (mip_dimensions.height * mip_dimensions.padded_bytes_per_row) as u64;
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: None,
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });
            encoder.copy_texture_to_buffer(
                wgpu::ImageCopyTexture {
                    texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::ImageCopyBuffer {
                    buffer: &buffer,
                    layout: wgpu::ImageDataLayout {
                        offset: 0,
                        bytes_per_row: Some(mip_dimensions.padded_bytes_per_row as u32),
                        rows_per_image: Some(mip_dimensions.height as u32),
                    },
                },
                wgpu::Extent3d {
                    width: mip_width,
                    height: mip_height,
                    depth_or_array_layers: 1,
                },
            );
            (buffer, mip_dimensions)
        })
        .collect::<Vec<_>>();
    context.queue().submit(std::iter::once(encoder.finish()));

    let mut mip_buffers = Vec::with_capacity(buffers.len());
    for (level, (buffer, buffer_dimensions)) in buffers.iter().enumerate() {
        let buffer_slice = buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        // Poll the device in a blocking manner so that the callback has run.
        device.poll(wgpu::Maintain::Wait);
        match rx.now_or_never() {
            Some(Ok(Ok(()))) => {}
            other => panic!("Unexpected failure mapping level {}: {:?}", level, other),
        }
        let padded_buffer = buffer_slice.get_mapped_range();
        // The buffer we get back is padded, so only extract what we need
        let mut exact_buffer = Vec::with_capacity(
            buffer_dimensions.unpadded_bytes_per_row * buffer_dimensions.height,
        );
        for y in 0..buffer_dimensions.height {
            let row_beg = y * buffer_dimensions.padded_bytes_per_row;
            let row_end = row_beg + buffer_dimensions.unpadded_bytes_per_row;
            exact_buffer.extend_from_slice(&padded_buffer[row_beg..row_end]);
        }
        drop(padded_buffer);
        buffer.unmap();
        mip_buffers.push(MipBuffer {
            buffer: exact_buffer,
            dimensions: *buffer_dimensions,
            level: level as u32,
        });
    }
    mip_buffers
}

pub fn checkerboard_r8(width: u32, height: u32, n: u32) -> Vec<u8> {
    (0..width * height)
        .map(|id| {
            let x = id % width;
            let y = id / width;
            (((x / n + y / n) % 2) * 255) as u8
        })
        .collect()
}

pub fn checkerboard_rgba8(width: u32, height: u32, n: u32) -> Vec<u8> {
    checkerboard_r8(width, height, n)
        .into_iter()
        .flat_map(|v| [v, v, v, 255])
        .collect()
}

/// Deterministic RGBA8 noise, so every texel differs from its neighbours.
pub fn noise_rgba8(width: u32, height: u32) -> Vec<u8> {
    let mut state = 0x9e37_79b9u32 ^ width.wrapping_mul(31) ^ height;
    (0..width * height * 4)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn format_bytes_per_channel(format: &wgpu::TextureFormat) -> usize {
    use wgpu::TextureFormat;
    match format {
        TextureFormat::R8Unorm => 1,
        TextureFormat::R16Float | TextureFormat::Rg8Unorm => 2,
        TextureFormat::Rg16Float
        | TextureFormat::Rgba8Unorm
        | TextureFormat::Rgba8UnormSrgb
        | TextureFormat::Bgra8Unorm
        | TextureFormat::Bgra8UnormSrgb
        | TextureFormat::Rgb10a2Unorm
        | TextureFormat::R32Float => 4,
        TextureFormat::Rgba16Float => 8,
        TextureFormat::Rgba32Float => 16,
        _ => unimplemented!(),
    }
}

/// Requests a device from the first available adapter.
///
/// Panics when the machine has none, so GPU tests never pass without running.
pub async fn wgpu_setup() -> (wgpu::Instance, wgpu::Adapter, wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("Failed to find an appropiate adapter");
    log::info!("[wgpu_setup] using {:?}", adapter.get_info());
    // Create the logical device and command queue
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("wgpu-mipmapper"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        )
        .await
        .expect("Failed to create device");
    (instance, adapter, device, queue)
}
