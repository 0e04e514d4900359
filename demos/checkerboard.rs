#[cfg(feature = "debug")]
use renderdoc::{RenderDoc, V110};
use wgpu_mipmapper::{util, GenerateOptions, GraphicsContext, Kernel, Mipmapper};

fn main() {
    env_logger::init();
    // usage: checkerboard [kernel] [strength]
    let mut args = std::env::args().skip(1);
    let kernels = match args.next() {
        Some(name) => vec![name.parse::<Kernel>().expect("Unknown kernel")],
        None => Kernel::ALL.to_vec(),
    };
    let strength = args
        .next()
        .map(|s| s.parse::<f32>().expect("Strength must be a number"))
        .unwrap_or(1.0);
    #[cfg(feature = "debug")]
    let mut rd: RenderDoc<V110> = RenderDoc::new().expect("Unable to connect");
    #[cfg(feature = "debug")]
    rd.start_frame_capture(std::ptr::null(), std::ptr::null());
    futures::executor::block_on(async {
        let (_instance, adapter, device, queue) = util::wgpu_setup().await;
        let context = GraphicsContext::from_adapter(&adapter, &device, &queue);
        let mut mipmapper = Mipmapper::new(&context, &Default::default())
            .expect("Failed to compile the resampling program");
        log::info!("writing mip levels through {}", mipmapper.backend());
        // Generate texture data on the CPU
        let width = 512;
        let height = 512;
        let data = util::checkerboard_rgba8(width, height, 16);
        // Generate a chain per kernel for both a linear and srgb format
        let formats = [
            ("linear", wgpu::TextureFormat::Rgba8Unorm),
            ("srgb", wgpu::TextureFormat::Rgba8UnormSrgb),
        ];
        for (format_str, format) in formats {
            for kernel in &kernels {
                let texture_descriptor = wgpu::TextureDescriptor {
                    label: None,
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: wgpu_mipmapper::full_chain_length(width, height),
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: util::destination_usage(),
                    view_formats: &[],
                };
                let options = GenerateOptions {
                    kernel: *kernel,
                    strength,
                };
                let (outcome, mip_buffers) = util::generate_and_copy_to_cpu(
                    &context,
                    &mut mipmapper,
                    &data,
                    &texture_descriptor,
                    &options,
                )
                .expect("shouldn't fail");
                log::info!("{} {}: {:?}", format_str, kernel, outcome);

                let has_file_system_available = cfg!(not(target_arch = "wasm32"));
                if !has_file_system_available {
                    return;
                }

                // Write the different mip levels as files
                for mip in &mip_buffers {
                    image::save_buffer(
                        format!("checkerboard-{}-{}-{}.png", format_str, kernel, mip.level),
                        &mip.buffer,
                        mip.dimensions.width as u32,
                        mip.dimensions.height as u32,
                        image::ColorType::Rgba8,
                    )
                    .unwrap();
                }
            }
        }
    });
    #[cfg(feature = "debug")]
    rd.end_frame_capture(std::ptr::null(), std::ptr::null());
}
