/*!
Generate mip chains for [wgpu](https://github.com/gfx-rs/wgpu) textures with a
selectable resampling kernel.

## Usage

Add this to your `Cargo.toml`:

```toml
[dependencies]
wgpu-mipmapper = "0.1"
```

Example usage:

```rust
use wgpu_mipmapper::*;
fn example(
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Texture,
) -> Result<wgpu::Texture, Error> {
    let context = GraphicsContext::from_adapter(adapter, device, queue);
    // compile the resampling program once and keep the mipmapper around
    let mut mipmapper = Mipmapper::new(&context, &MipmapperDescriptor::default())?;
    // a destination with the same size and format, and a full chain
    let destination = device.create_texture(&wgpu::TextureDescriptor {
        label: None,
        size: source.size(),
        mip_level_count: full_chain_length(source.width(), source.height()),
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: source.format(),
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let options = GenerateOptions {
        kernel: Kernel::Lanczos,
        strength: 1.0,
    };
    mipmapper.generate(&context, Some(source), Some(&destination), &options)?;
    Ok(destination)
}
```
*/
mod backends;
mod chain;
mod context;
mod core;
mod geometry;
mod mipmapper;
mod program;
mod render_target;

#[doc(hidden)]
pub mod util;

#[doc(inline)]
pub use crate::chain::{full_chain_length, mip_extent, MipChain, MipLevel};

#[doc(inline)]
pub use crate::context::{ContextScope, GraphicsContext};

#[doc(inline)]
pub use crate::core::*;

#[doc(inline)]
pub use crate::mipmapper::{Mipmapper, MipmapperDescriptor};

#[doc(inline)]
pub use crate::program::{ProgramSource, BUILTIN_PROGRAM};
