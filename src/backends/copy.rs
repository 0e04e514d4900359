use super::{BackendAdapter, PassContext};
use crate::{chain::MipLevel, render_target::RenderTarget};

/// Writes levels with a texture to texture copy addressing the mip slot.
///
/// Used by the backends whose copy commands take a subresource index
/// (Vulkan, Metal, DX12 and WebGPU).
#[derive(Debug)]
pub(crate) struct TransferCopy;

impl BackendAdapter for TransferCopy {
    fn name(&self) -> &'static str {
        "transfer-copy"
    }

    fn copy_into_mip_slot(
        &self,
        pass: &mut PassContext,
        target: &RenderTarget,
        destination: &wgpu::Texture,
        level: &MipLevel,
    ) {
        pass.encoder.copy_texture_to_texture(
            wgpu::ImageCopyTexture {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyTexture {
                texture: destination,
                mip_level: level.index,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            level.extent(),
        );
    }
}
