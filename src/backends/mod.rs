//! Write-back of rendered levels into the mip slots of a texture.
//!
//! Each graphics API family addresses texture subresources differently, so
//! every supported backend gets its own [`BackendAdapter`].
mod copy;
mod render;

pub(crate) use copy::*;
pub(crate) use render::*;

use crate::{chain::MipLevel, geometry::Quad, program::ResampleProgram, render_target::RenderTarget};
use std::fmt;

/// What a write-back may use besides the command encoder.
pub(crate) struct PassContext<'a> {
    pub device: &'a wgpu::Device,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub program: &'a mut ResampleProgram,
    pub quad: &'a Quad,
}

pub(crate) trait BackendAdapter: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Destination usage the mip slot write-back needs.
    fn required_usage(&self) -> wgpu::TextureUsages {
        wgpu::TextureUsages::empty()
    }

    /// Copies every layer of level 0 of `source` into level 0 of `destination`.
    fn copy_full(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::Texture,
        destination: &wgpu::Texture,
    ) {
        encoder.copy_texture_to_texture(
            wgpu::ImageCopyTexture {
                texture: source,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyTexture {
                texture: destination,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            source.size(),
        );
    }

    /// Copies the `level` sized region at the origin of `target` into mip
    /// `level.index` of `destination`.
    fn copy_into_mip_slot(
        &self,
        pass: &mut PassContext,
        target: &RenderTarget,
        destination: &wgpu::Texture,
        level: &MipLevel,
    );
}

/// Picks the write-back path for `backend`.
pub(crate) fn adapter_for(backend: wgpu::Backend) -> Box<dyn BackendAdapter> {
    let adapter: Box<dyn BackendAdapter> = match backend {
        wgpu::Backend::Vulkan
        | wgpu::Backend::Metal
        | wgpu::Backend::Dx12
        | wgpu::Backend::BrowserWebGpu => Box::new(TransferCopy),
        wgpu::Backend::Gl => Box::new(RasterCopy),
        other => {
            log::warn!(
                "[adapter_for] no mip write-back for backend {:?}, only level 0 will be written",
                other
            );
            Box::new(Unsupported)
        }
    };
    log::debug!("[adapter_for] {:?} uses {}", backend, adapter.name());
    adapter
}

/// Used for backends without a write-back path. Level 0 is still copied,
/// the derived levels are left untouched.
#[derive(Debug)]
pub(crate) struct Unsupported;

impl BackendAdapter for Unsupported {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn copy_into_mip_slot(
        &self,
        _pass: &mut PassContext,
        _target: &RenderTarget,
        _destination: &wgpu::Texture,
        level: &MipLevel,
    ) {
        log::warn!(
            "[Unsupported::copy_into_mip_slot] skipping mip level {}",
            level.index
        );
    }
}
