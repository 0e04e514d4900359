use super::{BackendAdapter, PassContext};
use crate::{
    chain::MipLevel,
    program::{Parameters, Technique},
    render_target::RenderTarget,
};

/// Writes levels by drawing the scratch region into a single level view of
/// the destination.
///
/// Used on GL, where a copy out of a framebuffer texture into a mip level goes
/// through a framebuffer blit anyway.
#[derive(Debug)]
pub(crate) struct RasterCopy;

impl BackendAdapter for RasterCopy {
    fn name(&self) -> &'static str {
        "raster-copy"
    }

    fn required_usage(&self) -> wgpu::TextureUsages {
        wgpu::TextureUsages::RENDER_ATTACHMENT
    }

    fn copy_into_mip_slot(
        &self,
        pass: &mut PassContext,
        target: &RenderTarget,
        destination: &wgpu::Texture,
        level: &MipLevel,
    ) {
        let slot = destination.create_view(&wgpu::TextureViewDescriptor {
            label: Some("wgpu-mipmapper-mip-slot"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: level.index,
            mip_level_count: Some(1),
            ..Default::default()
        });
        let bind_group = pass.program.bind(
            pass.device,
            &target.view,
            &Parameters::blit(level.width, level.height),
        );
        let pipeline = pass
            .program
            .pipeline(pass.device, destination.format(), Technique::Blit);
        let mut render = pass.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("wgpu-mipmapper-raster-copy"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &slot,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render.set_pipeline(pipeline);
        render.set_bind_group(0, &bind_group, &[]);
        pass.quad.draw(&mut render);
    }
}
