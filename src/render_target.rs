/// The format and capacity of a scratch render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScratchSpec {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl ScratchSpec {
    /// Whether a target allocated as `self` can serve `required`.
    ///
    /// The format must match exactly. Smaller regions are rendered through the
    /// viewport, so only a larger `required` size invalidates the target.
    pub fn covers(&self, required: &ScratchSpec) -> bool {
        self.format == required.format
            && self.width >= required.width
            && self.height >= required.height
    }
}

/// An offscreen texture every level is rendered into before it is copied
/// into the destination.
#[derive(Debug)]
pub(crate) struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub spec: ScratchSpec,
}

impl RenderTarget {
    pub fn required_usage() -> wgpu::TextureUsages {
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::TEXTURE_BINDING
    }

    fn new(device: &wgpu::Device, spec: ScratchSpec) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("wgpu-mipmapper-scratch-{:?}", spec.format)),
            size: wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: spec.format,
            usage: Self::required_usage(),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            spec,
        }
    }
}

/// Holds at most one [`RenderTarget`], replaced only when it no longer
/// covers what a call needs.
#[derive(Debug, Default)]
pub(crate) struct ScratchTarget {
    slot: Option<RenderTarget>,
}

impl ScratchTarget {
    pub fn acquire(&mut self, device: &wgpu::Device, required: ScratchSpec) -> &RenderTarget {
        let valid = self
            .slot
            .as_ref()
            .map_or(false, |target| target.spec.covers(&required));
        if !valid {
            if let Some(old) = self.slot.take() {
                log::debug!(
                    "[ScratchTarget::acquire] replacing {:?} with {:?}",
                    old.spec,
                    required
                );
            }
        }
        self.slot
            .get_or_insert_with(|| RenderTarget::new(device, required))
    }

    pub fn spec(&self) -> Option<ScratchSpec> {
        self.slot.as_ref().map(|target| target.spec)
    }
}
