/// One derived level of a mip chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MipLevel {
    /// Index of the level in the destination texture, always at least 1.
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Size of one texel of this level in normalized texture coordinates.
    pub texel: [f32; 2],
}

impl MipLevel {
    /// The level this one is resampled from.
    pub fn source_index(&self) -> u32 {
        self.index - 1
    }

    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// Iterates the levels below the base level of a texture, largest first.
///
/// Every level halves the previous one (rounding down, never below 1).
#[derive(Debug, Clone)]
pub struct MipChain {
    width: u32,
    height: u32,
    next: u32,
    level_count: u32,
}

impl MipChain {
    pub fn new(width: u32, height: u32, level_count: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            next: 1,
            level_count,
        }
    }
}

impl Iterator for MipChain {
    type Item = MipLevel;

    fn next(&mut self) -> Option<MipLevel> {
        if self.next >= self.level_count {
            return None;
        }
        self.width = (self.width / 2).max(1);
        self.height = (self.height / 2).max(1);
        let level = MipLevel {
            index: self.next,
            width: self.width,
            height: self.height,
            texel: [1.0 / self.width as f32, 1.0 / self.height as f32],
        };
        self.next += 1;
        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.level_count.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MipChain {}

/// Size of mip `level` of a `width` x `height` texture.
pub fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    let shrink = |size: u32| size.checked_shr(level).unwrap_or(0).max(1);
    (shrink(width), shrink(height))
}

/// The number of levels in a full chain for a `width` x `height` texture.
pub fn full_chain_length(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}
