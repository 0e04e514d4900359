use std::{fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

/// The filter used to compute a level from the level above it.
///
/// Each kernel maps to one technique of the resampling program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kernel {
    /// Picks the top-left texel of every 2x2 block, without blending.
    Point,
    /// Bilinear average of every 2x2 block.
    #[default]
    Linear,
    /// Unsharp mask, `strength` scales the detail added back.
    Sharpen,
    /// 3x3 tent filter, `strength` blends it over the linear result.
    Smoothen,
    /// 4x4 Catmull-Rom filter, `strength` blends it over the linear result.
    Bicubic,
    /// 4x4 Lanczos (a = 2) filter, `strength` blends it over the linear result.
    Lanczos,
}

impl Kernel {
    /// Every kernel, in declaration order.
    pub const ALL: [Kernel; 6] = [
        Kernel::Point,
        Kernel::Linear,
        Kernel::Sharpen,
        Kernel::Smoothen,
        Kernel::Bicubic,
        Kernel::Lanczos,
    ];

    /// Name of the program technique implementing this kernel.
    pub fn technique_name(self) -> &'static str {
        match self {
            Kernel::Point => "Point",
            Kernel::Linear => "Linear",
            Kernel::Sharpen => "Sharpen",
            Kernel::Smoothen => "Smoothen",
            Kernel::Bicubic => "Bicubic",
            Kernel::Lanczos => "Lanczos",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.technique_name())
    }
}

impl FromStr for Kernel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kernel::ALL
            .iter()
            .copied()
            .find(|kernel| kernel.technique_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownKernel(s.to_owned()))
    }
}

/// Per-call settings for [`Mipmapper::generate`](crate::Mipmapper::generate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub kernel: Kernel,
    /// Kernel specific modifier, see [`Kernel`].
    pub strength: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            kernel: Kernel::Linear,
            strength: 1.0,
        }
    }
}

/// What a call to [`Mipmapper::generate`](crate::Mipmapper::generate) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The source or the destination was absent.
    NothingToDo,
    /// Level 0 was copied, but the texture kind has no resampling support yet.
    BaseLevelOnly,
    /// Level 0 was copied and `levels` further levels were resampled.
    Generated { levels: u32 },
}

/// The storage shape of a texture.
///
/// wgpu has no dedicated cube map storage, cube maps are six layer 2D
/// textures and report [`TextureKind::Array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// A single layer 2D texture. The only kind mip chains are generated for.
    Normal,
    Line,
    Array,
    Volume,
}

/// The texture properties mip generation depends on.
pub trait TextureInfo {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> wgpu::TextureFormat;
    fn kind(&self) -> TextureKind;
    fn mip_level_count(&self) -> u32;
    fn usage(&self) -> wgpu::TextureUsages;
}

impl TextureInfo for wgpu::Texture {
    fn width(&self) -> u32 {
        wgpu::Texture::width(self)
    }

    fn height(&self) -> u32 {
        wgpu::Texture::height(self)
    }

    fn format(&self) -> wgpu::TextureFormat {
        wgpu::Texture::format(self)
    }

    fn kind(&self) -> TextureKind {
        match self.dimension() {
            wgpu::TextureDimension::D1 => TextureKind::Line,
            wgpu::TextureDimension::D2 if self.depth_or_array_layers() == 1 => {
                TextureKind::Normal
            }
            wgpu::TextureDimension::D2 => TextureKind::Array,
            wgpu::TextureDimension::D3 => TextureKind::Volume,
        }
    }

    fn mip_level_count(&self) -> u32 {
        wgpu::Texture::mip_level_count(self)
    }

    fn usage(&self) -> wgpu::TextureUsages {
        wgpu::Texture::usage(self)
    }
}

/// Formats that can be both rendered to and filtered, which resampling needs.
pub const SUPPORTED_FORMATS: [wgpu::TextureFormat; 10] = {
    use wgpu::TextureFormat;
    [
        TextureFormat::R8Unorm,
        TextureFormat::Rg8Unorm,
        TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb,
        TextureFormat::R16Float,
        TextureFormat::Rg16Float,
        TextureFormat::Rgba16Float,
        TextureFormat::Rgb10a2Unorm,
    ]
};

/// Checks that `destination` can receive a copy of `source`.
///
/// Sizes are compared first, then kinds, then formats.
pub fn validate<S, D>(source: &S, destination: &D) -> Result<(), Error>
where
    S: TextureInfo + ?Sized,
    D: TextureInfo + ?Sized,
{
    let src = (source.width(), source.height());
    let dst = (destination.width(), destination.height());
    if src != dst {
        return Err(Error::DimensionMismatch { src, dst });
    }
    if source.kind() != destination.kind() {
        return Err(Error::TypeMismatch {
            src: source.kind(),
            dst: destination.kind(),
        });
    }
    if source.format() != destination.format() {
        return Err(Error::FormatMismatch {
            src: source.format(),
            dst: destination.format(),
        });
    }
    Ok(())
}

/// An error that occurred during mipmap generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Source size `{src:?}` does not match destination size `{dst:?}`.")]
    DimensionMismatch { src: (u32, u32), dst: (u32, u32) },
    #[error("Source kind `{src:?}` does not match destination kind `{dst:?}`.")]
    TypeMismatch { src: TextureKind, dst: TextureKind },
    #[error("Source format `{src:?}` does not match destination format `{dst:?}`.")]
    FormatMismatch {
        src: wgpu::TextureFormat,
        dst: wgpu::TextureFormat,
    },
    #[error("Unsupported texture usage `{0:?}`.\nThe source needs TextureUsages::COPY_SRC, the destination needs TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING plus the usage of the active backend.")]
    UnsupportedUsage(wgpu::TextureUsages),
    #[error("Unsupported texture format `{0:?}`. The format must be renderable and filterable.")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("Unknown kernel `{0}`. Expected one of Point, Linear, Sharpen, Smoothen, Bicubic, Lanczos.")]
    UnknownKernel(String),
    #[error("Unable to read resampling program `{}`: {reason}", .path.display())]
    ProgramLoad { path: PathBuf, reason: String },
    #[error("Unable to compile resampling program: {0}")]
    ProgramCompile(String),
    #[error("The device reported an error: {0}")]
    Device(String),
}

impl Error {
    /// Returns true for errors caused by the textures handed in, which are
    /// reported before any GPU work is recorded.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::DimensionMismatch { .. }
                | Error::TypeMismatch { .. }
                | Error::FormatMismatch { .. }
                | Error::UnsupportedUsage(_)
                | Error::UnsupportedFormat(_)
        )
    }
}
