// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Textures.

A texture is created with immutable storage: its kind, format, size and mip level count are
fixed at creation.  Contents may be uploaded at creation and replaced later, region by region.
*/

use crate::device::{
    Comparison, CubeFace, DataFormat, Device, RawTexture, Region, SamplingState, TextureFormat,
    TextureKind, TextureStorage, TextureTarget,
};

/// Pixel format of a color texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Rgba8,
    Rgba16F,
    Rgba32F,
}

impl ColorFormat {
    /// Storage format.  Gamma correction only exists for 8-bit color.
    pub const fn texture_format(self, gamma_correction: bool) -> TextureFormat {
        match self {
            ColorFormat::Rgba8 if gamma_correction => TextureFormat::Srgb8Alpha8,
            ColorFormat::Rgba8 => TextureFormat::Rgba8,
            ColorFormat::Rgba16F => TextureFormat::Rgba16F,
            ColorFormat::Rgba32F => TextureFormat::Rgba32F,
        }
    }

    pub const fn data_format(self) -> DataFormat {
        match self {
            ColorFormat::Rgba8 => DataFormat::Rgba8,
            ColorFormat::Rgba16F => DataFormat::Rgba16F,
            ColorFormat::Rgba32F => DataFormat::Rgba32F,
        }
    }
}

/**
Describes a texture to create.

Cube face data is ordered +X, -X, +Y, -Y, +Z, -Z.
*/
#[derive(Debug, Clone, Copy)]
pub enum TextureInfo<'a> {
    Color2D {
        width: u32,
        height: u32,
        format: ColorFormat,
        gamma_correction: bool,
        mipmaps: bool,
        data: Option<&'a [u8]>,
    },
    ColorCube {
        dimension: u32,
        format: ColorFormat,
        gamma_correction: bool,
        mipmaps: bool,
        faces: [Option<&'a [u8]>; 6],
    },
    /// `comparable` textures are sampled with a depth comparison, for shadow maps.
    Depth2D {
        width: u32,
        height: u32,
        comparable: bool,
    },
    Depth2DArray {
        width: u32,
        height: u32,
        layers: u32,
        comparable: bool,
    },
    Stencil2D {
        width: u32,
        height: u32,
    },
    DepthStencil2D {
        width: u32,
        height: u32,
    },
}

/// Number of mip levels for a `width` x `height` image: one per halving until both sides reach 1.
pub fn mip_level_count(width: u32, height: u32, mipmaps: bool) -> u32 {
    if !mipmaps {
        return 1;
    }
    let mut count = 1;
    let (mut w, mut h) = (width, height);
    while w > 1 || h > 1 {
        w /= 2;
        h /= 2;
        count += 1;
    }
    count
}

const CUBE_FACES: [CubeFace; 6] = [
    CubeFace::PositiveX,
    CubeFace::NegativeX,
    CubeFace::PositiveY,
    CubeFace::NegativeY,
    CubeFace::PositiveZ,
    CubeFace::NegativeZ,
];

#[derive(Debug)]
pub struct Texture {
    raw: RawTexture,
    kind: TextureKind,
    format: TextureFormat,
    width: u32,
    height: u32,
    layers: u32,
    levels: u32,
}

impl Texture {
    pub(crate) fn create<D: Device + ?Sized>(device: &mut D, info: &TextureInfo<'_>) -> Texture {
        let (storage, sampling) = storage_for(info);
        let raw = device.create_texture(&storage, &sampling);
        let texture = Texture {
            raw,
            kind: storage.kind,
            format: storage.format,
            width: storage.width,
            height: storage.height,
            layers: storage.layers,
            levels: storage.levels,
        };
        match *info {
            TextureInfo::Color2D {
                data,
                format,
                mipmaps,
                ..
            } => {
                if let Some(data) = data {
                    texture.upload(device, TextureTarget::TwoD, texture.full_region(), format.data_format(), data);
                }
                if mipmaps {
                    device.generate_mipmaps(raw, TextureKind::TwoD);
                }
            }
            TextureInfo::ColorCube {
                faces,
                format,
                mipmaps,
                ..
            } => {
                for (face, data) in CUBE_FACES.iter().zip(faces.iter()) {
                    if let Some(data) = data {
                        texture.upload(
                            device,
                            TextureTarget::Cube(*face),
                            texture.full_region(),
                            format.data_format(),
                            data,
                        );
                    }
                }
                if mipmaps {
                    device.generate_mipmaps(raw, TextureKind::Cube);
                }
            }
            _ => {}
        }
        texture
    }

    /**
    Replaces the contents of `region` on mip level 0.

    # Panics
    If `data` is not exactly the size of `region` in `format`, or the region lies outside the texture.
    */
    pub(crate) fn upload<D: Device + ?Sized>(
        &self,
        device: &mut D,
        target: TextureTarget,
        region: Region,
        format: DataFormat,
        data: &[u8],
    ) {
        let expected = region.width as usize * region.height as usize * format.bytes_per_pixel();
        assert_eq!(
            data.len(),
            expected,
            "texture upload of {} bytes does not match a {}x{} region",
            data.len(),
            region.width,
            region.height
        );
        assert!(
            region.x >= 0
                && region.y >= 0
                && region.x as u32 + region.width <= self.width
                && region.y as u32 + region.height <= self.height,
            "texture upload region {:?} outside {}x{} texture",
            region,
            self.width,
            self.height
        );
        device.upload_texture(self.raw, target, region, format, data);
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_texture(self.raw);
    }

    pub fn raw(&self) -> RawTexture {
        self.raw
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn full_region(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }
}

fn storage_for(info: &TextureInfo<'_>) -> (TextureStorage, SamplingState) {
    let two_d = |format, width, height| TextureStorage {
        kind: TextureKind::TwoD,
        format,
        width,
        height,
        layers: 1,
        levels: 1,
    };
    match *info {
        TextureInfo::Color2D {
            width,
            height,
            format,
            gamma_correction,
            mipmaps,
            ..
        } => (
            TextureStorage {
                levels: mip_level_count(width, height, mipmaps),
                ..two_d(format.texture_format(gamma_correction), width, height)
            },
            SamplingState {
                mipmaps,
                ..SamplingState::default()
            },
        ),
        TextureInfo::ColorCube {
            dimension,
            format,
            gamma_correction,
            mipmaps,
            ..
        } => (
            TextureStorage {
                kind: TextureKind::Cube,
                levels: mip_level_count(dimension, dimension, mipmaps),
                ..two_d(format.texture_format(gamma_correction), dimension, dimension)
            },
            SamplingState {
                mipmaps,
                ..SamplingState::default()
            },
        ),
        TextureInfo::Depth2D {
            width,
            height,
            comparable,
        } => (
            two_d(depth_format(comparable), width, height),
            depth_sampling(comparable),
        ),
        TextureInfo::Depth2DArray {
            width,
            height,
            layers,
            comparable,
        } => (
            TextureStorage {
                kind: TextureKind::TwoDArray,
                layers,
                ..two_d(depth_format(comparable), width, height)
            },
            depth_sampling(comparable),
        ),
        // 8-bit stencil-only storage is not portable; stencil rides along with depth.
        TextureInfo::Stencil2D { width, height } | TextureInfo::DepthStencil2D { width, height } => (
            two_d(TextureFormat::Depth24Stencil8, width, height),
            SamplingState::default(),
        ),
    }
}

fn depth_format(comparable: bool) -> TextureFormat {
    if comparable {
        TextureFormat::Depth32F
    } else {
        TextureFormat::Depth24
    }
}

fn depth_sampling(comparable: bool) -> SamplingState {
    SamplingState {
        comparison: comparable.then_some(Comparison::LessOrEqual),
        ..SamplingState::default()
    }
}
