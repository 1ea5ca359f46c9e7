// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Recorded commands.

Commands are recorded into a [CommandBuffer] as plain bytes: a 4-byte header naming the [Kind],
followed by a fixed-size payload whose size depends only on the kind.  Objects are referenced by
handle, so nothing in a buffer borrows anything.  At submit time the buffer is decoded back into
[Command] values and replayed in order.

The byte layout is private to this crate and only has to agree with itself within a process.
*/

mod buffer;
mod decoder;
mod encoder;
mod wire;

pub use buffer::{CommandBuffer, CommandBufferConfig, EncodeError};
pub use decoder::DecodeError;

use crate::device::{DataFormat, Region};
use crate::objects::{
    BufferHandle, PipelineHandle, SamplerHandle, TextureHandle, UniformLocationHandle,
};
use crate::renderer::RenderPassInfo;

/// Discriminant of a command record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Kind {
    BindPipeline = 1,
    Uniform1f,
    Uniform1i,
    Uniform3f,
    Uniform4f,
    UniformMatrix4f,
    TextureUnit,
    SamplerUnit,
    UniformBufferUnit,
    UniformBufferUnitRange,
    Draw,
    DrawIndexed,
    CopyContentToBuffer,
    CopyContentToTexture,
    BeginRenderPass,
    EndRenderPass,
    Invalidate,
}

impl Kind {
    pub const ALL: [Kind; 17] = [
        Kind::BindPipeline,
        Kind::Uniform1f,
        Kind::Uniform1i,
        Kind::Uniform3f,
        Kind::Uniform4f,
        Kind::UniformMatrix4f,
        Kind::TextureUnit,
        Kind::SamplerUnit,
        Kind::UniformBufferUnit,
        Kind::UniformBufferUnitRange,
        Kind::Draw,
        Kind::DrawIndexed,
        Kind::CopyContentToBuffer,
        Kind::CopyContentToTexture,
        Kind::BeginRenderPass,
        Kind::EndRenderPass,
        Kind::Invalidate,
    ];

    /// Bytes following the header for this kind.
    pub const fn payload_size(self) -> usize {
        use std::mem::size_of;
        match self {
            Kind::BindPipeline => size_of::<wire::BindPipeline>(),
            Kind::Uniform1f => size_of::<wire::Uniform1f>(),
            Kind::Uniform1i => size_of::<wire::Uniform1i>(),
            Kind::Uniform3f => size_of::<wire::Uniform3f>(),
            Kind::Uniform4f => size_of::<wire::Uniform4f>(),
            Kind::UniformMatrix4f => size_of::<wire::UniformMatrix4f>(),
            Kind::TextureUnit | Kind::SamplerUnit | Kind::UniformBufferUnit => {
                size_of::<wire::Unit>()
            }
            Kind::UniformBufferUnitRange => size_of::<wire::UnitRange>(),
            Kind::Draw | Kind::DrawIndexed => size_of::<wire::Draw>(),
            Kind::CopyContentToBuffer => size_of::<wire::CopyContentToBuffer>(),
            Kind::CopyContentToTexture => size_of::<wire::CopyContentToTexture>(),
            Kind::BeginRenderPass => size_of::<wire::BeginRenderPass>(),
            Kind::EndRenderPass | Kind::Invalidate => 0,
        }
    }

    /// Header plus payload.
    pub const fn record_size(self) -> usize {
        wire::HEADER_SIZE + self.payload_size()
    }
}

impl TryFrom<u32> for Kind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Kind::ALL
            .iter()
            .copied()
            .find(|k| *k as u32 == value)
            .ok_or(value)
    }
}

/// Reads framebuffer pixels into a pixel-transfer buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyContentToBufferInfo {
    pub buffer: BufferHandle,
    /// Region of the bound framebuffer.
    pub region: Region,
    pub format: DataFormat,
    pub buffer_offset: u32,
}

/// Copies a region of the bound framebuffer into a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyContentToTextureInfo {
    pub texture: TextureHandle,
    pub texture_level: u32,
    pub texture_x: i32,
    pub texture_y: i32,
    pub framebuffer_region: Region,
    /// Regenerate the texture's mip chain after the copy.
    pub generate_mipmaps: bool,
}

/// A decoded command, ready for replay.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindPipeline(PipelineHandle),
    Uniform1f {
        location: UniformLocationHandle,
        value: f32,
    },
    Uniform1i {
        location: UniformLocationHandle,
        value: i32,
    },
    Uniform3f {
        location: UniformLocationHandle,
        values: [f32; 3],
    },
    Uniform4f {
        location: UniformLocationHandle,
        values: [f32; 4],
    },
    UniformMatrix4f {
        location: UniformLocationHandle,
        values: [f32; 16],
    },
    TextureUnit {
        index: u32,
        texture: TextureHandle,
    },
    SamplerUnit {
        index: u32,
        sampler: SamplerHandle,
    },
    UniformBufferUnit {
        index: u32,
        buffer: BufferHandle,
    },
    UniformBufferUnitRange {
        index: u32,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    },
    Draw {
        vertex_offset: u32,
        vertex_count: u32,
        instance_count: u32,
    },
    /// `index_offset` counts indices, not bytes.
    DrawIndexed {
        index_offset: u32,
        index_count: u32,
        instance_count: u32,
    },
    CopyContentToBuffer(CopyContentToBufferInfo),
    CopyContentToTexture(CopyContentToTextureInfo),
    BeginRenderPass(RenderPassInfo),
    EndRenderPass,
    /// Forces the next draw to reapply all fixed-function state.
    Invalidate,
}

impl Command {
    pub fn kind(&self) -> Kind {
        match self {
            Command::BindPipeline(_) => Kind::BindPipeline,
            Command::Uniform1f { .. } => Kind::Uniform1f,
            Command::Uniform1i { .. } => Kind::Uniform1i,
            Command::Uniform3f { .. } => Kind::Uniform3f,
            Command::Uniform4f { .. } => Kind::Uniform4f,
            Command::UniformMatrix4f { .. } => Kind::UniformMatrix4f,
            Command::TextureUnit { .. } => Kind::TextureUnit,
            Command::SamplerUnit { .. } => Kind::SamplerUnit,
            Command::UniformBufferUnit { .. } => Kind::UniformBufferUnit,
            Command::UniformBufferUnitRange { .. } => Kind::UniformBufferUnitRange,
            Command::Draw { .. } => Kind::Draw,
            Command::DrawIndexed { .. } => Kind::DrawIndexed,
            Command::CopyContentToBuffer(_) => Kind::CopyContentToBuffer,
            Command::CopyContentToTexture(_) => Kind::CopyContentToTexture,
            Command::BeginRenderPass(_) => Kind::BeginRenderPass,
            Command::EndRenderPass => Kind::EndRenderPass,
            Command::Invalidate => Kind::Invalidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::try_from(kind as u32), Ok(kind));
        }
        assert_eq!(Kind::try_from(0), Err(0));
        assert_eq!(Kind::try_from(18), Err(18));
    }

    #[test]
    fn payloads_are_whole_words() {
        for kind in Kind::ALL {
            assert_eq!(kind.payload_size() % 4, 0, "{:?}", kind);
        }
        assert_eq!(Kind::Uniform4f.payload_size(), 20);
        assert_eq!(Kind::UniformMatrix4f.payload_size(), 68);
        assert_eq!(Kind::EndRenderPass.record_size(), 4);
    }
}
