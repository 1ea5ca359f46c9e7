// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Replay side of [CommandBuffer].

use super::wire;
use super::{Command, CommandBuffer, CopyContentToBufferInfo, CopyContentToTextureInfo, Kind};
use crate::device::{MAX_COLOR_ATTACHMENTS, Region};
use crate::handles::Handle;
use crate::renderer::{ColorAttachmentInfo, RenderPassInfo};
use bytemuck::Pod;

/**
The buffer holds bytes that do not form a valid command.

Every variant means the buffer is corrupt.  Decoding cannot resynchronize after one, since
record boundaries are only known from the kinds.
*/
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("unknown command kind {kind} at offset {offset}")]
    UnknownKind { kind: u32, offset: usize },
    #[error(
        "truncated {kind:?} record at offset {offset}: needs {needed} bytes, {available} available"
    )]
    Truncated {
        /// `None` when the header itself is cut off.
        kind: Option<Kind>,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("{kind:?} record at offset {offset} has invalid {field} value {value}")]
    InvalidField {
        kind: Kind,
        offset: usize,
        field: &'static str,
        value: u32,
    },
}

/// Converts a recorded field, reporting `field` if the value is not valid for it.
fn field<T>(
    kind: Kind,
    offset: usize,
    field: &'static str,
    value: u32,
    f: impl FnOnce(u32) -> Option<T>,
) -> Result<T, DecodeError> {
    f(value).ok_or(DecodeError::InvalidField {
        kind,
        offset,
        field,
        value,
    })
}

fn handle<T>(
    kind: Kind,
    offset: usize,
    name: &'static str,
    value: u32,
) -> Result<Handle<T>, DecodeError> {
    field(kind, offset, name, value, Handle::from_raw)
}

impl CommandBuffer {
    /// True while undecoded commands remain.
    pub fn has_more(&self) -> bool {
        self.data.len() > self.read_offset
    }

    fn read<T: Pod>(&mut self, kind: Option<Kind>, record_offset: usize) -> Result<T, DecodeError> {
        let size = std::mem::size_of::<T>();
        let available = self.data.len() - self.read_offset;
        if available < size {
            return Err(DecodeError::Truncated {
                kind,
                offset: record_offset,
                needed: size,
                available,
            });
        }
        let bytes = &self.data[self.read_offset..self.read_offset + size];
        let value = bytemuck::pod_read_unaligned(bytes);
        self.read_offset += size;
        Ok(value)
    }

    /**
    Decodes the command at the read cursor and advances past it.

    After the last command is consumed the buffer resets itself.  On error the cursor position is
    unspecified and the buffer should be [reset](Self::reset).

    # Panics
    If there is nothing left to decode.
    */
    pub fn decode_next(&mut self) -> Result<Command, DecodeError> {
        assert!(self.has_more(), "decode_next on an exhausted command buffer");
        let offset = self.read_offset;
        let header: wire::CommandHeader = self.read(None, offset)?;
        let kind = Kind::try_from(header.kind)
            .map_err(|kind| DecodeError::UnknownKind { kind, offset })?;
        let k = Some(kind);
        let command = match kind {
            Kind::BindPipeline => {
                let p: wire::BindPipeline = self.read(k, offset)?;
                Command::BindPipeline(handle(kind, offset, "pipeline", p.pipeline)?)
            }
            Kind::Uniform1f => {
                let p: wire::Uniform1f = self.read(k, offset)?;
                Command::Uniform1f {
                    location: handle(kind, offset, "location", p.location)?,
                    value: p.value,
                }
            }
            Kind::Uniform1i => {
                let p: wire::Uniform1i = self.read(k, offset)?;
                Command::Uniform1i {
                    location: handle(kind, offset, "location", p.location)?,
                    value: p.value,
                }
            }
            Kind::Uniform3f => {
                let p: wire::Uniform3f = self.read(k, offset)?;
                Command::Uniform3f {
                    location: handle(kind, offset, "location", p.location)?,
                    values: p.values,
                }
            }
            Kind::Uniform4f => {
                let p: wire::Uniform4f = self.read(k, offset)?;
                Command::Uniform4f {
                    location: handle(kind, offset, "location", p.location)?,
                    values: p.values,
                }
            }
            Kind::UniformMatrix4f => {
                let p: wire::UniformMatrix4f = self.read(k, offset)?;
                Command::UniformMatrix4f {
                    location: handle(kind, offset, "location", p.location)?,
                    values: p.values,
                }
            }
            Kind::TextureUnit => {
                let p: wire::Unit = self.read(k, offset)?;
                Command::TextureUnit {
                    index: p.index,
                    texture: handle(kind, offset, "texture", p.object)?,
                }
            }
            Kind::SamplerUnit => {
                let p: wire::Unit = self.read(k, offset)?;
                Command::SamplerUnit {
                    index: p.index,
                    sampler: handle(kind, offset, "sampler", p.object)?,
                }
            }
            Kind::UniformBufferUnit => {
                let p: wire::Unit = self.read(k, offset)?;
                Command::UniformBufferUnit {
                    index: p.index,
                    buffer: handle(kind, offset, "buffer", p.object)?,
                }
            }
            Kind::UniformBufferUnitRange => {
                let p: wire::UnitRange = self.read(k, offset)?;
                Command::UniformBufferUnitRange {
                    index: p.index,
                    buffer: handle(kind, offset, "buffer", p.object)?,
                    offset: p.offset,
                    size: p.size,
                }
            }
            Kind::Draw => {
                let p: wire::Draw = self.read(k, offset)?;
                Command::Draw {
                    vertex_offset: p.offset,
                    vertex_count: p.count,
                    instance_count: p.instance_count,
                }
            }
            Kind::DrawIndexed => {
                let p: wire::Draw = self.read(k, offset)?;
                Command::DrawIndexed {
                    index_offset: p.offset,
                    index_count: p.count,
                    instance_count: p.instance_count,
                }
            }
            Kind::CopyContentToBuffer => {
                let p: wire::CopyContentToBuffer = self.read(k, offset)?;
                Command::CopyContentToBuffer(CopyContentToBufferInfo {
                    buffer: handle(kind, offset, "buffer", p.buffer)?,
                    region: Region::new(p.x, p.y, p.width, p.height),
                    format: field(kind, offset, "format", p.format, wire::data_format_from)?,
                    buffer_offset: p.buffer_offset,
                })
            }
            Kind::CopyContentToTexture => {
                let p: wire::CopyContentToTexture = self.read(k, offset)?;
                Command::CopyContentToTexture(CopyContentToTextureInfo {
                    texture: handle(kind, offset, "texture", p.texture)?,
                    texture_level: p.texture_level,
                    texture_x: p.texture_x,
                    texture_y: p.texture_y,
                    framebuffer_region: Region::new(
                        p.framebuffer_x,
                        p.framebuffer_y,
                        p.width,
                        p.height,
                    ),
                    generate_mipmaps: field(
                        kind,
                        offset,
                        "generate_mipmaps",
                        p.generate_mipmaps,
                        wire::bool_from,
                    )?,
                })
            }
            Kind::BeginRenderPass => {
                let p: wire::BeginRenderPass = self.read(k, offset)?;
                let load = |name, code| field(kind, offset, name, code, wire::load_op_from);
                let store = |name, code| field(kind, offset, name, code, wire::store_op_from);
                let mut colors = [ColorAttachmentInfo::default(); MAX_COLOR_ATTACHMENTS];
                for (color, recorded) in colors.iter_mut().zip(p.colors.iter()) {
                    *color = ColorAttachmentInfo {
                        load_op: load("color load_op", recorded.load_op)?,
                        store_op: store("color store_op", recorded.store_op)?,
                        clear_value: recorded.clear_value,
                    };
                }
                Command::BeginRenderPass(RenderPassInfo {
                    framebuffer: handle(kind, offset, "framebuffer", p.framebuffer)?,
                    viewport: Region::new(
                        p.viewport_x,
                        p.viewport_y,
                        p.viewport_width,
                        p.viewport_height,
                    ),
                    colors,
                    depth_load_op: load("depth load_op", p.depth_load_op)?,
                    depth_store_op: store("depth store_op", p.depth_store_op)?,
                    depth_clear_value: p.depth_clear_value,
                    stencil_load_op: load("stencil load_op", p.stencil_load_op)?,
                    stencil_store_op: store("stencil store_op", p.stencil_store_op)?,
                    stencil_clear_value: p.stencil_clear_value,
                })
            }
            Kind::EndRenderPass => Command::EndRenderPass,
            Kind::Invalidate => Command::Invalidate,
        };
        if self.read_offset == self.data.len() {
            self.reset();
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DataFormat;
    use crate::renderer::{LoadOp, StoreOp};

    fn h<T>(raw: u32) -> Handle<T> {
        Handle::from_raw(raw).expect("nonzero")
    }

    fn one_of_each() -> Vec<Command> {
        let mut pass = RenderPassInfo::new(h(1), Region::new(0, 0, 640, 480));
        pass.colors[0] = ColorAttachmentInfo {
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            clear_value: [0.1, 0.2, 0.3, 1.0],
        };
        pass.colors[2].store_op = StoreOp::DontCare;
        pass.depth_load_op = LoadOp::Clear;
        pass.depth_clear_value = 1.0;
        pass.stencil_store_op = StoreOp::DontCare;
        pass.stencil_clear_value = -3;
        let mut matrix = [0.0; 16];
        for (i, m) in matrix.iter_mut().enumerate() {
            *m = i as f32 * 0.5;
        }
        vec![
            Command::BindPipeline(h(7)),
            Command::Uniform1f {
                location: h(2),
                value: -0.25,
            },
            Command::Uniform1i {
                location: h(3),
                value: -9,
            },
            Command::Uniform3f {
                location: h(4),
                values: [1.0, 2.0, 3.0],
            },
            Command::Uniform4f {
                location: h(5),
                values: [1.0, 0.0, 0.0, 1.0],
            },
            Command::UniformMatrix4f {
                location: h(6),
                values: matrix,
            },
            Command::TextureUnit {
                index: 3,
                texture: h(11),
            },
            Command::SamplerUnit {
                index: 3,
                sampler: h(12),
            },
            Command::UniformBufferUnit {
                index: 1,
                buffer: h(13),
            },
            Command::UniformBufferUnitRange {
                index: 2,
                buffer: h(13),
                offset: 256,
                size: 64,
            },
            Command::Draw {
                vertex_offset: 6,
                vertex_count: 3,
                instance_count: 2,
            },
            Command::DrawIndexed {
                index_offset: 12,
                index_count: 36,
                instance_count: 1,
            },
            Command::CopyContentToBuffer(CopyContentToBufferInfo {
                buffer: h(14),
                region: Region::new(-1, 2, 1, 1),
                format: DataFormat::Rgba32F,
                buffer_offset: 16,
            }),
            Command::CopyContentToTexture(CopyContentToTextureInfo {
                texture: h(15),
                texture_level: 0,
                texture_x: 4,
                texture_y: 8,
                framebuffer_region: Region::new(0, 0, 32, 32),
                generate_mipmaps: true,
            }),
            Command::BeginRenderPass(pass),
            Command::EndRenderPass,
            Command::Invalidate,
        ]
    }

    #[test]
    fn every_kind_round_trips() {
        let commands = one_of_each();
        let kinds: Vec<_> = commands.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, Kind::ALL.to_vec());

        let mut buffer = CommandBuffer::new();
        let mut expected_len = 0;
        for command in &commands {
            buffer.encode(command).expect("unbounded");
            expected_len += command.kind().record_size();
            assert_eq!(buffer.write_offset(), expected_len);
        }
        let mut decoded = Vec::new();
        while buffer.has_more() {
            decoded.push(buffer.decode_next().expect("well formed"));
        }
        assert_eq!(decoded, commands);
    }

    #[test]
    fn exhausting_resets_the_cursors() {
        let mut buffer = CommandBuffer::new();
        buffer.draw(0, 3, 1).expect("fits");
        buffer.draw(3, 3, 1).expect("fits");
        buffer.decode_next().expect("first");
        assert_eq!(buffer.read_offset(), Kind::Draw.record_size());
        buffer.decode_next().expect("second");
        assert_eq!(buffer.read_offset(), 0);
        assert_eq!(buffer.write_offset(), 0);
        assert!(!buffer.has_more());

        // a second reset changes nothing
        buffer.reset();
        assert!(!buffer.has_more());
        buffer.invalidate().expect("fits");
        assert_eq!(buffer.decode_next(), Ok(Command::Invalidate));
        assert!(!buffer.has_more());
    }

    #[test]
    fn unknown_kind_is_reported_with_its_offset() {
        let mut buffer = CommandBuffer::new();
        buffer.draw(0, 3, 1).expect("fits");
        buffer.append_raw_for_testing(&99u32.to_ne_bytes());
        buffer.decode_next().expect("draw");
        assert_eq!(
            buffer.decode_next(),
            Err(DecodeError::UnknownKind { kind: 99, offset: 16 })
        );
    }

    #[test]
    fn truncated_payload() {
        let mut buffer = CommandBuffer::new();
        buffer.append_raw_for_testing(&(Kind::Uniform4f as u32).to_ne_bytes());
        buffer.append_raw_for_testing(&[0; 6]);
        assert_eq!(
            buffer.decode_next(),
            Err(DecodeError::Truncated {
                kind: Some(Kind::Uniform4f),
                offset: 0,
                needed: 20,
                available: 6
            })
        );
    }

    #[test]
    fn zero_handle_is_invalid() {
        let mut buffer = CommandBuffer::new();
        buffer.append_raw_for_testing(&(Kind::BindPipeline as u32).to_ne_bytes());
        buffer.append_raw_for_testing(&0u32.to_ne_bytes());
        assert!(matches!(
            buffer.decode_next(),
            Err(DecodeError::InvalidField {
                kind: Kind::BindPipeline,
                field: "pipeline",
                ..
            })
        ));
    }
}
