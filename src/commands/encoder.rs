// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Recording side of [CommandBuffer].  Encoding only appends bytes; the device is never touched.

use super::wire;
use super::{
    Command, CommandBuffer, CopyContentToBufferInfo, CopyContentToTextureInfo, EncodeError, Kind,
};
use crate::objects::{
    BufferHandle, PipelineHandle, SamplerHandle, TextureHandle, UniformLocationHandle,
};
use crate::renderer::RenderPassInfo;
use bytemuck::Pod;

impl CommandBuffer {
    fn push<T: Pod>(&mut self, kind: Kind, payload: &T) -> Result<(), EncodeError> {
        debug_assert_eq!(std::mem::size_of::<T>(), kind.payload_size());
        self.reserve(kind, kind.record_size())?;
        let header = wire::CommandHeader { kind: kind as u32 };
        self.data.extend_from_slice(bytemuck::bytes_of(&header));
        self.data.extend_from_slice(bytemuck::bytes_of(payload));
        Ok(())
    }

    fn push_bare(&mut self, kind: Kind) -> Result<(), EncodeError> {
        debug_assert_eq!(kind.payload_size(), 0);
        self.reserve(kind, kind.record_size())?;
        let header = wire::CommandHeader { kind: kind as u32 };
        self.data.extend_from_slice(bytemuck::bytes_of(&header));
        Ok(())
    }

    /**
    Appends one command.

    Handles are recorded as-is.  They must still be live when the buffer is submitted.
    */
    pub fn encode(&mut self, command: &Command) -> Result<(), EncodeError> {
        let kind = command.kind();
        match command {
            Command::BindPipeline(pipeline) => self.push(
                kind,
                &wire::BindPipeline {
                    pipeline: pipeline.raw(),
                },
            ),
            Command::Uniform1f { location, value } => self.push(
                kind,
                &wire::Uniform1f {
                    location: location.raw(),
                    value: *value,
                },
            ),
            Command::Uniform1i { location, value } => self.push(
                kind,
                &wire::Uniform1i {
                    location: location.raw(),
                    value: *value,
                },
            ),
            Command::Uniform3f { location, values } => self.push(
                kind,
                &wire::Uniform3f {
                    location: location.raw(),
                    values: *values,
                },
            ),
            Command::Uniform4f { location, values } => self.push(
                kind,
                &wire::Uniform4f {
                    location: location.raw(),
                    values: *values,
                },
            ),
            Command::UniformMatrix4f { location, values } => self.push(
                kind,
                &wire::UniformMatrix4f {
                    location: location.raw(),
                    values: *values,
                },
            ),
            Command::TextureUnit { index, texture } => self.push(
                kind,
                &wire::Unit {
                    index: *index,
                    object: texture.raw(),
                },
            ),
            Command::SamplerUnit { index, sampler } => self.push(
                kind,
                &wire::Unit {
                    index: *index,
                    object: sampler.raw(),
                },
            ),
            Command::UniformBufferUnit { index, buffer } => self.push(
                kind,
                &wire::Unit {
                    index: *index,
                    object: buffer.raw(),
                },
            ),
            Command::UniformBufferUnitRange {
                index,
                buffer,
                offset,
                size,
            } => self.push(
                kind,
                &wire::UnitRange {
                    index: *index,
                    object: buffer.raw(),
                    offset: *offset,
                    size: *size,
                },
            ),
            Command::Draw {
                vertex_offset,
                vertex_count,
                instance_count,
            } => self.push(
                kind,
                &wire::Draw {
                    offset: *vertex_offset,
                    count: *vertex_count,
                    instance_count: *instance_count,
                },
            ),
            Command::DrawIndexed {
                index_offset,
                index_count,
                instance_count,
            } => self.push(
                kind,
                &wire::Draw {
                    offset: *index_offset,
                    count: *index_count,
                    instance_count: *instance_count,
                },
            ),
            Command::CopyContentToBuffer(info) => self.push(
                kind,
                &wire::CopyContentToBuffer {
                    buffer: info.buffer.raw(),
                    x: info.region.x,
                    y: info.region.y,
                    width: info.region.width,
                    height: info.region.height,
                    format: wire::data_format_code(info.format),
                    buffer_offset: info.buffer_offset,
                },
            ),
            Command::CopyContentToTexture(info) => self.push(
                kind,
                &wire::CopyContentToTexture {
                    texture: info.texture.raw(),
                    texture_level: info.texture_level,
                    texture_x: info.texture_x,
                    texture_y: info.texture_y,
                    framebuffer_x: info.framebuffer_region.x,
                    framebuffer_y: info.framebuffer_region.y,
                    width: info.framebuffer_region.width,
                    height: info.framebuffer_region.height,
                    generate_mipmaps: wire::bool_code(info.generate_mipmaps),
                },
            ),
            Command::BeginRenderPass(info) => self.push(
                kind,
                &wire::BeginRenderPass {
                    framebuffer: info.framebuffer.raw(),
                    viewport_x: info.viewport.x,
                    viewport_y: info.viewport.y,
                    viewport_width: info.viewport.width,
                    viewport_height: info.viewport.height,
                    colors: info.colors.map(|c| wire::ColorAttachment {
                        load_op: wire::load_op_code(c.load_op),
                        store_op: wire::store_op_code(c.store_op),
                        clear_value: c.clear_value,
                    }),
                    depth_load_op: wire::load_op_code(info.depth_load_op),
                    depth_store_op: wire::store_op_code(info.depth_store_op),
                    depth_clear_value: info.depth_clear_value,
                    stencil_load_op: wire::load_op_code(info.stencil_load_op),
                    stencil_store_op: wire::store_op_code(info.stencil_store_op),
                    stencil_clear_value: info.stencil_clear_value,
                },
            ),
            Command::EndRenderPass | Command::Invalidate => self.push_bare(kind),
        }
    }

    pub fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> Result<(), EncodeError> {
        self.encode(&Command::BindPipeline(pipeline))
    }

    pub fn uniform1f(
        &mut self,
        location: UniformLocationHandle,
        value: f32,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::Uniform1f { location, value })
    }

    pub fn uniform1i(
        &mut self,
        location: UniformLocationHandle,
        value: i32,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::Uniform1i { location, value })
    }

    pub fn uniform3f(
        &mut self,
        location: UniformLocationHandle,
        values: [f32; 3],
    ) -> Result<(), EncodeError> {
        self.encode(&Command::Uniform3f { location, values })
    }

    pub fn uniform4f(
        &mut self,
        location: UniformLocationHandle,
        values: [f32; 4],
    ) -> Result<(), EncodeError> {
        self.encode(&Command::Uniform4f { location, values })
    }

    /// Column-major, not transposed.
    pub fn uniform_matrix4f(
        &mut self,
        location: UniformLocationHandle,
        values: [f32; 16],
    ) -> Result<(), EncodeError> {
        self.encode(&Command::UniformMatrix4f { location, values })
    }

    pub fn texture_unit(&mut self, index: u32, texture: TextureHandle) -> Result<(), EncodeError> {
        self.encode(&Command::TextureUnit { index, texture })
    }

    pub fn sampler_unit(&mut self, index: u32, sampler: SamplerHandle) -> Result<(), EncodeError> {
        self.encode(&Command::SamplerUnit { index, sampler })
    }

    pub fn uniform_buffer_unit(
        &mut self,
        index: u32,
        buffer: BufferHandle,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::UniformBufferUnit { index, buffer })
    }

    /// `offset` must be a multiple of the device's uniform buffer offset alignment.
    pub fn uniform_buffer_unit_range(
        &mut self,
        index: u32,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::UniformBufferUnitRange {
            index,
            buffer,
            offset,
            size,
        })
    }

    pub fn draw(
        &mut self,
        vertex_offset: u32,
        vertex_count: u32,
        instance_count: u32,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::Draw {
            vertex_offset,
            vertex_count,
            instance_count,
        })
    }

    pub fn draw_indexed(
        &mut self,
        index_offset: u32,
        index_count: u32,
        instance_count: u32,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::DrawIndexed {
            index_offset,
            index_count,
            instance_count,
        })
    }

    pub fn copy_content_to_buffer(
        &mut self,
        info: &CopyContentToBufferInfo,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::CopyContentToBuffer(*info))
    }

    pub fn copy_content_to_texture(
        &mut self,
        info: &CopyContentToTextureInfo,
    ) -> Result<(), EncodeError> {
        self.encode(&Command::CopyContentToTexture(*info))
    }

    pub fn begin_render_pass(&mut self, info: &RenderPassInfo) -> Result<(), EncodeError> {
        self.encode(&Command::BeginRenderPass(*info))
    }

    pub fn end_render_pass(&mut self) -> Result<(), EncodeError> {
        self.encode(&Command::EndRenderPass)
    }

    pub fn invalidate(&mut self) -> Result<(), EncodeError> {
        self.encode(&Command::Invalidate)
    }
}
