// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Fixed-layout records.  Every field is a 4-byte scalar, so the structs have no padding.

use crate::device::{DataFormat, MAX_COLOR_ATTACHMENTS};
use crate::renderer::{LoadOp, StoreOp};
use bytemuck::{Pod, Zeroable};

pub(super) const HEADER_SIZE: usize = std::mem::size_of::<CommandHeader>();

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct CommandHeader {
    pub kind: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct BindPipeline {
    pub pipeline: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct Uniform1f {
    pub location: u32,
    pub value: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct Uniform1i {
    pub location: u32,
    pub value: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct Uniform3f {
    pub location: u32,
    pub values: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct Uniform4f {
    pub location: u32,
    pub values: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct UniformMatrix4f {
    pub location: u32,
    pub values: [f32; 16],
}

/// Texture, sampler and uniform buffer units.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct Unit {
    pub index: u32,
    pub object: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct UnitRange {
    pub index: u32,
    pub object: u32,
    pub offset: u32,
    pub size: u32,
}

/// Both draw kinds: `offset` counts vertices or indices.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct Draw {
    pub offset: u32,
    pub count: u32,
    pub instance_count: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct CopyContentToBuffer {
    pub buffer: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub buffer_offset: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct CopyContentToTexture {
    pub texture: u32,
    pub texture_level: u32,
    pub texture_x: i32,
    pub texture_y: i32,
    pub framebuffer_x: i32,
    pub framebuffer_y: i32,
    pub width: u32,
    pub height: u32,
    pub generate_mipmaps: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct ColorAttachment {
    pub load_op: u32,
    pub store_op: u32,
    pub clear_value: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(super) struct BeginRenderPass {
    pub framebuffer: u32,
    pub viewport_x: i32,
    pub viewport_y: i32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub colors: [ColorAttachment; MAX_COLOR_ATTACHMENTS],
    pub depth_load_op: u32,
    pub depth_store_op: u32,
    pub depth_clear_value: f32,
    pub stencil_load_op: u32,
    pub stencil_store_op: u32,
    pub stencil_clear_value: i32,
}

pub(super) fn bool_code(value: bool) -> u32 {
    value as u32
}

pub(super) fn bool_from(code: u32) -> Option<bool> {
    match code {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

pub(super) fn load_op_code(op: LoadOp) -> u32 {
    match op {
        LoadOp::Load => 0,
        LoadOp::Clear => 1,
    }
}

pub(super) fn load_op_from(code: u32) -> Option<LoadOp> {
    match code {
        0 => Some(LoadOp::Load),
        1 => Some(LoadOp::Clear),
        _ => None,
    }
}

pub(super) fn store_op_code(op: StoreOp) -> u32 {
    match op {
        StoreOp::Store => 0,
        StoreOp::DontCare => 1,
    }
}

pub(super) fn store_op_from(code: u32) -> Option<StoreOp> {
    match code {
        0 => Some(StoreOp::Store),
        1 => Some(StoreOp::DontCare),
        _ => None,
    }
}

pub(super) fn data_format_code(format: DataFormat) -> u32 {
    match format {
        DataFormat::Rgba8 => 0,
        DataFormat::Rgba16F => 1,
        DataFormat::Rgba32F => 2,
    }
}

pub(super) fn data_format_from(code: u32) -> Option<DataFormat> {
    match code {
        0 => Some(DataFormat::Rgba8),
        1 => Some(DataFormat::Rgba16F),
        2 => Some(DataFormat::Rgba32F),
        _ => None,
    }
}
