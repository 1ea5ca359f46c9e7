// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Backend objects and the metadata replay needs about them.

Each object wraps one device-level id.  Objects are created and released through
[crate::Context], which stores them in per-kind [HandleTable](crate::handles::HandleTable)s and
hands out the handle aliases defined here.
*/

pub mod buffer;
pub mod fence;
pub mod framebuffer;
pub mod pipeline;
pub mod program;
pub mod sampler;
pub mod texture;
pub mod vertex_array;

use crate::handles::{Handle, HandleTable};

pub use buffer::{Buffer, BufferInfo};
pub use fence::{Fence, FenceStatus};
pub use framebuffer::{Framebuffer, FramebufferInfo};
pub use pipeline::{
    BlendState, CullMode, Pipeline, PipelineInfo, StencilFaceState, StencilFunc, StencilOps,
};
pub use program::{NamedBinding, Program, ProgramInfo, Shader, UniformLocation};
pub use sampler::Sampler;
pub use texture::{ColorFormat, Texture, TextureInfo, mip_level_count};
pub use vertex_array::{
    AttributeType, VertexArray, VertexArrayInfo, VertexAttribute, VertexAttributeFormat,
    VertexBinding,
};

pub type TextureHandle = Handle<Texture>;
pub type BufferHandle = Handle<Buffer>;
pub type ShaderHandle = Handle<Shader>;
pub type ProgramHandle = Handle<Program>;
pub type UniformLocationHandle = Handle<UniformLocation>;
pub type FramebufferHandle = Handle<Framebuffer>;
pub type VertexArrayHandle = Handle<VertexArray>;
pub type PipelineHandle = Handle<Pipeline>;
pub type SamplerHandle = Handle<Sampler>;
pub type FenceHandle = Handle<Fence>;

/**
One handle table per object kind.

The default framebuffer is allocated when the tables are created and lives as long as they do.
*/
#[derive(Debug)]
pub(crate) struct ObjectTables {
    pub textures: HandleTable<Texture>,
    pub buffers: HandleTable<Buffer>,
    pub shaders: HandleTable<Shader>,
    pub programs: HandleTable<Program>,
    pub uniform_locations: HandleTable<UniformLocation>,
    pub framebuffers: HandleTable<Framebuffer>,
    pub vertex_arrays: HandleTable<VertexArray>,
    pub pipelines: HandleTable<Pipeline>,
    pub samplers: HandleTable<Sampler>,
    pub fences: HandleTable<Fence>,
    pub default_framebuffer: FramebufferHandle,
}

impl ObjectTables {
    pub fn new() -> Self {
        let mut framebuffers = HandleTable::new();
        let default_framebuffer = framebuffers.allocate(Framebuffer::default_surface());
        ObjectTables {
            textures: HandleTable::new(),
            buffers: HandleTable::new(),
            shaders: HandleTable::new(),
            programs: HandleTable::new(),
            uniform_locations: HandleTable::new(),
            framebuffers,
            vertex_arrays: HandleTable::new(),
            pipelines: HandleTable::new(),
            samplers: HandleTable::new(),
            fences: HandleTable::new(),
            default_framebuffer,
        }
    }
}
