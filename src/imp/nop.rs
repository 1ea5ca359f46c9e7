// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::*;

/**
A device that accepts every call and does nothing.

Object creation hands out increasing ids, compiles and links succeed, framebuffers are complete,
and fences are signaled as soon as they are created.  Useful for exercising the recording side
without caring what the device sees.
*/
#[derive(Debug)]
pub struct NopDevice {
    next_id: u32,
    limits: Limits,
}

impl NopDevice {
    pub fn new() -> Self {
        NopDevice {
            next_id: 1,
            limits: Limits::default(),
        }
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for NopDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for NopDevice {
    fn limits(&self) -> Limits {
        self.limits
    }

    fn create_texture(&mut self, _storage: &TextureStorage, _sampling: &SamplingState) -> RawTexture {
        RawTexture(self.next())
    }
    fn upload_texture(&mut self, _: RawTexture, _: TextureTarget, _: Region, _: DataFormat, _: &[u8]) {}
    fn generate_mipmaps(&mut self, _: RawTexture, _: TextureKind) {}
    fn delete_texture(&mut self, _: RawTexture) {}

    fn create_sampler(&mut self, _sampling: &SamplingState) -> RawSampler {
        RawSampler(self.next())
    }
    fn delete_sampler(&mut self, _: RawSampler) {}

    fn create_buffer(&mut self, _: BufferKind, _: BufferUsage, _: usize, _: Option<&[u8]>) -> RawBuffer {
        RawBuffer(self.next())
    }
    fn write_buffer(&mut self, _: RawBuffer, _: BufferKind, _: usize, _: &[u8]) {}
    fn read_buffer(&mut self, _: RawBuffer, _: BufferKind, _: usize, target: &mut [u8]) {
        target.fill(0);
    }
    fn delete_buffer(&mut self, _: RawBuffer) {}

    fn create_shader(&mut self, _: ShaderStage) -> RawShader {
        RawShader(self.next())
    }
    fn compile_shader(&mut self, _: RawShader, _: &str) -> Result<(), String> {
        Ok(())
    }
    fn delete_shader(&mut self, _: RawShader) {}
    fn create_program(&mut self) -> RawProgram {
        RawProgram(self.next())
    }
    fn link_program(&mut self, _: RawProgram, _: &[RawShader]) -> Result<(), String> {
        Ok(())
    }
    fn uniform_location(&mut self, _: RawProgram, _: &str) -> Option<RawUniformLocation> {
        Some(RawUniformLocation(self.next()))
    }
    fn texture_binding(&mut self, _: RawProgram, _: &str, _: u32) -> bool {
        true
    }
    fn uniform_block_binding(&mut self, _: RawProgram, _: &str, _: u32) -> bool {
        true
    }
    fn delete_program(&mut self, _: RawProgram) {}

    fn create_framebuffer(&mut self, _: &FramebufferAttachments) -> RawFramebuffer {
        RawFramebuffer(self.next())
    }
    fn framebuffer_complete(&mut self, _: RawFramebuffer) -> bool {
        true
    }
    fn delete_framebuffer(&mut self, _: RawFramebuffer) {}
    fn create_vertex_array(&mut self, _: &VertexArrayLayout) -> RawVertexArray {
        RawVertexArray(self.next())
    }
    fn delete_vertex_array(&mut self, _: RawVertexArray) {}

    fn set_enabled(&mut self, _: Feature, _: bool) {}
    fn cull_face(&mut self, _: Face) {}
    fn front_face(&mut self, _: FaceOrientation) {}
    fn depth_mask(&mut self, _: bool) {}
    fn depth_func(&mut self, _: Comparison) {}
    fn stencil_op(&mut self, _: Face, _: StencilOperation, _: StencilOperation, _: StencilOperation) {}
    fn stencil_func(&mut self, _: Face, _: Comparison, _: i32, _: u32) {}
    fn stencil_mask(&mut self, _: Face, _: u32) {}
    fn color_mask(&mut self, _: [bool; 4]) {}
    fn blend_color(&mut self, _: [f32; 4]) {}
    fn blend_equation(&mut self, _: BlendEquation, _: BlendEquation) {}
    fn blend_func(&mut self, _: BlendFactor, _: BlendFactor, _: BlendFactor, _: BlendFactor) {}
    fn viewport(&mut self, _: Region) {}
    fn scissor(&mut self, _: Region) {}

    fn bind_framebuffer(&mut self, _: RawFramebuffer) {}
    fn use_program(&mut self, _: RawProgram) {}
    fn bind_vertex_array(&mut self, _: RawVertexArray) {}
    fn bind_texture(&mut self, _: u32, _: TextureKind, _: RawTexture) {}
    fn bind_sampler(&mut self, _: u32, _: RawSampler) {}
    fn bind_uniform_buffer(&mut self, _: u32, _: RawBuffer) {}
    fn bind_uniform_buffer_range(&mut self, _: u32, _: RawBuffer, _: u32, _: u32) {}

    fn uniform1f(&mut self, _: RawUniformLocation, _: f32) {}
    fn uniform1i(&mut self, _: RawUniformLocation, _: i32) {}
    fn uniform3f(&mut self, _: RawUniformLocation, _: [f32; 3]) {}
    fn uniform4f(&mut self, _: RawUniformLocation, _: [f32; 4]) {}
    fn uniform_matrix4f(&mut self, _: RawUniformLocation, _: &[f32; 16]) {}

    fn clear_color(&mut self, _: u32, _: [f32; 4]) {}
    fn clear_depth(&mut self, _: f32) {}
    fn clear_stencil(&mut self, _: i32) {}
    fn clear_depth_stencil(&mut self, _: f32, _: i32) {}
    fn invalidate_framebuffer(&mut self, _: &[InvalidateAttachment]) {}

    fn draw_arrays(&mut self, _: Topology, _: u32, _: u32, _: u32) {}
    fn draw_elements(&mut self, _: Topology, _: u32, _: IndexFormat, _: u32, _: u32) {}

    fn read_pixels_to_buffer(&mut self, _: RawBuffer, _: Region, _: DataFormat, _: u32) {}
    fn copy_framebuffer_to_texture(&mut self, _: RawTexture, _: TextureKind, _: u32, _: i32, _: i32, _: Region) {}

    fn create_fence(&mut self) -> RawSync {
        RawSync(self.next())
    }
    fn fence_status(&mut self, _: RawSync) -> SyncStatus {
        SyncStatus::Signaled
    }
    fn delete_fence(&mut self, _: RawSync) {}
}
