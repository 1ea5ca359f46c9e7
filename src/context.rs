// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The top-level owner of a device connection.

A [Context] holds the [Device], one handle table per object kind and the [Renderer].  Objects are
created and released through it, and recorded [CommandBuffer]s are replayed with
[Context::submit].

Several contexts can coexist, each with its own device; nothing here is global.
*/

use crate::commands::{Command, CommandBuffer, DecodeError};
use crate::device::{
    DataFormat, Device, FramebufferAttachments, Limits, RawShader, Region, SamplingState,
    ShaderStage, TextureTarget,
};
use crate::objects::{
    Buffer, BufferHandle, BufferInfo, Fence, FenceHandle, FenceStatus, Framebuffer,
    FramebufferHandle, FramebufferInfo, ObjectTables, Pipeline, PipelineHandle, PipelineInfo,
    Program, ProgramHandle, ProgramInfo, Sampler, SamplerHandle, Shader, ShaderHandle, Texture,
    TextureHandle, TextureInfo, UniformLocation, UniformLocationHandle, VertexArray,
    VertexArrayHandle, VertexArrayInfo, vertex_array::device_layout,
};
use crate::renderer::Renderer;

/// A submitted buffer could not be replayed to the end.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("command buffer is corrupt: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug)]
pub struct Context<D: Device> {
    device: D,
    limits: Limits,
    objects: ObjectTables,
    renderer: Renderer,
}

impl<D: Device> Context<D> {
    pub fn new(device: D) -> Self {
        let limits = device.limits();
        logwise::info_sync!(
            "Context created; uniform buffer alignment {alignment}, {colors} color attachments",
            alignment = limits.uniform_buffer_offset_alignment,
            colors = limits.max_color_attachments
        );
        let objects = ObjectTables::new();
        let renderer = Renderer::new(objects.default_framebuffer);
        Context {
            device,
            limits,
            objects,
            renderer,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /**
    Direct access to the device.

    State changed through this bypasses the cache.  Call [Self::invalidate] afterwards.
    */
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Capabilities queried when the context was created.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// The window surface.  Valid for the life of the context and never released.
    pub fn default_framebuffer(&self) -> FramebufferHandle {
        self.objects.default_framebuffer
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    // textures

    pub fn create_texture(&mut self, info: &TextureInfo<'_>) -> TextureHandle {
        let texture = Texture::create(&mut self.device, info);
        self.objects.textures.allocate(texture)
    }

    pub fn texture(&self, texture: TextureHandle) -> &Texture {
        self.objects.textures.get(texture)
    }

    /**
    Replaces a region of one level-0 image.

    # Panics
    If `data` does not hold exactly `region` pixels of `format`, or the region is out of bounds.
    */
    pub fn upload_texture(
        &mut self,
        texture: TextureHandle,
        target: TextureTarget,
        region: Region,
        format: DataFormat,
        data: &[u8],
    ) {
        self.objects
            .textures
            .get(texture)
            .upload(&mut self.device, target, region, format, data);
    }

    pub fn generate_mipmaps(&mut self, texture: TextureHandle) {
        let texture = self.objects.textures.get(texture);
        self.device.generate_mipmaps(texture.raw(), texture.kind());
    }

    pub fn release_texture(&mut self, texture: TextureHandle) {
        self.objects.textures.release(texture).release(&mut self.device);
    }

    // buffers

    pub fn create_buffer(&mut self, info: &BufferInfo<'_>) -> BufferHandle {
        let buffer = Buffer::create(&mut self.device, info);
        self.objects.buffers.allocate(buffer)
    }

    pub fn buffer(&self, buffer: BufferHandle) -> &Buffer {
        self.objects.buffers.get(buffer)
    }

    pub fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) {
        self.objects
            .buffers
            .get(buffer)
            .write(&mut self.device, offset, data);
    }

    /**
    Copies buffer contents back to the CPU.

    For readback targets, wait on a fence first or the read stalls until the copy is done.
    */
    pub fn read_buffer(&mut self, buffer: BufferHandle, offset: usize, target: &mut [u8]) {
        self.objects
            .buffers
            .get(buffer)
            .read(&mut self.device, offset, target);
    }

    pub fn release_buffer(&mut self, buffer: BufferHandle) {
        self.objects.buffers.release(buffer).release(&mut self.device);
    }

    // shaders and programs

    /// Compiles a shader.  On failure the shader is still returned; see [Shader::is_compiled].
    pub fn create_shader(&mut self, stage: ShaderStage, label: &str, source: &str) -> ShaderHandle {
        let shader = Shader::create(&mut self.device, stage, label, source);
        self.objects.shaders.allocate(shader)
    }

    pub fn shader(&self, shader: ShaderHandle) -> &Shader {
        self.objects.shaders.get(shader)
    }

    pub fn release_shader(&mut self, shader: ShaderHandle) {
        self.objects.shaders.release(shader).release(&mut self.device);
    }

    /// Links a program.  On failure the program is still returned; see [Program::is_linked].
    pub fn create_program(&mut self, info: &ProgramInfo<'_>) -> ProgramHandle {
        let shaders: [RawShader; 2] = [
            self.objects.shaders.get(info.vertex_shader).raw(),
            self.objects.shaders.get(info.fragment_shader).raw(),
        ];
        let program = Program::create(
            &mut self.device,
            info.label,
            &shaders,
            info.texture_bindings,
            info.uniform_bindings,
        );
        self.objects.programs.allocate(program)
    }

    pub fn program(&self, program: ProgramHandle) -> &Program {
        self.objects.programs.get(program)
    }

    /**
    Looks up a uniform by name.

    A name the program does not have still yields a handle.  Commands using it do nothing.  The
    handle lives until the program is released.
    */
    pub fn uniform_location(
        &mut self,
        program: ProgramHandle,
        name: &str,
    ) -> UniformLocationHandle {
        let raw_program = self.objects.programs.get(program).raw();
        let raw = self.device.uniform_location(raw_program, name);
        if raw.is_none() {
            logwise::trace_sync!(
                "Uniform {name} not found",
                name = logwise::privacy::LogIt(&name)
            );
        }
        let location = self
            .objects
            .uniform_locations
            .allocate(UniformLocation::new(raw, program));
        self.objects
            .programs
            .get_mut(program)
            .track_uniform_location(location);
        location
    }

    /// Releases the program and every uniform location looked up on it.
    pub fn release_program(&mut self, program: ProgramHandle) {
        let locations = self.objects.programs.release(program).release(&mut self.device);
        for location in locations {
            self.objects.uniform_locations.release(location);
        }
    }

    // framebuffers

    /**
    Creates a framebuffer.

    If the device reports it incomplete it is still returned; see [Framebuffer::is_complete].
    */
    pub fn create_framebuffer(&mut self, info: &FramebufferInfo<'_>) -> FramebufferHandle {
        let textures = &self.objects.textures;
        let resolve = |t: Option<TextureHandle>| t.map(|t| textures.get(t).raw());
        let attachments = FramebufferAttachments {
            colors: info.colors.map(resolve),
            depth: resolve(info.depth),
            stencil: resolve(info.stencil),
            depth_stencil: resolve(info.depth_stencil),
        };
        let max_colors = self.limits.max_color_attachments as usize;
        let framebuffer =
            Framebuffer::create(&mut self.device, info.label, &attachments, max_colors);
        self.objects.framebuffers.allocate(framebuffer)
    }

    pub fn framebuffer(&self, framebuffer: FramebufferHandle) -> &Framebuffer {
        self.objects.framebuffers.get(framebuffer)
    }

    /**
    # Panics
    For the default framebuffer.
    */
    pub fn release_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        assert_ne!(
            framebuffer, self.objects.default_framebuffer,
            "the default framebuffer cannot be released"
        );
        self.objects
            .framebuffers
            .release(framebuffer)
            .release(&mut self.device);
    }

    // vertex arrays, pipelines, samplers

    pub fn create_vertex_array(&mut self, info: &VertexArrayInfo<'_>) -> VertexArrayHandle {
        let buffers = &self.objects.buffers;
        let layout = device_layout(info, |b| buffers.get(b).raw());
        let vertex_array = VertexArray::create(&mut self.device, &layout, info.index_format);
        self.objects.vertex_arrays.allocate(vertex_array)
    }

    pub fn release_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.objects
            .vertex_arrays
            .release(vertex_array)
            .release(&mut self.device);
    }

    /// Pipelines are CPU-side snapshots; creating one makes no device calls.
    pub fn create_pipeline(&mut self, info: &PipelineInfo) -> PipelineHandle {
        let index_format = self.objects.vertex_arrays.get(info.vertex_array).index_format();
        self.objects.pipelines.allocate(Pipeline::new(info, index_format))
    }

    pub fn pipeline(&self, pipeline: PipelineHandle) -> &Pipeline {
        self.objects.pipelines.get(pipeline)
    }

    pub fn release_pipeline(&mut self, pipeline: PipelineHandle) {
        self.objects.pipelines.release(pipeline);
    }

    pub fn create_sampler(&mut self, state: &SamplingState) -> SamplerHandle {
        let sampler = Sampler::create(&mut self.device, state);
        self.objects.samplers.allocate(sampler)
    }

    pub fn release_sampler(&mut self, sampler: SamplerHandle) {
        self.objects.samplers.release(sampler).release(&mut self.device);
    }

    // fences

    /// Inserts a fence after everything submitted so far.
    pub fn create_fence(&mut self) -> FenceHandle {
        let fence = Fence::create(&mut self.device);
        self.objects.fences.allocate(fence)
    }

    /// Non-blocking.  Must not be called after [Self::release_fence].
    pub fn fence_status(&mut self, fence: FenceHandle) -> FenceStatus {
        self.objects.fences.get(fence).status(&mut self.device)
    }

    /// Call exactly once per fence, whatever its status.
    pub fn release_fence(&mut self, fence: FenceHandle) {
        self.objects.fences.release(fence).release(&mut self.device);
    }

    // replay

    /// Runs one command immediately, without recording it.
    pub fn execute(&mut self, command: &Command) {
        self.renderer.execute(&mut self.device, &self.objects, command);
    }

    /**
    Replays every command in `buffer`, in order, and returns how many ran.

    The buffer is empty afterwards and can be recorded into again.  If it turns out to be corrupt,
    the commands before the bad record have already run; the rest is dropped.
    */
    pub fn submit(&mut self, buffer: &mut CommandBuffer) -> Result<usize, SubmitError> {
        let _interval = logwise::perfwarn_begin!("Context::submit");
        let mut count = 0;
        while buffer.has_more() {
            let command = match buffer.decode_next() {
                Ok(command) => command,
                Err(err) => {
                    logwise::error_sync!(
                        "Aborting replay after {count} commands: {err}",
                        count = count,
                        err = logwise::privacy::LogIt(&err)
                    );
                    buffer.reset();
                    return Err(err.into());
                }
            };
            self.renderer.execute(&mut self.device, &self.objects, &command);
            count += 1;
        }
        logwise::trace_sync!("Replayed {count} commands", count = count);
        Ok(count)
    }

    /// Forces a full state reapply before the next draw.
    pub fn invalidate(&mut self) {
        self.renderer.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BufferKind, RawFramebuffer, SyncStatus};
    use crate::imp::{DeviceCall, NopDevice, RecordingDevice};
    use crate::objects::{ColorFormat, NamedBinding};

    fn program(context: &mut Context<RecordingDevice>) -> ProgramHandle {
        let vs = context.create_shader(ShaderStage::Vertex, "vs", "void main() {}");
        let fs = context.create_shader(ShaderStage::Fragment, "fs", "void main() {}");
        context.create_program(&ProgramInfo {
            label: "p",
            vertex_shader: vs,
            fragment_shader: fs,
            texture_bindings: &[NamedBinding::new("albedo", 0)],
            uniform_bindings: &[],
        })
    }

    #[test]
    fn default_framebuffer_is_preallocated() {
        let context = Context::new(NopDevice::new());
        let framebuffer = context.framebuffer(context.default_framebuffer());
        assert!(framebuffer.is_default());
        assert_eq!(framebuffer.raw(), RawFramebuffer::DEFAULT);
    }

    #[test]
    #[should_panic(expected = "default framebuffer cannot be released")]
    fn default_framebuffer_cannot_be_released() {
        let mut context = Context::new(NopDevice::new());
        let framebuffer = context.default_framebuffer();
        context.release_framebuffer(framebuffer);
    }

    #[test]
    fn failed_link_still_yields_a_program() {
        let mut context = Context::new(RecordingDevice::new());
        context.device_mut().fail_next_link("missing main");
        let program = program(&mut context);
        assert!(!context.program(program).is_linked());
        assert_eq!(context.program(program).info_log(), Some("missing main"));
    }

    #[test]
    fn releasing_a_program_retires_its_uniform_locations() {
        let mut context = Context::new(RecordingDevice::new());
        context.device_mut().set_known_uniforms(&["color"]);
        let program = program(&mut context);
        let color = context.uniform_location(program, "color");
        let missing = context.uniform_location(program, "nothing");
        assert!(context.objects.uniform_locations.get(color).raw().is_some());
        assert!(context.objects.uniform_locations.get(missing).raw().is_none());
        context.release_program(program);
        assert!(!context.objects.uniform_locations.contains(color));
        assert!(!context.objects.uniform_locations.contains(missing));
    }

    #[test]
    fn framebuffer_resolves_attachments() {
        let mut context = Context::new(RecordingDevice::new());
        let color = context.create_texture(&TextureInfo::Color2D {
            width: 4,
            height: 4,
            format: ColorFormat::Rgba8,
            gamma_correction: false,
            mipmaps: false,
            data: None,
        });
        let depth = context.create_texture(&TextureInfo::Depth2D {
            width: 4,
            height: 4,
            comparable: false,
        });
        let framebuffer = context.create_framebuffer(&FramebufferInfo {
            label: "offscreen",
            colors: [None, Some(color), None, None],
            depth: Some(depth),
            ..Default::default()
        });
        let framebuffer = context.framebuffer(framebuffer);
        assert!(framebuffer.is_complete());
        assert_eq!(framebuffer.active_colors(), [false, true, false, false]);
    }

    #[test]
    fn submit_replays_in_order_and_empties_the_buffer() {
        let mut context = Context::new(RecordingDevice::new());
        let mut buffer = CommandBuffer::new();
        buffer.draw(0, 3, 1).expect("fits");
        buffer.draw(3, 3, 1).expect("fits");
        context.device_mut().clear_calls();
        assert_eq!(context.submit(&mut buffer), Ok(2));
        assert!(buffer.is_empty());
        let draws: Vec<_> = context
            .device()
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::DrawArrays { .. }))
            .cloned()
            .collect();
        assert_eq!(draws.len(), 2);
        assert!(matches!(draws[1], DeviceCall::DrawArrays { first: 3, .. }));
    }

    #[test]
    fn corrupt_buffer_aborts_and_resets() {
        let mut context = Context::new(RecordingDevice::new());
        let mut buffer = CommandBuffer::new();
        buffer.invalidate().expect("fits");
        buffer.append_raw_for_testing(&999u32.to_ne_bytes());
        let err = context.submit(&mut buffer).expect_err("corrupt");
        assert_eq!(
            err,
            SubmitError::Decode(DecodeError::UnknownKind {
                kind: 999,
                offset: 4
            })
        );
        assert!(buffer.is_empty());
        assert!(context.renderer().is_invalidated());
    }

    #[test]
    fn fences_follow_device_status() {
        let mut context = Context::new(RecordingDevice::new());
        let fence = context.create_fence();
        assert_eq!(context.fence_status(fence), FenceStatus::NotReady);
        context.device_mut().set_all_fences(SyncStatus::Signaled);
        assert_eq!(context.fence_status(fence), FenceStatus::Success);
        context.release_fence(fence);
        assert_eq!(context.device().live_fences(), 0);
    }

    #[test]
    fn buffer_round_trip_through_device() {
        let mut context = Context::new(RecordingDevice::new());
        let buffer = context.create_buffer(&BufferInfo::with_size(BufferKind::Uniform, 8));
        context.write_buffer(buffer, 4, &[1, 2, 3, 4]);
        let mut out = [0u8; 4];
        context.read_buffer(buffer, 4, &mut out);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn limits_are_queried_once_at_creation() {
        let context = Context::new(RecordingDevice::with_limits(Limits {
            uniform_buffer_offset_alignment: 64,
            max_color_attachments: 2,
        }));
        assert_eq!(context.limits().uniform_buffer_offset_alignment, 64);
        assert_eq!(context.limits().max_color_attachments, 2);
    }

    #[test]
    fn releasing_objects_deletes_their_device_objects() {
        let mut context = Context::new(RecordingDevice::new());
        let program = program(&mut context);
        let vertex_array = context.create_vertex_array(&VertexArrayInfo::default());
        let pipeline = context.create_pipeline(&PipelineInfo::new(program, vertex_array));
        let shader = context.create_shader(ShaderStage::Vertex, "unused", "void main() {}");
        context.device_mut().clear_calls();

        context.release_pipeline(pipeline);
        // pipelines own no device object
        assert!(context.device().calls().is_empty());
        context.release_vertex_array(vertex_array);
        context.release_shader(shader);
        context.release_program(program);
        let calls = context.device_mut().take_calls();
        assert!(matches!(calls[0], DeviceCall::DeleteVertexArray(_)));
        assert!(matches!(calls[1], DeviceCall::DeleteShader(_)));
        assert!(matches!(calls[2], DeviceCall::DeleteProgram(_)));
    }
}
