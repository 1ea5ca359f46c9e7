// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Replays commands against a [Device].

The renderer sits between decoded [Command]s and the device.  Binding a pipeline only records what
the next draw wants; the device is brought up to date lazily, right before each draw or pass, and
only for the fields that actually changed.  See [StateCache] for the diffing rules.
*/

mod render_pass;
mod state;

pub use render_pass::{ColorAttachmentInfo, LoadOp, RenderPassInfo, StoreOp};
pub use state::{State, StateCache};

use crate::commands::{Command, CopyContentToBufferInfo, CopyContentToTextureInfo};
use crate::device::{Device, IndexFormat, InvalidateAttachment, RawUniformLocation, Topology};
use crate::objects::{
    BufferHandle, FramebufferHandle, ObjectTables, PipelineHandle, SamplerHandle, TextureHandle,
    UniformLocationHandle,
};

/// Uniform commands for a name the program does not have are dropped.
fn uniform_location(
    objects: &ObjectTables,
    location: UniformLocationHandle,
) -> Option<RawUniformLocation> {
    objects.uniform_locations.get(location).raw()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassState {
    Idle,
    InPass,
}

/// The replay state machine.  One per device connection.
#[derive(Debug)]
pub struct Renderer {
    cache: StateCache,
    topology: Topology,
    index_format: IndexFormat,
    framebuffer: FramebufferHandle,
    default_framebuffer: FramebufferHandle,
    pass: PassState,
    invalidations: Vec<InvalidateAttachment>,
}

impl Renderer {
    pub(crate) fn new(default_framebuffer: FramebufferHandle) -> Self {
        Renderer {
            cache: StateCache::new(),
            topology: Topology::TriangleList,
            index_format: IndexFormat::U16,
            framebuffer: default_framebuffer,
            default_framebuffer,
            pass: PassState::Idle,
            invalidations: Vec::new(),
        }
    }

    /// State the next draw will run with.
    pub fn desired(&self) -> &State {
        self.cache.desired()
    }

    /// State last applied to the device.
    pub fn actual(&self) -> &State {
        self.cache.actual()
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_dirty()
    }

    pub fn is_invalidated(&self) -> bool {
        self.cache.is_invalidated()
    }

    /// The framebuffer draws currently land in.
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    pub fn is_in_pass(&self) -> bool {
        self.pass == PassState::InPass
    }

    /// Runs one decoded command.
    pub(crate) fn execute<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        command: &Command,
    ) {
        match command {
            Command::BindPipeline(pipeline) => self.bind_pipeline(device, objects, *pipeline),
            Command::Uniform1f { location, value } => {
                if let Some(raw) = uniform_location(objects, *location) {
                    device.uniform1f(raw, *value);
                }
            }
            Command::Uniform1i { location, value } => {
                if let Some(raw) = uniform_location(objects, *location) {
                    device.uniform1i(raw, *value);
                }
            }
            Command::Uniform3f { location, values } => {
                if let Some(raw) = uniform_location(objects, *location) {
                    device.uniform3f(raw, *values);
                }
            }
            Command::Uniform4f { location, values } => {
                if let Some(raw) = uniform_location(objects, *location) {
                    device.uniform4f(raw, *values);
                }
            }
            Command::UniformMatrix4f { location, values } => {
                if let Some(raw) = uniform_location(objects, *location) {
                    device.uniform_matrix4f(raw, values);
                }
            }
            Command::TextureUnit { index, texture } => {
                self.texture_unit(device, objects, *index, *texture)
            }
            Command::SamplerUnit { index, sampler } => {
                self.sampler_unit(device, objects, *index, *sampler)
            }
            Command::UniformBufferUnit { index, buffer } => {
                self.uniform_buffer_unit(device, objects, *index, *buffer)
            }
            Command::UniformBufferUnitRange {
                index,
                buffer,
                offset,
                size,
            } => self.uniform_buffer_unit_range(device, objects, *index, *buffer, *offset, *size),
            Command::Draw {
                vertex_offset,
                vertex_count,
                instance_count,
            } => self.draw(device, *vertex_offset, *vertex_count, *instance_count),
            Command::DrawIndexed {
                index_offset,
                index_count,
                instance_count,
            } => self.draw_indexed(device, *index_offset, *index_count, *instance_count),
            Command::CopyContentToBuffer(info) => self.copy_content_to_buffer(device, objects, info),
            Command::CopyContentToTexture(info) => {
                self.copy_content_to_texture(device, objects, info)
            }
            Command::BeginRenderPass(info) => self.begin_render_pass(device, objects, info),
            Command::EndRenderPass => self.end_render_pass(device),
            Command::Invalidate => self.invalidate(),
        }
    }

    /**
    Makes `pipeline` current.

    The program and vertex array are bound right away.  Everything else goes into the desired
    state; fields a disabled test would not read are left as they are.
    */
    pub(crate) fn bind_pipeline<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        pipeline: PipelineHandle,
    ) {
        let pipeline = objects.pipelines.get(pipeline);
        let program = objects.programs.get(pipeline.program);
        device.use_program(program.raw());
        self.topology = pipeline.topology;

        let desired = self.cache.desired_mut();
        desired.cull_test = pipeline.cull_test;
        if pipeline.cull_test {
            desired.cull_face = pipeline.cull_face;
        }
        desired.front_face = pipeline.front_face;

        desired.depth_test = pipeline.depth_test;
        desired.depth_mask = pipeline.depth_write;
        if pipeline.depth_test {
            desired.depth_comparison = pipeline.depth_comparison;
        }

        desired.stencil_test = pipeline.stencil_test;
        if pipeline.stencil_test {
            desired.stencil_ops_front = pipeline.stencil_ops_front;
            desired.stencil_ops_back = pipeline.stencil_ops_back;
            desired.stencil_func_front = pipeline.stencil_func_front;
            desired.stencil_func_back = pipeline.stencil_func_back;
            desired.stencil_mask_front = pipeline.stencil_mask_front;
            desired.stencil_mask_back = pipeline.stencil_mask_back;
        }

        desired.color_mask = pipeline.color_write;
        desired.blending = pipeline.blending;
        if pipeline.blending {
            let blend = &pipeline.blend;
            desired.blend_color = blend.color;
            desired.blend_equation_rgb = blend.equation_rgb;
            desired.blend_equation_alpha = blend.equation_alpha;
            desired.blend_source_rgb = blend.source_rgb;
            desired.blend_destination_rgb = blend.destination_rgb;
            desired.blend_source_alpha = blend.source_alpha;
            desired.blend_destination_alpha = blend.destination_alpha;
        }

        let vertex_array = objects.vertex_arrays.get(pipeline.vertex_array);
        device.bind_vertex_array(vertex_array.raw());
        self.index_format = pipeline.index_format;
    }

    pub(crate) fn texture_unit<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        index: u32,
        texture: TextureHandle,
    ) {
        let texture = objects.textures.get(texture);
        device.bind_texture(index, texture.kind(), texture.raw());
    }

    pub(crate) fn sampler_unit<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        index: u32,
        sampler: SamplerHandle,
    ) {
        device.bind_sampler(index, objects.samplers.get(sampler).raw());
    }

    pub(crate) fn uniform_buffer_unit<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        index: u32,
        buffer: BufferHandle,
    ) {
        device.bind_uniform_buffer(index, objects.buffers.get(buffer).raw());
    }

    pub(crate) fn uniform_buffer_unit_range<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        index: u32,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    ) {
        debug_assert!(
            offset % device.limits().uniform_buffer_offset_alignment.max(1) == 0,
            "uniform buffer range offset {offset} is not aligned"
        );
        device.bind_uniform_buffer_range(index, objects.buffers.get(buffer).raw(), offset, size);
    }

    pub(crate) fn draw<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        vertex_offset: u32,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.validate(device);
        device.draw_arrays(self.topology, vertex_offset, vertex_count, instance_count);
    }

    /**
    `index_offset` counts indices, not bytes.

    A draw whose byte offset does not fit in a `u32` is logged and skipped.
    */
    pub(crate) fn draw_indexed<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        index_offset: u32,
        index_count: u32,
        instance_count: u32,
    ) {
        let Some(byte_offset) = index_offset.checked_mul(self.index_format.byte_size()) else {
            logwise::error_sync!(
                "Skipping indexed draw: index offset {offset} overflows the byte offset",
                offset = index_offset
            );
            return;
        };
        self.validate(device);
        device.draw_elements(
            self.topology,
            index_count,
            self.index_format,
            byte_offset,
            instance_count,
        );
    }

    /// Reads from the bound framebuffer into a pixel-transfer buffer.
    pub(crate) fn copy_content_to_buffer<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        info: &CopyContentToBufferInfo,
    ) {
        let buffer = objects.buffers.get(info.buffer);
        device.read_pixels_to_buffer(buffer.raw(), info.region, info.format, info.buffer_offset);
    }

    pub(crate) fn copy_content_to_texture<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        info: &CopyContentToTextureInfo,
    ) {
        let texture = objects.textures.get(info.texture);
        device.copy_framebuffer_to_texture(
            texture.raw(),
            texture.kind(),
            info.texture_level,
            info.texture_x,
            info.texture_y,
            info.framebuffer_region,
        );
        if info.generate_mipmaps {
            device.generate_mipmaps(texture.raw(), texture.kind());
        }
    }

    /// Forgets what the device holds.  Call after anything else touched device state.
    pub fn invalidate(&mut self) {
        logwise::warn_sync!("Render state invalidated; the next validation reapplies everything");
        self.cache.invalidate();
    }

    /// Applies pending state changes now.  Draws and passes do this on their own.
    pub(crate) fn validate<D: Device + ?Sized>(&mut self, device: &mut D) {
        self.cache.validate(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BlendFactor, Comparison, Face, RawFramebuffer, StencilOperation};
    use crate::imp::{DeviceCall, RecordingDevice};
    use crate::objects::{BlendState, PipelineInfo, StencilFaceState};
    use crate::{Context, NamedBinding, ProgramInfo, VertexArrayInfo};

    struct Fixture {
        context: Context<RecordingDevice>,
        program: crate::objects::ProgramHandle,
        vertex_array: crate::objects::VertexArrayHandle,
    }

    fn fixture() -> Fixture {
        let mut context = Context::new(RecordingDevice::new());
        let vertex_shader =
            context.create_shader(crate::device::ShaderStage::Vertex, "vs", "void main() {}");
        let fragment_shader =
            context.create_shader(crate::device::ShaderStage::Fragment, "fs", "void main() {}");
        let bindings: [NamedBinding<'_>; 0] = [];
        let program = context.create_program(&ProgramInfo {
            label: "test",
            vertex_shader,
            fragment_shader,
            texture_bindings: &bindings,
            uniform_bindings: &bindings,
        });
        let vertex_array = context.create_vertex_array(&VertexArrayInfo::default());
        Fixture {
            context,
            program,
            vertex_array,
        }
    }

    impl Fixture {
        fn pipeline(&mut self, edit: impl FnOnce(&mut PipelineInfo)) -> PipelineHandle {
            let mut info = PipelineInfo::new(self.program, self.vertex_array);
            edit(&mut info);
            self.context.create_pipeline(&info)
        }

        fn run(&mut self, commands: &[Command]) -> Vec<DeviceCall> {
            self.context.device_mut().clear_calls();
            for command in commands {
                self.context.execute(command);
            }
            self.context.device_mut().take_calls()
        }

        fn state_changes(&mut self, commands: &[Command]) -> Vec<DeviceCall> {
            self.run(commands)
                .into_iter()
                .filter(DeviceCall::is_state_change)
                .collect()
        }
    }

    fn draw() -> Command {
        Command::Draw {
            vertex_offset: 0,
            vertex_count: 3,
            instance_count: 1,
        }
    }

    #[test]
    fn rebinding_identical_pipeline_changes_no_state() {
        let mut f = fixture();
        let pipeline = f.pipeline(|_| {});
        f.run(&[Command::BindPipeline(pipeline), draw()]);
        let calls = f.run(&[Command::BindPipeline(pipeline), draw()]);
        assert!(calls.iter().all(|c| !c.is_state_change()));
        assert!(matches!(calls[0], DeviceCall::UseProgram(_)));
        assert!(matches!(calls[1], DeviceCall::BindVertexArray(_)));
    }

    #[test]
    fn pipelines_differing_in_blend_color_cost_one_call() {
        let mut f = fixture();
        let a = f.pipeline(|info| info.blending = Some(BlendState::alpha_over()));
        let b = f.pipeline(|info| {
            info.blending = Some(BlendState {
                color: [0.25, 0.5, 0.75, 1.0],
                ..BlendState::alpha_over()
            })
        });
        f.run(&[Command::BindPipeline(a), draw()]);
        let changes = f.state_changes(&[Command::BindPipeline(b), draw()]);
        assert_eq!(changes, vec![DeviceCall::BlendColor([0.25, 0.5, 0.75, 1.0])]);
    }

    #[test]
    fn matching_stencil_faces_collapse() {
        let mut f = fixture();
        f.run(&[draw()]);
        let face = StencilFaceState {
            fail: StencilOperation::Replace,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Increment,
            comparison: Comparison::Equal,
            reference: 1,
            compare_mask: 0x0F,
            write_mask: 0x03,
        };
        let pipeline = f.pipeline(|info| {
            info.stencil_test = true;
            info.stencil_front = face;
            info.stencil_back = face;
        });
        let changes = f.state_changes(&[Command::BindPipeline(pipeline), draw()]);
        assert_eq!(
            changes,
            vec![
                DeviceCall::SetEnabled(crate::device::Feature::StencilTest, true),
                DeviceCall::StencilOp(
                    Face::FrontAndBack,
                    StencilOperation::Replace,
                    StencilOperation::Keep,
                    StencilOperation::Increment
                ),
                DeviceCall::StencilFunc(Face::FrontAndBack, Comparison::Equal, 1, 0x0F),
                DeviceCall::StencilMask(Face::FrontAndBack, 0x03),
            ]
        );
    }

    #[test]
    fn disabled_tests_keep_their_parameters() {
        let mut f = fixture();
        let pipeline = f.pipeline(|info| {
            info.depth_comparison = Comparison::Greater;
            info.blending = None;
        });
        f.run(&[Command::BindPipeline(pipeline), draw()]);
        let desired = f.context.renderer().desired();
        assert_eq!(desired.depth_comparison, Comparison::Less);
        assert_eq!(desired.blend_source_rgb, BlendFactor::One);
    }

    #[test]
    fn invalidate_reapplies_everything_once() {
        let mut f = fixture();
        f.run(&[draw()]);
        let changes = f.state_changes(&[Command::Invalidate, draw()]);
        assert_eq!(changes.len(), 15);
        assert!(f.state_changes(&[draw()]).is_empty());
    }

    #[test]
    fn draw_indexed_scales_offset_by_index_size() {
        let mut f = fixture();
        let calls = f.run(&[Command::DrawIndexed {
            index_offset: 6,
            index_count: 12,
            instance_count: 2,
        }]);
        assert_eq!(
            calls.last(),
            Some(&DeviceCall::DrawElements {
                topology: Topology::TriangleList,
                count: 12,
                format: IndexFormat::U16,
                byte_offset: 12,
                instances: 2,
            })
        );
    }

    #[test]
    fn draw_indexed_with_overflowing_offset_is_skipped() {
        let mut f = fixture();
        f.run(&[draw()]);
        let calls = f.run(&[
            Command::DrawIndexed {
                index_offset: 0x8000_0000,
                index_count: 3,
                instance_count: 1,
            },
            Command::DrawIndexed {
                index_offset: 0x7FFF_FFFF,
                index_count: 3,
                instance_count: 1,
            },
        ]);
        assert_eq!(
            calls,
            vec![DeviceCall::DrawElements {
                topology: Topology::TriangleList,
                count: 3,
                format: IndexFormat::U16,
                byte_offset: 0xFFFF_FFFE,
                instances: 1,
            }]
        );
    }

    #[test]
    fn end_without_begin_is_ignored() {
        let mut f = fixture();
        assert!(f.run(&[Command::EndRenderPass]).is_empty());
        assert!(!f.context.renderer().is_in_pass());
    }

    #[test]
    fn pass_on_default_framebuffer_returns_to_default() {
        let mut f = fixture();
        let default = f.context.default_framebuffer();
        let info = RenderPassInfo::new(default, crate::device::Region::new(0, 0, 4, 4));
        let calls = f.run(&[Command::BeginRenderPass(info)]);
        assert!(calls.contains(&DeviceCall::BindFramebuffer(RawFramebuffer::DEFAULT)));
        assert!(f.context.renderer().is_in_pass());
        f.run(&[Command::EndRenderPass]);
        assert_eq!(f.context.renderer().framebuffer(), default);
    }
}
