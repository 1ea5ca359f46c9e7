// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A device that executes nothing and remembers everything.

[RecordingDevice] appends one [DeviceCall] per trait call, keeps enough bookkeeping (buffer
contents, fence status) to behave plausibly, and lets a caller script the interesting failure
paths: shader and link errors, incomplete framebuffers, fences that never signal or fail.
*/

use crate::device::*;
use std::collections::HashMap;

/// One call made on a [RecordingDevice], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture(RawTexture, TextureStorage, SamplingState),
    UploadTexture {
        texture: RawTexture,
        target: TextureTarget,
        region: Region,
        format: DataFormat,
        len: usize,
    },
    GenerateMipmaps(RawTexture, TextureKind),
    DeleteTexture(RawTexture),
    CreateSampler(RawSampler, SamplingState),
    DeleteSampler(RawSampler),
    CreateBuffer {
        buffer: RawBuffer,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
    },
    WriteBuffer {
        buffer: RawBuffer,
        kind: BufferKind,
        offset: usize,
        len: usize,
    },
    ReadBuffer {
        buffer: RawBuffer,
        kind: BufferKind,
        offset: usize,
        len: usize,
    },
    DeleteBuffer(RawBuffer),
    CreateShader(RawShader, ShaderStage),
    CompileShader(RawShader),
    DeleteShader(RawShader),
    CreateProgram(RawProgram),
    LinkProgram(RawProgram, Vec<RawShader>),
    UniformLocation(RawProgram, String),
    TextureBinding(RawProgram, String, u32),
    UniformBlockBinding(RawProgram, String, u32),
    DeleteProgram(RawProgram),
    CreateFramebuffer(RawFramebuffer, FramebufferAttachments),
    DeleteFramebuffer(RawFramebuffer),
    CreateVertexArray(RawVertexArray, VertexArrayLayout),
    DeleteVertexArray(RawVertexArray),
    SetEnabled(Feature, bool),
    CullFace(Face),
    FrontFace(FaceOrientation),
    DepthMask(bool),
    DepthFunc(Comparison),
    StencilOp(Face, StencilOperation, StencilOperation, StencilOperation),
    StencilFunc(Face, Comparison, i32, u32),
    StencilMask(Face, u32),
    ColorMask([bool; 4]),
    BlendColor([f32; 4]),
    BlendEquation(BlendEquation, BlendEquation),
    BlendFunc(BlendFactor, BlendFactor, BlendFactor, BlendFactor),
    Viewport(Region),
    Scissor(Region),
    BindFramebuffer(RawFramebuffer),
    UseProgram(RawProgram),
    BindVertexArray(RawVertexArray),
    BindTexture(u32, TextureKind, RawTexture),
    BindSampler(u32, RawSampler),
    BindUniformBuffer(u32, RawBuffer),
    BindUniformBufferRange(u32, RawBuffer, u32, u32),
    Uniform1f(RawUniformLocation, f32),
    Uniform1i(RawUniformLocation, i32),
    Uniform3f(RawUniformLocation, [f32; 3]),
    Uniform4f(RawUniformLocation, [f32; 4]),
    UniformMatrix4f(RawUniformLocation, [f32; 16]),
    ClearColor(u32, [f32; 4]),
    ClearDepth(f32),
    ClearStencil(i32),
    ClearDepthStencil(f32, i32),
    InvalidateFramebuffer(Vec<InvalidateAttachment>),
    DrawArrays {
        topology: Topology,
        first: u32,
        count: u32,
        instances: u32,
    },
    DrawElements {
        topology: Topology,
        count: u32,
        format: IndexFormat,
        byte_offset: u32,
        instances: u32,
    },
    ReadPixelsToBuffer {
        buffer: RawBuffer,
        region: Region,
        format: DataFormat,
        byte_offset: u32,
    },
    CopyFramebufferToTexture {
        texture: RawTexture,
        kind: TextureKind,
        level: u32,
        texture_x: i32,
        texture_y: i32,
        region: Region,
    },
    CreateFence(RawSync),
    FenceStatus(RawSync),
    DeleteFence(RawSync),
}

impl DeviceCall {
    /// True for calls that change fixed-function state.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            DeviceCall::SetEnabled(..)
                | DeviceCall::CullFace(_)
                | DeviceCall::FrontFace(_)
                | DeviceCall::DepthMask(_)
                | DeviceCall::DepthFunc(_)
                | DeviceCall::StencilOp(..)
                | DeviceCall::StencilFunc(..)
                | DeviceCall::StencilMask(..)
                | DeviceCall::ColorMask(_)
                | DeviceCall::BlendColor(_)
                | DeviceCall::BlendEquation(..)
                | DeviceCall::BlendFunc(..)
        )
    }

    pub fn is_clear(&self) -> bool {
        matches!(
            self,
            DeviceCall::ClearColor(..)
                | DeviceCall::ClearDepth(_)
                | DeviceCall::ClearStencil(_)
                | DeviceCall::ClearDepthStencil(..)
        )
    }
}

#[derive(Debug)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    next_id: u32,
    limits: Limits,
    buffers: HashMap<RawBuffer, Vec<u8>>,
    fences: HashMap<RawSync, SyncStatus>,
    initial_fence_status: SyncStatus,
    pixel_source: Vec<u8>,
    compile_failure: Option<String>,
    link_failure: Option<String>,
    incomplete_framebuffer: bool,
    known_uniforms: Option<Vec<String>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        RecordingDevice {
            calls: Vec::new(),
            next_id: 1,
            limits: Limits::default(),
            buffers: HashMap::new(),
            fences: HashMap::new(),
            initial_fence_status: SyncStatus::Unsignaled,
            pixel_source: Vec::new(),
            compile_failure: None,
            link_failure: None,
            incomplete_framebuffer: false,
            known_uniforms: None,
        }
    }

    pub fn with_limits(limits: Limits) -> Self {
        RecordingDevice {
            limits,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Returns the calls recorded so far and starts a fresh log.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// The state-changing subset of the recorded calls.
    pub fn state_changes(&self) -> Vec<DeviceCall> {
        self.calls
            .iter()
            .filter(|c| c.is_state_change())
            .cloned()
            .collect()
    }

    /// The next shader compile fails with `info_log`.
    pub fn fail_next_compile(&mut self, info_log: &str) {
        self.compile_failure = Some(info_log.to_owned());
    }

    /// The next program link fails with `info_log`.
    pub fn fail_next_link(&mut self, info_log: &str) {
        self.link_failure = Some(info_log.to_owned());
    }

    /// The next framebuffer created reports itself incomplete.
    pub fn fail_next_framebuffer(&mut self) {
        self.incomplete_framebuffer = true;
    }

    /// Restricts uniform lookups to `names`; other names resolve to no location.
    ///
    /// By default every name resolves.
    pub fn set_known_uniforms(&mut self, names: &[&str]) {
        self.known_uniforms = Some(names.iter().map(|n| n.to_string()).collect());
    }

    /// Status newly created fences start in.
    pub fn set_initial_fence_status(&mut self, status: SyncStatus) {
        self.initial_fence_status = status;
    }

    /// Moves every live fence to `status`.
    pub fn set_all_fences(&mut self, status: SyncStatus) {
        for s in self.fences.values_mut() {
            *s = status;
        }
    }

    pub fn set_fence_status(&mut self, sync: RawSync, status: SyncStatus) {
        if let Some(s) = self.fences.get_mut(&sync) {
            *s = status;
        }
    }

    /// Number of sync objects created and not yet deleted.
    pub fn live_fences(&self) -> usize {
        self.fences.len()
    }

    /// Bytes that framebuffer readbacks produce, repeated or truncated to fit.
    pub fn set_pixel_source(&mut self, bytes: &[u8]) {
        self.pixel_source = bytes.to_vec();
    }

    /// Current contents of a buffer, if it exists.
    pub fn buffer_contents(&self, buffer: RawBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.as_slice())
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn write_at(target: &mut Vec<u8>, offset: usize, data: &[u8]) {
    let end = offset + data.len();
    if target.len() < end {
        target.resize(end, 0);
    }
    target[offset..end].copy_from_slice(data);
}

impl Device for RecordingDevice {
    fn limits(&self) -> Limits {
        self.limits
    }

    fn create_texture(&mut self, storage: &TextureStorage, sampling: &SamplingState) -> RawTexture {
        let raw = RawTexture(self.next());
        self.calls.push(DeviceCall::CreateTexture(raw, *storage, *sampling));
        raw
    }

    fn upload_texture(
        &mut self,
        texture: RawTexture,
        target: TextureTarget,
        region: Region,
        format: DataFormat,
        data: &[u8],
    ) {
        self.calls.push(DeviceCall::UploadTexture {
            texture,
            target,
            region,
            format,
            len: data.len(),
        });
    }

    fn generate_mipmaps(&mut self, texture: RawTexture, kind: TextureKind) {
        self.calls.push(DeviceCall::GenerateMipmaps(texture, kind));
    }

    fn delete_texture(&mut self, texture: RawTexture) {
        self.calls.push(DeviceCall::DeleteTexture(texture));
    }

    fn create_sampler(&mut self, sampling: &SamplingState) -> RawSampler {
        let raw = RawSampler(self.next());
        self.calls.push(DeviceCall::CreateSampler(raw, *sampling));
        raw
    }

    fn delete_sampler(&mut self, sampler: RawSampler) {
        self.calls.push(DeviceCall::DeleteSampler(sampler));
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
        data: Option<&[u8]>,
    ) -> RawBuffer {
        let raw = RawBuffer(self.next());
        let contents = match data {
            Some(data) => data.to_vec(),
            None => vec![0; size],
        };
        self.buffers.insert(raw, contents);
        self.calls.push(DeviceCall::CreateBuffer {
            buffer: raw,
            kind,
            usage,
            size,
        });
        raw
    }

    fn write_buffer(&mut self, buffer: RawBuffer, kind: BufferKind, offset: usize, data: &[u8]) {
        if let Some(contents) = self.buffers.get_mut(&buffer) {
            write_at(contents, offset, data);
        }
        self.calls.push(DeviceCall::WriteBuffer {
            buffer,
            kind,
            offset,
            len: data.len(),
        });
    }

    fn read_buffer(&mut self, buffer: RawBuffer, kind: BufferKind, offset: usize, target: &mut [u8]) {
        if let Some(contents) = self.buffers.get(&buffer) {
            for (i, byte) in target.iter_mut().enumerate() {
                *byte = contents.get(offset + i).copied().unwrap_or(0);
            }
        }
        self.calls.push(DeviceCall::ReadBuffer {
            buffer,
            kind,
            offset,
            len: target.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: RawBuffer) {
        self.buffers.remove(&buffer);
        self.calls.push(DeviceCall::DeleteBuffer(buffer));
    }

    fn create_shader(&mut self, stage: ShaderStage) -> RawShader {
        let raw = RawShader(self.next());
        self.calls.push(DeviceCall::CreateShader(raw, stage));
        raw
    }

    fn compile_shader(&mut self, shader: RawShader, _source: &str) -> Result<(), String> {
        self.calls.push(DeviceCall::CompileShader(shader));
        match self.compile_failure.take() {
            Some(log) => Err(log),
            None => Ok(()),
        }
    }

    fn delete_shader(&mut self, shader: RawShader) {
        self.calls.push(DeviceCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> RawProgram {
        let raw = RawProgram(self.next());
        self.calls.push(DeviceCall::CreateProgram(raw));
        raw
    }

    fn link_program(&mut self, program: RawProgram, shaders: &[RawShader]) -> Result<(), String> {
        self.calls
            .push(DeviceCall::LinkProgram(program, shaders.to_vec()));
        match self.link_failure.take() {
            Some(log) => Err(log),
            None => Ok(()),
        }
    }

    fn uniform_location(&mut self, program: RawProgram, name: &str) -> Option<RawUniformLocation> {
        self.calls
            .push(DeviceCall::UniformLocation(program, name.to_owned()));
        let known = match &self.known_uniforms {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        };
        if known {
            Some(RawUniformLocation(self.next()))
        } else {
            None
        }
    }

    fn texture_binding(&mut self, program: RawProgram, name: &str, unit: u32) -> bool {
        self.calls
            .push(DeviceCall::TextureBinding(program, name.to_owned(), unit));
        true
    }

    fn uniform_block_binding(&mut self, program: RawProgram, name: &str, index: u32) -> bool {
        self.calls
            .push(DeviceCall::UniformBlockBinding(program, name.to_owned(), index));
        true
    }

    fn delete_program(&mut self, program: RawProgram) {
        self.calls.push(DeviceCall::DeleteProgram(program));
    }

    fn create_framebuffer(&mut self, attachments: &FramebufferAttachments) -> RawFramebuffer {
        let raw = RawFramebuffer(self.next());
        self.calls
            .push(DeviceCall::CreateFramebuffer(raw, *attachments));
        raw
    }

    fn framebuffer_complete(&mut self, _framebuffer: RawFramebuffer) -> bool {
        !std::mem::take(&mut self.incomplete_framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        self.calls.push(DeviceCall::DeleteFramebuffer(framebuffer));
    }

    fn create_vertex_array(&mut self, layout: &VertexArrayLayout) -> RawVertexArray {
        let raw = RawVertexArray(self.next());
        self.calls
            .push(DeviceCall::CreateVertexArray(raw, layout.clone()));
        raw
    }

    fn delete_vertex_array(&mut self, vertex_array: RawVertexArray) {
        self.calls.push(DeviceCall::DeleteVertexArray(vertex_array));
    }

    fn set_enabled(&mut self, feature: Feature, enabled: bool) {
        self.calls.push(DeviceCall::SetEnabled(feature, enabled));
    }

    fn cull_face(&mut self, face: Face) {
        self.calls.push(DeviceCall::CullFace(face));
    }

    fn front_face(&mut self, orientation: FaceOrientation) {
        self.calls.push(DeviceCall::FrontFace(orientation));
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.calls.push(DeviceCall::DepthMask(enabled));
    }

    fn depth_func(&mut self, comparison: Comparison) {
        self.calls.push(DeviceCall::DepthFunc(comparison));
    }

    fn stencil_op(
        &mut self,
        face: Face,
        stencil_fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) {
        self.calls
            .push(DeviceCall::StencilOp(face, stencil_fail, depth_fail, pass));
    }

    fn stencil_func(&mut self, face: Face, comparison: Comparison, reference: i32, mask: u32) {
        self.calls
            .push(DeviceCall::StencilFunc(face, comparison, reference, mask));
    }

    fn stencil_mask(&mut self, face: Face, mask: u32) {
        self.calls.push(DeviceCall::StencilMask(face, mask));
    }

    fn color_mask(&mut self, mask: [bool; 4]) {
        self.calls.push(DeviceCall::ColorMask(mask));
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        self.calls.push(DeviceCall::BlendColor(color));
    }

    fn blend_equation(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        self.calls.push(DeviceCall::BlendEquation(rgb, alpha));
    }

    fn blend_func(
        &mut self,
        source_rgb: BlendFactor,
        destination_rgb: BlendFactor,
        source_alpha: BlendFactor,
        destination_alpha: BlendFactor,
    ) {
        self.calls.push(DeviceCall::BlendFunc(
            source_rgb,
            destination_rgb,
            source_alpha,
            destination_alpha,
        ));
    }

    fn viewport(&mut self, region: Region) {
        self.calls.push(DeviceCall::Viewport(region));
    }

    fn scissor(&mut self, region: Region) {
        self.calls.push(DeviceCall::Scissor(region));
    }

    fn bind_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        self.calls.push(DeviceCall::BindFramebuffer(framebuffer));
    }

    fn use_program(&mut self, program: RawProgram) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn bind_vertex_array(&mut self, vertex_array: RawVertexArray) {
        self.calls.push(DeviceCall::BindVertexArray(vertex_array));
    }

    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: RawTexture) {
        self.calls.push(DeviceCall::BindTexture(unit, kind, texture));
    }

    fn bind_sampler(&mut self, unit: u32, sampler: RawSampler) {
        self.calls.push(DeviceCall::BindSampler(unit, sampler));
    }

    fn bind_uniform_buffer(&mut self, index: u32, buffer: RawBuffer) {
        self.calls.push(DeviceCall::BindUniformBuffer(index, buffer));
    }

    fn bind_uniform_buffer_range(&mut self, index: u32, buffer: RawBuffer, offset: u32, size: u32) {
        self.calls
            .push(DeviceCall::BindUniformBufferRange(index, buffer, offset, size));
    }

    fn uniform1f(&mut self, location: RawUniformLocation, value: f32) {
        self.calls.push(DeviceCall::Uniform1f(location, value));
    }

    fn uniform1i(&mut self, location: RawUniformLocation, value: i32) {
        self.calls.push(DeviceCall::Uniform1i(location, value));
    }

    fn uniform3f(&mut self, location: RawUniformLocation, values: [f32; 3]) {
        self.calls.push(DeviceCall::Uniform3f(location, values));
    }

    fn uniform4f(&mut self, location: RawUniformLocation, values: [f32; 4]) {
        self.calls.push(DeviceCall::Uniform4f(location, values));
    }

    fn uniform_matrix4f(&mut self, location: RawUniformLocation, values: &[f32; 16]) {
        self.calls.push(DeviceCall::UniformMatrix4f(location, *values));
    }

    fn clear_color(&mut self, slot: u32, value: [f32; 4]) {
        self.calls.push(DeviceCall::ClearColor(slot, value));
    }

    fn clear_depth(&mut self, value: f32) {
        self.calls.push(DeviceCall::ClearDepth(value));
    }

    fn clear_stencil(&mut self, value: i32) {
        self.calls.push(DeviceCall::ClearStencil(value));
    }

    fn clear_depth_stencil(&mut self, depth: f32, stencil: i32) {
        self.calls.push(DeviceCall::ClearDepthStencil(depth, stencil));
    }

    fn invalidate_framebuffer(&mut self, attachments: &[InvalidateAttachment]) {
        self.calls
            .push(DeviceCall::InvalidateFramebuffer(attachments.to_vec()));
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32, instances: u32) {
        self.calls.push(DeviceCall::DrawArrays {
            topology,
            first,
            count,
            instances,
        });
    }

    fn draw_elements(
        &mut self,
        topology: Topology,
        count: u32,
        format: IndexFormat,
        byte_offset: u32,
        instances: u32,
    ) {
        self.calls.push(DeviceCall::DrawElements {
            topology,
            count,
            format,
            byte_offset,
            instances,
        });
    }

    fn read_pixels_to_buffer(
        &mut self,
        buffer: RawBuffer,
        region: Region,
        format: DataFormat,
        byte_offset: u32,
    ) {
        let len = region.width as usize * region.height as usize * format.bytes_per_pixel();
        if !self.pixel_source.is_empty() {
            let bytes: Vec<u8> = self.pixel_source.iter().copied().cycle().take(len).collect();
            if let Some(contents) = self.buffers.get_mut(&buffer) {
                write_at(contents, byte_offset as usize, &bytes);
            }
        }
        self.calls.push(DeviceCall::ReadPixelsToBuffer {
            buffer,
            region,
            format,
            byte_offset,
        });
    }

    fn copy_framebuffer_to_texture(
        &mut self,
        texture: RawTexture,
        kind: TextureKind,
        level: u32,
        texture_x: i32,
        texture_y: i32,
        region: Region,
    ) {
        self.calls.push(DeviceCall::CopyFramebufferToTexture {
            texture,
            kind,
            level,
            texture_x,
            texture_y,
            region,
        });
    }

    fn create_fence(&mut self) -> RawSync {
        let raw = RawSync(self.next());
        self.fences.insert(raw, self.initial_fence_status);
        self.calls.push(DeviceCall::CreateFence(raw));
        raw
    }

    fn fence_status(&mut self, sync: RawSync) -> SyncStatus {
        self.calls.push(DeviceCall::FenceStatus(sync));
        self.fences
            .get(&sync)
            .copied()
            .unwrap_or(SyncStatus::Failed)
    }

    fn delete_fence(&mut self, sync: RawSync) {
        self.fences.remove(&sync);
        self.calls.push(DeviceCall::DeleteFence(sync));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_remember_writes_and_readbacks() {
        let mut device = RecordingDevice::new();
        let buffer = device.create_buffer(BufferKind::PixelTransfer, BufferUsage::DynamicRead, 8, None);
        device.write_buffer(buffer, BufferKind::PixelTransfer, 2, &[1, 2]);
        let mut out = [0u8; 4];
        device.read_buffer(buffer, BufferKind::PixelTransfer, 1, &mut out);
        assert_eq!(out, [0, 1, 2, 0]);

        device.set_pixel_source(&[9]);
        device.read_pixels_to_buffer(buffer, Region::new(0, 0, 1, 1), DataFormat::Rgba8, 4);
        assert_eq!(device.buffer_contents(buffer), Some(&[0, 0, 1, 2, 9, 9, 9, 9][..]));
    }

    #[test]
    fn scripted_failures_apply_once() {
        let mut device = RecordingDevice::new();
        let shader = device.create_shader(ShaderStage::Vertex);
        device.fail_next_compile("syntax error");
        assert_eq!(device.compile_shader(shader, ""), Err("syntax error".to_string()));
        assert_eq!(device.compile_shader(shader, ""), Ok(()));
    }

    #[test]
    fn fences_follow_script() {
        let mut device = RecordingDevice::new();
        let fence = device.create_fence();
        assert_eq!(device.fence_status(fence), SyncStatus::Unsignaled);
        device.set_all_fences(SyncStatus::Signaled);
        assert_eq!(device.fence_status(fence), SyncStatus::Signaled);
        device.delete_fence(fence);
        assert_eq!(device.live_fences(), 0);
    }
}
