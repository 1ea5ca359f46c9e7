// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The boundary to a live graphics context.

Everything in this crate ultimately turns into calls on a [Device].  The trait is deliberately
imperative and close to the way GL-family APIs look: objects are created and deleted through
integer ids, and fixed-function state is set one field at a time.  The state cache in
[crate::renderer] exists to call the state-setting half of this trait as rarely as possible.

Two implementations ship with the crate, see [crate::NopDevice] and [crate::RecordingDevice].
*/

/// Device-level texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawTexture(pub u32);

/// Device-level buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawBuffer(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawShader(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawProgram(pub u32);

/// Device-level framebuffer object.  [RawFramebuffer::DEFAULT] is the window surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFramebuffer(pub u32);

impl RawFramebuffer {
    pub const DEFAULT: RawFramebuffer = RawFramebuffer(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawVertexArray(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSampler(pub u32);

/// Device-level synchronization object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSync(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawUniformLocation(pub u32);

/// Toggleable fixed-function features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    CullFace,
    DepthTest,
    StencilTest,
    Blend,
    ScissorTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
    FrontAndBack,
}

/// Winding that counts as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceOrientation {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SourceColor,
    OneMinusSourceColor,
    DestinationColor,
    OneMinusDestinationColor,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationAlpha,
    OneMinusDestinationAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SourceAlphaSaturate,
}

/// Primitive assembly mode for draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub const fn byte_size(self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// The binding point a buffer is created for.  A buffer keeps its kind for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
    /// Destination of framebuffer readbacks.
    PixelTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    DynamicRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    TwoD,
    TwoDArray,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

/// Where a texture upload lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    TwoD,
    Cube(CubeFace),
}

/// GPU-side storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Srgb8Alpha8,
    Rgba16F,
    Rgba32F,
    Depth24,
    Depth32F,
    Depth24Stencil8,
}

/// CPU-side layout of pixel data passed to or read from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Rgba8,
    Rgba16F,
    Rgba32F,
}

impl DataFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            DataFormat::Rgba8 => 4,
            DataFormat::Rgba16F => 8,
            DataFormat::Rgba32F => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Clamp,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    Anisotropic,
}

/// How a texture or sampler object is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplingState {
    pub wrap: Wrap,
    pub filter: Filter,
    pub mipmaps: bool,
    /// Depth comparison for shadow lookups.
    pub comparison: Option<Comparison>,
}

impl Default for SamplingState {
    fn default() -> Self {
        SamplingState {
            wrap: Wrap::Clamp,
            filter: Filter::Nearest,
            mipmaps: false,
            comparison: None,
        }
    }
}

/// Immutable storage description for a new texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureStorage {
    pub kind: TextureKind,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Array layers; 1 for anything but [TextureKind::TwoDArray].
    pub layers: u32,
    pub levels: u32,
}

/// A rectangle in pixels, origin at the lower-left as in GL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Region {
            x,
            y,
            width,
            height,
        }
    }
}

/// Scalar type of one vertex attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    F32,
    F16,
    I16,
    U16,
    I8,
    U8,
}

/// One vertex attribute as the device consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawVertexAttribute {
    pub location: u32,
    pub buffer: RawBuffer,
    pub components: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Read as integers by the shader rather than converted to float.
    pub integer: bool,
    pub stride: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexArrayLayout {
    pub attributes: Vec<RawVertexAttribute>,
    pub index_buffer: Option<RawBuffer>,
}

/// Maximum number of color attachments a framebuffer may carry.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferAttachments {
    pub colors: [Option<RawTexture>; MAX_COLOR_ATTACHMENTS],
    pub depth: Option<RawTexture>,
    pub stencil: Option<RawTexture>,
    /// Takes precedence over `depth` and `stencil` when present.
    pub depth_stencil: Option<RawTexture>,
}

/// An attachment whose contents may be dropped at the end of a pass.
///
/// On the default framebuffer `Color(0)` names the window's color surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidateAttachment {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

/// Device-level status of a synchronization object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    Unsignaled,
    Signaled,
    /// The sync object can no longer complete, e.g. after context loss.
    Failed,
}

/// Capability values queried once per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    pub uniform_buffer_offset_alignment: u32,
    pub max_color_attachments: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            uniform_buffer_offset_alignment: 256,
            max_color_attachments: MAX_COLOR_ATTACHMENTS as u32,
        }
    }
}

/**
A live graphics context.

Implementations execute each call immediately against their backend.  Nothing here is cached or
deduplicated; callers are expected to go through [crate::Context] which does that.

Failures of shader compilation and program linking are reported as `Err(info_log)`.  All other
failures are the implementation's business to log; the caller keeps going.
*/
pub trait Device {
    fn limits(&self) -> Limits;

    // textures

    fn create_texture(&mut self, storage: &TextureStorage, sampling: &SamplingState) -> RawTexture;
    fn upload_texture(
        &mut self,
        texture: RawTexture,
        target: TextureTarget,
        region: Region,
        format: DataFormat,
        data: &[u8],
    );
    fn generate_mipmaps(&mut self, texture: RawTexture, kind: TextureKind);
    fn delete_texture(&mut self, texture: RawTexture);

    // samplers

    fn create_sampler(&mut self, sampling: &SamplingState) -> RawSampler;
    fn delete_sampler(&mut self, sampler: RawSampler);

    // buffers

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
        data: Option<&[u8]>,
    ) -> RawBuffer;
    fn write_buffer(&mut self, buffer: RawBuffer, kind: BufferKind, offset: usize, data: &[u8]);
    fn read_buffer(&mut self, buffer: RawBuffer, kind: BufferKind, offset: usize, target: &mut [u8]);
    fn delete_buffer(&mut self, buffer: RawBuffer);

    // shaders and programs

    fn create_shader(&mut self, stage: ShaderStage) -> RawShader;
    fn compile_shader(&mut self, shader: RawShader, source: &str) -> Result<(), String>;
    fn delete_shader(&mut self, shader: RawShader);
    fn create_program(&mut self) -> RawProgram;
    /// Attaches `shaders`, links, and detaches them again.
    fn link_program(&mut self, program: RawProgram, shaders: &[RawShader]) -> Result<(), String>;
    fn uniform_location(&mut self, program: RawProgram, name: &str) -> Option<RawUniformLocation>;
    /// Points the sampler uniform `name` at texture unit `unit`.  Returns false if there is no such uniform.
    fn texture_binding(&mut self, program: RawProgram, name: &str, unit: u32) -> bool;
    /// Points the uniform block `name` at binding `index`.  Returns false if there is no such block.
    fn uniform_block_binding(&mut self, program: RawProgram, name: &str, index: u32) -> bool;
    fn delete_program(&mut self, program: RawProgram);

    // framebuffers and vertex arrays

    fn create_framebuffer(&mut self, attachments: &FramebufferAttachments) -> RawFramebuffer;
    fn framebuffer_complete(&mut self, framebuffer: RawFramebuffer) -> bool;
    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer);
    fn create_vertex_array(&mut self, layout: &VertexArrayLayout) -> RawVertexArray;
    fn delete_vertex_array(&mut self, vertex_array: RawVertexArray);

    // fixed-function state

    fn set_enabled(&mut self, feature: Feature, enabled: bool);
    fn cull_face(&mut self, face: Face);
    fn front_face(&mut self, orientation: FaceOrientation);
    fn depth_mask(&mut self, enabled: bool);
    fn depth_func(&mut self, comparison: Comparison);
    fn stencil_op(
        &mut self,
        face: Face,
        stencil_fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    );
    fn stencil_func(&mut self, face: Face, comparison: Comparison, reference: i32, mask: u32);
    fn stencil_mask(&mut self, face: Face, mask: u32);
    fn color_mask(&mut self, mask: [bool; 4]);
    fn blend_color(&mut self, color: [f32; 4]);
    fn blend_equation(&mut self, rgb: BlendEquation, alpha: BlendEquation);
    fn blend_func(
        &mut self,
        source_rgb: BlendFactor,
        destination_rgb: BlendFactor,
        source_alpha: BlendFactor,
        destination_alpha: BlendFactor,
    );
    fn viewport(&mut self, region: Region);
    fn scissor(&mut self, region: Region);

    // bindings

    fn bind_framebuffer(&mut self, framebuffer: RawFramebuffer);
    fn use_program(&mut self, program: RawProgram);
    fn bind_vertex_array(&mut self, vertex_array: RawVertexArray);
    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: RawTexture);
    fn bind_sampler(&mut self, unit: u32, sampler: RawSampler);
    fn bind_uniform_buffer(&mut self, index: u32, buffer: RawBuffer);
    fn bind_uniform_buffer_range(&mut self, index: u32, buffer: RawBuffer, offset: u32, size: u32);

    // uniforms

    fn uniform1f(&mut self, location: RawUniformLocation, value: f32);
    fn uniform1i(&mut self, location: RawUniformLocation, value: i32);
    fn uniform3f(&mut self, location: RawUniformLocation, values: [f32; 3]);
    fn uniform4f(&mut self, location: RawUniformLocation, values: [f32; 4]);
    fn uniform_matrix4f(&mut self, location: RawUniformLocation, values: &[f32; 16]);

    // clears and discards on the bound framebuffer

    fn clear_color(&mut self, slot: u32, value: [f32; 4]);
    fn clear_depth(&mut self, value: f32);
    fn clear_stencil(&mut self, value: i32);
    fn clear_depth_stencil(&mut self, depth: f32, stencil: i32);
    /// Advisory: the listed attachments need not be preserved.
    fn invalidate_framebuffer(&mut self, attachments: &[InvalidateAttachment]);

    // draws

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32, instances: u32);
    fn draw_elements(
        &mut self,
        topology: Topology,
        count: u32,
        format: IndexFormat,
        byte_offset: u32,
        instances: u32,
    );

    // transfers out of the bound framebuffer

    fn read_pixels_to_buffer(
        &mut self,
        buffer: RawBuffer,
        region: Region,
        format: DataFormat,
        byte_offset: u32,
    );
    fn copy_framebuffer_to_texture(
        &mut self,
        texture: RawTexture,
        kind: TextureKind,
        level: u32,
        texture_x: i32,
        texture_y: i32,
        region: Region,
    );

    // synchronization

    /// Inserts a sync point after all currently queued work.
    fn create_fence(&mut self) -> RawSync;
    /// Must not block.
    fn fence_status(&mut self, sync: RawSync) -> SyncStatus;
    fn delete_fence(&mut self, sync: RawSync);
}
