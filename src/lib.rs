// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! record_and_replay is a retained-mode layer between a renderer and a GL-family graphics device.

Draw work is recorded into a [CommandBuffer] as compact fixed-layout records that name GPU
objects by integer handle.  Later, usually once per frame, the buffer is replayed against a
[Device] through a [Context].  Replay keeps a cache of the fixed-function state the device holds
and only issues the state changes that actually differ, so switching between two pipelines that
share most of their state costs a handful of calls rather than dozens.

# Pieces

| Module       | Role                                                                          |
|--------------|-------------------------------------------------------------------------------|
| [handles]    | Per-kind integer handle tables                                                |
| [device]     | The [Device] trait a backend implements, plus its plain-data vocabulary       |
| [objects]    | Textures, buffers, programs, framebuffers, pipelines and friends              |
| [commands]   | The command wire format: encoding and decoding                                |
| [renderer]   | Replay with state diffing and render passes                                   |
| [context]    | The owner of a device, its object tables and its renderer                     |
| [exposure]   | Auto-exposure from an asynchronous 1x1 readback, polled across frames         |

# Backends

The crate does not talk to a GPU itself.  A backend implements [Device].  Two ship here:
[NopDevice] accepts everything and does nothing, [RecordingDevice] logs every call as a
[DeviceCall] for inspection in tests.

# Threading

Everything runs on one render thread; nothing locks.  Command buffers may be recorded on other
threads and handed over for submission.

# Example

```
use record_and_replay::{CommandBuffer, Context, NopDevice, RenderPassInfo};
use record_and_replay::device::Region;

let mut context = Context::new(NopDevice::new());
let mut frame = CommandBuffer::new();
let pass = RenderPassInfo::new(context.default_framebuffer(), Region::new(0, 0, 640, 480))
    .clear_color(0, [0.0, 0.0, 0.0, 1.0]);
frame.begin_render_pass(&pass).unwrap();
frame.end_render_pass().unwrap();
assert_eq!(context.submit(&mut frame), Ok(2));
```
*/

pub mod commands;
pub mod context;
pub mod device;
pub mod exposure;
pub mod handles;
mod imp;
pub mod objects;
pub mod renderer;

pub use commands::{
    Command, CommandBuffer, CommandBufferConfig, CopyContentToBufferInfo,
    CopyContentToTextureInfo, DecodeError, EncodeError,
};
pub use context::{Context, SubmitError};
pub use device::Device;
pub use exposure::{ExposureConfig, ExposureProbe, ProbeError, ProbePoll};
pub use handles::{Handle, HandleTable};
pub use imp::{DeviceCall, NopDevice, RecordingDevice};
pub use objects::{
    BlendState, BufferHandle, BufferInfo, ColorFormat, CullMode, FenceHandle, FenceStatus,
    FramebufferHandle, FramebufferInfo, NamedBinding, PipelineHandle, PipelineInfo,
    ProgramHandle, ProgramInfo, SamplerHandle, ShaderHandle, StencilFaceState, TextureHandle,
    TextureInfo, UniformLocationHandle, VertexArrayHandle, VertexArrayInfo, VertexAttribute,
    VertexAttributeFormat, VertexBinding,
};
pub use renderer::{ColorAttachmentInfo, LoadOp, RenderPassInfo, Renderer, StoreOp};
