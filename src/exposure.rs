// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Automatic exposure from an asynchronous 1x1 readback.

Once per frame [ExposureProbe::update] does three things:

1. If a probe is in flight, poll its fence.  When it has signaled, read the probe pixel and derive
   a new exposure target from its luminance.
2. Move the smoothed exposure a small step toward the target.
3. If nothing is in flight, record and submit a new probe: the caller draws into a 1x1 target,
   the pixel is copied into a readback buffer, and a fence is placed after the copy.

At most one probe is in flight, so readbacks never queue up.  The fence is polled, never waited
on.

A probe whose fence reports device loss stops the cycle.  No further probes are submitted until
[ExposureProbe::retry] is called, typically after the device has been recreated.
*/

use crate::commands::{CommandBuffer, CopyContentToBufferInfo, EncodeError};
use crate::context::{Context, SubmitError};
use crate::device::{BufferKind, DataFormat, Device, Region};
use crate::objects::{
    BufferHandle, BufferInfo, ColorFormat, FenceHandle, FenceStatus, FramebufferHandle,
    FramebufferInfo, TextureHandle, TextureInfo,
};
use crate::renderer::RenderPassInfo;

/// Tuning for [ExposureProbe].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureConfig {
    pub min_exposure: f32,
    pub max_exposure: f32,
    /// Fraction of the remaining distance to the target covered each frame.
    pub adaptation_speed: f32,
    /// Target (and starting exposure) before the first measurement arrives.
    pub initial_target: f32,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        ExposureConfig {
            min_exposure: 0.001,
            max_exposure: 1000.0,
            adaptation_speed: 0.01,
            initial_target: 1.0,
        }
    }
}

/// Luminance below this is treated as this, so black frames do not divide by zero.
const MIN_LUMINANCE: f32 = 0.001;

/// Relative luminance of a linear RGB color.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

/// The exposure that maps `luminance` to mid-grey, within the configured range.
pub fn exposure_target(luminance: f32, config: &ExposureConfig) -> f32 {
    let luminance = luminance.max(MIN_LUMINANCE);
    (1.0 / (3.14 * luminance)).clamp(config.min_exposure, config.max_exposure)
}

fn mix(from: f32, to: f32, amount: f32) -> f32 {
    from + (to - from) * amount
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProbeError {
    #[error("recording the probe failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("submitting the probe failed: {0}")]
    Submit(#[from] SubmitError),
}

/// What polling the in-flight probe found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbePoll {
    /// No probe was in flight.
    Idle,
    NotReady,
    /// The probe finished and moved the target.
    Measured { luminance: f32, target: f32 },
    /// The probe can never finish.  Its fence has been released and the target kept.
    ///
    /// Reported on every update until [ExposureProbe::retry].
    DeviceLost,
}

/**
Per-frame exposure adaptation.

Owns a 1x1 `Rgba32F` render target and a 16-byte readback buffer.  Release it with
[ExposureProbe::release] before the context goes away.
*/
#[derive(Debug)]
pub struct ExposureProbe {
    config: ExposureConfig,
    texture: TextureHandle,
    framebuffer: FramebufferHandle,
    buffer: BufferHandle,
    fence: Option<FenceHandle>,
    lost: bool,
    commands: CommandBuffer,
    target: f32,
    exposure: f32,
}

impl ExposureProbe {
    pub fn new<D: Device>(context: &mut Context<D>, config: ExposureConfig) -> Self {
        let texture = context.create_texture(&TextureInfo::Color2D {
            width: 1,
            height: 1,
            format: ColorFormat::Rgba32F,
            gamma_correction: false,
            mipmaps: false,
            data: None,
        });
        let framebuffer = context.create_framebuffer(&FramebufferInfo {
            label: "exposure probe",
            colors: [Some(texture), None, None, None],
            ..Default::default()
        });
        let buffer = context.create_buffer(&BufferInfo::with_size(
            BufferKind::PixelTransfer,
            DataFormat::Rgba32F.bytes_per_pixel(),
        ));
        ExposureProbe {
            config,
            texture,
            framebuffer,
            buffer,
            fence: None,
            lost: false,
            commands: CommandBuffer::new(),
            target: config.initial_target,
            exposure: config.initial_target,
        }
    }

    /// The smoothed exposure to render with this frame.
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_pending(&self) -> bool {
        self.fence.is_some()
    }

    /// True after a probe reported device loss, until [Self::retry].
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Allows probes to be submitted again after a device loss.
    pub fn retry(&mut self) {
        self.lost = false;
    }

    /// The 1x1 target `record` draws into.
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /**
    Advances the probe by one frame.

    `record` is called only when a new probe is submitted, which never happens while the probe
    is lost.  It runs inside a render pass on the probe framebuffer, which has been cleared to
    transparent black, and should draw whatever averages the scene into the single pixel.
    */
    pub fn update<D: Device>(
        &mut self,
        context: &mut Context<D>,
        record: impl FnOnce(&mut CommandBuffer) -> Result<(), EncodeError>,
    ) -> Result<ProbePoll, ProbeError> {
        let poll = self.poll(context);
        self.exposure = mix(self.exposure, self.target, self.config.adaptation_speed);
        if self.fence.is_none() && !self.lost {
            self.submit(context, record)?;
        }
        Ok(poll)
    }

    fn poll<D: Device>(&mut self, context: &mut Context<D>) -> ProbePoll {
        let Some(fence) = self.fence else {
            return if self.lost {
                ProbePoll::DeviceLost
            } else {
                ProbePoll::Idle
            };
        };
        match context.fence_status(fence) {
            FenceStatus::NotReady => ProbePoll::NotReady,
            FenceStatus::Success => {
                let mut bytes = [0u8; 16];
                context.read_buffer(self.buffer, 0, &mut bytes);
                let rgba: [f32; 4] = bytemuck::pod_read_unaligned(&bytes);
                let luminance = luminance([rgba[0], rgba[1], rgba[2]]);
                self.target = exposure_target(luminance, &self.config);
                context.release_fence(fence);
                self.fence = None;
                logwise::trace_sync!(
                    "Exposure probe measured luminance {luminance}, target {target}",
                    luminance = logwise::privacy::LogIt(&luminance),
                    target = logwise::privacy::LogIt(&self.target)
                );
                ProbePoll::Measured {
                    luminance,
                    target: self.target,
                }
            }
            FenceStatus::DeviceLost => {
                context.release_fence(fence);
                self.fence = None;
                self.lost = true;
                ProbePoll::DeviceLost
            }
        }
    }

    fn submit<D: Device>(
        &mut self,
        context: &mut Context<D>,
        record: impl FnOnce(&mut CommandBuffer) -> Result<(), EncodeError>,
    ) -> Result<(), ProbeError> {
        let pixel = Region::new(0, 0, 1, 1);
        let pass = RenderPassInfo::new(self.framebuffer, pixel).clear_color(0, [0.0; 4]);
        if let Err(err) = self.record_probe(&pass, pixel, record) {
            self.commands.reset();
            return Err(err.into());
        }
        context.submit(&mut self.commands)?;
        self.fence = Some(context.create_fence());
        Ok(())
    }

    fn record_probe(
        &mut self,
        pass: &RenderPassInfo,
        pixel: Region,
        record: impl FnOnce(&mut CommandBuffer) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.commands.begin_render_pass(pass)?;
        record(&mut self.commands)?;
        self.commands.copy_content_to_buffer(&CopyContentToBufferInfo {
            buffer: self.buffer,
            region: pixel,
            format: DataFormat::Rgba32F,
            buffer_offset: 0,
        })?;
        self.commands.end_render_pass()
    }

    /// Releases the probe's objects, including an in-flight fence.
    pub fn release<D: Device>(self, context: &mut Context<D>) {
        if let Some(fence) = self.fence {
            context.release_fence(fence);
        }
        context.release_framebuffer(self.framebuffer);
        context.release_texture(self.texture);
        context.release_buffer(self.buffer);
    }
}
