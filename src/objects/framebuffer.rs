// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Framebuffers.

A framebuffer remembers which of its color slots carry an attachment.  Render passes use that to
skip clears and discards on empty slots.
*/

use crate::device::{Device, FramebufferAttachments, MAX_COLOR_ATTACHMENTS, RawFramebuffer};
use crate::objects::TextureHandle;

/// Attachments of a framebuffer to create, by texture handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramebufferInfo<'a> {
    pub label: &'a str,
    pub colors: [Option<TextureHandle>; MAX_COLOR_ATTACHMENTS],
    pub depth: Option<TextureHandle>,
    pub stencil: Option<TextureHandle>,
    /// When present, `depth` and `stencil` are ignored.
    pub depth_stencil: Option<TextureHandle>,
}

#[derive(Debug)]
pub struct Framebuffer {
    raw: RawFramebuffer,
    active_colors: [bool; MAX_COLOR_ATTACHMENTS],
    is_default: bool,
    complete: bool,
}

impl Framebuffer {
    /// The window surface.  It has a single color slot and is never released.
    pub(crate) fn default_surface() -> Framebuffer {
        Framebuffer {
            raw: RawFramebuffer::DEFAULT,
            active_colors: [true, false, false, false],
            is_default: true,
            complete: true,
        }
    }

    /**
    `attachments` must already be resolved to device textures.

    Color slots at or past `max_colors` (the device's limit) are dropped with an error.
    */
    pub(crate) fn create<D: Device + ?Sized>(
        device: &mut D,
        label: &str,
        attachments: &FramebufferAttachments,
        max_colors: usize,
    ) -> Framebuffer {
        let mut attachments = *attachments;
        for (slot, color) in attachments.colors.iter_mut().enumerate().skip(max_colors) {
            if color.take().is_some() {
                logwise::error_sync!(
                    "Framebuffer {label}: color slot {slot} exceeds the device limit of {max}",
                    label = logwise::privacy::LogIt(&label),
                    slot = slot,
                    max = max_colors
                );
            }
        }
        if attachments.depth_stencil.is_some() {
            attachments.depth = None;
            attachments.stencil = None;
        }
        let raw = device.create_framebuffer(&attachments);
        let complete = device.framebuffer_complete(raw);
        if !complete {
            logwise::error_sync!(
                "Framebuffer {label} is incomplete",
                label = logwise::privacy::LogIt(&label)
            );
        }
        Framebuffer {
            raw,
            active_colors: attachments.colors.map(|c| c.is_some()),
            is_default: false,
            complete,
        }
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        assert!(!self.is_default, "the default framebuffer cannot be released");
        device.delete_framebuffer(self.raw);
    }

    pub fn raw(&self) -> RawFramebuffer {
        self.raw
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// False if the device rejected the attachment combination.  It can still be bound.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_color_active(&self, slot: usize) -> bool {
        self.active_colors.get(slot).copied().unwrap_or(false)
    }

    pub fn active_colors(&self) -> [bool; MAX_COLOR_ATTACHMENTS] {
        self.active_colors
    }
}
