// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Render pass begin and end.

Beginning a pass binds a framebuffer, sets the viewport and performs the requested clears.
Clears obey the write masks, so the masks are forced on around them and put back afterwards.
Ending a pass tells the device which attachments need not be kept.
*/

use super::{PassState, Renderer};
use crate::device::{Device, InvalidateAttachment, MAX_COLOR_ATTACHMENTS, Region};
use crate::objects::{FramebufferHandle, ObjectTables};

/// What happens to an attachment's contents when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadOp {
    #[default]
    Load,
    Clear,
}

/// What happens to an attachment's contents when a pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    #[default]
    Store,
    /// The contents may be discarded.
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorAttachmentInfo {
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_value: [f32; 4],
}

/**
Describes one render pass.

Attachment settings for slots the framebuffer does not have are ignored.  For the default
framebuffer only color slot 0 exists.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassInfo {
    pub framebuffer: FramebufferHandle,
    pub viewport: Region,
    pub colors: [ColorAttachmentInfo; MAX_COLOR_ATTACHMENTS],
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub depth_clear_value: f32,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub stencil_clear_value: i32,
}

impl RenderPassInfo {
    /// A pass that loads and stores everything.
    pub fn new(framebuffer: FramebufferHandle, viewport: Region) -> Self {
        RenderPassInfo {
            framebuffer,
            viewport,
            colors: [ColorAttachmentInfo::default(); MAX_COLOR_ATTACHMENTS],
            depth_load_op: LoadOp::Load,
            depth_store_op: StoreOp::Store,
            depth_clear_value: 1.0,
            stencil_load_op: LoadOp::Load,
            stencil_store_op: StoreOp::Store,
            stencil_clear_value: 0,
        }
    }

    /**
    Sets color slot `slot` to be cleared to `value`.

    # Panics
    If `slot` is not below [MAX_COLOR_ATTACHMENTS].
    */
    pub fn clear_color(mut self, slot: usize, value: [f32; 4]) -> Self {
        self.colors[slot].load_op = LoadOp::Clear;
        self.colors[slot].clear_value = value;
        self
    }

    pub fn clear_depth(mut self, value: f32) -> Self {
        self.depth_load_op = LoadOp::Clear;
        self.depth_clear_value = value;
        self
    }

    pub fn clear_stencil(mut self, value: i32) -> Self {
        self.stencil_load_op = LoadOp::Clear;
        self.stencil_clear_value = value;
        self
    }
}

impl Renderer {
    pub(crate) fn begin_render_pass<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        objects: &ObjectTables,
        info: &RenderPassInfo,
    ) {
        if self.pass == PassState::InPass {
            logwise::warn_sync!("begin_render_pass while a pass is open; ending the previous pass");
            self.end_render_pass(device);
        }
        self.validate(device);

        let framebuffer = objects.framebuffers.get(info.framebuffer);
        self.framebuffer = info.framebuffer;
        device.bind_framebuffer(framebuffer.raw());
        device.viewport(info.viewport);

        let old_color_mask = self.cache.actual().color_mask;
        let mut color_mask_forced = false;
        for (slot, color) in info.colors.iter().enumerate() {
            if !framebuffer.is_color_active(slot) || color.load_op != LoadOp::Clear {
                continue;
            }
            if !color_mask_forced {
                self.cache.desired.color_mask = [true; 4];
                self.cache.validate_color_mask(device, false);
                color_mask_forced = true;
            }
            device.clear_color(slot as u32, color.clear_value);
        }
        if color_mask_forced {
            self.cache.desired_mut().color_mask = old_color_mask;
        }

        let old_depth_mask = self.cache.actual().depth_mask;
        let old_stencil_mask_front = self.cache.actual().stencil_mask_front;
        let old_stencil_mask_back = self.cache.actual().stencil_mask_back;
        let clear_depth = info.depth_load_op == LoadOp::Clear;
        let clear_stencil = info.stencil_load_op == LoadOp::Clear;
        if clear_depth {
            self.cache.desired.depth_mask = true;
            self.cache.validate_depth_mask(device, false);
        }
        if clear_stencil {
            self.cache.desired.stencil_mask_front = 0xFF;
            self.cache.desired.stencil_mask_back = 0xFF;
            self.cache.validate_stencil_mask(device, false);
        }
        match (clear_depth, clear_stencil) {
            (true, true) => {
                device.clear_depth_stencil(info.depth_clear_value, info.stencil_clear_value)
            }
            (true, false) => device.clear_depth(info.depth_clear_value),
            (false, true) => device.clear_stencil(info.stencil_clear_value),
            (false, false) => {}
        }

        self.invalidations.clear();
        for (slot, color) in info.colors.iter().enumerate() {
            if framebuffer.is_color_active(slot) && color.store_op == StoreOp::DontCare {
                self.invalidations.push(InvalidateAttachment::Color(slot as u32));
            }
        }
        let discard_depth = info.depth_store_op == StoreOp::DontCare;
        let discard_stencil = info.stencil_store_op == StoreOp::DontCare;
        if discard_depth && discard_stencil && !framebuffer.is_default() {
            self.invalidations.push(InvalidateAttachment::DepthStencil);
        } else {
            if discard_depth {
                self.invalidations.push(InvalidateAttachment::Depth);
            }
            if discard_stencil {
                self.invalidations.push(InvalidateAttachment::Stencil);
            }
        }

        let desired = self.cache.desired_mut();
        desired.depth_mask = old_depth_mask;
        desired.stencil_mask_front = old_stencil_mask_front;
        desired.stencil_mask_back = old_stencil_mask_back;
        self.pass = PassState::InPass;
    }

    pub(crate) fn end_render_pass<D: Device + ?Sized>(&mut self, device: &mut D) {
        if self.pass == PassState::Idle {
            logwise::warn_sync!("end_render_pass without an open pass");
            return;
        }
        if !self.invalidations.is_empty() {
            device.invalidate_framebuffer(&self.invalidations);
            self.invalidations.clear();
        }
        self.framebuffer = self.default_framebuffer;
        self.pass = PassState::Idle;
    }
}
