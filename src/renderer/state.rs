// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The fixed-function state cache.

[StateCache] keeps two copies of every state field: what the next draw wants (`desired`) and
what the device was last told (`actual`).  Setters only touch `desired`.  [StateCache::validate]
walks the fields in a fixed order and calls the device for the ones that differ, so a redundant
change costs nothing.

After an invalidation every field is reapplied once, whether or not it differs, because the
device may have been changed behind the cache's back.
*/

use crate::device::{
    BlendEquation, BlendFactor, Comparison, Device, Face, FaceOrientation, Feature,
    StencilOperation,
};
use crate::objects::{StencilFunc, StencilOps};

/// One complete set of fixed-function state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub cull_test: bool,
    pub cull_face: Face,
    pub front_face: FaceOrientation,
    pub depth_test: bool,
    pub depth_mask: bool,
    pub depth_comparison: Comparison,
    pub stencil_test: bool,
    pub stencil_ops_front: StencilOps,
    pub stencil_ops_back: StencilOps,
    pub stencil_func_front: StencilFunc,
    pub stencil_func_back: StencilFunc,
    pub stencil_mask_front: u32,
    pub stencil_mask_back: u32,
    pub color_mask: [bool; 4],
    pub blending: bool,
    pub blend_color: [f32; 4],
    pub blend_equation_rgb: BlendEquation,
    pub blend_equation_alpha: BlendEquation,
    pub blend_source_rgb: BlendFactor,
    pub blend_destination_rgb: BlendFactor,
    pub blend_source_alpha: BlendFactor,
    pub blend_destination_alpha: BlendFactor,
}

impl Default for State {
    /// The defaults of a fresh GL-family context.
    fn default() -> Self {
        let keep = StencilOps {
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Keep,
        };
        let always = StencilFunc {
            comparison: Comparison::Always,
            reference: 0,
            mask: 0xFF,
        };
        State {
            cull_test: false,
            cull_face: Face::Back,
            front_face: FaceOrientation::CounterClockwise,
            depth_test: false,
            depth_mask: true,
            depth_comparison: Comparison::Less,
            stencil_test: false,
            stencil_ops_front: keep,
            stencil_ops_back: keep,
            stencil_func_front: always,
            stencil_func_back: always,
            stencil_mask_front: 0xFF,
            stencil_mask_back: 0xFF,
            color_mask: [true; 4],
            blending: false,
            blend_color: [0.0; 4],
            blend_equation_rgb: BlendEquation::Add,
            blend_equation_alpha: BlendEquation::Add,
            blend_source_rgb: BlendFactor::One,
            blend_destination_rgb: BlendFactor::Zero,
            blend_source_alpha: BlendFactor::One,
            blend_destination_alpha: BlendFactor::Zero,
        }
    }
}

/**
Applies a per-face field.

When both faces need an update and want the same value, one `FrontAndBack` call does it.  The
comparison is on the desired values, regardless of whether the faces matched before.
*/
fn validate_faces<T: PartialEq + Copy>(
    forced: bool,
    desired_front: T,
    desired_back: T,
    actual_front: &mut T,
    actual_back: &mut T,
    mut apply: impl FnMut(Face, T),
) {
    let front_needs_update = forced || *actual_front != desired_front;
    let back_needs_update = forced || *actual_back != desired_back;
    if front_needs_update && back_needs_update && desired_front == desired_back {
        apply(Face::FrontAndBack, desired_front);
    } else {
        if front_needs_update {
            apply(Face::Front, desired_front);
        }
        if back_needs_update {
            apply(Face::Back, desired_back);
        }
    }
    if front_needs_update {
        *actual_front = desired_front;
    }
    if back_needs_update {
        *actual_back = desired_back;
    }
}

#[derive(Debug)]
pub struct StateCache {
    pub(crate) desired: State,
    actual: State,
    is_dirty: bool,
    is_invalidated: bool,
}

impl StateCache {
    /// Starts invalidated: nothing is known about the device yet.
    pub fn new() -> Self {
        StateCache {
            desired: State::default(),
            actual: State::default(),
            is_dirty: true,
            is_invalidated: true,
        }
    }

    pub fn desired(&self) -> &State {
        &self.desired
    }

    pub fn actual(&self) -> &State {
        &self.actual
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_invalidated(&self) -> bool {
        self.is_invalidated
    }

    /// Mutable access to the desired state.  Marks the cache dirty.
    pub(crate) fn desired_mut(&mut self) -> &mut State {
        self.is_dirty = true;
        &mut self.desired
    }

    /// Forgets what the device holds; the next validation reapplies every field.
    pub fn invalidate(&mut self) {
        self.is_dirty = true;
        self.is_invalidated = true;
    }

    /// Brings the device in line with the desired state.
    pub(crate) fn validate<D: Device + ?Sized>(&mut self, device: &mut D) {
        if self.is_dirty || self.is_invalidated {
            let forced = self.is_invalidated;
            self.validate_cull_test(device, forced);
            self.validate_cull_face(device, forced);
            self.validate_front_face(device, forced);
            self.validate_depth_test(device, forced);
            self.validate_depth_mask(device, forced);
            self.validate_depth_comparison(device, forced);
            self.validate_stencil_test(device, forced);
            self.validate_stencil_operation(device, forced);
            self.validate_stencil_func(device, forced);
            self.validate_stencil_mask(device, forced);
            self.validate_color_mask(device, forced);
            self.validate_blending(device, forced);
            self.validate_blend_color(device, forced);
            self.validate_blend_equation(device, forced);
            self.validate_blend_func(device, forced);
        }
        self.is_dirty = false;
        self.is_invalidated = false;
    }

    fn validate_cull_test<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.cull_test != self.desired.cull_test {
            self.actual.cull_test = self.desired.cull_test;
            device.set_enabled(Feature::CullFace, self.actual.cull_test);
        }
    }

    fn validate_cull_face<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.cull_face != self.desired.cull_face {
            self.actual.cull_face = self.desired.cull_face;
            device.cull_face(self.actual.cull_face);
        }
    }

    fn validate_front_face<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.front_face != self.desired.front_face {
            self.actual.front_face = self.desired.front_face;
            device.front_face(self.actual.front_face);
        }
    }

    fn validate_depth_test<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.depth_test != self.desired.depth_test {
            self.actual.depth_test = self.desired.depth_test;
            device.set_enabled(Feature::DepthTest, self.actual.depth_test);
        }
    }

    pub(crate) fn validate_depth_mask<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.depth_mask != self.desired.depth_mask {
            self.actual.depth_mask = self.desired.depth_mask;
            device.depth_mask(self.actual.depth_mask);
        }
    }

    fn validate_depth_comparison<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.depth_comparison != self.desired.depth_comparison {
            self.actual.depth_comparison = self.desired.depth_comparison;
            device.depth_func(self.actual.depth_comparison);
        }
    }

    fn validate_stencil_test<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.stencil_test != self.desired.stencil_test {
            self.actual.stencil_test = self.desired.stencil_test;
            device.set_enabled(Feature::StencilTest, self.actual.stencil_test);
        }
    }

    fn validate_stencil_operation<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        validate_faces(
            forced,
            self.desired.stencil_ops_front,
            self.desired.stencil_ops_back,
            &mut self.actual.stencil_ops_front,
            &mut self.actual.stencil_ops_back,
            |face, ops| device.stencil_op(face, ops.stencil_fail, ops.depth_fail, ops.pass),
        );
    }

    fn validate_stencil_func<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        validate_faces(
            forced,
            self.desired.stencil_func_front,
            self.desired.stencil_func_back,
            &mut self.actual.stencil_func_front,
            &mut self.actual.stencil_func_back,
            |face, func| device.stencil_func(face, func.comparison, func.reference, func.mask),
        );
    }

    pub(crate) fn validate_stencil_mask<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        validate_faces(
            forced,
            self.desired.stencil_mask_front,
            self.desired.stencil_mask_back,
            &mut self.actual.stencil_mask_front,
            &mut self.actual.stencil_mask_back,
            |face, mask| device.stencil_mask(face, mask),
        );
    }

    pub(crate) fn validate_color_mask<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.color_mask != self.desired.color_mask {
            self.actual.color_mask = self.desired.color_mask;
            device.color_mask(self.actual.color_mask);
        }
    }

    fn validate_blending<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.blending != self.desired.blending {
            self.actual.blending = self.desired.blending;
            device.set_enabled(Feature::Blend, self.actual.blending);
        }
    }

    fn validate_blend_color<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        if forced || self.actual.blend_color != self.desired.blend_color {
            self.actual.blend_color = self.desired.blend_color;
            device.blend_color(self.actual.blend_color);
        }
    }

    fn validate_blend_equation<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        let needs_update = forced
            || self.actual.blend_equation_rgb != self.desired.blend_equation_rgb
            || self.actual.blend_equation_alpha != self.desired.blend_equation_alpha;
        if needs_update {
            self.actual.blend_equation_rgb = self.desired.blend_equation_rgb;
            self.actual.blend_equation_alpha = self.desired.blend_equation_alpha;
            device.blend_equation(self.actual.blend_equation_rgb, self.actual.blend_equation_alpha);
        }
    }

    fn validate_blend_func<D: Device + ?Sized>(&mut self, device: &mut D, forced: bool) {
        let needs_update = forced
            || self.actual.blend_source_rgb != self.desired.blend_source_rgb
            || self.actual.blend_destination_rgb != self.desired.blend_destination_rgb
            || self.actual.blend_source_alpha != self.desired.blend_source_alpha
            || self.actual.blend_destination_alpha != self.desired.blend_destination_alpha;
        if needs_update {
            self.actual.blend_source_rgb = self.desired.blend_source_rgb;
            self.actual.blend_destination_rgb = self.desired.blend_destination_rgb;
            self.actual.blend_source_alpha = self.desired.blend_source_alpha;
            self.actual.blend_destination_alpha = self.desired.blend_destination_alpha;
            device.blend_func(
                self.actual.blend_source_rgb,
                self.actual.blend_destination_rgb,
                self.actual.blend_source_alpha,
                self.actual.blend_destination_alpha,
            );
        }
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}
