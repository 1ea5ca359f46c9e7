// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Pipelines: fully resolved fixed-function state.

A [PipelineInfo] describes state the way a material thinks about it (a cull mode, one stencil
description per face, an optional blend).  [Pipeline] is the same state decomposed into the
fields the state cache diffs against, resolved once at creation.  Pipelines own no device
object; the program and vertex array they reference are owned elsewhere.
*/

use crate::device::{
    BlendEquation, BlendFactor, Comparison, Face, FaceOrientation, IndexFormat, StencilOperation,
    Topology,
};
use crate::objects::{ProgramHandle, VertexArrayHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
    FrontAndBack,
}

impl CullMode {
    /// (test enabled, culled face)
    fn resolve(self) -> (bool, Face) {
        match self {
            CullMode::None => (false, Face::Back),
            CullMode::Front => (true, Face::Front),
            CullMode::Back => (true, Face::Back),
            CullMode::FrontAndBack => (true, Face::FrontAndBack),
        }
    }
}

/// Stencil behavior for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    pub fail: StencilOperation,
    pub depth_fail: StencilOperation,
    pub pass: StencilOperation,
    pub comparison: Comparison,
    pub reference: i32,
    pub compare_mask: u32,
    pub write_mask: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        StencilFaceState {
            fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Keep,
            comparison: Comparison::Always,
            reference: 0,
            compare_mask: 0xFF,
            write_mask: 0xFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub color: [f32; 4],
    pub equation_rgb: BlendEquation,
    pub equation_alpha: BlendEquation,
    pub source_rgb: BlendFactor,
    pub destination_rgb: BlendFactor,
    pub source_alpha: BlendFactor,
    pub destination_alpha: BlendFactor,
}

impl Default for BlendState {
    fn default() -> Self {
        BlendState {
            color: [0.0; 4],
            equation_rgb: BlendEquation::Add,
            equation_alpha: BlendEquation::Add,
            source_rgb: BlendFactor::One,
            destination_rgb: BlendFactor::Zero,
            source_alpha: BlendFactor::One,
            destination_alpha: BlendFactor::Zero,
        }
    }
}

impl BlendState {
    /// Premultiplied-alpha "over".
    pub fn alpha_over() -> Self {
        BlendState {
            source_rgb: BlendFactor::One,
            destination_rgb: BlendFactor::OneMinusSourceAlpha,
            source_alpha: BlendFactor::One,
            destination_alpha: BlendFactor::OneMinusSourceAlpha,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineInfo {
    pub program: ProgramHandle,
    pub vertex_array: VertexArrayHandle,
    pub topology: Topology,
    pub culling: CullMode,
    pub front_face: FaceOrientation,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_comparison: Comparison,
    pub stencil_test: bool,
    pub stencil_front: StencilFaceState,
    pub stencil_back: StencilFaceState,
    pub color_write: [bool; 4],
    /// `None` disables blending.
    pub blending: Option<BlendState>,
}

impl PipelineInfo {
    /// Triangles, no culling, no depth or stencil test, full color writes, no blending.
    pub fn new(program: ProgramHandle, vertex_array: VertexArrayHandle) -> Self {
        PipelineInfo {
            program,
            vertex_array,
            topology: Topology::TriangleList,
            culling: CullMode::None,
            front_face: FaceOrientation::CounterClockwise,
            depth_test: false,
            depth_write: true,
            depth_comparison: Comparison::Less,
            stencil_test: false,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            color_write: [true; 4],
            blending: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilOps {
    pub stencil_fail: StencilOperation,
    pub depth_fail: StencilOperation,
    pub pass: StencilOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFunc {
    pub comparison: Comparison,
    pub reference: i32,
    pub mask: u32,
}

impl StencilFaceState {
    fn ops(&self) -> StencilOps {
        StencilOps {
            stencil_fail: self.fail,
            depth_fail: self.depth_fail,
            pass: self.pass,
        }
    }

    fn func(&self) -> StencilFunc {
        StencilFunc {
            comparison: self.comparison,
            reference: self.reference,
            mask: self.compare_mask,
        }
    }
}

/// Immutable state snapshot bound by `BindPipeline`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub(crate) program: ProgramHandle,
    pub(crate) vertex_array: VertexArrayHandle,
    pub(crate) index_format: IndexFormat,
    pub(crate) topology: Topology,
    pub(crate) cull_test: bool,
    pub(crate) cull_face: Face,
    pub(crate) front_face: FaceOrientation,
    pub(crate) depth_test: bool,
    pub(crate) depth_write: bool,
    pub(crate) depth_comparison: Comparison,
    pub(crate) stencil_test: bool,
    pub(crate) stencil_ops_front: StencilOps,
    pub(crate) stencil_ops_back: StencilOps,
    pub(crate) stencil_func_front: StencilFunc,
    pub(crate) stencil_func_back: StencilFunc,
    pub(crate) stencil_mask_front: u32,
    pub(crate) stencil_mask_back: u32,
    pub(crate) color_write: [bool; 4],
    pub(crate) blending: bool,
    pub(crate) blend: BlendState,
}

impl Pipeline {
    /// `index_format` comes from the referenced vertex array.
    pub(crate) fn new(info: &PipelineInfo, index_format: IndexFormat) -> Pipeline {
        let (cull_test, cull_face) = info.culling.resolve();
        Pipeline {
            program: info.program,
            vertex_array: info.vertex_array,
            index_format,
            topology: info.topology,
            cull_test,
            cull_face,
            front_face: info.front_face,
            depth_test: info.depth_test,
            depth_write: info.depth_write,
            depth_comparison: info.depth_comparison,
            stencil_test: info.stencil_test,
            stencil_ops_front: info.stencil_front.ops(),
            stencil_ops_back: info.stencil_back.ops(),
            stencil_func_front: info.stencil_front.func(),
            stencil_func_back: info.stencil_back.func(),
            stencil_mask_front: info.stencil_front.write_mask,
            stencil_mask_back: info.stencil_back.write_mask,
            color_write: info.color_write,
            blending: info.blending.is_some(),
            blend: info.blending.unwrap_or_default(),
        }
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn index_format(&self) -> IndexFormat {
        self.index_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::Handle;

    fn info() -> PipelineInfo {
        PipelineInfo::new(
            Handle::from_raw(1).expect("nonzero"),
            Handle::from_raw(1).expect("nonzero"),
        )
    }

    #[test]
    fn cull_mode_resolution() {
        let mut info = info();
        let pipeline = Pipeline::new(&info, IndexFormat::U16);
        assert!(!pipeline.cull_test);
        assert_eq!(pipeline.cull_face, Face::Back);

        info.culling = CullMode::Front;
        let pipeline = Pipeline::new(&info, IndexFormat::U32);
        assert!(pipeline.cull_test);
        assert_eq!(pipeline.cull_face, Face::Front);
        assert_eq!(pipeline.index_format(), IndexFormat::U32);
    }

    #[test]
    fn per_face_stencil_split() {
        let mut info = info();
        info.stencil_test = true;
        info.stencil_front = StencilFaceState {
            pass: StencilOperation::Replace,
            comparison: Comparison::Equal,
            reference: 3,
            write_mask: 0x0F,
            ..StencilFaceState::default()
        };
        let pipeline = Pipeline::new(&info, IndexFormat::U16);
        assert_eq!(pipeline.stencil_ops_front.pass, StencilOperation::Replace);
        assert_eq!(pipeline.stencil_ops_back.pass, StencilOperation::Keep);
        assert_eq!(
            pipeline.stencil_func_front,
            StencilFunc {
                comparison: Comparison::Equal,
                reference: 3,
                mask: 0xFF
            }
        );
        assert_eq!(pipeline.stencil_mask_front, 0x0F);
        assert_eq!(pipeline.stencil_mask_back, 0xFF);
    }

    #[test]
    fn blending_option() {
        let mut info = info();
        assert!(!Pipeline::new(&info, IndexFormat::U16).blending);
        info.blending = Some(BlendState::alpha_over());
        let pipeline = Pipeline::new(&info, IndexFormat::U16);
        assert!(pipeline.blending);
        assert_eq!(pipeline.blend.destination_rgb, BlendFactor::OneMinusSourceAlpha);
    }
}
