// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Clears, write-mask forcing and discards around render passes.

use record_and_replay::device::{Face, InvalidateAttachment, Region, ShaderStage};
use record_and_replay::{
    ColorFormat, CommandBuffer, Context, DeviceCall, FramebufferHandle, FramebufferInfo,
    NamedBinding, PipelineHandle, PipelineInfo, ProgramInfo, RecordingDevice, RenderPassInfo,
    StoreOp, TextureHandle, TextureInfo, VertexArrayInfo,
};

const VIEWPORT: Region = Region::new(0, 0, 4, 4);

fn context() -> Context<RecordingDevice> {
    Context::new(RecordingDevice::new())
}

fn color_target(context: &mut Context<RecordingDevice>) -> TextureHandle {
    context.create_texture(&TextureInfo::Color2D {
        width: 4,
        height: 4,
        format: ColorFormat::Rgba16F,
        gamma_correction: false,
        mipmaps: false,
        data: None,
    })
}

/// Two color slots and a combined depth-stencil attachment.
fn offscreen(context: &mut Context<RecordingDevice>) -> FramebufferHandle {
    let first = color_target(context);
    let second = color_target(context);
    let depth_stencil = context.create_texture(&TextureInfo::DepthStencil2D {
        width: 4,
        height: 4,
    });
    context.create_framebuffer(&FramebufferInfo {
        label: "gbuffer",
        colors: [Some(first), Some(second), None, None],
        depth_stencil: Some(depth_stencil),
        ..Default::default()
    })
}

/// A pipeline that writes nothing: no color, no depth.
fn masked_pipeline(context: &mut Context<RecordingDevice>) -> PipelineHandle {
    let vs = context.create_shader(ShaderStage::Vertex, "vs", "void main() {}");
    let fs = context.create_shader(ShaderStage::Fragment, "fs", "void main() {}");
    let no_bindings: &[NamedBinding<'_>] = &[];
    let program = context.create_program(&ProgramInfo {
        label: "masked",
        vertex_shader: vs,
        fragment_shader: fs,
        texture_bindings: no_bindings,
        uniform_bindings: no_bindings,
    });
    let vertex_array = context.create_vertex_array(&VertexArrayInfo::default());
    context.create_pipeline(&PipelineInfo {
        depth_write: false,
        color_write: [false; 4],
        ..PipelineInfo::new(program, vertex_array)
    })
}

fn replay(context: &mut Context<RecordingDevice>, frame: &mut CommandBuffer) -> Vec<DeviceCall> {
    context.device_mut().clear_calls();
    context.submit(frame).expect("well-formed buffer");
    context.device_mut().take_calls()
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn clear_touches_only_the_cleared_slot() {
    let mut context = context();
    let framebuffer = offscreen(&mut context);
    let mut frame = CommandBuffer::new();
    frame
        .begin_render_pass(&RenderPassInfo::new(framebuffer, VIEWPORT).clear_color(0, [0.1, 0.2, 0.3, 1.0]))
        .unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    let clears: Vec<_> = calls.iter().filter(|c| c.is_clear()).collect();
    assert_eq!(clears, vec![&DeviceCall::ClearColor(0, [0.1, 0.2, 0.3, 1.0])]);
    assert!(calls.contains(&DeviceCall::Viewport(VIEWPORT)));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn slots_without_attachments_are_not_cleared() {
    let mut context = context();
    let default = context.default_framebuffer();
    let mut frame = CommandBuffer::new();
    frame
        .begin_render_pass(
            &RenderPassInfo::new(default, VIEWPORT)
                .clear_color(0, [0.0; 4])
                .clear_color(2, [1.0; 4]),
        )
        .unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    let clears: Vec<_> = calls.iter().filter(|c| c.is_clear()).collect();
    assert_eq!(clears, vec![&DeviceCall::ClearColor(0, [0.0; 4])]);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn color_mask_is_forced_once_and_restored_before_the_next_draw() {
    let mut context = context();
    let framebuffer = offscreen(&mut context);
    let pipeline = masked_pipeline(&mut context);
    let mut frame = CommandBuffer::new();
    frame.bind_pipeline(pipeline).unwrap();
    frame.draw(0, 3, 1).unwrap();
    replay(&mut context, &mut frame);

    frame
        .begin_render_pass(
            &RenderPassInfo::new(framebuffer, VIEWPORT)
                .clear_color(0, [0.0; 4])
                .clear_color(1, [0.0; 4]),
        )
        .unwrap();
    frame.draw(0, 3, 1).unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    let masks_and_clears: Vec<_> = calls
        .into_iter()
        .filter(|c| matches!(c, DeviceCall::ColorMask(_) | DeviceCall::ClearColor(..)))
        .collect();
    assert_eq!(
        masks_and_clears,
        vec![
            DeviceCall::ColorMask([true; 4]),
            DeviceCall::ClearColor(0, [0.0; 4]),
            DeviceCall::ClearColor(1, [0.0; 4]),
            DeviceCall::ColorMask([false; 4]),
        ]
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn depth_and_stencil_clear_together_with_masks_forced() {
    let mut context = context();
    let framebuffer = offscreen(&mut context);
    let pipeline = masked_pipeline(&mut context);
    let mut frame = CommandBuffer::new();
    frame.bind_pipeline(pipeline).unwrap();
    frame.draw(0, 3, 1).unwrap();
    replay(&mut context, &mut frame);

    frame
        .begin_render_pass(
            &RenderPassInfo::new(framebuffer, VIEWPORT)
                .clear_depth(1.0)
                .clear_stencil(0),
        )
        .unwrap();
    frame.draw(0, 3, 1).unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    let relevant: Vec<_> = calls
        .into_iter()
        .filter(|c| {
            c.is_clear() || matches!(c, DeviceCall::DepthMask(_) | DeviceCall::StencilMask(..))
        })
        .collect();
    assert_eq!(
        relevant,
        vec![
            DeviceCall::DepthMask(true),
            DeviceCall::ClearDepthStencil(1.0, 0),
            DeviceCall::DepthMask(false),
        ]
    );
    // stencil masks already allowed every bit, so forcing them cost nothing
    assert!(!relevant.iter().any(|c| matches!(c, DeviceCall::StencilMask(Face::FrontAndBack, _))));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn separate_depth_clear() {
    let mut context = context();
    let framebuffer = offscreen(&mut context);
    let mut frame = CommandBuffer::new();
    frame
        .begin_render_pass(&RenderPassInfo::new(framebuffer, VIEWPORT).clear_depth(0.5))
        .unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    let clears: Vec<_> = calls.iter().filter(|c| c.is_clear()).collect();
    assert_eq!(clears, vec![&DeviceCall::ClearDepth(0.5)]);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn discards_collapse_depth_stencil_on_user_framebuffers() {
    let mut context = context();
    let framebuffer = offscreen(&mut context);
    let mut pass = RenderPassInfo::new(framebuffer, VIEWPORT);
    pass.colors[1].store_op = StoreOp::DontCare;
    pass.colors[3].store_op = StoreOp::DontCare;
    pass.depth_store_op = StoreOp::DontCare;
    pass.stencil_store_op = StoreOp::DontCare;
    let mut frame = CommandBuffer::new();
    frame.begin_render_pass(&pass).unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    assert!(calls.contains(&DeviceCall::InvalidateFramebuffer(vec![
        InvalidateAttachment::Color(1),
        InvalidateAttachment::DepthStencil,
    ])));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn default_framebuffer_discards_depth_and_stencil_separately() {
    let mut context = context();
    let default = context.default_framebuffer();
    let mut pass = RenderPassInfo::new(default, VIEWPORT);
    pass.colors[0].store_op = StoreOp::DontCare;
    pass.depth_store_op = StoreOp::DontCare;
    pass.stencil_store_op = StoreOp::DontCare;
    let mut frame = CommandBuffer::new();
    frame.begin_render_pass(&pass).unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    assert_eq!(
        calls.last(),
        Some(&DeviceCall::InvalidateFramebuffer(vec![
            InvalidateAttachment::Color(0),
            InvalidateAttachment::Depth,
            InvalidateAttachment::Stencil,
        ]))
    );
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn storing_everything_discards_nothing() {
    let mut context = context();
    let framebuffer = offscreen(&mut context);
    let mut frame = CommandBuffer::new();
    frame.begin_render_pass(&RenderPassInfo::new(framebuffer, VIEWPORT)).unwrap();
    frame.end_render_pass().unwrap();
    let calls = replay(&mut context, &mut frame);
    assert!(!calls.iter().any(|c| matches!(c, DeviceCall::InvalidateFramebuffer(_))));
    assert!(!context.renderer().is_in_pass());
    assert_eq!(context.renderer().framebuffer(), context.default_framebuffer());
}
