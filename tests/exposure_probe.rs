// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The auto-exposure probe polled across frames against scripted fences.

use record_and_replay::device::SyncStatus;
use record_and_replay::{
    Context, DeviceCall, ExposureConfig, ExposureProbe, ProbePoll, RecordingDevice,
};

fn rgba_bytes(rgba: [f32; 4]) -> Vec<u8> {
    rgba.iter().flat_map(|c| c.to_ne_bytes()).collect()
}

fn probe_submissions(context: &Context<RecordingDevice>) -> usize {
    context
        .device()
        .calls()
        .iter()
        .filter(|c| matches!(c, DeviceCall::ReadPixelsToBuffer { .. }))
        .count()
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn one_probe_in_flight_until_it_signals() {
    let mut context = Context::new(RecordingDevice::new());
    context.device_mut().set_pixel_source(&rgba_bytes([0.5, 0.5, 0.5, 1.0]));
    let mut probe = ExposureProbe::new(&mut context, ExposureConfig::default());
    context.device_mut().clear_calls();

    assert_eq!(probe.update(&mut context, |_| Ok(())), Ok(ProbePoll::Idle));
    assert!(probe.is_pending());
    assert_eq!(probe_submissions(&context), 1);

    for _ in 0..3 {
        assert_eq!(probe.update(&mut context, |_| Ok(())), Ok(ProbePoll::NotReady));
    }
    assert_eq!(probe_submissions(&context), 1);
    assert_eq!(context.device().live_fences(), 1);

    context.device_mut().set_all_fences(SyncStatus::Signaled);
    let poll = probe.update(&mut context, |_| Ok(())).expect("records");
    let ProbePoll::Measured { luminance, target } = poll else {
        panic!("expected a measurement, got {poll:?}");
    };
    assert!((luminance - 0.5).abs() < 1e-5);
    assert!((target - 1.0 / 1.57).abs() < 1e-4);
    // the old fence is gone and a new probe went out in the same frame
    assert_eq!(context.device().live_fences(), 1);
    assert_eq!(probe_submissions(&context), 2);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn exposure_moves_toward_target_each_frame() {
    let mut context = Context::new(RecordingDevice::new());
    context.device_mut().set_initial_fence_status(SyncStatus::Signaled);
    // black frame: luminance clamps, target clamps to the configured maximum
    context.device_mut().set_pixel_source(&rgba_bytes([0.0; 4]));
    let config = ExposureConfig {
        max_exposure: 11.0,
        adaptation_speed: 0.5,
        ..ExposureConfig::default()
    };
    let mut probe = ExposureProbe::new(&mut context, config);
    probe.update(&mut context, |_| Ok(())).expect("records");
    assert_eq!(probe.exposure(), 1.0);

    probe.update(&mut context, |_| Ok(())).expect("records");
    assert_eq!(probe.target(), 11.0);
    assert_eq!(probe.exposure(), 6.0);
    probe.update(&mut context, |_| Ok(())).expect("records");
    assert_eq!(probe.exposure(), 8.5);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn device_lost_is_reported_and_the_target_kept() {
    let mut context = Context::new(RecordingDevice::new());
    let mut probe = ExposureProbe::new(&mut context, ExposureConfig::default());
    probe.update(&mut context, |_| Ok(())).expect("records");
    context.device_mut().set_all_fences(SyncStatus::Failed);

    assert_eq!(probe.update(&mut context, |_| Ok(())), Ok(ProbePoll::DeviceLost));
    assert_eq!(probe.target(), 1.0);
    assert!(probe.is_lost());
    assert!(!probe.is_pending());
    assert_eq!(context.device().live_fences(), 0);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn lost_probe_stays_quiet_until_retried() {
    let mut context = Context::new(RecordingDevice::new());
    context.device_mut().set_initial_fence_status(SyncStatus::Failed);
    let mut probe = ExposureProbe::new(&mut context, ExposureConfig::default());
    assert_eq!(probe.update(&mut context, |_| Ok(())), Ok(ProbePoll::Idle));
    for _ in 0..5 {
        assert_eq!(probe.update(&mut context, |_| Ok(())), Ok(ProbePoll::DeviceLost));
    }
    let fences_created = context
        .device()
        .calls()
        .iter()
        .filter(|c| matches!(c, DeviceCall::CreateFence(_)))
        .count();
    assert_eq!(fences_created, 1);
    assert_eq!(probe_submissions(&context), 1);
    assert_eq!(context.device().live_fences(), 0);

    context.device_mut().set_initial_fence_status(SyncStatus::Unsignaled);
    probe.retry();
    assert!(!probe.is_lost());
    assert_eq!(probe.update(&mut context, |_| Ok(())), Ok(ProbePoll::Idle));
    assert!(probe.is_pending());
    assert_eq!(probe_submissions(&context), 2);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn caller_draws_inside_the_probe_pass() {
    let mut context = Context::new(RecordingDevice::new());
    let mut probe = ExposureProbe::new(&mut context, ExposureConfig::default());
    context.device_mut().clear_calls();
    probe
        .update(&mut context, |commands| commands.draw(0, 3, 1))
        .expect("records");
    let calls = context.device().calls();
    let clear = calls
        .iter()
        .position(|c| matches!(c, DeviceCall::ClearColor(0, _)))
        .expect("probe target cleared");
    let draw = calls
        .iter()
        .position(|c| matches!(c, DeviceCall::DrawArrays { .. }))
        .expect("caller draw replayed");
    let readback = calls
        .iter()
        .position(|c| matches!(c, DeviceCall::ReadPixelsToBuffer { .. }))
        .expect("pixel read back");
    let fence = calls
        .iter()
        .position(|c| matches!(c, DeviceCall::CreateFence(_)))
        .expect("fence created");
    assert!(clear < draw && draw < readback && readback < fence);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn release_frees_an_in_flight_fence() {
    let mut context = Context::new(RecordingDevice::new());
    let mut probe = ExposureProbe::new(&mut context, ExposureConfig::default());
    probe.update(&mut context, |_| Ok(())).expect("records");
    assert_eq!(context.device().live_fences(), 1);
    probe.release(&mut context);
    assert_eq!(context.device().live_fences(), 0);
}
