// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Backends implementing [crate::device::Device].
//!
//! A platform context lives outside this crate; the backends here are for headless use and tests.

mod nop;
mod recording;

pub use nop::NopDevice;
pub use recording::{DeviceCall, RecordingDevice};
