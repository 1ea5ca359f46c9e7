// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{Device, RawSampler, SamplingState};

/// Standalone sampling parameters, bound to a texture unit independently of the texture.
#[derive(Debug)]
pub struct Sampler {
    raw: RawSampler,
    state: SamplingState,
}

impl Sampler {
    pub(crate) fn create<D: Device + ?Sized>(device: &mut D, state: &SamplingState) -> Sampler {
        Sampler {
            raw: device.create_sampler(state),
            state: *state,
        }
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_sampler(self.raw);
    }

    pub fn raw(&self) -> RawSampler {
        self.raw
    }

    pub fn state(&self) -> SamplingState {
        self.state
    }
}
