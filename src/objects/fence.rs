// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Fences over device sync objects.

A fence marks a point in the queued device work.  Polling is non-blocking, so callers check it
once per frame.  Every fence must be released exactly once whatever its final status, otherwise
the sync object leaks.
*/

use crate::device::{Device, RawSync, SyncStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceStatus {
    /// The work before the fence is still in flight.
    NotReady,
    Success,
    /// The work will never complete.  Its results are permanently unavailable.
    DeviceLost,
}

impl From<SyncStatus> for FenceStatus {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Unsignaled => FenceStatus::NotReady,
            SyncStatus::Signaled => FenceStatus::Success,
            SyncStatus::Failed => FenceStatus::DeviceLost,
        }
    }
}

#[derive(Debug)]
pub struct Fence {
    raw: RawSync,
}

impl Fence {
    pub(crate) fn create<D: Device + ?Sized>(device: &mut D) -> Fence {
        Fence {
            raw: device.create_fence(),
        }
    }

    pub(crate) fn status<D: Device + ?Sized>(&self, device: &mut D) -> FenceStatus {
        let status = FenceStatus::from(device.fence_status(self.raw));
        if status == FenceStatus::DeviceLost {
            logwise::warn_sync!(
                "Fence {raw} reports device lost",
                raw = self.raw.0
            );
        }
        status
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_fence(self.raw);
    }

    pub fn raw(&self) -> RawSync {
        self.raw
    }
}
