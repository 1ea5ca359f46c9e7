// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{BufferKind, BufferUsage, Device, RawBuffer};

/// Describes a buffer to create.
#[derive(Debug, Clone, Copy)]
pub struct BufferInfo<'a> {
    pub kind: BufferKind,
    /// Contents are rewritten often.  Ignored for pixel-transfer buffers, which are always read-back buffers.
    pub dynamic: bool,
    /// Size in bytes.  When `data` is present its length wins.
    pub size: usize,
    pub data: Option<&'a [u8]>,
}

impl<'a> BufferInfo<'a> {
    pub fn with_data(kind: BufferKind, data: &'a [u8]) -> Self {
        BufferInfo {
            kind,
            dynamic: false,
            size: data.len(),
            data: Some(data),
        }
    }

    pub fn with_size(kind: BufferKind, size: usize) -> Self {
        BufferInfo {
            kind,
            dynamic: true,
            size,
            data: None,
        }
    }

    fn usage(&self) -> BufferUsage {
        match (self.kind, self.dynamic) {
            (BufferKind::PixelTransfer, _) => BufferUsage::DynamicRead,
            (_, true) => BufferUsage::DynamicDraw,
            (_, false) => BufferUsage::StaticDraw,
        }
    }
}

/**
A device buffer.

The buffer keeps the binding kind it was created with; every transfer binds it to that kind.
*/
#[derive(Debug)]
pub struct Buffer {
    raw: RawBuffer,
    kind: BufferKind,
    size: usize,
}

impl Buffer {
    pub(crate) fn create<D: Device + ?Sized>(device: &mut D, info: &BufferInfo<'_>) -> Buffer {
        let size = info.data.map_or(info.size, |d| d.len());
        let raw = device.create_buffer(info.kind, info.usage(), size, info.data);
        Buffer {
            raw,
            kind: info.kind,
            size,
        }
    }

    /**
    # Panics
    If `offset + data.len()` exceeds the buffer size.
    */
    pub(crate) fn write<D: Device + ?Sized>(&self, device: &mut D, offset: usize, data: &[u8]) {
        self.check_range(offset, data.len());
        device.write_buffer(self.raw, self.kind, offset, data);
    }

    /**
    # Panics
    If `offset + target.len()` exceeds the buffer size.
    */
    pub(crate) fn read<D: Device + ?Sized>(&self, device: &mut D, offset: usize, target: &mut [u8]) {
        self.check_range(offset, target.len());
        device.read_buffer(self.raw, self.kind, offset, target);
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_buffer(self.raw);
    }

    fn check_range(&self, offset: usize, len: usize) {
        assert!(
            offset.checked_add(len).is_some_and(|end| end <= self.size),
            "buffer access of {} bytes at offset {} exceeds buffer size {}",
            len,
            offset,
            self.size
        );
    }

    pub fn raw(&self) -> RawBuffer {
        self.raw
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
