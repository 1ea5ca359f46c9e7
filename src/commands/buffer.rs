// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::Kind;

/// Arena sizing for a [CommandBuffer].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBufferConfig {
    /// Bytes reserved up front.
    pub initial_capacity: usize,
    /// Upper bound for growth.  `None` grows without limit.
    pub max_capacity: Option<usize>,
}

impl Default for CommandBufferConfig {
    fn default() -> Self {
        CommandBufferConfig {
            initial_capacity: 4 * 1024,
            max_capacity: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    #[error(
        "encoding {kind:?} needs {requested} bytes but the command buffer is capped at {capacity}"
    )]
    CapacityExceeded {
        kind: Kind,
        requested: usize,
        capacity: usize,
    },
}

/**
A byte arena of encoded commands with a write cursor and a read cursor.

Encoding appends at the write cursor; decoding consumes from the read cursor.  When the read
cursor catches up with the write cursor both go back to 0, so one buffer is reused frame after
frame without reallocating.

The arena grows by doubling.  With [CommandBufferConfig::max_capacity] set, a record that would
not fit is rejected with [EncodeError::CapacityExceeded] and the buffer is left as it was.
*/
#[derive(Debug)]
pub struct CommandBuffer {
    pub(super) data: Vec<u8>,
    pub(super) read_offset: usize,
    capacity: usize,
    max_capacity: Option<usize>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::with_config(CommandBufferConfig::default())
    }

    pub fn with_config(config: CommandBufferConfig) -> Self {
        let capacity = match config.max_capacity {
            Some(max) => config.initial_capacity.min(max),
            None => config.initial_capacity,
        };
        CommandBuffer {
            data: Vec::with_capacity(capacity),
            read_offset: 0,
            capacity,
            max_capacity: config.max_capacity,
        }
    }

    /// Bytes written and not yet reset.
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// True if nothing has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_offset(&self) -> usize {
        self.data.len()
    }

    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    /// Drops everything recorded and rewinds both cursors.  The arena is kept.
    pub fn reset(&mut self) {
        self.data.clear();
        self.read_offset = 0;
    }

    /// Makes room for `additional` more bytes, growing the arena if needed.
    pub(super) fn reserve(&mut self, kind: Kind, additional: usize) -> Result<(), EncodeError> {
        let needed = self.data.len() + additional;
        if needed <= self.capacity {
            return Ok(());
        }
        let mut new_capacity = self.capacity.max(1);
        while new_capacity < needed {
            new_capacity = new_capacity.saturating_mul(2);
        }
        if let Some(max) = self.max_capacity {
            if needed > max {
                logwise::warn_sync!(
                    "Command buffer full: {kind} needs {needed} bytes, limit is {max}",
                    kind = logwise::privacy::LogIt(&kind),
                    needed = needed,
                    max = max
                );
                return Err(EncodeError::CapacityExceeded {
                    kind,
                    requested: needed,
                    capacity: max,
                });
            }
            new_capacity = new_capacity.min(max);
        }
        logwise::info_sync!(
            "Growing command buffer from {old} to {new} bytes",
            old = self.capacity,
            new = new_capacity
        );
        self.data.reserve_exact(new_capacity - self.data.len());
        self.capacity = new_capacity;
        Ok(())
    }

    /// Appends bytes that bypass the encoder, to build corrupt buffers in tests.
    #[cfg(any(test, feature = "testing"))]
    pub fn append_raw_for_testing(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.capacity = self.capacity.max(self.data.len());
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}
