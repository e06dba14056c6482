//! Fixed-capacity staging buffers for strings crossing the Lua boundary.
//!
//! A [`Buffer`] holds at most `capacity - 1` bytes of payload followed by a
//! NUL terminator, the same shape as the client's other `BUFFER_SIZE` line
//! buffers.  Writes longer than that are truncated, never reallocated.

use crate::error::{BridgeError, BridgeResult};

/// System-wide line buffer capacity, in bytes (terminator included).
pub const BUFFER_SIZE: usize = 40_000;

/// Number of buffers in every context's pool.
pub const LUA_BUFFER_BLOCKS: usize = 2;

/// Pool slot used by `tt.print` and `tt.send`.
pub const TEXT_SLOT: usize = 0;

/// Pool slot allocated for compatibility with the pool size but never
/// written by any host function.
pub const RESERVED_SLOT: usize = 1;

// ── Buffer ────────────────────────────────────────────────────────────────

/// One fixed-capacity, NUL-terminated byte buffer.
#[derive(Debug)]
pub struct Buffer {
    data: Box<[u8]>,
    len: usize,
}

impl Buffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    ///
    /// A capacity of zero is raised to one so there is always room for the
    /// terminator.  Allocation failure is reported instead of aborting.
    pub fn try_new(capacity: usize) -> BridgeResult<Self> {
        let capacity = capacity.max(1);
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| BridgeError::OutOfMemory { what: "lua buffer" })?;
        data.resize(capacity, 0);
        Ok(Self { data: data.into_boxed_slice(), len: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Copy `src` in, truncated to `capacity - 1` bytes, and terminate it.
    ///
    /// Returns the staged payload (terminator excluded).
    pub fn write(&mut self, src: &[u8]) -> &[u8] {
        let n = src.len().min(self.capacity() - 1);
        self.data[..n].copy_from_slice(&src[..n]);
        self.data[n] = 0;
        self.len = n;
        &self.data[..n]
    }

    /// The payload of the most recent write.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The payload including its NUL terminator.
    #[cfg(test)]
    fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data[..=self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ── BufferPool ────────────────────────────────────────────────────────────

/// The per-context set of [`LUA_BUFFER_BLOCKS`] staging buffers.
#[derive(Debug)]
pub struct BufferPool {
    slots: Vec<Buffer>,
}

impl BufferPool {
    /// Allocate every buffer in the pool.  On failure nothing is kept.
    pub fn try_new(capacity: usize) -> BridgeResult<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(LUA_BUFFER_BLOCKS)
            .map_err(|_| BridgeError::OutOfMemory { what: "lua buffer pool" })?;
        for _ in 0..LUA_BUFFER_BLOCKS {
            slots.push(Buffer::try_new(capacity)?);
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Buffer> {
        self.slots.get(index)
    }

    /// Stage `src` into `slot` and hand back an owned copy of the staged
    /// text, so the caller can forward it after releasing the pool.
    ///
    /// Bytes that are not valid UTF-8 (including a multi-byte character cut
    /// by truncation) are replaced with U+FFFD.
    pub fn stage(&mut self, slot: usize, src: &[u8]) -> String {
        let buf = &mut self.slots[slot];
        String::from_utf8_lossy(buf.write(src)).into_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
