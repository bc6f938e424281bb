//! Bounded line storage and the reversal transform.
//!
//! `LineBuffer` is a fixed-capacity byte container: every write path is
//! bounds-checked, so an oversize line can be truncated or rejected but
//! can never spill past the declared capacity.

use bytes::BytesMut;

use crate::error::ServerError;

/// A fixed-capacity buffer holding one client line (no trailing newline).
#[derive(Debug)]
pub struct LineBuffer {
    data: BytesMut,
    capacity: usize,
}

impl LineBuffer {
    /// Create an empty buffer that will never hold more than `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Declared capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// Reset to empty. Called before each read so no bytes from a previous
    /// line or session can leak into the next one.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Stored line content.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append as much of `bytes` as fits, returning how many were accepted.
    pub fn extend_truncated(&mut self, bytes: &[u8]) -> usize {
        let accepted = bytes.len().min(self.capacity - self.data.len());
        self.data.extend_from_slice(&bytes[..accepted]);
        accepted
    }
}

/// Write `src` into `dest` in reverse byte order.
///
/// Fails with `LineTooLong` (writing nothing) if `src` does not fit in
/// `dest`; the destination must be at least as large as the source line.
pub fn reverse_into(src: &[u8], dest: &mut LineBuffer) -> Result<(), ServerError> {
    if src.len() > dest.capacity() {
        return Err(ServerError::LineTooLong {
            len: src.len(),
            capacity: dest.capacity(),
        });
    }
    dest.clear();
    dest.data.extend(src.iter().rev().copied());
    Ok(())
}
