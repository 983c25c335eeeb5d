//! The heap provider seam.
//!
//! The underlying memory region is treated as an opaque, monotonically
//! growing collaborator rather than something the allocator core manages
//! itself. Naming that seam as a trait — instead of hard-coding a syscall
//! inline — means the allocator core only ever calls `extend`/`low`/`high`,
//! so it can run against a real process heap or a fixed test buffer without
//! caring which.

use std::ptr;

use libc::{c_void, intptr_t, sbrk};

use crate::error::AllocError;

/// An opaque, monotonically growing memory region the allocator core
/// extends but never shrinks.
pub trait HeapProvider {
  /// Requests `bytes` more memory and returns the address of the first
  /// newly available byte (the previous high-water mark).
  fn extend(&mut self, bytes: usize) -> Result<*mut u8, AllocError>;

  /// Inclusive lower bound of the region handed out so far.
  fn low(&self) -> *const u8;

  /// Inclusive upper bound of the region handed out so far.
  fn high(&self) -> *const u8;
}

/// Extends the process heap via `sbrk(2)`.
pub struct SbrkProvider {
  low: *const u8,
  high: *const u8,
}

impl SbrkProvider {
  pub fn new() -> SbrkProvider {
    SbrkProvider { low: ptr::null(), high: ptr::null() }
  }
}

impl Default for SbrkProvider {
  fn default() -> Self {
    SbrkProvider::new()
  }
}

impl HeapProvider for SbrkProvider {
  fn extend(&mut self, bytes: usize) -> Result<*mut u8, AllocError> {
    let raw = unsafe { sbrk(bytes as intptr_t) };
    if raw == usize::MAX as *mut c_void {
      return Err(AllocError::OutOfMemory);
    }

    let base = raw as *mut u8;
    if self.low.is_null() {
      self.low = base;
    }
    self.high = unsafe { base.add(bytes) };
    Ok(base)
  }

  fn low(&self) -> *const u8 {
    self.low
  }

  fn high(&self) -> *const u8 {
    self.high
  }
}

/// A deterministic provider backed by a fixed, owned buffer rather than
/// the real process heap, so tests stay independent of process-global
/// `sbrk` state and can run concurrently.
pub struct BufferProvider {
  buf: Box<[u8]>,
  base: *mut u8,
  used: usize,
}

impl BufferProvider {
  /// Creates a provider backed by `capacity` bytes. `extend` fails with
  /// `OutOfMemory` once `capacity` is exhausted.
  pub fn new(capacity: usize) -> BufferProvider {
    let mut buf = vec![0u8; capacity].into_boxed_slice();
    let base = buf.as_mut_ptr();
    BufferProvider { buf, base, used: 0 }
  }
}

impl HeapProvider for BufferProvider {
  fn extend(&mut self, bytes: usize) -> Result<*mut u8, AllocError> {
    if self.used + bytes > self.buf.len() {
      return Err(AllocError::OutOfMemory);
    }
    let ptr = unsafe { self.base.add(self.used) };
    self.used += bytes;
    Ok(ptr)
  }

  fn low(&self) -> *const u8 {
    self.base
  }

  fn high(&self) -> *const u8 {
    unsafe { self.base.add(self.used) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buffer_provider_extends_monotonically() {
    let mut provider = BufferProvider::new(256);
    let a = provider.extend(64).unwrap();
    let b = provider.extend(64).unwrap();
    assert_eq!(unsafe { a.add(64) }, b);
  }

  #[test]
  fn buffer_provider_reports_out_of_memory() {
    let mut provider = BufferProvider::new(64);
    assert!(provider.extend(128).is_err());
  }

  #[test]
  fn buffer_provider_low_high_track_usage() {
    let mut provider = BufferProvider::new(128);
    assert_eq!(provider.low(), provider.high());
    provider.extend(32).unwrap();
    assert_eq!(unsafe { provider.low().add(32) }, provider.high());
  }
}
