//! The allocator's only real error: the heap provider refused to grow.
//!
//! `allocate(0)` returning null and a foreign/double-free being undefined
//! behavior are not represented as `AllocError` — those are null-valued or
//! undefined-behavior edge cases of a raw `malloc`-style API, not
//! recoverable conditions a caller can branch on.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AllocError {
  /// The heap provider refused to extend the region (e.g. `sbrk` failed).
  /// The heap's prior state is left unchanged.
  OutOfMemory,
}

impl fmt::Display for AllocError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AllocError::OutOfMemory => write!(f, "heap provider refused to extend the region"),
    }
  }
}

impl std::error::Error for AllocError {}
