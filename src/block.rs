//! Block layout and physical traversal.
//!
//! Every function here takes a block pointer `bp` — the address of the
//! first byte *after* the header, i.e. where payload or free-list links
//! live. Header/footer addresses, and the addresses of physically adjacent
//! blocks, are all derived from `bp` and the size encoded in its header.
//!
//! This module knows nothing about `heap_base` or free-list membership; it
//! is pure physical layout — header, footer, and the addresses of the
//! previous/next blocks, all derived from a block pointer and its size.

use crate::config::{DWORD, WORD};
use crate::header::Header;

#[inline]
unsafe fn get_u32(p: *mut u8) -> u32 {
  unsafe { *(p as *mut u32) }
}

#[inline]
unsafe fn put_u32(p: *mut u8, value: u32) {
  unsafe {
    *(p as *mut u32) = value;
  }
}

/// Address of `bp`'s header.
#[inline]
pub unsafe fn header_ptr(bp: *mut u8) -> *mut u8 {
  unsafe { bp.sub(WORD) }
}

/// Address of `bp`'s footer. Only meaningful when `bp` is free — allocated
/// blocks have no footer.
#[inline]
pub unsafe fn footer_ptr(bp: *mut u8) -> *mut u8 {
  unsafe { bp.add(size(bp) as usize - DWORD) }
}

/// Reads the header word at `bp`.
#[inline]
pub unsafe fn read_header(bp: *mut u8) -> Header {
  unsafe { Header::from_raw(get_u32(header_ptr(bp))) }
}

#[inline]
pub unsafe fn size(bp: *mut u8) -> u32 {
  unsafe { read_header(bp).size() }
}

#[inline]
pub unsafe fn is_alloc(bp: *mut u8) -> bool {
  unsafe { read_header(bp).is_alloc() }
}

#[inline]
pub unsafe fn prev_is_alloc(bp: *mut u8) -> bool {
  unsafe { read_header(bp).prev_alloc() }
}

/// Packs and writes `bp`'s header.
#[inline]
pub unsafe fn set_header(bp: *mut u8, block_size: u32, alloc: bool, prev_alloc: bool) {
  unsafe {
    put_u32(header_ptr(bp), Header::new(block_size, alloc, prev_alloc).raw());
  }
}

/// Packs and writes `bp`'s footer. Caller must only do this for free
/// blocks — allocated blocks have no footer to overwrite.
#[inline]
pub unsafe fn set_footer(bp: *mut u8, block_size: u32, alloc: bool, prev_alloc: bool) {
  unsafe {
    put_u32(footer_ptr(bp), Header::new(block_size, alloc, prev_alloc).raw());
  }
}

/// Rewrites bit 1 only of the *following* physical block's header.
#[inline]
pub unsafe fn propagate_prev_alloc(bp: *mut u8, prev_alloc: bool) {
  unsafe {
    let next = next_block(bp);
    let mut header = read_header(next);
    header.set_prev_alloc(prev_alloc);
    put_u32(header_ptr(next), header.raw());
  }
}

/// The block physically following `bp`.
#[inline]
pub unsafe fn next_block(bp: *mut u8) -> *mut u8 {
  unsafe { bp.add(size(bp) as usize) }
}

/// The block physically preceding `bp`.
///
/// Only valid when `prev_is_alloc(bp)` is false: the previous block's
/// footer must exist to read its size.
#[inline]
pub unsafe fn prev_block(bp: *mut u8) -> *mut u8 {
  unsafe {
    let prev_footer = bp.sub(DWORD);
    let prev_size = Header::from_raw(get_u32(prev_footer)).size();
    bp.sub(prev_size as usize)
  }
}

/// Reads the predecessor link stored in a free block's body.
#[inline]
pub unsafe fn pred_raw(bp: *mut u8) -> u32 {
  unsafe { get_u32(bp) }
}

/// Reads the successor link stored in a free block's body.
#[inline]
pub unsafe fn succ_raw(bp: *mut u8) -> u32 {
  unsafe { get_u32(bp.add(WORD)) }
}

#[inline]
pub unsafe fn set_pred_raw(bp: *mut u8, value: u32) {
  unsafe { put_u32(bp, value) }
}

#[inline]
pub unsafe fn set_succ_raw(bp: *mut u8, value: u32) {
  unsafe { put_u32(bp.add(WORD), value) }
}
