//! The allocator engine: `init`, `allocate`, `free`, `reallocate`, and the
//! internal `extend_heap`/`place`/`coalesce` helpers that implement them.
//!
//! ## Heap layout
//!
//! ```text
//!   heap_base
//!       │
//!       ▼
//!   ┌──────┬───────────┬───────────┬────────────────────┬───────────┬─── ···
//!   │ pad  │ prologue  │ prologue  │  20 free-list root  │ first real│
//!   │ word │  header   │  footer   │  slots (4B each)    │   block   │
//!   └──────┴───────────┴───────────┴────────────────────┴───────────┴─── ···
//!    1 word    1 word      1 word         20 words             ...      epilogue
//!                                                                       (size 0,
//!                                                                        alloc)
//! ```
//!
//! `Heap<P>` owns no bytes itself — all state lives in the region `P`
//! hands out, addressed from `heap_base`. The struct itself keeps only
//! the provider and that one base address; every block's metadata lives
//! in the heap region itself.

use std::ptr;

use crate::align_to;
use crate::block;
use crate::check::{self, Violation};
use crate::config::{ALIGNMENT, CHUNK, DWORD, MIN_BLOCK_SIZE, NUM_SIZE_CLASSES, PROLOGUE_WORDS, WORD};
use crate::error::AllocError;
use crate::freelist::FreeLists;
use crate::header::Header;
use crate::provider::HeapProvider;

#[inline]
unsafe fn put_u32(p: *mut u8, value: u32) {
  unsafe {
    *(p as *mut u32) = value;
  }
}

/// A segregated free-list allocator over a [`HeapProvider`]-backed region.
pub struct Heap<P: HeapProvider> {
  provider: P,
  base: Option<usize>,
}

impl<P: HeapProvider> Heap<P> {
  pub fn new(provider: P) -> Heap<P> {
    Heap { provider, base: None }
  }

  fn free_lists(&self) -> FreeLists {
    FreeLists::new(self.base.expect("Heap::init must be called before use"))
  }

  /// Lays out the prologue, the twenty free-list roots, and the epilogue,
  /// then extends the heap by one [`CHUNK`] of free space.
  pub fn init(&mut self) -> Result<(), AllocError> {
    let base_ptr = self.provider.extend(PROLOGUE_WORDS * WORD)?;
    let base = base_ptr as usize;
    self.base = Some(base);

    unsafe {
      put_u32(base as *mut u8, 0); // alignment pad
      let prologue = Header::new(DWORD as u32, true, false).raw();
      put_u32((base + 1 * WORD) as *mut u8, prologue);
      put_u32((base + 2 * WORD) as *mut u8, prologue);
      for i in 0..NUM_SIZE_CLASSES {
        put_u32((base + (3 + i) * WORD) as *mut u8, 0);
      }
      let epilogue = Header::new(0, true, true).raw();
      put_u32((base + (3 + NUM_SIZE_CLASSES) * WORD) as *mut u8, epilogue);
    }

    self.extend_heap(CHUNK / WORD)?;
    Ok(())
  }

  /// Requests `words` (rounded up to an even count) more bytes from the
  /// provider, formats them as one free block inheriting the prior
  /// epilogue's `prev_alloc` bit, writes a fresh epilogue after it,
  /// coalesces with any trailing free block, and inserts the result into
  /// its free list.
  fn extend_heap(&mut self, words: usize) -> Result<*mut u8, AllocError> {
    let words = if words % 2 != 0 { words + 1 } else { words };
    let size_bytes = words * WORD;

    let bp = self.provider.extend(size_bytes)?;

    unsafe {
      let prev_alloc = block::read_header(bp).prev_alloc();
      block::set_header(bp, size_bytes as u32, false, prev_alloc);
      block::set_footer(bp, size_bytes as u32, false, prev_alloc);

      let next = block::next_block(bp);
      block::set_header(next, 0, true, false);
    }

    let merged = self.coalesce(bp);
    self.free_lists().insert_head(merged);
    Ok(merged)
  }

  /// `n == 0` returns null. Otherwise adjusts `n` to an 8-aligned,
  /// overhead-inclusive block size, first-fits it against the free lists,
  /// and extends the heap by `max(asize, CHUNK)` on a miss.
  ///
  /// # Safety
  /// The heap must have been [`init`](Self::init)ed.
  pub unsafe fn allocate(&mut self, n: usize) -> *mut u8 {
    if n == 0 || self.base.is_none() {
      return ptr::null_mut();
    }

    let asize = Self::adjusted_size(n);

    if let Some(bp) = self.free_lists().first_fit(asize) {
      unsafe { self.place(bp, asize) };
      return bp;
    }

    let extend_words = asize.max(CHUNK) / WORD;
    let bp = match self.extend_heap(extend_words) {
      Ok(bp) => bp,
      Err(_) => return ptr::null_mut(),
    };
    unsafe { self.place(bp, asize) };
    bp
  }

  /// `asize = max(MIN_BLOCK_SIZE, round_up(n + header_overhead, ALIGNMENT))`.
  fn adjusted_size(n: usize) -> usize {
    let rounded = align_to!(n + WORD, ALIGNMENT);
    rounded.max(MIN_BLOCK_SIZE)
  }

  /// Splits `bp` (a free block of at least `asize` bytes, already fitted
  /// by [`FreeLists::first_fit`]) if the remainder would be at least
  /// [`MIN_BLOCK_SIZE`], otherwise hands over the whole block.
  unsafe fn place(&mut self, bp: *mut u8, asize: usize) {
    unsafe {
      let csize = block::size(bp) as usize;
      self.free_lists().remove(bp);
      let prev_alloc = block::prev_is_alloc(bp);

      if csize - asize >= MIN_BLOCK_SIZE {
        block::set_header(bp, asize as u32, true, prev_alloc);

        let rp = block::next_block(bp);
        let remainder = (csize - asize) as u32;
        block::set_header(rp, remainder, false, true);
        block::set_footer(rp, remainder, false, true);
        block::propagate_prev_alloc(rp, false);
        self.free_lists().insert_head(rp);
      } else {
        block::set_header(bp, csize as u32, true, prev_alloc);
        block::propagate_prev_alloc(bp, true);
      }
    }
  }

  /// `free(null)` is a no-op. Otherwise marks the block free (header and
  /// footer), coalesces with adjacent free neighbors, and reinserts the
  /// result at its class head.
  ///
  /// # Safety
  /// `ptr` must be null or a pointer previously returned by `allocate`/
  /// `reallocate` on this heap, not already freed.
  pub unsafe fn free(&mut self, ptr: *mut u8) {
    if ptr.is_null() {
      return;
    }

    unsafe {
      let size = block::size(ptr);
      let prev_alloc = block::prev_is_alloc(ptr);
      block::set_header(ptr, size, false, prev_alloc);
      block::set_footer(ptr, size, false, prev_alloc);

      let merged = self.coalesce(ptr);
      self.free_lists().insert_head(merged);
    }
  }

  /// Four-case immediate merge with physically adjacent free blocks. Does
  /// not touch the free lists for `bp` itself — only for any neighbor it
  /// absorbs — and does not reinsert the result; callers do that.
  unsafe fn coalesce(&mut self, bp: *mut u8) -> *mut u8 {
    unsafe {
      let prev_alloc = block::prev_is_alloc(bp);
      let next = block::next_block(bp);
      let next_alloc = block::is_alloc(next);
      let mut size = block::size(bp);

      let result = match (prev_alloc, next_alloc) {
        (true, true) => bp,
        (true, false) => {
          self.free_lists().remove(next);
          size += block::size(next);
          bp
        }
        (false, true) => {
          let prev = block::prev_block(bp);
          self.free_lists().remove(prev);
          size += block::size(prev);
          prev
        }
        (false, false) => {
          let prev = block::prev_block(bp);
          self.free_lists().remove(prev);
          self.free_lists().remove(next);
          size += block::size(prev) + block::size(next);
          prev
        }
      };

      let result_prev_alloc = block::prev_is_alloc(result);
      block::set_header(result, size, false, result_prev_alloc);
      block::set_footer(result, size, false, result_prev_alloc);
      block::propagate_prev_alloc(result, false);
      result
    }
  }

  /// `n == 0` frees `ptr` and returns null. `ptr == null` is `allocate(n)`.
  /// Otherwise: allocate a new block, copy `min(old payload, n)` bytes,
  /// free the old block. No in-place growth is attempted.
  ///
  /// # Safety
  /// `ptr` must be null or a pointer previously returned by `allocate`/
  /// `reallocate` on this heap.
  pub unsafe fn reallocate(&mut self, ptr: *mut u8, n: usize) -> *mut u8 {
    if n == 0 {
      unsafe { self.free(ptr) };
      return ptr::null_mut();
    }
    if ptr.is_null() {
      return unsafe { self.allocate(n) };
    }

    let new_ptr = unsafe { self.allocate(n) };
    if new_ptr.is_null() {
      return ptr::null_mut();
    }

    unsafe {
      let old_payload = block::size(ptr) as usize - WORD;
      let copy_len = old_payload.min(n);
      ptr::copy_nonoverlapping(ptr, new_ptr, copy_len);
      self.free(ptr);
    }

    new_ptr
  }

  /// Validates every heap invariant, returning each violation found. Never
  /// mutates state.
  pub fn check_heap(&self, verbose: bool) -> Vec<Violation> {
    match self.base {
      Some(base) => check::check_heap(&self.provider, base, verbose),
      None => Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::BufferProvider;

  fn new_heap() -> Heap<BufferProvider> {
    let mut heap = Heap::new(BufferProvider::new(1 << 20));
    heap.init().unwrap();
    heap
  }

  #[test]
  fn allocate_zero_returns_null() {
    let mut heap = new_heap();
    assert!(unsafe { heap.allocate(0) }.is_null());
  }

  #[test]
  fn allocations_are_aligned_and_non_overlapping() {
    let mut heap = new_heap();
    let sizes = [1usize, 7, 8, 9, 16, 100, 4096];
    let mut ptrs = Vec::new();
    unsafe {
      for &size in &sizes {
        let p = heap.allocate(size);
        assert!(!p.is_null());
        assert_eq!(p as usize % ALIGNMENT, 0);
        ptrs.push((p as usize, size));
      }
    }
    for i in 0..ptrs.len() {
      for j in (i + 1)..ptrs.len() {
        let (a, asz) = ptrs[i];
        let (b, bsz) = ptrs[j];
        let overlap = a < b + bsz && b < a + asz;
        assert!(!overlap, "allocations {i} and {j} overlap");
      }
    }
  }

  #[test]
  fn write_read_round_trip() {
    let mut heap = new_heap();
    unsafe {
      let p = heap.allocate(64);
      for i in 0..64u8 {
        p.add(i as usize).write(i);
      }
      for i in 0..64u8 {
        assert_eq!(p.add(i as usize).read(), i);
      }
    }
  }

  #[test]
  fn freeing_adjacent_blocks_coalesces() {
    let mut heap = new_heap();
    unsafe {
      let a = heap.allocate(8);
      let b = heap.allocate(8);
      heap.free(a);
      heap.free(b);
    }
    assert!(heap.check_heap(false).is_empty());
  }

  #[test]
  fn realloc_preserves_prefix() {
    let mut heap = new_heap();
    unsafe {
      let p = heap.allocate(40);
      ptr::write_bytes(p, 0xAB, 40);
      let q = heap.reallocate(p, 80);
      assert!(!q.is_null());
      for i in 0..40 {
        assert_eq!(q.add(i).read(), 0xAB);
      }
    }
  }

  #[test]
  fn realloc_zero_frees_and_returns_null() {
    let mut heap = new_heap();
    unsafe {
      let p = heap.allocate(32);
      let q = heap.reallocate(p, 0);
      assert!(q.is_null());
    }
    assert!(heap.check_heap(false).is_empty());
  }

  #[test]
  fn realloc_null_behaves_like_allocate() {
    let mut heap = new_heap();
    unsafe {
      let p = heap.reallocate(ptr::null_mut(), 16);
      assert!(!p.is_null());
    }
  }

  #[test]
  fn free_of_null_is_noop() {
    let mut heap = new_heap();
    unsafe { heap.free(ptr::null_mut()) };
    assert!(heap.check_heap(false).is_empty());
  }

  #[test]
  fn first_fit_reuses_freed_block() {
    let mut heap = new_heap();
    unsafe {
      let a = heap.allocate(24);
      heap.free(a);
      let b = heap.allocate(24);
      assert_eq!(a, b);
    }
  }

  #[test]
  fn large_allocation_forces_heap_extension() {
    let mut heap = new_heap();
    unsafe {
      let big = heap.allocate(50_000);
      assert!(!big.is_null());
      assert_eq!(crate::freelist::size_class(block::size(big) as usize), 19);
    }
  }
}
