//! The integrity checker: walks the heap physically and through the free
//! lists, cross-checking the two against each other. Never mutates state
//! and keeps no counters between calls, so repeated calls are idempotent.

use crate::block;
use crate::config::{ALIGNMENT, DWORD, PROLOGUE_WORDS, WORD};
use crate::freelist::{size_class, FreeLists};
use crate::provider::HeapProvider;

/// A single detected violation of a heap invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
  BadPrologue,
  BadEpilogue { size: u32, alloc: bool },
  Unaligned { at: usize },
  OutsideHeap { at: usize },
  AdjacentFreeBlocks { first: usize, second: usize },
  HeaderFooterMismatch { at: usize },
  UndersizedBlock { at: usize, size: u32 },
  FreeListLinkBroken { at: usize },
  FreeListOutsideHeap { at: usize },
  WrongSizeClass { at: usize, expected: usize, actual: usize },
  FreeBlockCountMismatch { walked: usize, listed: usize },
}

impl std::fmt::Display for Violation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Violation::BadPrologue => write!(f, "bad prologue header"),
      Violation::BadEpilogue { size, alloc } => {
        write!(f, "bad epilogue header: size={size}, alloc={alloc}")
      }
      Violation::Unaligned { at } => write!(f, "block at {at:#x} is not 8-byte aligned"),
      Violation::OutsideHeap { at } => write!(f, "block at {at:#x} lies outside the heap"),
      Violation::AdjacentFreeBlocks { first, second } => {
        write!(f, "coalescing error: free blocks at {first:#x} and {second:#x} are adjacent")
      }
      Violation::HeaderFooterMismatch { at } => {
        write!(f, "header and footer mismatch for free block at {at:#x}")
      }
      Violation::UndersizedBlock { at, size } => {
        write!(f, "block at {at:#x} has size {size}, below the minimum")
      }
      Violation::FreeListLinkBroken { at } => {
        write!(f, "free-list predecessor/successor links broken around {at:#x}")
      }
      Violation::FreeListOutsideHeap { at } => {
        write!(f, "free-list entry at {at:#x} lies outside the heap")
      }
      Violation::WrongSizeClass { at, expected, actual } => {
        write!(f, "block at {at:#x} is in size class {actual}, expected {expected}")
      }
      Violation::FreeBlockCountMismatch { walked, listed } => write!(
        f,
        "free block count mismatch: {walked} found by physical walk, {listed} found across free lists"
      ),
    }
  }
}

fn aligned(p: *mut u8) -> bool {
  (p as usize) % ALIGNMENT == 0
}

fn in_heap(p: *mut u8, low: *const u8, high: *const u8) -> bool {
  if low.is_null() || high.is_null() || low == high {
    return false;
  }
  (p as usize) >= (low as usize) && (p as usize) <= (high as usize - 1)
}

/// Walks the heap rooted at `heap_base` against `provider`'s bounds,
/// returning every detected violation. Prints a block-by-block dump when
/// `verbose` is set.
pub fn check_heap<P: HeapProvider>(provider: &P, heap_base: usize, verbose: bool) -> Vec<Violation> {
  let mut violations = Vec::new();
  let low = provider.low();
  let high = provider.high();

  if verbose {
    println!("Heap ({:#x}):", heap_base);
  }

  unsafe {
    let prologue_header = block::read_header((heap_base + 2 * WORD) as *mut u8);
    if prologue_header.size() as usize != DWORD || !prologue_header.is_alloc() {
      violations.push(Violation::BadPrologue);
    }

    let mut bp = (heap_base + PROLOGUE_WORDS * WORD) as *mut u8;
    let mut walked_free = 0usize;

    loop {
      let header = block::read_header(bp);
      let size = header.size();

      if size == 0 {
        if !header.is_alloc() {
          violations.push(Violation::BadEpilogue { size, alloc: header.is_alloc() });
        }
        break;
      }

      if verbose {
        if header.is_alloc() {
          println!("{:#x}: header:[size={} alloc]", bp as usize, size);
        } else {
          println!("{:#x}: header:[size={} free] footer:[size={} free]", bp as usize, size, size);
        }
      }

      if !aligned(bp) {
        violations.push(Violation::Unaligned { at: bp as usize });
      }
      if !in_heap(bp, low, high) {
        violations.push(Violation::OutsideHeap { at: bp as usize });
      }
      if (size as usize) < crate::config::MIN_BLOCK_SIZE {
        violations.push(Violation::UndersizedBlock { at: bp as usize, size });
      }

      let next = block::next_block(bp);
      let next_header = block::read_header(next);
      if !header.is_alloc() && next_header.size() > 0 && !next_header.is_alloc() {
        violations.push(Violation::AdjacentFreeBlocks { first: bp as usize, second: next as usize });
      }

      if !header.is_alloc() {
        walked_free += 1;
        let footer = block::read_header(block::footer_ptr(bp));
        if footer.raw() != header.raw() {
          violations.push(Violation::HeaderFooterMismatch { at: bp as usize });
        }
      }

      bp = next;
    }

    let lists = FreeLists::new(heap_base);
    let mut listed_free = 0usize;
    for class in 0..crate::config::NUM_SIZE_CLASSES {
      for bp in lists.iter_class(class) {
        listed_free += 1;

        if !in_heap(bp, low, high) {
          violations.push(Violation::FreeListOutsideHeap { at: bp as usize });
        }

        let actual_class = size_class(block::size(bp) as usize);
        if actual_class != class {
          violations.push(Violation::WrongSizeClass { at: bp as usize, expected: class, actual: actual_class });
        }

        let succ_raw = block::succ_raw(bp);
        if succ_raw != 0 {
          let succ = (heap_base + succ_raw as usize) as *mut u8;
          if block::pred_raw(succ) != (bp as usize - heap_base) as u32 {
            violations.push(Violation::FreeListLinkBroken { at: bp as usize });
          }
        }
      }
    }

    if walked_free != listed_free {
      violations.push(Violation::FreeBlockCountMismatch { walked: walked_free, listed: listed_free });
    }
  }

  violations
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::heap::Heap;
  use crate::provider::BufferProvider;

  #[test]
  fn freshly_initialized_heap_has_no_violations() {
    let mut heap = Heap::new(BufferProvider::new(1 << 16));
    heap.init().unwrap();
    let violations = heap.check_heap(false);
    assert!(violations.is_empty(), "{violations:?}");
  }

  #[test]
  fn heap_after_allocations_and_frees_has_no_violations() {
    let mut heap = Heap::new(BufferProvider::new(1 << 16));
    heap.init().unwrap();
    unsafe {
      let a = heap.allocate(40);
      let b = heap.allocate(80);
      let c = heap.allocate(16);
      heap.free(b);
      heap.free(a);
      heap.free(c);
    }
    let violations = heap.check_heap(false);
    assert!(violations.is_empty(), "{violations:?}");
  }
}
