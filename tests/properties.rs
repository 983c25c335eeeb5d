//! Property tests over randomized call sequences of `allocate`/`free`/
//! `reallocate`. Each live allocation is tracked by the test model as
//! `(ptr, size, tag)`, where `tag` is a byte written across the whole
//! allocation so capacity and non-overlap can both be checked by reading
//! it back.

use proptest::prelude::*;
use segalloc::{BufferProvider, Heap};

const HEAP_BYTES: usize = 1 << 22;

#[derive(Clone, Debug)]
enum Op {
  Alloc { size: usize, tag: u8 },
  Free { slot: usize },
  Realloc { slot: usize, new_size: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    (1usize..2000, any::<u8>()).prop_map(|(size, tag)| Op::Alloc { size, tag }),
    (0usize..64).prop_map(|slot| Op::Free { slot }),
    (0usize..64, 1usize..2000).prop_map(|(slot, new_size)| Op::Realloc { slot, new_size }),
  ]
}

struct Live {
  ptr: *mut u8,
  size: usize,
  tag: u8,
}

fn run(ops: &[Op]) {
  let mut heap = Heap::new(BufferProvider::new(HEAP_BYTES));
  heap.init().expect("init");
  let mut live: Vec<Live> = Vec::new();

  for op in ops {
    match *op {
      Op::Alloc { size, tag } => unsafe {
        let ptr = heap.allocate(size);
        if ptr.is_null() {
          continue;
        }
        // P1: alignment.
        assert_eq!(ptr as usize % 8, 0, "allocate returned misaligned pointer");

        // P2: capacity — the whole region round-trips an arbitrary pattern.
        std::ptr::write_bytes(ptr, tag, size);
        for i in 0..size {
          assert_eq!(ptr.add(i).read(), tag, "byte {i} did not round-trip");
        }

        // P3: non-overlap against every other live allocation.
        for other in &live {
          let a = ptr as usize;
          let b = other.ptr as usize;
          let overlap = a < b + other.size && b < a + size;
          assert!(!overlap, "new allocation overlaps an existing one");
        }

        live.push(Live { ptr, size, tag });
      },
      Op::Free { slot } => {
        if live.is_empty() {
          continue;
        }
        let idx = slot % live.len();
        let entry = live.remove(idx);
        unsafe { heap.free(entry.ptr) };
      }
      Op::Realloc { slot, new_size } => {
        if live.is_empty() {
          continue;
        }
        let idx = slot % live.len();
        let entry = live.remove(idx);
        unsafe {
          let new_ptr = heap.reallocate(entry.ptr, new_size);
          if new_ptr.is_null() {
            continue;
          }
          // P9: realloc growing preserves the previous contents' prefix.
          let preserved = entry.size.min(new_size);
          for i in 0..preserved {
            assert_eq!(new_ptr.add(i).read(), entry.tag, "realloc lost byte {i} of the old contents");
          }
          live.push(Live { ptr: new_ptr, size: new_size, tag: entry.tag });
        }
      }
    }

    // P4, P5, P6, P7, P8 all reduce to "the checker finds nothing".
    let violations = heap.check_heap(false);
    assert!(violations.is_empty(), "heap invariant violated after {op:?}: {violations:?}");
  }
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(128))]

  #[test]
  fn heap_invariants_hold_over_random_call_sequences(ops in prop::collection::vec(op_strategy(), 1..300)) {
    run(&ops);
  }
}

#[test]
fn free_of_null_is_idempotent_and_preserves_invariants() {
  // P10.
  let mut heap = Heap::new(BufferProvider::new(HEAP_BYTES));
  heap.init().expect("init");
  unsafe {
    heap.free(std::ptr::null_mut());
    heap.free(std::ptr::null_mut());
  }
  assert!(heap.check_heap(false).is_empty());
}
