use std::io::Read;
use std::ptr;

use libc::sbrk;
use segalloc::{Heap, SbrkProvider};

/// Waits until the user presses ENTER. Useful when you want to inspect
/// memory state with tools like `pmap`, `htop`, `gdb`, or just visually
/// track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  let mut heap = Heap::new(SbrkProvider::new());
  heap.init().expect("heap init");

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Allocate 4 bytes, write through it, observe alignment.
    // --------------------------------------------------------------------
    let first = heap.allocate(4) as *mut u32;
    println!("\n[1] Allocate u32 at {:?}", first);
    first.write(0xDEADBEEF);
    println!("[1] Value written = 0x{:X}", first.read());
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Allocate 12 bytes, fill with a byte pattern.
    // --------------------------------------------------------------------
    let second = heap.allocate(12);
    println!("\n[2] Allocate [u8; 12] at {:?}", second);
    ptr::write_bytes(second, 0xAB, 12);
    println!("[2] Initialized second block with 0xAB");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Free the first block, then allocate something that fits in its
    //    size class to show first-fit reuse.
    // --------------------------------------------------------------------
    heap.free(first as *mut u8);
    let reused = heap.allocate(4);
    println!("\n[3] Freed first block, reallocated 4 bytes at {:?}", reused);
    println!("[3] Reused same address: {}", reused == first as *mut u8);
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Grow the second block with reallocate, observe prefix preserved.
    // --------------------------------------------------------------------
    let grown = heap.reallocate(second, 64);
    println!("\n[4] Reallocated second block to 64 bytes at {:?}", grown);
    for i in 0..12u8 {
      assert_eq!(grown.add(i as usize).read(), 0xAB);
    }
    println!("[4] First 12 bytes preserved");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) Force a heap extension with a large allocation.
    // --------------------------------------------------------------------
    let big = heap.allocate(50_000);
    println!("\n[5] Allocated 50000 bytes at {:?}", big);
    print_program_break("after large allocation");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 6) Validate heap integrity before exiting.
    // --------------------------------------------------------------------
    let violations = heap.check_heap(true);
    if violations.is_empty() {
      println!("\n[6] Heap check passed: no violations");
    } else {
      println!("\n[6] Heap check found {} violation(s):", violations.len());
      for v in &violations {
        println!("  - {v}");
      }
    }

    heap.free(reused);
    heap.free(grown);
    heap.free(big);
    print_program_break("end");
  }
}
