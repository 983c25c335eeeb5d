//! # segalloc - A Segregated Free-List Memory Allocator
//!
//! This crate provides a general-purpose dynamic memory allocator built on
//! segregated free lists, in the style of a hand-rolled `malloc`/`free`/
//! `realloc` replacement rather than a bump/arena allocator.
//!
//! ## Overview
//!
//! Free blocks are bucketed into twenty size classes, each backed by its
//! own doubly linked list. Allocation walks the lists starting at the
//! requested size's own class and returns the first block that fits;
//! freeing coalesces immediately with any adjacent free neighbor.
//!
//! ```text
//!   Segregated Free Lists:
//!
//!   class 0  (16B)   ──▶ [free] ──▶ [free] ──▶ null
//!   class 1  (24B)   ──▶ null
//!   class 10 (96B)   ──▶ [free] ──▶ null
//!   class 11 (≤192B) ──▶ [free] ──▶ [free] ──▶ [free] ──▶ null
//!     ⋮
//!   class 19 (>49152B or catch-all) ──▶ null
//!
//!   allocate(size) searches from size_class(size) upward, first fit wins.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   segalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── config     - Named layout constants
//!   ├── offset     - Compressed 32-bit intra-heap pointers
//!   ├── header     - Packed header/footer words
//!   ├── block      - Physical block layout and traversal
//!   ├── freelist   - Segregated free lists and first-fit search
//!   ├── provider   - The heap-growth abstraction (sbrk, or a test buffer)
//!   ├── error      - The allocator's error type
//!   ├── check      - Heap integrity checker
//!   └── heap       - The allocator engine: init/allocate/free/reallocate
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segalloc::{Heap, SbrkProvider};
//!
//! let mut heap = Heap::new(SbrkProvider::new());
//! heap.init().unwrap();
//!
//! unsafe {
//!     let ptr = heap.allocate(64) as *mut u64;
//!     *ptr = 42;
//!     println!("Value: {}", *ptr);
//!     heap.free(ptr as *mut u8);
//! }
//! ```
//!
//! ## How It Works
//!
//! `SbrkProvider` extends the program's data segment via `sbrk(2)`:
//!
//! ```text
//!   Program Memory Layout:
//!
//!   High Address ┌─────────────────────┐
//!                │       Stack         │ ↓ grows down
//!                │         │           │
//!                │         ▼           │
//!                │                     │
//!                │         ▲           │
//!                │         │           │
//!                │       Heap          │ ↑ grows up (sbrk)
//!                ├─────────────────────┤ ← Program Break
//!                │   Uninitialized     │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │   Initialized       │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │       Text          │
//!   Low Address  └─────────────────────┘
//! ```
//!
//! Every block carries a packed header word and, if free, a matching
//! footer:
//!
//! ```text
//!   Allocated block (no footer):          Free block:
//!   ┌───────────────────────┐              ┌───────────────────────┐
//!   │ header: size|alloc|pa │              │ header: size|alloc|pa │
//!   ├───────────────────────┤              ├───────────────────────┤
//!   │                       │              │ pred (4B)             │
//!   │      payload          │              ├───────────────────────┤
//!   │                       │              │ succ (4B)             │
//!   └───────────────────────┘              ├───────────────────────┤
//!                                           │      ... free ...     │
//!                                           ├───────────────────────┤
//!                                           │ footer: size|alloc|pa │
//!                                           └───────────────────────┘
//! ```
//!
//! An allocated block's `prev_alloc` bit lets it skip the footer entirely;
//! the footer is only needed to walk backward from a free neighbor, and a
//! neighbor can only be free if `prev_alloc` says so.
//!
//! ## Features
//!
//! - **Segregated fits**: twenty size classes, first-fit within each
//! - **Immediate coalescing**: adjacent free blocks never persist as two
//! - **Compact headers**: allocated blocks carry no footer
//! - **Pluggable growth**: heap growth is abstracted behind [`HeapProvider`]
//! - **Integrity checking**: [`Heap::check_heap`] walks and cross-validates
//!   the physical block chain against the free lists
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **Never shrinks**: memory returned to the provider is never released
//! - **Naive realloc**: always allocates new, copies, frees old
//! - **Unix-only**: [`SbrkProvider`] requires `libc` and `sbrk` (POSIX)
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! `allocate`, `free`, and `reallocate` all require `unsafe` blocks and
//! carry pointer-validity preconditions documented on each method.

pub mod align;
mod block;
mod check;
mod config;
mod error;
mod freelist;
mod header;
mod heap;
mod offset;
mod provider;

pub use check::Violation;
pub use error::AllocError;
pub use freelist::size_class;
pub use heap::Heap;
pub use provider::{BufferProvider, HeapProvider, SbrkProvider};
