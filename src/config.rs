//! Named tunables for the heap, collected in one place instead of scattered
//! as magic numbers through the allocator.

/// Byte alignment every block (and every pointer handed to the caller) must
/// satisfy.
pub const ALIGNMENT: usize = 8;

/// Size in bytes of a header/footer word and of a free-list offset.
pub const WORD: usize = 4;

/// Size in bytes of a double word: the minimum payload increment and the
/// size of the prologue sentinel.
pub const DWORD: usize = 8;

/// Number of words reserved at the heap base for the alignment pad, the
/// prologue header/footer, and the twenty free-list roots, before the
/// epilogue.
pub const PROLOGUE_WORDS: usize = 24;

/// Smallest possible block: header + pred + succ + footer.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Bytes requested from the provider when `first_fit` comes up empty.
pub const CHUNK: usize = 256;

/// Number of segregated free lists.
pub const NUM_SIZE_CLASSES: usize = 20;

/// Exact-size classes cover payload-inclusive block sizes up to and
/// including this many bytes, one class per 8-byte increment.
pub const EXACT_CLASS_MAX: usize = 96;

/// Largest block size still covered by a doubling size class; anything
/// larger falls into the catch-all final class.
pub const DOUBLING_CLASS_MAX: usize = 49152;

/// Size of the smallest doubling-class upper bound (class covers
/// `(EXACT_CLASS_MAX, DOUBLING_CLASS_BASE]`).
pub const DOUBLING_CLASS_BASE: usize = 192;
