use std::{error, fmt};

/// Why an allocation or resize request could not be served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapError {
  /// The break could not be moved far enough.
  OutOfMemory,
  /// The requested byte count does not fit in a block once aligned and
  /// combined with its header, or `count * size` overflowed.
  SizeOverflow,
  /// The pointer does not name a live, in-use block of this heap.
  InvalidPointer,
}

impl fmt::Display for HeapError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      HeapError::OutOfMemory => f.write_str("out of memory: heap break cannot be extended"),
      HeapError::SizeOverflow => f.write_str("requested size overflows the addressable range"),
      HeapError::InvalidPointer => f.write_str("pointer was not returned by this heap or is already free"),
    }
  }
}

impl error::Error for HeapError {}

/// What a call to `deallocate` did.
///
/// Invalid and repeated frees are tolerated and leave the heap untouched; the
/// outcome tells the caller which case applied.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeallocateOutcome {
  Freed,
  InvalidPointer,
  AlreadyFree,
}

impl DeallocateOutcome {
  pub fn is_freed(self) -> bool {
    matches!(self, DeallocateOutcome::Freed)
  }
}

/// A broken invariant found by `Heap::check`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corruption {
  /// Header address of the offending block.
  pub at: usize,
  pub reason: &'static str,
}

impl fmt::Display for Corruption {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "heap corrupted at {:#x}: {}", self.at, self.reason)
  }
}

impl error::Error for Corruption {}
