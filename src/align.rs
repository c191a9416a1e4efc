use crate::{HeapError, block::META_SIZE};

/// Granularity of every block size handed out by the heap.
pub const ALIGNMENT: usize = 4;

/// Smallest data area a block can have. Zero-byte requests are rounded up to
/// this so they still get a distinct, freeable block.
pub const MIN_BLOCK_SIZE: usize = ALIGNMENT;

/// Rounds the given size up to the next multiple of four.
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
///
/// assert_eq!(align!(5), 8);
/// assert_eq!(align!(12), 12);
/// assert_eq!(align!(0), 0);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + 3) & !3
  };
}

/// Block size reserved for a request of `size` bytes.
///
/// Fails when the rounded size plus a header no longer fits a break delta.
pub(crate) fn block_size(size: usize) -> Result<usize, HeapError> {
  let Some(padded) = size.checked_add(ALIGNMENT - 1) else {
    return Err(HeapError::SizeOverflow);
  };
  let aligned = (padded & !(ALIGNMENT - 1)).max(MIN_BLOCK_SIZE);

  match aligned.checked_add(META_SIZE) {
    Some(total) if total <= isize::MAX as usize => Ok(aligned),
    _ => Err(HeapError::SizeOverflow),
  }
}
