use std::{mem, ptr, ptr::NonNull};

/// Size of the header stored in front of every data area.
pub const META_SIZE: usize = mem::size_of::<Block>();

/// Header record describing one heap region.
///
/// Headers live in-band, directly in front of the data area they describe.
/// Data sizes are only 4-aligned, so a header can sit at any 4-byte boundary
/// and is always copied in and out with unaligned accesses.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Block {
  pub size: usize,
  pub next: Option<BlockPtr>,
  pub prev: Option<BlockPtr>,
  pub self_ref: *mut u8,
  pub free: bool,
}

impl Block {
  pub fn new(
    at: BlockPtr,
    size: usize,
    free: bool,
  ) -> Self {
    Self {
      size,
      next: None,
      prev: None,
      self_ref: at.data().as_ptr(),
      free,
    }
  }
}

/// Address of a block header. This is the handle every list operation works
/// with; it is the only place raw header memory is touched.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct BlockPtr(NonNull<u8>);

impl BlockPtr {
  pub fn new(header: NonNull<u8>) -> Self {
    Self(header)
  }

  pub fn addr(self) -> usize {
    self.0.as_ptr() as usize
  }

  pub fn data(self) -> NonNull<u8> {
    // SAFETY: a header is always followed by its data area inside the same
    // region, so the offset stays in bounds and non-null.
    unsafe { self.0.add(META_SIZE) }
  }

  /// Address one past the data area of a block of `size` bytes.
  pub fn end(
    self,
    size: usize,
  ) -> usize {
    self.addr() + META_SIZE + size
  }

  /// Header position of a block carved at `offset` bytes into this block's
  /// data area.
  ///
  /// # Safety
  ///
  /// `offset + META_SIZE` must not exceed this block's data size.
  pub unsafe fn carve(
    self,
    offset: usize,
  ) -> BlockPtr {
    BlockPtr(unsafe { self.data().add(offset) })
  }

  /// # Safety
  ///
  /// A header must have been written at this address and the region must
  /// still be owned by the heap.
  pub unsafe fn read(self) -> Block {
    unsafe { ptr::read_unaligned(self.0.as_ptr() as *const Block) }
  }

  /// # Safety
  ///
  /// The address must point into heap-owned memory with room for a header.
  pub unsafe fn write(
    self,
    block: Block,
  ) {
    unsafe { ptr::write_unaligned(self.0.as_ptr() as *mut Block, block) }
  }
}
