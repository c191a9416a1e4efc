use std::ptr::{self, NonNull};

use log::{debug, trace};

use crate::{
  Heap, HeapError,
  align::{self, ALIGNMENT},
  block::{BlockPtr, META_SIZE},
  brk::Break,
};

impl<B: Break> Heap<B> {
  /// Changes the size of the block at `ptr` to hold `new_size` bytes.
  ///
  /// A null `ptr` allocates; a zero `new_size` frees the block and yields
  /// `None`. Otherwise the block is resized in place when it can be (by
  /// shrinking, by absorbing a free successor, or by moving the break when
  /// it is the last block) and moved otherwise, copying its contents. On
  /// failure the original block is left untouched.
  pub fn resize(
    &mut self,
    ptr: *mut u8,
    new_size: usize,
  ) -> Result<Option<NonNull<u8>>, HeapError> {
    if ptr.is_null() {
      return self.allocate(new_size).map(Some);
    }

    let at = self.lookup(ptr).ok_or(HeapError::InvalidPointer)?;
    let block = self.read(at);
    if block.free {
      return Err(HeapError::InvalidPointer);
    }

    if new_size == 0 {
      self.update(at, |block| block.free = true);
      self.release(at);
      trace!("resize({:?}, 0): freed", ptr);
      return Ok(None);
    }

    let size = align::block_size(new_size)?;

    if size <= block.size {
      self.shrink_in_place(at, size);
      trace!("resize({:?}, {}): shrunk in place", ptr, size);
      return Ok(Some(at.data()));
    }

    if self.grow_in_place(at, size) {
      trace!("resize({:?}, {}): grown in place", ptr, size);
      return Ok(Some(at.data()));
    }

    let moved = self.allocate(new_size)?;

    // SAFETY: both blocks are live and distinct; the new one holds at least
    // `size > block.size` bytes.
    unsafe { ptr::copy_nonoverlapping(at.data().as_ptr(), moved.as_ptr(), block.size) };

    self.update(at, |block| block.free = true);
    self.release(at);

    trace!("resize({:?}, {}): moved to {:?}", ptr, size, moved);
    Ok(Some(moved))
  }

  fn shrink_in_place(
    &mut self,
    at: BlockPtr,
    size: usize,
  ) {
    if self.read(at).size - size < META_SIZE + ALIGNMENT {
      return;
    }

    let rest = self.split(at, size);
    self.release(rest);
  }

  fn grow_in_place(
    &mut self,
    at: BlockPtr,
    size: usize,
  ) -> bool {
    let block = self.read(at);

    let Some(next) = block.next else {
      if self.brk.current() as usize != at.end(block.size) {
        return false;
      }

      let delta = size - block.size;
      if let Err(err) = self.brk.shift(delta as isize) {
        debug!("cannot grow tail block {:#x} by {}: {}", at.addr(), delta, err);
        return false;
      }

      self.update(at, |block| block.size = size);
      return true;
    };

    let neighbour = self.read(next);
    if !neighbour.free || block.size + META_SIZE + neighbour.size < size {
      return false;
    }

    if !self.merge_next(at) {
      return false;
    }

    if self.read(at).size - size >= META_SIZE + ALIGNMENT {
      self.split(at, size);
    }

    true
  }
}
