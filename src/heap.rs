use std::ptr::{self, NonNull};

use log::{debug, trace, warn};

use crate::{
  DeallocateOutcome, HeapError,
  align::{self, ALIGNMENT},
  block::{Block, BlockPtr, META_SIZE},
  brk::Break,
};

/// First-fit free-list heap growing and shrinking through a [`Break`].
///
/// Blocks sit back to back from the first header up to the break. They are
/// linked in address order, so the list doubles as the physical layout.
///
/// ```text
///   base                                                      break
///    │                                                          │
///    ▼                                                          ▼
///   ┌──────┬──────────┬──────┬──────────────┬──────┬───────────┐
///   │ hdr  │ data     │ hdr  │ data (free)  │ hdr  │ data      │
///   └──────┴──────────┴──────┴──────────────┴──────┴───────────┘
///      └──── next ────►  ◄───┘└──── next ────►  ◄───┘
///                      prev                    prev
/// ```
pub struct Heap<B: Break> {
  pub(crate) brk: B,
  pub(crate) base: Option<BlockPtr>,
}

// The raw headers are only reachable through the heap that owns them.
unsafe impl<B: Break + Send> Send for Heap<B> {}

impl<B: Break> Heap<B> {
  pub const fn new(brk: B) -> Self {
    Self { brk, base: None }
  }

  /// The heap-growth provider backing this heap.
  pub fn provider(&self) -> &B {
    &self.brk
  }

  pub fn break_addr(&self) -> *mut u8 {
    self.brk.current()
  }

  /// `true` when no block exists and the heap occupies zero bytes.
  pub fn is_empty(&self) -> bool {
    self.base.is_none()
  }

  /// Reserves at least `size` bytes and returns the start of the data area.
  ///
  /// The request is rounded up to a multiple of four. The first free block
  /// large enough is reused, split when the leftover can hold a header and
  /// four bytes. When nothing fits, the break is moved to append a new block.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    let size = align::block_size(size)?;

    let at = match self.base {
      None => {
        let at = self.extend(None, size)?;
        self.base = Some(at);
        at
      }
      Some(base) => match self.find_fit(base, size) {
        (Some(at), _) => {
          self.claim(at, size);
          at
        }
        (None, last) => self.extend(Some(last), size)?,
      },
    };

    trace!("allocate({}) -> {:?}", size, at.data());
    Ok(at.data())
  }

  /// Like [`Heap::allocate`] for `count * size` bytes, with exactly that many
  /// bytes zeroed.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    let bytes = count.checked_mul(size).ok_or(HeapError::SizeOverflow)?;
    let data = self.allocate(bytes)?;

    // SAFETY: the block behind `data` holds at least `bytes` bytes.
    unsafe { ptr::write_bytes(data.as_ptr(), 0, bytes) };

    Ok(data)
  }

  /// Returns a block to the heap.
  ///
  /// Pointers that are not the data address of a block are ignored, as are
  /// blocks that are already free. A freed block absorbs a free predecessor
  /// and then a free successor; if it ends up last, the break is moved back
  /// to its header.
  pub fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) -> DeallocateOutcome {
    let Some(at) = self.lookup(ptr) else {
      trace!("deallocate({:?}): not a block of this heap", ptr);
      return DeallocateOutcome::InvalidPointer;
    };

    let mut block = self.read(at);
    if block.free {
      trace!("deallocate({:?}): already free", ptr);
      return DeallocateOutcome::AlreadyFree;
    }

    block.free = true;
    self.write(at, block);
    self.release(at);

    trace!("deallocate({:?})", ptr);
    DeallocateOutcome::Freed
  }

  /// Finds the block whose data area starts exactly at `ptr`.
  ///
  /// Membership is established by walking the list, so an arbitrary pointer
  /// is never dereferenced.
  pub(crate) fn lookup(
    &self,
    ptr: *mut u8,
  ) -> Option<BlockPtr> {
    let base = self.base?;
    let addr = ptr as usize;

    if addr <= base.addr() || addr >= self.brk.current() as usize {
      return None;
    }

    let mut current = Some(base);
    while let Some(at) = current {
      if at.addr() >= addr {
        break;
      }

      let block = self.read(at);
      if at.data().as_ptr() as usize == addr {
        return (block.self_ref == ptr).then_some(at);
      }
      current = block.next;
    }

    None
  }

  fn find_fit(
    &self,
    base: BlockPtr,
    size: usize,
  ) -> (Option<BlockPtr>, BlockPtr) {
    let mut last = base;
    let mut current = Some(base);

    while let Some(at) = current {
      let block = self.read(at);
      if block.free && block.size >= size {
        return (Some(at), last);
      }
      last = at;
      current = block.next;
    }

    (None, last)
  }

  fn claim(
    &mut self,
    at: BlockPtr,
    size: usize,
  ) {
    if self.read(at).size - size >= META_SIZE + ALIGNMENT {
      self.split(at, size);
    }
    self.update(at, |block| block.free = false);
  }

  /// Shrinks the block at `at` to `size` bytes and turns the trailing space
  /// into a new free block, which is returned.
  ///
  /// The caller guarantees the block has at least `size + META_SIZE` bytes.
  pub(crate) fn split(
    &mut self,
    at: BlockPtr,
    size: usize,
  ) -> BlockPtr {
    let mut block = self.read(at);

    // SAFETY: `size + META_SIZE <= block.size`.
    let rest = unsafe { at.carve(size) };
    let mut remainder = Block::new(rest, block.size - size - META_SIZE, true);
    remainder.prev = Some(at);
    remainder.next = block.next;
    self.write(rest, remainder);

    if let Some(next) = block.next {
      self.update(next, |next| next.prev = Some(rest));
    }

    block.next = Some(rest);
    block.size = size;
    self.write(at, block);

    rest
  }

  fn extend(
    &mut self,
    last: Option<BlockPtr>,
    size: usize,
  ) -> Result<BlockPtr, HeapError> {
    let total = META_SIZE + size;
    let at = BlockPtr::new(self.brk.shift(total as isize)?);

    let mut block = Block::new(at, size, false);
    block.prev = last;
    self.write(at, block);

    if let Some(last) = last {
      self.update(last, |last| last.next = Some(at));
    }

    debug!("heap grew by {} bytes, new block at {:#x}", total, at.addr());
    Ok(at)
  }

  /// Coalesces a block that was just marked free with its neighbours and
  /// hands it back to the break when it is the last one.
  pub(crate) fn release(
    &mut self,
    at: BlockPtr,
  ) {
    let mut at = at;

    if let Some(prev) = self.read(at).prev {
      if self.read(prev).free && self.merge_next(prev) {
        at = prev;
      }
    }

    self.merge_next(at);

    if self.read(at).next.is_none() {
      self.trim(at);
    }
  }

  /// Absorbs the successor of `at` when it is free and physically contiguous.
  pub(crate) fn merge_next(
    &mut self,
    at: BlockPtr,
  ) -> bool {
    let mut block = self.read(at);
    let Some(next) = block.next else {
      return false;
    };

    let absorbed = self.read(next);
    if !absorbed.free || at.end(block.size) != next.addr() {
      return false;
    }

    block.size += META_SIZE + absorbed.size;
    block.next = absorbed.next;
    self.write(at, block);

    if let Some(after) = absorbed.next {
      self.update(after, |after| after.prev = Some(at));
    }

    true
  }

  /// Moves the break back to the header of the free tail block `at`.
  fn trim(
    &mut self,
    at: BlockPtr,
  ) {
    let block = self.read(at);

    if self.brk.current() as usize != at.end(block.size) {
      warn!("break moved past block {:#x}, keeping it as a free tail", at.addr());
      return;
    }

    let total = META_SIZE + block.size;
    if let Err(err) = self.brk.shift(-(total as isize)) {
      warn!("cannot return {} bytes at {:#x}: {}", total, at.addr(), err);
      return;
    }

    match block.prev {
      Some(prev) => self.update(prev, |prev| prev.next = None),
      None => self.base = None,
    }

    debug!("heap shrank by {} bytes to {:#x}", total, at.addr());
  }

  pub(crate) fn read(
    &self,
    at: BlockPtr,
  ) -> Block {
    // SAFETY: every `BlockPtr` the heap handles was taken from its own list
    // or carved inside a listed block, so a header lives there.
    unsafe { at.read() }
  }

  pub(crate) fn write(
    &mut self,
    at: BlockPtr,
    block: Block,
  ) {
    // SAFETY: as for `read`; the address lies below the break.
    unsafe { at.write(block) }
  }

  pub(crate) fn update(
    &mut self,
    at: BlockPtr,
    f: impl FnOnce(&mut Block),
  ) {
    let mut block = self.read(at);
    f(&mut block);
    self.write(at, block);
  }
}
