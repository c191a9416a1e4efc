use std::ptr::NonNull;

use spin::{Mutex, MutexGuard};

use crate::{DeallocateOutcome, Heap, HeapError, brk::Break};

/// A [`Heap`] behind a spin lock, for sharing between threads or placing in
/// a `static`.
///
/// The lock never allocates, so it is safe to take from inside an
/// allocator entry point.
pub struct LockedHeap<B: Break> {
  inner: Mutex<Heap<B>>,
}

impl<B: Break> LockedHeap<B> {
  pub const fn new(heap: Heap<B>) -> Self {
    Self {
      inner: Mutex::new(heap),
    }
  }

  pub fn lock(&self) -> MutexGuard<'_, Heap<B>> {
    self.inner.lock()
  }

  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    self.lock().allocate(size)
  }

  pub fn zero_allocate(
    &self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    self.lock().zero_allocate(count, size)
  }

  pub fn deallocate(
    &self,
    ptr: *mut u8,
  ) -> DeallocateOutcome {
    self.lock().deallocate(ptr)
  }

  pub fn resize(
    &self,
    ptr: *mut u8,
    new_size: usize,
  ) -> Result<Option<NonNull<u8>>, HeapError> {
    self.lock().resize(ptr, new_size)
  }
}
