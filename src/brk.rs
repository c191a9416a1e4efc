//! Heap-growth providers.
//!
//! A [`Break`] is the only thing the heap uses to obtain or return memory. It
//! models the classic program break: a single upper boundary that can be read
//! and moved by a signed delta.

use std::ptr::{self, NonNull};

use libc::{c_void, intptr_t, sbrk};
use log::debug;

use crate::HeapError;

/// A movable upper boundary of a contiguous memory region.
///
/// # Safety
///
/// Implementors must guarantee that after a successful `shift(delta)` with a
/// positive `delta`, the `delta` bytes starting at the returned address are
/// readable, writable and owned by the caller until the break is moved back
/// below them.
pub unsafe trait Break {
  /// Current break address. Has no side effect.
  fn current(&self) -> *mut u8;

  /// Moves the break by `delta` bytes and returns the previous break.
  fn shift(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, HeapError>;
}

/// The process program break, driven through `sbrk(2)`.
#[derive(Debug)]
pub struct Sbrk {
  _private: (),
}

impl Sbrk {
  /// # Safety
  ///
  /// Nothing else in the process may shrink the program break below memory
  /// handed out by this heap, and only one heap may drive it. In practice this
  /// means the platform allocator must not be using `brk` concurrently.
  pub const unsafe fn new() -> Self {
    Self { _private: () }
  }
}

unsafe impl Break for Sbrk {
  fn current(&self) -> *mut u8 {
    unsafe { sbrk(0) as *mut u8 }
  }

  fn shift(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, HeapError> {
    let previous = unsafe { sbrk(delta as intptr_t) };

    if previous == usize::MAX as *mut c_void {
      debug!("sbrk({}) failed", delta);
      return Err(HeapError::OutOfMemory);
    }

    debug!("program break moved by {} from {:?}", delta, previous);
    NonNull::new(previous as *mut u8).ok_or(HeapError::OutOfMemory)
  }
}

/// A private, fixed-capacity region with a simulated break.
///
/// Useful when the real program break is off limits: tests, demos, or a heap
/// carved out of memory obtained some other way.
#[derive(Debug)]
pub struct Arena {
  start: NonNull<u8>,
  capacity: usize,
  offset: usize,
}

impl Arena {
  pub fn new(capacity: usize) -> Self {
    let region: Box<[u8]> = vec![0; capacity.max(1)].into_boxed_slice();
    let start = NonNull::new(Box::into_raw(region) as *mut u8).unwrap_or(NonNull::dangling());

    Self {
      start,
      capacity,
      offset: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Start of the region. The first block of a heap built on this arena
  /// lives here.
  pub fn start(&self) -> NonNull<u8> {
    self.start
  }

  /// Bytes currently below the break.
  pub fn used(&self) -> usize {
    self.offset
  }
}

unsafe impl Break for Arena {
  fn current(&self) -> *mut u8 {
    self.start.as_ptr().wrapping_add(self.offset)
  }

  fn shift(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, HeapError> {
    let offset = self
      .offset
      .checked_add_signed(delta)
      .filter(|&offset| offset <= self.capacity)
      .ok_or(HeapError::OutOfMemory)?;

    // SAFETY: `self.offset <= capacity`, so this stays inside the region.
    let previous = unsafe { self.start.add(self.offset) };
    self.offset = offset;

    Ok(previous)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    let region = ptr::slice_from_raw_parts_mut(self.start.as_ptr(), self.capacity.max(1));
    drop(unsafe { Box::from_raw(region) });
  }
}

unsafe impl Send for Arena {}
