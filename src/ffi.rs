//! `malloc`-family symbols backed by the process program break.
//!
//! Enabled with the `c-abi` feature. Linking the crate into a C program (or
//! preloading it as a `cdylib`) replaces the platform allocator with a
//! single [`LockedHeap`] driving `sbrk(2)`.

use std::{ffi::c_void, ptr};

use crate::{Heap, LockedHeap, brk::Sbrk};

// SAFETY: once these symbols are exported they are the only allocator in the
// process, so nothing else moves the break under the heap.
static HEAP: LockedHeap<Sbrk> = LockedHeap::new(Heap::new(unsafe { Sbrk::new() }));

#[unsafe(no_mangle)]
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
  HEAP
    .allocate(size)
    .map_or(ptr::null_mut(), |data| data.as_ptr().cast())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn calloc(
  number: usize,
  size: usize,
) -> *mut c_void {
  HEAP
    .zero_allocate(number, size)
    .map_or(ptr::null_mut(), |data| data.as_ptr().cast())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  let _ = HEAP.deallocate(ptr.cast());
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: usize,
) -> *mut c_void {
  match HEAP.resize(ptr.cast(), size) {
    Ok(Some(data)) => data.as_ptr().cast(),
    Ok(None) | Err(_) => ptr::null_mut(),
  }
}
