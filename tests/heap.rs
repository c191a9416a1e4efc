use std::{ptr::NonNull, slice};

use brkalloc::{Arena, BlockInfo, DeallocateOutcome, Heap, HeapError, META_SIZE};

fn heap() -> Heap<Arena> {
  Heap::new(Arena::new(64 * 1024))
}

fn snapshot(heap: &Heap<Arena>) -> Vec<BlockInfo> {
  heap.blocks().collect()
}

fn bytes<'a>(
  data: NonNull<u8>,
  len: usize,
) -> &'a mut [u8] {
  unsafe { slice::from_raw_parts_mut(data.as_ptr(), len) }
}

#[test]
fn five_bytes_reserve_an_eight_byte_block() {
  let mut heap = heap();

  let data = heap.allocate(5).unwrap();

  let blocks = snapshot(&heap);
  assert_eq!(blocks.len(), 1);
  assert_eq!(blocks[0].data, data);
  assert_eq!(blocks[0].size, 8);
}

#[test]
fn every_size_is_aligned_and_large_enough() {
  let mut heap = heap();

  for size in 0..100 {
    let data = heap.allocate(size).unwrap();
    let block = heap.blocks().find(|block| block.data == data).unwrap();

    assert_eq!(block.size % 4, 0);
    assert!(block.size >= size);
    assert!(!block.free);
  }
  heap.check().unwrap();
}

#[test]
fn zero_byte_requests_get_distinct_blocks() {
  let mut heap = heap();

  let a = heap.allocate(0).unwrap();
  let b = heap.allocate(0).unwrap();

  assert_ne!(a, b);
  assert_eq!(heap.deallocate(a.as_ptr()), DeallocateOutcome::Freed);
  assert_eq!(heap.deallocate(b.as_ptr()), DeallocateOutcome::Freed);
  assert!(heap.is_empty());
}

#[test]
fn freeing_the_tail_restores_the_break() {
  let mut heap = heap();

  heap.allocate(10).unwrap();
  let before = heap.break_addr();

  let data = heap.allocate(100).unwrap();
  assert_eq!(heap.break_addr(), before.wrapping_add(META_SIZE + 100));

  assert!(heap.deallocate(data.as_ptr()).is_freed());
  assert_eq!(heap.break_addr(), before);
}

#[test]
fn first_fit_reuses_the_freed_first_block() {
  let mut heap = heap();

  let first = heap.allocate(10).unwrap();
  heap.allocate(10).unwrap();
  assert!(heap.deallocate(first.as_ptr()).is_freed());
  let before = heap.break_addr();

  let reused = heap.allocate(4).unwrap();

  assert_eq!(reused, first);
  assert_eq!(heap.break_addr(), before);
  heap.check().unwrap();
}

#[test]
fn last_free_empties_the_heap() {
  let mut heap = heap();
  let start = heap.break_addr();

  let first = heap.allocate(64).unwrap();
  assert!(heap.deallocate(first.as_ptr()).is_freed());

  assert!(heap.is_empty());
  assert_eq!(heap.break_addr(), start);
  assert_eq!(heap.provider().used(), 0);

  // The next allocation behaves like the very first one.
  assert_eq!(heap.allocate(64).unwrap(), first);
}

#[test]
fn invalid_free_changes_nothing() {
  let mut heap = heap();

  let a = heap.allocate(16).unwrap();
  let b = heap.allocate(16).unwrap();
  heap.allocate(16).unwrap();
  assert!(heap.deallocate(b.as_ptr()).is_freed());

  let blocks = snapshot(&heap);
  let brk = heap.break_addr();
  let mut foreign = 0u64;

  for ptr in [
    std::ptr::null_mut(),
    &mut foreign as *mut u64 as *mut u8,
    a.as_ptr().wrapping_add(1),
    a.as_ptr().wrapping_sub(META_SIZE),
    brk,
    brk.wrapping_add(64),
  ] {
    assert_eq!(heap.deallocate(ptr), DeallocateOutcome::InvalidPointer);
  }

  assert_eq!(snapshot(&heap), blocks);
  assert_eq!(heap.break_addr(), brk);
}

#[test]
fn repeated_free_is_reported_and_ignored() {
  let mut heap = heap();

  let a = heap.allocate(16).unwrap();
  let b = heap.allocate(16).unwrap();
  heap.allocate(16).unwrap();

  assert!(heap.deallocate(a.as_ptr()).is_freed());
  let blocks = snapshot(&heap);
  assert_eq!(heap.deallocate(a.as_ptr()), DeallocateOutcome::AlreadyFree);
  assert_eq!(snapshot(&heap), blocks);

  // Once merged into its neighbour the block no longer exists at all.
  assert!(heap.deallocate(b.as_ptr()).is_freed());
  assert_eq!(heap.deallocate(b.as_ptr()), DeallocateOutcome::InvalidPointer);
  heap.check().unwrap();
}

#[test]
fn zero_allocate_clears_exactly_the_requested_span() {
  let mut heap = heap();

  let a = heap.allocate(8).unwrap();
  heap.allocate(4).unwrap();
  bytes(a, 8).fill(0xAB);
  assert!(heap.deallocate(a.as_ptr()).is_freed());

  let zeroed = heap.zero_allocate(7, 1).unwrap();

  assert_eq!(zeroed, a);
  assert_eq!(bytes(zeroed, 8), &[0, 0, 0, 0, 0, 0, 0, 0xAB]);
}

#[test]
fn zero_allocate_of_elements_is_zeroed() {
  let mut heap = heap();

  let data = heap.zero_allocate(16, 12).unwrap();

  assert!(bytes(data, 16 * 12).iter().all(|&byte| byte == 0));
}

#[test]
fn zero_allocate_rejects_overflowing_counts() {
  let mut heap = heap();

  assert_eq!(heap.zero_allocate(usize::MAX, 2), Err(HeapError::SizeOverflow));
  assert_eq!(heap.zero_allocate(usize::MAX / 2 + 1, 2), Err(HeapError::SizeOverflow));
  assert_eq!(heap.allocate(usize::MAX), Err(HeapError::SizeOverflow));
  assert!(heap.is_empty());
}

#[test]
fn out_of_memory_is_an_error_not_a_panic() {
  let mut heap = Heap::new(Arena::new(128));

  assert_eq!(heap.allocate(4096), Err(HeapError::OutOfMemory));
  assert!(heap.is_empty());
  assert_eq!(heap.provider().used(), 0);
}

#[test]
fn allocations_stay_put_while_neighbours_change() {
  let mut heap = heap();

  let a = heap.allocate(300).unwrap();
  let keep = heap.allocate(24).unwrap();
  heap.allocate(8).unwrap();
  bytes(keep, 24).copy_from_slice(&[7; 24]);

  assert!(heap.deallocate(a.as_ptr()).is_freed());
  let small = heap.allocate(40).unwrap();
  let other = heap.allocate(40).unwrap();
  bytes(small, 40).fill(1);
  bytes(other, 40).fill(2);

  assert_eq!(small, a);
  assert!(heap.blocks().any(|block| block.data == keep && !block.free));
  assert_eq!(bytes(keep, 24), &[7; 24]);
  heap.check().unwrap();
}

#[test]
fn round_trip_keeps_the_list_consistent() {
  let mut heap = heap();

  heap.allocate(32).unwrap();
  for _ in 0..10 {
    let data = heap.allocate(48).unwrap();
    bytes(data, 48).fill(0x5A);
    heap.allocate(8).unwrap();
    assert!(heap.deallocate(data.as_ptr()).is_freed());

    let again = heap.allocate(48).unwrap();
    assert_eq!(again, data);
    assert!(heap.deallocate(again.as_ptr()).is_freed());
    heap.check().unwrap();
  }
}

/// xorshift64, enough to drive a reproducible workload.
struct Rng(u64);

impl Rng {
  fn next(&mut self) -> u64 {
    self.0 ^= self.0 << 13;
    self.0 ^= self.0 >> 7;
    self.0 ^= self.0 << 17;
    self.0
  }

  fn below(
    &mut self,
    n: usize,
  ) -> usize {
    (self.next() % n as u64) as usize
  }
}

#[test]
fn mixed_workload_preserves_invariants() {
  let mut heap = Heap::new(Arena::new(1 << 20));
  let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
  let mut live: Vec<(NonNull<u8>, usize, u8)> = Vec::new();

  for step in 0..2000 {
    match rng.below(4) {
      0 | 1 => {
        let len = rng.below(200);
        if let Ok(data) = heap.allocate(len) {
          let tag = step as u8;
          bytes(data, len).fill(tag);
          live.push((data, len, tag));
        }
      }
      2 if !live.is_empty() => {
        let (data, _, _) = live.swap_remove(rng.below(live.len()));
        assert_eq!(heap.deallocate(data.as_ptr()), DeallocateOutcome::Freed);
      }
      3 if !live.is_empty() => {
        let index = rng.below(live.len());
        let (data, len, tag) = live[index];
        let new_len = rng.below(300) + 1;
        if let Ok(Some(resized)) = heap.resize(data.as_ptr(), new_len) {
          assert!(bytes(resized, len.min(new_len)).iter().all(|&byte| byte == tag));
          bytes(resized, new_len).fill(tag);
          live[index] = (resized, new_len, tag);
        }
      }
      _ => {}
    }

    heap.check().unwrap();
  }

  for (data, len, tag) in &live {
    assert!(bytes(*data, *len).iter().all(|byte| byte == tag));
  }
  for (data, _, _) in live.drain(..) {
    assert!(heap.deallocate(data.as_ptr()).is_freed());
  }

  assert!(heap.is_empty());
  assert_eq!(heap.provider().used(), 0);
}
