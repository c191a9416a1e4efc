//! Read-only views of the block list.

use std::ptr::NonNull;

use log::debug;

use crate::{
  Corruption, Heap,
  align::{ALIGNMENT, MIN_BLOCK_SIZE},
  block::{Block, BlockPtr, META_SIZE},
  brk::Break,
};

/// Snapshot of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  /// Address of the block header.
  pub header: usize,
  pub data: NonNull<u8>,
  pub size: usize,
  pub free: bool,
}

/// Iterator over the blocks of a heap in address order.
pub struct Blocks<'a, B: Break> {
  heap: &'a Heap<B>,
  current: Option<BlockPtr>,
}

impl<B: Break> Iterator for Blocks<'_, B> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let at = self.current?;
    let block = self.heap.read(at);
    self.current = block.next;

    Some(BlockInfo {
      header: at.addr(),
      data: at.data(),
      size: block.size,
      free: block.free,
    })
  }
}

/// Totals over the block list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub blocks: usize,
  pub free_blocks: usize,
  pub used_bytes: usize,
  pub free_bytes: usize,
  /// Bytes below the break owned by the heap, headers included.
  pub heap_bytes: usize,
}

impl<B: Break> Heap<B> {
  pub fn blocks(&self) -> Blocks<'_, B> {
    Blocks {
      heap: self,
      current: self.base,
    }
  }

  pub fn stats(&self) -> HeapStats {
    self.blocks().fold(HeapStats::default(), |mut stats, block| {
      stats.blocks += 1;
      stats.heap_bytes += META_SIZE + block.size;
      if block.free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
      } else {
        stats.used_bytes += block.size;
      }
      stats
    })
  }

  /// Walks the list and verifies its structural invariants: mutual links,
  /// strictly increasing non-overlapping addresses, matching self
  /// references, aligned sizes, every block below the break, and no two
  /// contiguous free blocks.
  pub fn check(&self) -> Result<(), Corruption> {
    let limit = self.brk.current() as usize;
    let mut previous: Option<(BlockPtr, Block)> = None;
    let mut current = self.base;

    while let Some(at) = current {
      let block = self.read(at);
      let corrupt = |reason| Corruption { at: at.addr(), reason };

      if block.self_ref != at.data().as_ptr() {
        return Err(corrupt("self reference does not match data address"));
      }
      if block.size % ALIGNMENT != 0 || block.size < MIN_BLOCK_SIZE {
        return Err(corrupt("size is not a positive multiple of the alignment"));
      }
      if at.end(block.size) > limit {
        return Err(corrupt("block extends past the break"));
      }

      match previous {
        None if block.prev.is_some() => return Err(corrupt("first block has a predecessor")),
        None => {}
        Some((prev_at, prev)) => {
          if block.prev != Some(prev_at) {
            return Err(corrupt("back link does not match predecessor"));
          }
          if prev_at.end(prev.size) > at.addr() {
            return Err(corrupt("block overlaps or precedes its predecessor"));
          }
          if prev.free && block.free && prev_at.end(prev.size) == at.addr() {
            return Err(corrupt("two adjacent free blocks"));
          }
        }
      }

      previous = Some((at, block));
      current = block.next;
    }

    Ok(())
  }

  /// Logs the current layout at debug level.
  pub fn dump(&self) {
    debug!("heap layout, program break = {:?}", self.brk.current());
    for block in self.blocks() {
      debug!(
        "  {:#x}: {} bytes at {:?} ({})",
        block.header,
        block.size,
        block.data,
        if block.free { "free" } else { "in use" }
      );
    }
  }
}
