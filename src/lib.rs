//! # brkalloc - A First-Fit Free-List Heap
//!
//! This crate provides a `malloc`-style allocator that manages memory directly
//! against a program break, growing it with `sbrk(2)` when no free block fits
//! and shrinking it again when the last block is freed.
//!
//! ## Overview
//!
//! Every allocation is a block: a small header followed by the data area
//! handed to the caller. Blocks are kept in a doubly-linked list in address
//! order:
//!
//! ```text
//!   Free-List Heap:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          HEAP MEMORY                                 │
//!   │                                                                      │
//!   │   ┌──────┬──────┬──────────┬──────┬───────┐                          │
//!   │   │  A1  │ free │    A3    │ free │  A5   │                          │
//!   │   └──────┴──────┴──────────┴──────┴───────┘                          │
//!   │   ▲                                       ▲                          │
//!   │   │                                       │                          │
//!   │  base                                  Program                       │
//!   │  (first header)                         Break                        │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   allocate:   first free block that fits, split if the rest is usable,
//!               otherwise move the break up and append.
//!   deallocate: mark free, merge with free neighbours, move the break
//!               down when the freed block is last.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - align! macro, block size rounding
//!   ├── block      - Block header and raw header access (internal)
//!   ├── brk        - Break trait, Sbrk and Arena providers
//!   ├── error      - HeapError, DeallocateOutcome, Corruption
//!   ├── heap       - Heap: allocate, zero_allocate, deallocate
//!   ├── resize     - Heap::resize
//!   ├── inspect    - block iteration, stats, invariant check
//!   ├── locked     - LockedHeap
//!   └── ffi        - malloc/calloc/free/realloc (feature `c-abi`)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brkalloc::{Arena, Heap};
//!
//! let mut heap = Heap::new(Arena::new(4096));
//!
//! let data = heap.allocate(5).unwrap();
//! unsafe { data.as_ptr().write(42) };
//!
//! assert!(heap.deallocate(data.as_ptr()).is_freed());
//! assert!(heap.is_empty());
//! ```
//!
//! Each block carries its own header:
//!
//! ```text
//!   Single Block:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ next, prev      │  │  │                          │  │
//!   │  │ self_ref ───────┼──┼─►│  N bytes usable          │  │
//!   │  │ free            │  │  │  (N is a multiple of 4)  │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │   META_SIZE bytes     │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! ## Limitations
//!
//! - **Single owner**: [`Heap`] needs `&mut self`; share it through
//!   [`LockedHeap`]
//! - **4-byte granularity**: data areas are 4-byte aligned relative to the
//!   first header, nothing stronger is promised
//! - **Linear search**: allocation and pointer validation walk the list
//! - **Exclusive break**: [`Sbrk`] assumes nothing else moves the program
//!   break
//!
//! ## Logging
//!
//! The heap reports through the `log` facade. A logger that allocates must
//! not be installed while this crate serves the process allocator.

pub mod align;
mod block;
pub mod brk;
mod error;
#[cfg(feature = "c-abi")]
pub mod ffi;
mod heap;
mod inspect;
mod locked;
mod resize;

pub use align::{ALIGNMENT, MIN_BLOCK_SIZE};
pub use block::META_SIZE;
pub use brk::{Arena, Break, Sbrk};
pub use error::{Corruption, DeallocateOutcome, HeapError};
pub use heap::Heap;
pub use inspect::{BlockInfo, Blocks, HeapStats};
pub use locked::LockedHeap;
