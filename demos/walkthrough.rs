use brkalloc::{Arena, Heap};

/// Prints the break and the block totals after a step.
fn print_state(
  label: &str,
  heap: &Heap<Arena>,
) {
  let stats = heap.stats();
  println!(
    "[{}] break = {:?} (+{} bytes), {} blocks, {} free, {} bytes in use",
    label,
    heap.break_addr(),
    heap.provider().used(),
    stats.blocks,
    stats.free_blocks,
    stats.used_bytes,
  );
  heap.dump();
}

fn main() {
  // RUST_LOG=trace shows every allocate/free, debug shows break movement
  // and the block layout after each step.
  env_logger::init();

  let mut heap = Heap::new(Arena::new(64 * 1024));
  print_state("start", &heap);

  // --------------------------------------------------------------------
  // 1) A 5-byte request is rounded up to an 8-byte block.
  // --------------------------------------------------------------------
  let first = heap.allocate(5).expect("arena has room");
  unsafe { first.as_ptr().write_bytes(0xAB, 5) };
  println!("\n[1] allocate(5) -> {:?}", first);
  print_state("1", &heap);

  // --------------------------------------------------------------------
  // 2) Two more blocks; the middle one is freed and stays in the list.
  // --------------------------------------------------------------------
  let second = heap.allocate(10).expect("arena has room");
  let third = heap.allocate(10).expect("arena has room");
  let _ = heap.deallocate(second.as_ptr());
  println!("\n[2] allocate(10) twice, free {:?}", second);
  print_state("2", &heap);

  // --------------------------------------------------------------------
  // 3) First fit: a 4-byte request reuses the freed block instead of
  //    moving the break.
  // --------------------------------------------------------------------
  let fourth = heap.allocate(4).expect("arena has room");
  println!(
    "\n[3] allocate(4) -> {:?}, reused freed block: {}",
    fourth,
    fourth == second
  );
  print_state("3", &heap);

  // --------------------------------------------------------------------
  // 4) A large tail block is returned to the break when freed.
  // --------------------------------------------------------------------
  let before = heap.break_addr();
  let big = heap.allocate(16 * 1024).expect("arena has room");
  print_state("4 grown", &heap);
  let _ = heap.deallocate(big.as_ptr());
  println!("\n[4] break restored after freeing the tail: {}", heap.break_addr() == before);
  print_state("4 shrunk", &heap);

  // --------------------------------------------------------------------
  // 5) Zeroed allocation and an in-place resize of the tail.
  // --------------------------------------------------------------------
  let zeroed = heap.zero_allocate(8, 4).expect("arena has room");
  let grown = heap
    .resize(zeroed.as_ptr(), 256)
    .expect("arena has room")
    .expect("non-zero size");
  println!("\n[5] zero_allocate(8, 4) -> {:?}, resized in place: {}", zeroed, grown == zeroed);
  print_state("5", &heap);

  // --------------------------------------------------------------------
  // 6) Freeing everything empties the heap.
  // --------------------------------------------------------------------
  for ptr in [first, third, fourth, grown] {
    let _ = heap.deallocate(ptr.as_ptr());
  }
  println!("\n[6] heap empty: {}", heap.is_empty());
  print_state("end", &heap);
}
