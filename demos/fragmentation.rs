use anyhow::Result;
use log::info;
use sycorax::Allocator;

fn main() -> Result<()> {
    std::env::set_var("RUST_LOG", "debug");
    pretty_env_logger::init();

    // A 100-byte arena, owned by us and merely borrowed by the
    // allocator.
    let mut arena = [0u8; 100];
    let mut heap = Allocator::new(&mut arena);

    // Two doomed blocks at the front of the arena, and a
    // survivor right behind them.
    let h1 = heap.allocate(30)?;
    let h2 = heap.allocate(20)?;
    let survivor = heap.allocate(25)?;
    heap.block_mut(survivor)
        .expect("survivor is live")
        .fill(0x5a);
    info!(
        "allocated blocks at {:?}, {:?}, {:?}",
        heap.resolve(h1),
        heap.resolve(h2),
        heap.resolve(survivor),
    );

    // Releasing the first two front-to-back fragments the free
    // space: neither freed block has a free region *after* it
    // to merge with, and nothing coalesces backwards. Two
    // adjacent free regions remain in front of the survivor.
    heap.release(h1)?;
    heap.release(h2)?;
    info!("after releases:\n{}", heap.dump());

    // Compaction slides the survivor to the front and folds
    // all free space into one trailing region. The handle
    // resolves to the new offset by itself; the payload bytes
    // came along.
    heap.compact();
    info!("after compaction:\n{}", heap.dump());
    info!("survivor now at {:?}", heap.resolve(survivor));
    assert_eq!(heap.block(survivor), Some(&[0x5a; 25][..]));

    Ok(())
}
