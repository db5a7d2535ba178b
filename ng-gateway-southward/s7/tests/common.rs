#![allow(dead_code)]

use ng_driver_s7::RequestGroup;
use std::sync::Once;
use tracing::Level;

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .with_test_writer()
            .without_time()
            .try_init();
    });
}

/// Deterministic pseudo-random sizes (LCG) so failures are reproducible.
pub fn sizes(seed: u64, len: usize, max: usize) -> Vec<usize> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as usize) % (max + 1)
        })
        .collect()
}

/// Check every structural guarantee of a packing result against its input.
pub fn assert_packing_invariants(sizes: &[usize], groups: &[RequestGroup], target_size: usize) {
    let ctx = format!("sizes={sizes:?} target={target_size}");

    // budget + no empty groups
    for (gi, g) in groups.iter().enumerate() {
        assert!(!g.is_empty(), "empty group {gi} ({ctx})");
        assert!(
            g.total_length() <= target_size,
            "group {gi} uses {} > {target_size} ({ctx})",
            g.total_length()
        );
        assert!(g.iter().all(|c| c.chunk_size > 0), "zero chunk in group {gi} ({ctx})");
    }

    // order: tag indexes non-decreasing, offsets strictly increasing per tag
    let flat: Vec<_> = groups.iter().flat_map(|g| g.iter()).collect();
    for w in flat.windows(2) {
        let (a, b) = (w[0], w[1]);
        assert!(a.tag_index <= b.tag_index, "tag order broken ({ctx})");
        if a.tag_index == b.tag_index {
            assert!(a.offset < b.offset, "offset order broken ({ctx})");
        }
    }

    // partition: chunks of each tag cover [0, size) exactly
    for (tag, &size) in sizes.iter().enumerate() {
        let mut next = 0usize;
        for c in flat.iter().filter(|c| c.tag_index == tag) {
            assert_eq!(c.original_size, size, "original size of tag {tag} ({ctx})");
            assert_eq!(c.offset, next, "gap/overlap in tag {tag} ({ctx})");
            next += c.chunk_size;
        }
        assert_eq!(next, size, "tag {tag} not fully covered ({ctx})");
    }
}
