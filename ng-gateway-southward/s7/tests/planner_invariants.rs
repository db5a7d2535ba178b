mod common;

use common::{assert_packing_invariants, init_tracing, sizes};
use ng_driver_s7::{pack_for_read, pack_for_write, S7Error};

const TARGETS: &[usize] = &[6, 20, 33, 64, 226, 466];
const OVERHEADS: &[usize] = &[1, 4, 5, 17];
const MARGINS: &[usize] = &[0, 2, 5, 12, 30];

#[test]
fn write_packing_holds_invariants() {
    init_tracing();
    for seed in 0..40u64 {
        let input = sizes(seed, (seed % 12) as usize, 700);
        for &target in TARGETS {
            for &overhead in OVERHEADS {
                if target <= overhead {
                    assert!(matches!(
                        pack_for_write(&input, target, overhead),
                        Err(S7Error::BudgetTooSmall { .. })
                    ));
                    continue;
                }
                let groups = pack_for_write(&input, target, overhead).unwrap();
                assert_packing_invariants(&input, &groups, target);
                assert!(groups.iter().flat_map(|g| g.iter()).all(|c| c.margin == 0));
            }
        }
    }
}

#[test]
fn read_packing_holds_invariants() {
    for seed in 100..140u64 {
        let input = sizes(seed, (seed % 15) as usize, 500);
        for &target in TARGETS {
            for &overhead in OVERHEADS {
                for &margin in MARGINS {
                    if target <= overhead || target <= margin {
                        assert!(matches!(
                            pack_for_read(&input, target, overhead, margin),
                            Err(S7Error::BudgetTooSmall { .. })
                        ));
                        continue;
                    }
                    let groups = pack_for_read(&input, target, overhead, margin).unwrap();
                    assert_packing_invariants(&input, &groups, target);
                }
            }
        }
    }
}

#[test]
fn write_groups_leave_no_room_for_another_item() {
    // Every closed group except the last one has less than one overhead left.
    let input = sizes(7, 30, 300);
    let groups = pack_for_write(&input, 226, 5).unwrap();
    for g in &groups[..groups.len() - 1] {
        assert!(g.total_length() + 5 >= 226);
    }
}

#[test]
fn read_groups_respect_margin() {
    let input = sizes(11, 30, 300);
    let groups = pack_for_read(&input, 226, 5, 12).unwrap();
    for g in &groups[..groups.len() - 1] {
        assert!(g.total_length() + 12 >= 226);
    }
}

#[test]
fn small_items_share_one_group() {
    let groups = pack_for_write(&[2; 10], 226, 5).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 10);
    assert_eq!(groups[0].total_length(), 70);
    assert_eq!(groups[0].payload_length(), 20);
}

#[test]
fn oversized_item_is_split_across_groups() {
    let groups = pack_for_write(&[1000], 226, 5).unwrap();
    let chunks: Vec<usize> = groups.iter().map(|g| g.chunks()[0].chunk_size).collect();
    assert_eq!(chunks, vec![221, 221, 221, 221, 116]);
    assert!(groups.iter().all(|g| g.len() == 1));
    assert!(groups[0].chunks()[0].is_partial());
}
