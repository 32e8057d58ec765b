use nsim_runtime::{NodeIndex, PartitionTable, WorkerId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ranges_tile_the_node_sequence(nodes in 0usize..5000, workers in 1usize..64) {
        let table = PartitionTable::new(nodes, workers).unwrap();
        let ranges: Vec<_> = table.ranges().collect();

        prop_assert_eq!(ranges.len(), workers);
        let mut next = 0;
        for range in &ranges {
            prop_assert_eq!(range.start, next);
            next = range.end;
        }
        prop_assert_eq!(next, nodes);

        let total: usize = (0..workers).map(|w| table.local_count(WorkerId::new(w))).sum();
        prop_assert_eq!(total, nodes);
    }

    #[test]
    fn blocks_differ_by_at_most_one(nodes in 0usize..5000, workers in 1usize..64) {
        let table = PartitionTable::new(nodes, workers).unwrap();
        let counts: Vec<_> = (0..workers).map(|w| table.local_count(WorkerId::new(w))).collect();
        let max = counts.iter().copied().max().unwrap_or(0);
        let min = counts.iter().copied().min().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn owner_lookup_inverts_ranges(nodes in 1usize..5000, workers in 1usize..64, pick in any::<prop::sample::Index>()) {
        let table = PartitionTable::new(nodes, workers).unwrap();
        let index = pick.index(nodes);
        let owner = table.owner_of_index(NodeIndex::new(index as u32)).unwrap();
        prop_assert!(table.range(owner).contains(&index));
    }
}
