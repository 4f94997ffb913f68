// THEORY:
// The `RegionMerger` is the engine of the spatial grouping layer. It reduces
// the raw marker list, often thousands of near-identical 2x2 footprints,
// into a handful of consolidated cluster rectangles.
//
// Algorithm steps:
// 1.  **Seeding**: markers are walked in input (row-major) order. The first
//     unvisited marker becomes the seed of a new cluster rectangle.
// 2.  **Fixed-point absorption**: the cluster repeatedly absorbs any
//     unvisited marker whose gap distance to the *current* cluster bounds is
//     strictly under the merge distance, unioning the marker's footprint into
//     the bounds. Passes repeat until one completes without an absorption, so
//     a marker far from the original seed can still join once the cluster has
//     grown toward it. Growth is transitive, not just adjacent-to-seed.
// 3.  **Emission**: each finalized cluster is emitted once, in seed discovery
//     order. Every marker lands in exactly one cluster; the visited flags
//     make the grouping a partition rather than a fuzzy cover.
//
// A brute-force absorption pass rescans the whole marker list and degrades
// quadratically (or worse across passes) on tens of thousands of markers, so
// passes consult a uniform grid over the marker anchors instead: a cluster
// can only absorb markers anchored inside its bounds grown by the merge
// distance plus one footprint, and only the cells under that window are
// walked. The exact gap predicate still decides every merge, which keeps the
// result identical to the full rescan.

use std::collections::HashMap;

use crate::core_modules::marker::DiffMarker;
use crate::core_modules::rect::Rect;

pub mod region_merger {
    use super::*; // Make structs from parent module available.

    /// The main function of the spatial grouping layer.
    /// Merges markers into cluster rectangles; markers closer than
    /// `merge_distance` to a cluster's current bounds are absorbed into it.
    pub fn merge_markers(markers: &[DiffMarker], merge_distance: u32) -> Vec<Rect> {
        if markers.is_empty() {
            return Vec::new();
        }

        let index = MarkerIndex::build(markers, merge_distance);
        let mut visited = vec![false; markers.len()];
        let mut clusters: Vec<Rect> = Vec::new();

        for seed in 0..markers.len() {
            if visited[seed] {
                continue;
            }

            let mut cluster = markers[seed].bounds;
            visited[seed] = true;

            let mut absorbed_something = true;
            while absorbed_something {
                absorbed_something = false;
                for candidate in index.candidates_near(&cluster) {
                    if !visited[candidate]
                        && cluster.gap_distance(&markers[candidate].bounds)
                            < merge_distance as f64
                    {
                        cluster = cluster.union(&markers[candidate].bounds);
                        visited[candidate] = true;
                        absorbed_something = true;
                    }
                }
            }

            clusters.push(cluster);
        }

        log::trace!(
            "merged {} markers into {} clusters at distance {}",
            markers.len(),
            clusters.len(),
            merge_distance
        );
        clusters
    }

    /// Uniform grid over marker anchor coordinates, bucketed at the merge
    /// distance. Queries walk the cell window in row-major order, so each
    /// absorption pass visits candidates deterministically.
    struct MarkerIndex {
        cell: u32,
        reach: u32,
        buckets: HashMap<(u32, u32), Vec<usize>>,
    }

    impl MarkerIndex {
        fn build(markers: &[DiffMarker], merge_distance: u32) -> Self {
            let cell = merge_distance.max(1);
            let mut reach = merge_distance;
            let mut buckets: HashMap<(u32, u32), Vec<usize>> = HashMap::new();

            for (i, marker) in markers.iter().enumerate() {
                // A footprint's anchor can trail its far edge by the footprint
                // size, so the query window must reach that much further.
                reach = reach.max(merge_distance + marker.bounds.width.max(marker.bounds.height));
                buckets
                    .entry((marker.x / cell, marker.y / cell))
                    .or_default()
                    .push(i);
            }

            Self {
                cell,
                reach,
                buckets,
            }
        }

        /// Indices of every marker anchored within `rect` grown by the index
        /// reach. A superset of the mergeable markers; the caller applies the
        /// exact gap check.
        fn candidates_near(&self, rect: &Rect) -> Vec<usize> {
            let min_cx = rect.left.saturating_sub(self.reach) / self.cell;
            let min_cy = rect.top.saturating_sub(self.reach) / self.cell;
            let max_cx = (rect.right() + self.reach) / self.cell;
            let max_cy = (rect.bottom() + self.reach) / self.cell;

            let mut found = Vec::new();
            for cy in min_cy..=max_cy {
                for cx in min_cx..=max_cx {
                    if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                        found.extend_from_slice(bucket);
                    }
                }
            }
            found
        }
    }
}

#[cfg(test)]
mod tests {
    use super::region_merger::*;
    use crate::core_modules::marker::DiffMarker;
    use crate::core_modules::rect::Rect;

    fn marker(x: u32, y: u32) -> DiffMarker {
        DiffMarker::new(x, y, 2)
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge_markers(&[], 15).is_empty());
    }

    #[test]
    fn single_marker_becomes_its_own_cluster() {
        let clusters = merge_markers(&[marker(1, 1)], 15);
        assert_eq!(clusters, vec![Rect::new(1, 1, 2, 2)]);
    }

    #[test]
    fn close_markers_merge_into_one_cluster() {
        let clusters = merge_markers(&[marker(0, 0), marker(4, 0)], 5);
        assert_eq!(clusters, vec![Rect::new(0, 0, 6, 2)]);
    }

    #[test]
    fn far_markers_stay_separate() {
        // Footprints (0,0,2,2) and (8,8,2,2): gap = sqrt(36 + 36) > 5.
        let clusters = merge_markers(&[marker(0, 0), marker(8, 8)], 5);
        assert_eq!(
            clusters,
            vec![Rect::new(0, 0, 2, 2), Rect::new(8, 8, 2, 2)]
        );
    }

    #[test]
    fn growth_is_transitive_through_a_chain() {
        // Each link is within range of its neighbor only; the last marker is
        // far from the seed but joins once the cluster has grown toward it.
        let chain = [marker(0, 0), marker(5, 0), marker(10, 0), marker(15, 0)];
        let clusters = merge_markers(&chain, 5);
        assert_eq!(clusters, vec![Rect::new(0, 0, 17, 2)]);
    }

    #[test]
    fn chain_merges_regardless_of_seed_position() {
        // Same chain with the seed in the middle; the fixed-point loop picks
        // up both arms.
        let chain = [marker(10, 0), marker(5, 0), marker(0, 0), marker(15, 0)];
        let clusters = merge_markers(&chain, 5);
        assert_eq!(clusters, vec![Rect::new(0, 0, 17, 2)]);
    }

    #[test]
    fn merge_distance_is_strict() {
        // Gap between (0,0,2,2) and (7,0,2,2) is exactly 5.
        let markers = [marker(0, 0), marker(7, 0)];
        assert_eq!(merge_markers(&markers, 5).len(), 2);
        assert_eq!(merge_markers(&markers, 6).len(), 1);
    }

    #[test]
    fn zero_merge_distance_keeps_every_marker_separate() {
        let markers = [marker(0, 0), marker(1, 1), marker(2, 2)];
        assert_eq!(merge_markers(&markers, 0).len(), 3);
    }

    #[test]
    fn raising_merge_distance_never_adds_clusters() {
        let markers: Vec<DiffMarker> = (0..10)
            .flat_map(|i| [marker(i * 11, 0), marker(i * 11, 40)])
            .collect();

        let mut previous = usize::MAX;
        for distance in [1, 5, 12, 30, 100] {
            let count = merge_markers(&markers, distance).len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn clusters_partition_the_markers() {
        let markers: Vec<DiffMarker> = [
            (0, 0),
            (3, 1),
            (1, 4),
            (40, 40),
            (44, 43),
            (90, 5),
        ]
        .into_iter()
        .map(|(x, y)| marker(x, y))
        .collect();

        let clusters = merge_markers(&markers, 10);
        for m in &markers {
            let holders = clusters.iter().filter(|c| c.contains(&m.bounds)).count();
            assert_eq!(holders, 1, "marker at ({}, {}) not in exactly one cluster", m.x, m.y);
        }
    }

    #[test]
    fn clusters_come_out_in_discovery_order() {
        // The marker at (90, 5) is scanned before the (40, 40) group, so its
        // cluster is emitted first even though it sits further right.
        let markers = [marker(0, 0), marker(90, 5), marker(40, 40)];
        let clusters = merge_markers(&markers, 10);
        assert_eq!(
            clusters,
            vec![
                Rect::new(0, 0, 2, 2),
                Rect::new(90, 5, 2, 2),
                Rect::new(40, 40, 2, 2)
            ]
        );
    }

    #[test]
    fn dense_block_collapses_to_one_cluster() {
        let markers: Vec<DiffMarker> = (0..20)
            .flat_map(|y| (0..20).map(move |x| marker(x, y)))
            .collect();
        let clusters = merge_markers(&markers, 15);
        assert_eq!(clusters, vec![Rect::new(0, 0, 21, 21)]);
    }
}
