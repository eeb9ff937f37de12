use crate::chain::graph::ChainGraph;

/// A successful trailing-subsequence match.
///
/// `chain` holds the existing node ids, headed by the merge target, that
/// exactly equal the candidate stop list from `split_index` onward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceMatch {
    pub split_index: usize,
    pub chain: Vec<i64>,
}

/// Finds the longest trailing run of `stop_ids` that already exists as
/// another route's chain.
///
/// Scans `split_index` ascending from 0, so the longest shareable suffix is
/// preferred. Suffixes of length 1 are never merged; sharing single common
/// stops would branch the graph at every popular stop for no storage win.
/// The first successful candidate wins (ascending index, then discovery
/// order) - a greedy heuristic, fine for small human-curated routes, not a
/// proof of the globally smallest representation.
///
/// A candidate chain matches only when it consumes the suffix exactly: same
/// stop ids positionally, and the chain ends where the suffix ends.
pub fn find_splice(
    graph: &ChainGraph,
    stop_ids: &[i64],
    exclude_route: Option<i64>,
) -> Option<SpliceMatch> {
    if stop_ids.is_empty() {
        return None;
    }

    for split_index in 0..stop_ids.len() {
        let suffix = &stop_ids[split_index..];
        if suffix.len() < 2 {
            continue;
        }

        for &candidate in graph.nodes_at_stop(suffix[0]) {
            let Some(head) = graph.get(candidate) else {
                continue;
            };
            if Some(head.route_id) == exclude_route {
                continue;
            }
            // A shareable chain has to actually continue past its head.
            if head.next_stop_id.is_none() {
                continue;
            }

            if chain_matches(graph, candidate, suffix) {
                return Some(SpliceMatch {
                    split_index,
                    chain: collect_chain(graph, candidate, suffix.len()),
                });
            }
        }
    }

    None
}

/// True when the chain starting at `head` equals `suffix` exactly and ends
/// with it. Iteration is bounded by the suffix length, so a corrupted cyclic
/// chain cannot hang the scan.
fn chain_matches(graph: &ChainGraph, head: i64, suffix: &[i64]) -> bool {
    let mut current = Some(head);
    for &stop_id in suffix {
        match current.and_then(|id| graph.get(id)) {
            Some(node) if node.stop_id == stop_id => current = node.next_stop_id,
            _ => return false,
        }
    }
    current.is_none()
}

fn collect_chain(graph: &ChainGraph, head: i64, length: usize) -> Vec<i64> {
    let mut chain = Vec::with_capacity(length);
    let mut current = Some(head);
    for _ in 0..length {
        let Some(id) = current else { break };
        chain.push(id);
        current = graph.get(id).and_then(|node| node.next_stop_id);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::test_support::node;

    // Route 10 owns 1(S1) -> 2(S2) -> 3(S3).
    fn linear_graph() -> ChainGraph {
        ChainGraph::from_nodes(vec![
            node(1, 10, 101, Some(2)),
            node(2, 10, 102, Some(3)),
            node(3, 10, 103, None),
        ])
    }

    #[test]
    fn matches_shared_suffix_at_longest_split() {
        let graph = linear_graph();

        let found = find_splice(&graph, &[104, 102, 103], None).unwrap();
        assert_eq!(found.split_index, 1);
        assert_eq!(found.chain, vec![2, 3]);
    }

    #[test]
    fn full_sequence_match_reports_split_zero() {
        let graph = linear_graph();

        let found = find_splice(&graph, &[101, 102, 103], None).unwrap();
        assert_eq!(found.split_index, 0);
        assert_eq!(found.chain, vec![1, 2, 3]);
    }

    #[test]
    fn single_stop_suffix_is_never_merged() {
        let graph = linear_graph();

        assert_eq!(find_splice(&graph, &[105, 103], None), None);
    }

    #[test]
    fn suffix_must_consume_existing_chain_exactly() {
        let graph = linear_graph();

        // S1,S2 matches the head of route 10's chain, but that chain keeps
        // going to S3, so it is not a shareable suffix.
        assert_eq!(find_splice(&graph, &[105, 101, 102], None), None);
    }

    #[test]
    fn excluded_route_contributes_no_candidates() {
        let graph = linear_graph();

        assert_eq!(find_splice(&graph, &[104, 102, 103], Some(10)), None);
        assert!(find_splice(&graph, &[104, 102, 103], Some(99)).is_some());
    }

    #[test]
    fn empty_input_matches_nothing() {
        let graph = linear_graph();

        assert_eq!(find_splice(&graph, &[], None), None);
    }

    #[test]
    fn earlier_split_wins_over_later_one() {
        // Two donor chains: route 20 covers S2,S3,S4 and route 30 covers
        // S3,S4. The scan must take the longer suffix from route 20.
        let graph = ChainGraph::from_nodes(vec![
            node(1, 20, 102, Some(2)),
            node(2, 20, 103, Some(3)),
            node(3, 20, 104, None),
            node(4, 30, 103, Some(5)),
            node(5, 30, 104, None),
        ]);

        let found = find_splice(&graph, &[101, 102, 103, 104], None).unwrap();
        assert_eq!(found.split_index, 1);
        assert_eq!(found.chain, vec![1, 2, 3]);
    }
}
