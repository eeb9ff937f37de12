use crate::chain::graph::ChainGraph;
use crate::chain::matcher::SpliceMatch;
use crate::chain::plan::{MutationPlan, PlanStep, ProvisionalIds};
use crate::models::{StopNode, StopSpec};

/// Builds a route's owned chain prefix and splices it onto a matched chain.
///
/// Creates one provisional node per unmatched position, linked in position
/// order (each node is planned before its id appears in a forward link).
/// With a match, the last new node's `next` is pointed at the merge target.
/// Without one, the chain simply terminates.
///
/// When the whole stop list matched (`split_index == 0`) the route still
/// gets a single marker node for its first stop, spliced onto the second
/// matched node. A route that owned nothing would be a pure alias onto
/// another route's chain and would vanish with it; the marker keeps every
/// route rooted in a node of its own.
///
/// Planned nodes are also inserted into `graph`, so later planning against
/// the same snapshot (sibling routes in a bulk day replacement) can match
/// against them. Returns the new node ids in position order.
pub fn build_chain(
    graph: &mut ChainGraph,
    plan: &mut MutationPlan,
    ids: &mut ProvisionalIds,
    route_id: i64,
    stops: &[StopSpec],
    splice: Option<&SpliceMatch>,
) -> Vec<i64> {
    let (prefix_len, merge_target) = match splice {
        None => (stops.len(), None),
        Some(found) if found.split_index == 0 => (1, Some(found.chain[1])),
        Some(found) => (found.split_index, Some(found.chain[0])),
    };

    let mut created = Vec::with_capacity(prefix_len);
    let mut last: Option<i64> = None;

    for spec in &stops[..prefix_len] {
        let id = ids.alloc();
        let node = StopNode {
            id,
            route_id,
            stop_id: spec.stop_id,
            price: spec.price,
            booking_capacity: spec.booking_capacity,
            pickup_time: spec.pickup_time,
            is_active: spec.is_active,
            next_stop_id: None,
        };
        plan.push(PlanStep::InsertNode(node.clone()));
        graph.insert(node);

        if let Some(previous) = last {
            plan.push(PlanStep::SetNext {
                node_id: previous,
                next: Some(id),
            });
            graph.set_next(previous, Some(id));
        }
        last = Some(id);
        created.push(id);
    }

    if let (Some(tail), Some(target)) = (last, merge_target) {
        plan.push(PlanStep::SetNext {
            node_id: tail,
            next: Some(target),
        });
        graph.set_next(tail, Some(target));
    }

    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::matcher::find_splice;
    use crate::chain::test_support::node;
    use rust_decimal::Decimal;

    fn specs(stop_ids: &[i64]) -> Vec<StopSpec> {
        stop_ids
            .iter()
            .map(|&stop_id| StopSpec::new(stop_id, Decimal::new(750, 2)))
            .collect()
    }

    #[test]
    fn unmatched_route_builds_a_terminal_chain() {
        let mut graph = ChainGraph::new();
        let mut plan = MutationPlan::new();
        let mut ids = ProvisionalIds::new();

        let created = build_chain(&mut graph, &mut plan, &mut ids, -1, &specs(&[101, 102]), None);

        assert_eq!(created.len(), 2);
        let first = graph.get(created[0]).unwrap();
        let second = graph.get(created[1]).unwrap();
        assert_eq!(first.next_stop_id, Some(second.id));
        assert_eq!(second.next_stop_id, None);
        assert_eq!(first.route_id, -1);
    }

    #[test]
    fn prefix_splices_onto_matched_head() {
        let mut graph = ChainGraph::from_nodes(vec![
            node(1, 10, 102, Some(2)),
            node(2, 10, 103, None),
        ]);
        let mut plan = MutationPlan::new();
        let mut ids = ProvisionalIds::new();

        let stop_ids = [104, 102, 103];
        let found = find_splice(&graph, &stop_ids, None).unwrap();
        let created = build_chain(
            &mut graph,
            &mut plan,
            &mut ids,
            -1,
            &specs(&stop_ids),
            Some(&found),
        );

        assert_eq!(created.len(), 1);
        assert_eq!(graph.get(created[0]).unwrap().next_stop_id, Some(1));
        assert_eq!(graph.predecessors(1), &[created[0]]);
        // Donor chain untouched.
        assert_eq!(graph.get(1).unwrap().next_stop_id, Some(2));
    }

    #[test]
    fn full_match_still_creates_a_marker_node() {
        let mut graph = ChainGraph::from_nodes(vec![
            node(1, 10, 101, Some(2)),
            node(2, 10, 102, Some(3)),
            node(3, 10, 103, None),
        ]);
        let mut plan = MutationPlan::new();
        let mut ids = ProvisionalIds::new();

        let stop_ids = [101, 102, 103];
        let found = find_splice(&graph, &stop_ids, None).unwrap();
        assert_eq!(found.split_index, 0);

        let created = build_chain(
            &mut graph,
            &mut plan,
            &mut ids,
            -1,
            &specs(&stop_ids),
            Some(&found),
        );

        // One owned marker for the first stop, spliced past the donor head.
        assert_eq!(created.len(), 1);
        let marker = graph.get(created[0]).unwrap();
        assert_eq!(marker.stop_id, 101);
        assert_eq!(marker.next_stop_id, Some(2));
    }
}
