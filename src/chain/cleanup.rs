use crate::chain::graph::ChainGraph;
use crate::error::ChainError;
use ahash::AHashSet;

/// Decisions for removing one route's owned nodes, computed in full before
/// any deletion is issued. Interleaving decisions with deletions risks
/// leaving a dangling forward pointer mid-operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupPlan {
    /// Owned nodes another route's chain still runs through. They stay,
    /// keeping their original owner id.
    pub retained: Vec<i64>,
    /// Owned nodes nothing external depends on. Safe to delete.
    pub deleted: Vec<i64>,
    /// Surviving nodes whose `next` still points at a deleted node and must
    /// be cleared first.
    pub cleared: Vec<i64>,
}

/// Plans the removal of every node owned by `route_id`.
///
/// A node is retained when it is still reachable from another route: either
/// it has a predecessor owned by a different route (a live merge point), or
/// it sits downstream of one on the owned chain. Retention is transitive on
/// purpose - deleting the successors of a merge point would cut the
/// borrowing route's chain off mid-walk.
///
/// A dangling forward pointer on an owned node is graph corruption and
/// aborts the whole operation rather than being silently repaired.
pub fn plan_route_removal(graph: &ChainGraph, route_id: i64) -> Result<CleanupPlan, ChainError> {
    let owned = graph.owned_by(route_id);
    let owned_set: AHashSet<i64> = owned.iter().copied().collect();

    for &id in &owned {
        if let Some(node) = graph.get(id)
            && let Some(next) = node.next_stop_id
            && !graph.contains(next)
        {
            tracing::error!(
                route_id,
                node_id = id,
                next_id = next,
                "dangling forward pointer found during cleanup"
            );
            return Err(ChainError::InvariantViolation(format!(
                "node {id} points at missing node {next}"
            )));
        }
    }

    // Merge points: owned nodes some other route's node still points at.
    let mut keep: AHashSet<i64> = AHashSet::new();
    for &id in &owned {
        let externally_referenced = graph
            .predecessors(id)
            .iter()
            .filter_map(|&pred| graph.get(pred))
            .any(|pred| pred.route_id != route_id);
        if externally_referenced {
            // Keep the whole downstream run of owned nodes; the external
            // route's walk continues through them.
            let mut current = Some(id);
            while let Some(node_id) = current {
                if !owned_set.contains(&node_id) || !keep.insert(node_id) {
                    break;
                }
                current = graph.get(node_id).and_then(|node| node.next_stop_id);
            }
        }
    }

    let deleted: Vec<i64> = owned.iter().copied().filter(|id| !keep.contains(id)).collect();
    let deleted_set: AHashSet<i64> = deleted.iter().copied().collect();

    // Defensive sweep: anything surviving this plan that still points at a
    // node marked for deletion gets its forward pointer cleared.
    let mut cleared: Vec<i64> = Vec::new();
    for &id in &deleted {
        for &pred in graph.predecessors(id) {
            if !deleted_set.contains(&pred) {
                tracing::warn!(
                    route_id,
                    node_id = pred,
                    target = id,
                    "clearing stray forward pointer into deleted node"
                );
                cleared.push(pred);
            }
        }
    }
    cleared.sort_unstable();
    cleared.dedup();

    let mut retained: Vec<i64> = keep.into_iter().collect();
    retained.sort_unstable();

    Ok(CleanupPlan {
        retained,
        deleted,
        cleared,
    })
}
