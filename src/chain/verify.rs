use crate::chain::graph::ChainGraph;
use ahash::AHashSet;

/// One structural problem found while scanning a graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// `node_id` points forward at an id with no persisted row.
    DanglingNext { node_id: i64, next_id: i64 },
    /// `node_id` closes a loop of forward pointers.
    CycleAt { node_id: i64 },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::DanglingNext { node_id, next_id } => {
                write!(f, "node {node_id} has dangling next pointer {next_id}")
            }
            IntegrityIssue::CycleAt { node_id } => {
                write!(f, "node {node_id} closes a forward-pointer cycle")
            }
        }
    }
}

/// Full structural scan: dangling forward pointers and cycles.
///
/// Work is bounded by the node count - every node is walked at most once
/// thanks to the shared done-set, so even a fully cyclic graph terminates.
pub fn scan(graph: &ChainGraph) -> Vec<IntegrityIssue> {
    let mut issues: Vec<IntegrityIssue> = Vec::new();

    let mut ids: Vec<i64> = graph.iter().map(|node| node.id).collect();
    ids.sort_unstable();

    for &id in &ids {
        if let Some(node) = graph.get(id)
            && let Some(next) = node.next_stop_id
            && !graph.contains(next)
        {
            issues.push(IntegrityIssue::DanglingNext {
                node_id: id,
                next_id: next,
            });
        }
    }

    let mut done: AHashSet<i64> = AHashSet::new();
    for &start in &ids {
        if done.contains(&start) {
            continue;
        }
        let mut walk: Vec<i64> = Vec::new();
        let mut on_walk: AHashSet<i64> = AHashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if on_walk.contains(&id) {
                issues.push(IntegrityIssue::CycleAt { node_id: id });
                break;
            }
            if done.contains(&id) {
                break;
            }
            on_walk.insert(id);
            walk.push(id);
            current = graph.get(id).and_then(|node| node.next_stop_id);
        }

        done.extend(walk);
    }

    issues
}
