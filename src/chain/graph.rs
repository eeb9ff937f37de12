use crate::models::StopNode;
use ahash::AHashMap;

/// In-memory index over a set of stop nodes.
///
/// Keeps three views in sync: node id -> node, stop id -> node ids, and the
/// derived incoming-edge index (node id -> ids of nodes whose `next_stop_id`
/// points at it). The incoming index is what makes "previous" queries cheap
/// without ever storing a back-pointer on the node itself.
#[derive(Debug, Clone, Default)]
pub struct ChainGraph {
    nodes: AHashMap<i64, StopNode>,
    by_stop: AHashMap<i64, Vec<i64>>,
    incoming: AHashMap<i64, Vec<i64>>,
}

impl ChainGraph {
    pub fn new() -> ChainGraph {
        ChainGraph::default()
    }

    /// Builds a graph from persisted rows. Nodes are indexed in ascending id
    /// order so candidate discovery during matching is deterministic.
    pub fn from_nodes(mut nodes: Vec<StopNode>) -> ChainGraph {
        nodes.sort_by_key(|node| node.id);
        let mut graph = ChainGraph::new();
        for node in nodes {
            graph.insert(node);
        }
        graph
    }

    pub fn insert(&mut self, node: StopNode) {
        if let Some(existing) = self.nodes.get(&node.id).cloned() {
            self.unindex(&existing);
        }
        self.by_stop.entry(node.stop_id).or_default().push(node.id);
        if let Some(next) = node.next_stop_id {
            self.incoming.entry(next).or_default().push(node.id);
        }
        self.nodes.insert(node.id, node);
    }

    pub fn remove(&mut self, id: i64) -> Option<StopNode> {
        let node = self.nodes.remove(&id)?;
        self.unindex(&node);
        Some(node)
    }

    fn unindex(&mut self, node: &StopNode) {
        if let Some(ids) = self.by_stop.get_mut(&node.stop_id) {
            ids.retain(|candidate| *candidate != node.id);
        }
        if let Some(next) = node.next_stop_id
            && let Some(ids) = self.incoming.get_mut(&next)
        {
            ids.retain(|candidate| *candidate != node.id);
        }
    }

    pub fn get(&self, id: i64) -> Option<&StopNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StopNode> {
        self.nodes.values()
    }

    /// Rewrites a node's forward pointer, keeping the incoming index in sync.
    /// Returns false when the node does not exist.
    pub fn set_next(&mut self, id: i64, next: Option<i64>) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let old_next = node.next_stop_id;
        if old_next == next {
            return true;
        }
        if let Some(old) = old_next
            && let Some(ids) = self.incoming.get_mut(&old)
        {
            ids.retain(|candidate| *candidate != id);
        }
        if let Some(new) = next {
            self.incoming.entry(new).or_default().push(id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.next_stop_id = next;
        }
        true
    }

    /// Ids of nodes referencing the given stop, in index insertion order.
    pub fn nodes_at_stop(&self, stop_id: i64) -> &[i64] {
        self.by_stop
            .get(&stop_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Derived previous-set: every node whose `next_stop_id` equals `id`.
    pub fn predecessors(&self, id: i64) -> &[i64] {
        self.incoming.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of nodes owned by the route, ascending.
    pub fn owned_by(&self, route_id: i64) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .nodes
            .values()
            .filter(|node| node.route_id == route_id)
            .map(|node| node.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Root nodes of a route: owned nodes with no incoming edge from any
    /// route. Traversal starts here.
    pub fn roots_of_route(&self, route_id: i64) -> Vec<i64> {
        let mut roots: Vec<i64> = self
            .nodes
            .values()
            .filter(|node| node.route_id == route_id && self.predecessors(node.id).is_empty())
            .map(|node| node.id)
            .collect();
        roots.sort_unstable();
        roots
    }
}
