use crate::chain::graph::ChainGraph;
use crate::chain::plan::{AppliedIds, MutationPlan, PlanStep};
use crate::error::ChainError;
use crate::models::{Route, RouteGroup, ScheduleDay, Stop, StopNode};
use crate::store::ChainStore;
use ahash::AHashMap;
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Mutex;

/// Transient store backed by plain maps. Used by the test suite and by
/// embedders that want the engine without a database.
///
/// `apply` works on a clone of the state and swaps it in only when every
/// step succeeded, giving the same all-or-nothing behavior as the SQL
/// transaction in the Postgres store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<State>,
}

#[derive(Debug, Clone, Default)]
struct State {
    routes: AHashMap<i64, Route>,
    nodes: AHashMap<i64, StopNode>,
    days: AHashMap<i64, ScheduleDay>,
    stops: AHashMap<i64, Stop>,
    groups: Vec<RouteGroup>,
    next_route_id: i64,
    next_node_id: i64,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn seed_stop(&self, stop: Stop) {
        let mut state = self.inner.lock().unwrap();
        state.stops.insert(stop.id, stop);
    }

    pub fn seed_day(&self, day: ScheduleDay) {
        let mut state = self.inner.lock().unwrap();
        state.days.insert(day.id, day);
    }

    pub fn seed_group(&self, group: RouteGroup) {
        let mut state = self.inner.lock().unwrap();
        state.groups.push(group);
    }

    /// Injects a node row verbatim, bypassing planning. Exists so tests can
    /// construct corrupted fixtures (cycles, dangling pointers).
    pub fn seed_raw_node(&self, node: StopNode) {
        let mut state = self.inner.lock().unwrap();
        state.next_node_id = state.next_node_id.max(node.id);
        state.nodes.insert(node.id, node);
    }

    pub fn seed_raw_route(&self, route: Route) {
        let mut state = self.inner.lock().unwrap();
        state.next_route_id = state.next_route_id.max(route.id);
        state.routes.insert(route.id, route);
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }
}

fn resolve(map: &AHashMap<i64, i64>, id: i64, what: &str) -> Result<i64, ChainError> {
    if id >= 0 {
        return Ok(id);
    }
    map.get(&id)
        .copied()
        .ok_or_else(|| ChainError::Storage(anyhow!("unresolved provisional {what} id {id}")))
}

fn apply_step(
    state: &mut State,
    applied: &mut AppliedIds,
    step: PlanStep,
) -> Result<(), ChainError> {
    match step {
        PlanStep::InsertRoute(mut route) => {
            state.next_route_id += 1;
            let id = state.next_route_id;
            applied.routes.insert(route.id, id);
            route.id = id;
            state.routes.insert(id, route);
        }
        PlanStep::UpdateRoute(route) => {
            if !state.routes.contains_key(&route.id) {
                return Err(ChainError::Storage(anyhow!(
                    "update of missing route {}",
                    route.id
                )));
            }
            state.routes.insert(route.id, route);
        }
        PlanStep::DeleteRoute(route_id) => {
            if state.routes.remove(&route_id).is_none() {
                return Err(ChainError::Storage(anyhow!(
                    "delete of missing route {route_id}"
                )));
            }
        }
        PlanStep::InsertNode(mut node) => {
            state.next_node_id += 1;
            let id = state.next_node_id;
            applied.nodes.insert(node.id, id);
            node.id = id;
            node.route_id = resolve(&applied.routes, node.route_id, "route")?;
            node.next_stop_id = node
                .next_stop_id
                .map(|next| resolve(&applied.nodes, next, "node"))
                .transpose()?;
            state.nodes.insert(id, node);
        }
        PlanStep::SetNext { node_id, next } => {
            let node_id = resolve(&applied.nodes, node_id, "node")?;
            let next = next
                .map(|next| resolve(&applied.nodes, next, "node"))
                .transpose()?;
            let node = state.nodes.get_mut(&node_id).ok_or_else(|| {
                ChainError::Storage(anyhow!("set_next on missing node {node_id}"))
            })?;
            node.next_stop_id = next;
        }
        PlanStep::DeleteNode(node_id) => {
            let node_id = resolve(&applied.nodes, node_id, "node")?;
            if state.nodes.remove(&node_id).is_none() {
                return Err(ChainError::Storage(anyhow!(
                    "delete of missing node {node_id}"
                )));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl ChainStore for MemoryStore {
    async fn load_graph(&self) -> Result<ChainGraph, ChainError> {
        let state = self.inner.lock().unwrap();
        Ok(ChainGraph::from_nodes(state.nodes.values().cloned().collect()))
    }

    async fn get_route(&self, route_id: i64) -> Result<Option<Route>, ChainError> {
        let state = self.inner.lock().unwrap();
        Ok(state.routes.get(&route_id).cloned())
    }

    async fn list_routes(&self) -> Result<Vec<Route>, ChainError> {
        let state = self.inner.lock().unwrap();
        let mut routes: Vec<Route> = state.routes.values().cloned().collect();
        routes.sort_by_key(|route| route.id);
        Ok(routes)
    }

    async fn routes_for_day(&self, day_id: i64) -> Result<Vec<Route>, ChainError> {
        let state = self.inner.lock().unwrap();
        let mut routes: Vec<Route> = state
            .routes
            .values()
            .filter(|route| route.schedule_day_id == Some(day_id))
            .cloned()
            .collect();
        routes.sort_by_key(|route| route.id);
        Ok(routes)
    }

    async fn get_day(&self, day_id: i64) -> Result<Option<ScheduleDay>, ChainError> {
        let state = self.inner.lock().unwrap();
        Ok(state.days.get(&day_id).cloned())
    }

    async fn missing_stops(&self, stop_ids: &[i64]) -> Result<Vec<i64>, ChainError> {
        let state = self.inner.lock().unwrap();
        Ok(stop_ids
            .iter()
            .copied()
            .filter(|id| !state.stops.contains_key(id))
            .collect())
    }

    async fn list_route_groups(&self) -> Result<Vec<RouteGroup>, ChainError> {
        let state = self.inner.lock().unwrap();
        Ok(state.groups.clone())
    }

    async fn apply(&self, plan: MutationPlan) -> Result<AppliedIds, ChainError> {
        let mut state = self.inner.lock().unwrap();
        let mut staged = state.clone();
        let mut applied = AppliedIds::default();

        for step in plan.into_steps() {
            apply_step(&mut staged, &mut applied, step)?;
        }

        *state = staged;
        Ok(applied)
    }
}
