use crate::models::{Route, StopNode};
use ahash::AHashMap;

/// One persisted effect of a route mutation.
///
/// Steps are ordered: a store applies them front to back inside a single
/// transaction. Inserts carry provisional (negative) ids; any step may refer
/// to a provisional id produced by an earlier insert in the same plan, which
/// keeps the "persist a node before its id is used in a forward link"
/// ordering explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    InsertRoute(Route),
    UpdateRoute(Route),
    DeleteRoute(i64),
    InsertNode(StopNode),
    SetNext { node_id: i64, next: Option<i64> },
    DeleteNode(i64),
}

/// An ordered, atomic batch of mutation steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationPlan {
    steps: Vec<PlanStep>,
}

impl MutationPlan {
    pub fn new() -> MutationPlan {
        MutationPlan::default()
    }

    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<PlanStep> {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Allocator for provisional ids used during planning. Negative so they can
/// never collide with persisted ids.
#[derive(Debug, Default)]
pub struct ProvisionalIds {
    last: i64,
}

impl ProvisionalIds {
    pub fn new() -> ProvisionalIds {
        ProvisionalIds::default()
    }

    pub fn alloc(&mut self) -> i64 {
        self.last -= 1;
        self.last
    }
}

/// Mapping from provisional ids to the real ids a store assigned while
/// applying a plan.
#[derive(Debug, Clone, Default)]
pub struct AppliedIds {
    pub routes: AHashMap<i64, i64>,
    pub nodes: AHashMap<i64, i64>,
}

impl AppliedIds {
    /// Resolves a route id: provisional ids go through the map, real ids
    /// pass through unchanged.
    pub fn route(&self, id: i64) -> Option<i64> {
        if id < 0 { self.routes.get(&id).copied() } else { Some(id) }
    }

    pub fn node(&self, id: i64) -> Option<i64> {
        if id < 0 { self.nodes.get(&id).copied() } else { Some(id) }
    }
}
