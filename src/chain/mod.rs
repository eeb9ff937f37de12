//! The stop-node chain engine.
//!
//! Everything in here is pure: it operates on a [`graph::ChainGraph`]
//! snapshot and emits [`plan::MutationPlan`] steps for a store to apply
//! atomically. Node ids created during planning are provisional (negative)
//! and are mapped to real ids when the plan is applied.

pub mod builder;
pub mod cleanup;
pub mod graph;
pub mod matcher;
pub mod plan;
pub mod traverse;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::build_chain;
pub use cleanup::{CleanupPlan, plan_route_removal};
pub use graph::ChainGraph;
pub use matcher::{SpliceMatch, find_splice};
pub use plan::{AppliedIds, MutationPlan, PlanStep, ProvisionalIds};
pub use traverse::{full_chain, previous_chain};
