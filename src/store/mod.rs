//! Persistence boundary for the chain engine.
//!
//! A [`ChainStore`] hands out read snapshots and applies a whole
//! [`MutationPlan`] atomically. The engine never talks to storage mid-plan,
//! so all-or-nothing durability is entirely the store's concern: one SQL
//! transaction for Postgres, one guarded swap for the in-memory store.

pub mod memory;
pub mod postgres;

use crate::chain::graph::ChainGraph;
use crate::chain::plan::{AppliedIds, MutationPlan};
use crate::error::ChainError;
use crate::models::{Route, RouteGroup, ScheduleDay};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PostgresChainStore;

#[async_trait]
pub trait ChainStore: Send + Sync {
    /// Snapshot of every persisted stop node, indexed for matching and
    /// traversal. Reads are pure; whatever isolation the backend provides
    /// is enough.
    async fn load_graph(&self) -> Result<ChainGraph, ChainError>;

    async fn get_route(&self, route_id: i64) -> Result<Option<Route>, ChainError>;

    async fn list_routes(&self) -> Result<Vec<Route>, ChainError>;

    async fn routes_for_day(&self, day_id: i64) -> Result<Vec<Route>, ChainError>;

    async fn get_day(&self, day_id: i64) -> Result<Option<ScheduleDay>, ChainError>;

    /// Which of the given stop ids have no catalog record.
    async fn missing_stops(&self, stop_ids: &[i64]) -> Result<Vec<i64>, ChainError>;

    async fn list_route_groups(&self) -> Result<Vec<RouteGroup>, ChainError>;

    /// Applies every step of the plan in order inside one transaction,
    /// assigning real ids to provisional inserts. Any failed step rolls the
    /// whole plan back.
    async fn apply(&self, plan: MutationPlan) -> Result<AppliedIds, ChainError>;
}
