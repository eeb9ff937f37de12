use crate::chain::cleanup::{CleanupPlan, plan_route_removal};
use crate::chain::graph::ChainGraph;
use crate::chain::matcher::find_splice;
use crate::chain::plan::{MutationPlan, PlanStep, ProvisionalIds};
use crate::chain::{builder, traverse};
use crate::error::ChainError;
use crate::models::{Route, RouteAttrs, RouteGroup, RouteSpec, RouteSummary, StopNode, StopSpec};
use crate::store::ChainStore;
use anyhow::anyhow;
use futures::future::try_join_all;
use itertools::Itertools;
use rust_decimal::Decimal;

/// Route orchestrator: composes matching, building, traversal and cleanup
/// into atomic operations over a [`ChainStore`].
///
/// Every mutation loads one graph snapshot, plans against it (cleanup
/// effects are applied to the planning snapshot before matching, so the
/// matcher never sees nodes that are about to go away), and hands the store
/// a single [`MutationPlan`]. Any failure aborts the whole plan.
pub struct RouteService<S: ChainStore> {
    store: S,
}

impl<S: ChainStore> RouteService<S> {
    pub fn new(store: S) -> RouteService<S> {
        RouteService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create_route(
        &self,
        attrs: RouteAttrs,
        stops: Vec<StopSpec>,
    ) -> Result<Route, ChainError> {
        validate_attrs(&attrs)?;
        self.validate_stops(&stops).await?;

        let mut graph = self.store.load_graph().await?;
        let mut plan = MutationPlan::new();
        let mut ids = ProvisionalIds::new();

        let route_id = ids.alloc();
        plan.push(PlanStep::InsertRoute(Route {
            id: route_id,
            name: attrs.name.clone(),
            start_location: attrs.start_location.clone(),
            destination: attrs.destination.clone(),
            is_active: attrs.is_active,
            schedule_day_id: None,
            group_id: attrs.group_id,
        }));

        plan_chain(&mut graph, &mut plan, &mut ids, route_id, &stops);

        let applied = self.store.apply(plan).await?;
        let real_id = applied
            .route(route_id)
            .ok_or_else(|| ChainError::Storage(anyhow!("created route id was not assigned")))?;
        tracing::info!(route_id = real_id, name = %attrs.name, "created route");

        self.store
            .get_route(real_id)
            .await?
            .ok_or(ChainError::RouteNotFound(real_id))
    }

    /// Full replace: the route keeps its id, its old chain is cleaned up
    /// reference-aware, and the new stop list is rebuilt (matching excludes
    /// the route itself).
    pub async fn update_route(
        &self,
        route_id: i64,
        attrs: RouteAttrs,
        stops: Vec<StopSpec>,
    ) -> Result<Route, ChainError> {
        let existing = self
            .store
            .get_route(route_id)
            .await?
            .ok_or(ChainError::RouteNotFound(route_id))?;
        validate_attrs(&attrs)?;
        self.validate_stops(&stops).await?;

        let mut graph = self.store.load_graph().await?;
        let mut plan = MutationPlan::new();
        let mut ids = ProvisionalIds::new();

        let removal = plan_route_removal(&graph, route_id)?;
        push_removal(&mut graph, &mut plan, &removal);

        let updated = Route {
            id: route_id,
            name: attrs.name,
            start_location: attrs.start_location,
            destination: attrs.destination,
            is_active: attrs.is_active,
            schedule_day_id: existing.schedule_day_id,
            group_id: attrs.group_id,
        };
        plan.push(PlanStep::UpdateRoute(updated.clone()));

        plan_chain(&mut graph, &mut plan, &mut ids, route_id, &stops);

        self.store.apply(plan).await?;
        tracing::info!(
            route_id,
            deleted = removal.deleted.len(),
            retained = removal.retained.len(),
            "replaced route chain"
        );
        Ok(updated)
    }

    /// Deletes a route; owned nodes another route still runs through are
    /// retained, everything else goes.
    pub async fn delete_route(&self, route_id: i64) -> Result<(), ChainError> {
        self.store
            .get_route(route_id)
            .await?
            .ok_or(ChainError::RouteNotFound(route_id))?;

        let mut graph = self.store.load_graph().await?;
        let mut plan = MutationPlan::new();

        let removal = plan_route_removal(&graph, route_id)?;
        push_removal(&mut graph, &mut plan, &removal);
        plan.push(PlanStep::DeleteRoute(route_id));

        self.store.apply(plan).await?;
        tracing::info!(
            route_id,
            deleted = removal.deleted.len(),
            retained = removal.retained.len(),
            "deleted route"
        );
        Ok(())
    }

    /// The route's full ordered node sequence, deduplicated across
    /// converging roots. Pure read.
    pub async fn get_full_chain(&self, route_id: i64) -> Result<Vec<StopNode>, ChainError> {
        self.store
            .get_route(route_id)
            .await?
            .ok_or(ChainError::RouteNotFound(route_id))?;
        let graph = self.store.load_graph().await?;
        Ok(traverse::full_chain(&graph, route_id))
    }

    /// Derived predecessor chain of one node, start-to-node order.
    pub async fn get_previous_nodes(&self, node_id: i64) -> Result<Vec<StopNode>, ChainError> {
        let graph = self.store.load_graph().await?;
        if !graph.contains(node_id) {
            return Err(ChainError::NodeNotFound(node_id));
        }
        Ok(traverse::previous_chain(&graph, node_id))
    }

    /// Replaces all child routes of a schedule day in one transaction.
    /// Later children may splice onto chains planned for earlier children
    /// of the same call.
    pub async fn bulk_replace_child_routes(
        &self,
        day_id: i64,
        specs: Vec<RouteSpec>,
    ) -> Result<Vec<Route>, ChainError> {
        self.store
            .get_day(day_id)
            .await?
            .ok_or(ChainError::DayNotFound(day_id))?;
        for spec in &specs {
            validate_attrs(&spec.attrs)?;
            self.validate_stops(&spec.stops).await?;
        }

        let mut graph = self.store.load_graph().await?;
        let mut plan = MutationPlan::new();
        let mut ids = ProvisionalIds::new();

        let children = self.store.routes_for_day(day_id).await?;
        for child in &children {
            let removal = plan_route_removal(&graph, child.id)?;
            push_removal(&mut graph, &mut plan, &removal);
            plan.push(PlanStep::DeleteRoute(child.id));
        }

        let mut provisional: Vec<i64> = Vec::with_capacity(specs.len());
        for spec in &specs {
            let route_id = ids.alloc();
            plan.push(PlanStep::InsertRoute(Route {
                id: route_id,
                name: spec.attrs.name.clone(),
                start_location: spec.attrs.start_location.clone(),
                destination: spec.attrs.destination.clone(),
                is_active: spec.attrs.is_active,
                schedule_day_id: Some(day_id),
                group_id: spec.attrs.group_id,
            }));
            plan_chain(&mut graph, &mut plan, &mut ids, route_id, &spec.stops);
            provisional.push(route_id);
        }

        let applied = self.store.apply(plan).await?;
        tracing::info!(
            day_id,
            replaced = children.len(),
            created = provisional.len(),
            "bulk-replaced child routes"
        );

        let applied = &applied;
        try_join_all(provisional.into_iter().map(|provisional_id| async move {
            let real_id = applied.route(provisional_id).ok_or_else(|| {
                ChainError::Storage(anyhow!("bulk-created route id was not assigned"))
            })?;
            self.store
                .get_route(real_id)
                .await?
                .ok_or(ChainError::RouteNotFound(real_id))
        }))
        .await
    }

    pub async fn get_route(&self, route_id: i64) -> Result<Route, ChainError> {
        self.store
            .get_route(route_id)
            .await?
            .ok_or(ChainError::RouteNotFound(route_id))
    }

    pub async fn list_routes(&self) -> Result<Vec<RouteSummary>, ChainError> {
        let routes = self.store.list_routes().await?;
        let graph = self.store.load_graph().await?;
        Ok(routes
            .into_iter()
            .map(|route| {
                let stop_count = graph.owned_by(route.id).len();
                RouteSummary {
                    id: route.id,
                    name: route.name,
                    start_location: route.start_location,
                    destination: route.destination,
                    is_active: route.is_active,
                    stop_count,
                }
            })
            .collect())
    }

    pub async fn list_route_groups(&self) -> Result<Vec<RouteGroup>, ChainError> {
        self.store.list_route_groups().await
    }

    async fn validate_stops(&self, stops: &[StopSpec]) -> Result<(), ChainError> {
        if stops.is_empty() {
            return Err(ChainError::Validation(
                "route needs at least one stop".to_string(),
            ));
        }
        if let Some(stop_id) = stops.iter().map(|spec| spec.stop_id).duplicates().next() {
            return Err(ChainError::Validation(format!(
                "stop {stop_id} appears more than once"
            )));
        }
        for spec in stops {
            if spec.price < Decimal::ZERO {
                return Err(ChainError::Validation(format!(
                    "negative price for stop {}",
                    spec.stop_id
                )));
            }
        }

        let stop_ids: Vec<i64> = stops.iter().map(|spec| spec.stop_id).collect();
        let missing = self.store.missing_stops(&stop_ids).await?;
        if !missing.is_empty() {
            return Err(ChainError::UnknownStops(missing));
        }
        Ok(())
    }
}

fn validate_attrs(attrs: &RouteAttrs) -> Result<(), ChainError> {
    if attrs.name.trim().is_empty() {
        return Err(ChainError::Validation("route name is empty".to_string()));
    }
    Ok(())
}

/// Matches the stop list against the (already cleaned-up) snapshot and plans
/// the owned prefix plus splice for one route.
fn plan_chain(
    graph: &mut ChainGraph,
    plan: &mut MutationPlan,
    ids: &mut ProvisionalIds,
    route_id: i64,
    stops: &[StopSpec],
) {
    let stop_ids: Vec<i64> = stops.iter().map(|spec| spec.stop_id).collect();
    let splice = find_splice(graph, &stop_ids, Some(route_id));
    if let Some(found) = &splice {
        tracing::info!(
            route_id,
            split_index = found.split_index,
            merge_node = found.chain[0],
            "splicing onto existing chain"
        );
    }
    builder::build_chain(graph, plan, ids, route_id, stops, splice.as_ref());
}

/// Converts a cleanup decision into plan steps and mirrors it onto the
/// planning snapshot. Pointer clears come before any deletion so no step
/// ever observes a dangling forward link.
fn push_removal(graph: &mut ChainGraph, plan: &mut MutationPlan, removal: &CleanupPlan) {
    for &node_id in &removal.cleared {
        plan.push(PlanStep::SetNext {
            node_id,
            next: None,
        });
        graph.set_next(node_id, None);
    }
    for &node_id in &removal.deleted {
        plan.push(PlanStep::DeleteNode(node_id));
        graph.remove(node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleDay, Stop, StopNode};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    const S1: i64 = 101;
    const S2: i64 = 102;
    const S3: i64 = 103;
    const S4: i64 = 104;
    const S5: i64 = 105;

    fn catalog_stop(id: i64) -> Stop {
        Stop {
            id,
            name: format!("stop {id}"),
            county_id: 1,
            location: "somewhere".to_string(),
            lat: 51.5,
            lng: -0.1,
        }
    }

    fn service() -> RouteService<MemoryStore> {
        let store = MemoryStore::new();
        for id in [S1, S2, S3, S4, S5] {
            store.seed_stop(catalog_stop(id));
        }
        RouteService::new(store)
    }

    fn attrs(name: &str) -> RouteAttrs {
        RouteAttrs {
            name: name.to_string(),
            start_location: "Origin".to_string(),
            destination: "Terminus".to_string(),
            is_active: true,
            group_id: None,
        }
    }

    fn stops(stop_ids: &[i64]) -> Vec<StopSpec> {
        stop_ids
            .iter()
            .map(|&id| StopSpec::new(id, Decimal::new(1250, 2)))
            .collect()
    }

    fn stop_ids(chain: &[StopNode]) -> Vec<i64> {
        chain.iter().map(|node| node.stop_id).collect()
    }

    fn node_ids(chain: &[StopNode]) -> Vec<i64> {
        chain.iter().map(|node| node.id).collect()
    }

    #[tokio::test]
    async fn full_chain_has_one_node_per_supplied_stop() {
        let svc = service();
        let route = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();

        let chain = svc.get_full_chain(route.id).await.unwrap();
        assert_eq!(stop_ids(&chain), vec![S1, S2, S3]);
        assert!(chain.iter().all(|node| node.route_id == route.id));
    }

    #[tokio::test]
    async fn trailing_overlap_reuses_the_donor_nodes() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let b = svc
            .create_route(attrs("beta"), stops(&[S4, S2, S3]))
            .await
            .unwrap();

        let chain_a = svc.get_full_chain(a.id).await.unwrap();
        let chain_b = svc.get_full_chain(b.id).await.unwrap();

        assert_eq!(stop_ids(&chain_a), vec![S1, S2, S3]);
        assert_eq!(stop_ids(&chain_b), vec![S4, S2, S3]);
        // B's S2,S3 are the very same persisted nodes as A's.
        assert_eq!(chain_b[1].id, chain_a[1].id);
        assert_eq!(chain_b[2].id, chain_a[2].id);
        assert_eq!(chain_b[1].route_id, a.id);
        // Only the S4 node was newly created for B.
        assert_eq!(svc.store().node_count(), 4);
    }

    #[tokio::test]
    async fn deleting_the_borrower_leaves_the_donor_intact() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let b = svc
            .create_route(attrs("beta"), stops(&[S4, S2, S3]))
            .await
            .unwrap();

        svc.delete_route(b.id).await.unwrap();

        let chain_a = svc.get_full_chain(a.id).await.unwrap();
        assert_eq!(stop_ids(&chain_a), vec![S1, S2, S3]);
        assert_eq!(svc.store().node_count(), 3);
        assert!(matches!(
            svc.get_full_chain(b.id).await,
            Err(ChainError::RouteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_the_donor_keeps_the_shared_suffix_alive() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let b = svc
            .create_route(attrs("beta"), stops(&[S4, S2, S3]))
            .await
            .unwrap();
        let chain_a = svc.get_full_chain(a.id).await.unwrap();

        svc.delete_route(a.id).await.unwrap();

        // S2 and S3 survive because B still runs through them; A's
        // exclusively-owned S1 node is gone.
        let chain_b = svc.get_full_chain(b.id).await.unwrap();
        assert_eq!(stop_ids(&chain_b), vec![S4, S2, S3]);
        assert_eq!(chain_b[1].id, chain_a[1].id);
        assert_eq!(chain_b[2].id, chain_a[2].id);

        let graph = svc.store().load_graph().await.unwrap();
        assert!(!graph.contains(chain_a[0].id));
        assert_eq!(svc.store().node_count(), 3);
    }

    #[tokio::test]
    async fn single_stop_overlap_is_not_merged() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S2, S1]))
            .await
            .unwrap();
        let c = svc
            .create_route(attrs("charlie"), stops(&[S5, S1]))
            .await
            .unwrap();

        let chain_a = svc.get_full_chain(a.id).await.unwrap();
        let chain_c = svc.get_full_chain(c.id).await.unwrap();

        // Only S1 overlaps, and length-1 suffixes are never shared: C gets
        // its own fresh S1 node.
        assert_eq!(stop_ids(&chain_c), vec![S5, S1]);
        assert_ne!(chain_c[1].id, chain_a[1].id);
        assert_eq!(svc.store().node_count(), 4);
    }

    #[tokio::test]
    async fn full_sequence_match_creates_a_marker_root() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let d = svc
            .create_route(attrs("delta"), stops(&[S1, S2, S3]))
            .await
            .unwrap();

        let chain_a = svc.get_full_chain(a.id).await.unwrap();
        let chain_d = svc.get_full_chain(d.id).await.unwrap();
        assert_eq!(stop_ids(&chain_d), vec![S1, S2, S3]);
        // D owns exactly one marker node (its own S1 root); the rest is A's
        // chain from S2 onward.
        assert_ne!(chain_d[0].id, chain_a[0].id);
        assert_eq!(chain_d[0].route_id, d.id);
        assert_eq!(chain_d[1].id, chain_a[1].id);

        // The marker keeps D alive when the donor disappears.
        svc.delete_route(a.id).await.unwrap();
        let chain_d = svc.get_full_chain(d.id).await.unwrap();
        assert_eq!(stop_ids(&chain_d), vec![S1, S2, S3]);
    }

    #[tokio::test]
    async fn replacing_with_identical_stops_is_idempotent_for_shared_nodes() {
        let svc = service();
        svc.create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let b = svc
            .create_route(attrs("beta"), stops(&[S4, S2, S3]))
            .await
            .unwrap();
        let before = svc.get_full_chain(b.id).await.unwrap();

        let updated = svc
            .update_route(b.id, attrs("beta mark two"), stops(&[S4, S2, S3]))
            .await
            .unwrap();
        assert_eq!(updated.name, "beta mark two");

        let after = svc.get_full_chain(b.id).await.unwrap();
        assert_eq!(stop_ids(&after), vec![S4, S2, S3]);
        // Positions still covered by A's chain keep their node ids; the
        // diverging S4 position gets a fresh node and the old one is gone.
        assert_eq!(after[1].id, before[1].id);
        assert_eq!(after[2].id, before[2].id);
        assert_ne!(after[0].id, before[0].id);
        let graph = svc.store().load_graph().await.unwrap();
        assert!(!graph.contains(before[0].id));
        assert_eq!(svc.store().node_count(), 4);
    }

    #[tokio::test]
    async fn cyclic_fixture_truncates_instead_of_looping() {
        let svc = service();
        svc.store().seed_raw_route(Route {
            id: 7,
            name: "corrupt".to_string(),
            start_location: "X".to_string(),
            destination: "Y".to_string(),
            is_active: true,
            schedule_day_id: None,
            group_id: None,
        });
        // 1 -> 2 -> 3 -> 2 closes a loop behind the root.
        for (id, stop, next) in [(1, S1, Some(2)), (2, S2, Some(3)), (3, S3, Some(2))] {
            svc.store().seed_raw_node(StopNode {
                id,
                route_id: 7,
                stop_id: stop,
                price: Decimal::ZERO,
                booking_capacity: None,
                pickup_time: None,
                is_active: true,
                next_stop_id: next,
            });
        }

        let chain = svc.get_full_chain(7).await.unwrap();
        let ids = node_ids(&chain);
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn dangling_pointer_aborts_deletion() {
        let svc = service();
        svc.store().seed_raw_route(Route {
            id: 9,
            name: "broken".to_string(),
            start_location: "X".to_string(),
            destination: "Y".to_string(),
            is_active: true,
            schedule_day_id: None,
            group_id: None,
        });
        svc.store().seed_raw_node(StopNode {
            id: 1,
            route_id: 9,
            stop_id: S1,
            price: Decimal::ZERO,
            booking_capacity: None,
            pickup_time: None,
            is_active: true,
            next_stop_id: Some(404),
        });

        let err = svc.delete_route(9).await.unwrap_err();
        assert!(matches!(err, ChainError::InvariantViolation(_)));
        // Nothing was applied: the route row is still there.
        assert!(svc.get_route(9).await.is_ok());
    }

    #[tokio::test]
    async fn bulk_replace_swaps_a_days_routes_atomically() {
        let svc = service();
        svc.store().seed_day(ScheduleDay {
            id: 1,
            name: "saturday service".to_string(),
            service_date: NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
        });

        let first = svc
            .bulk_replace_child_routes(
                1,
                vec![RouteSpec {
                    attrs: attrs("early run"),
                    stops: stops(&[S1, S2]),
                }],
            )
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].schedule_day_id, Some(1));

        // Replace with two routes; the second splices onto the first
        // sibling planned in the same call.
        let replaced = svc
            .bulk_replace_child_routes(
                1,
                vec![
                    RouteSpec {
                        attrs: attrs("morning run"),
                        stops: stops(&[S1, S2, S3]),
                    },
                    RouteSpec {
                        attrs: attrs("express run"),
                        stops: stops(&[S4, S2, S3]),
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(replaced.len(), 2);

        assert!(matches!(
            svc.get_route(first[0].id).await,
            Err(ChainError::RouteNotFound(_))
        ));
        let morning = svc.get_full_chain(replaced[0].id).await.unwrap();
        let express = svc.get_full_chain(replaced[1].id).await.unwrap();
        assert_eq!(stop_ids(&morning), vec![S1, S2, S3]);
        assert_eq!(stop_ids(&express), vec![S4, S2, S3]);
        assert_eq!(express[1].id, morning[1].id);
        assert_eq!(express[2].id, morning[2].id);
        assert_eq!(svc.store().node_count(), 4);
    }

    #[tokio::test]
    async fn bulk_replace_validates_before_touching_anything() {
        let svc = service();
        svc.store().seed_day(ScheduleDay {
            id: 1,
            name: "sunday service".to_string(),
            service_date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
        });
        let existing = svc
            .bulk_replace_child_routes(
                1,
                vec![RouteSpec {
                    attrs: attrs("keeper"),
                    stops: stops(&[S1, S2]),
                }],
            )
            .await
            .unwrap();

        let err = svc
            .bulk_replace_child_routes(
                1,
                vec![
                    RouteSpec {
                        attrs: attrs("fine"),
                        stops: stops(&[S1, S2]),
                    },
                    RouteSpec {
                        attrs: attrs("bad"),
                        stops: stops(&[777]),
                    },
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::UnknownStops(_)));

        // The existing child was untouched.
        let chain = svc.get_full_chain(existing[0].id).await.unwrap();
        assert_eq!(stop_ids(&chain), vec![S1, S2]);
    }

    #[tokio::test]
    async fn payload_validation_and_lookup_errors() {
        let svc = service();

        assert!(matches!(
            svc.create_route(attrs("empty"), vec![]).await,
            Err(ChainError::Validation(_))
        ));
        assert!(matches!(
            svc.create_route(attrs(""), stops(&[S1, S2])).await,
            Err(ChainError::Validation(_))
        ));
        assert!(matches!(
            svc.create_route(attrs("dup"), stops(&[S1, S1])).await,
            Err(ChainError::Validation(_))
        ));
        assert!(matches!(
            svc.create_route(attrs("ghost"), stops(&[S1, 999])).await,
            Err(ChainError::UnknownStops(ids)) if ids == vec![999]
        ));
        assert!(matches!(
            svc.update_route(42, attrs("nope"), stops(&[S1])).await,
            Err(ChainError::RouteNotFound(42))
        ));
        assert!(matches!(
            svc.delete_route(42).await,
            Err(ChainError::RouteNotFound(42))
        ));
        assert!(matches!(
            svc.bulk_replace_child_routes(9, vec![]).await,
            Err(ChainError::DayNotFound(9))
        ));
        assert!(matches!(
            svc.get_previous_nodes(5).await,
            Err(ChainError::NodeNotFound(5))
        ));
    }

    #[tokio::test]
    async fn summaries_count_owned_nodes_only() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let b = svc
            .create_route(attrs("beta"), stops(&[S4, S2, S3]))
            .await
            .unwrap();

        let summaries = svc.list_routes().await.unwrap();
        let by_id = |id: i64| summaries.iter().find(|s| s.id == id).unwrap().stop_count;
        assert_eq!(by_id(a.id), 3);
        assert_eq!(by_id(b.id), 1);
    }

    #[tokio::test]
    async fn previous_nodes_walk_back_to_the_chain_start() {
        let svc = service();
        let a = svc
            .create_route(attrs("alpha"), stops(&[S1, S2, S3]))
            .await
            .unwrap();
        let chain = svc.get_full_chain(a.id).await.unwrap();

        let previous = svc.get_previous_nodes(chain[2].id).await.unwrap();
        assert_eq!(node_ids(&previous), vec![chain[0].id, chain[1].id]);
    }
}
