use crate::chain::graph::ChainGraph;
use crate::chain::plan::{AppliedIds, MutationPlan, PlanStep};
use crate::error::ChainError;
use crate::models::{Route, RouteGroup, ScheduleDay, StopNode};
use crate::store::ChainStore;
use ahash::AHashMap;
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

/// Postgres-backed store. Every `apply` runs as one SQL transaction; node
/// inserts happen in plan order with `RETURNING id`, so a forward link is
/// only ever written after the row it points at exists.
pub struct PostgresChainStore {
    pool: PgPool,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schedule_days (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        service_date DATE NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS routes (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        start_location TEXT NOT NULL,
        destination TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        schedule_day_id BIGINT,
        group_id BIGINT
    )",
    "CREATE TABLE IF NOT EXISTS stops (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        county_id BIGINT NOT NULL,
        location TEXT NOT NULL,
        lat DOUBLE PRECISION NOT NULL,
        lng DOUBLE PRECISION NOT NULL
    )",
    // No foreign key from route_id to routes: retained merge-point nodes
    // outlive the route that created them.
    "CREATE TABLE IF NOT EXISTS stop_nodes (
        id BIGSERIAL PRIMARY KEY,
        route_id BIGINT NOT NULL,
        stop_id BIGINT NOT NULL,
        price NUMERIC NOT NULL,
        booking_capacity INTEGER,
        pickup_time TIMESTAMP,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        next_stop_id BIGINT
    )",
    "CREATE INDEX IF NOT EXISTS idx_stop_nodes_stop_id ON stop_nodes (stop_id)",
    "CREATE INDEX IF NOT EXISTS idx_stop_nodes_route_id ON stop_nodes (route_id)",
    "CREATE TABLE IF NOT EXISTS route_groups (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS route_group_members (
        group_id BIGINT NOT NULL,
        route_id BIGINT NOT NULL,
        PRIMARY KEY (group_id, route_id)
    )",
];

impl PostgresChainStore {
    pub fn new(pool: PgPool) -> PostgresChainStore {
        PostgresChainStore { pool }
    }

    pub async fn connect(database_url: &str) -> Result<PostgresChainStore, ChainError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .map_err(db_err)?;
        Ok(PostgresChainStore { pool })
    }

    /// Creates missing tables and indexes. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), ChainError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }
}

fn db_err(err: sqlx::Error) -> ChainError {
    ChainError::Storage(anyhow::Error::from(err))
}

fn route_from_row(row: &PgRow) -> Result<Route, sqlx::Error> {
    Ok(Route {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        start_location: row.try_get("start_location")?,
        destination: row.try_get("destination")?,
        is_active: row.try_get("is_active")?,
        schedule_day_id: row.try_get("schedule_day_id")?,
        group_id: row.try_get("group_id")?,
    })
}

fn node_from_row(row: &PgRow) -> Result<StopNode, sqlx::Error> {
    Ok(StopNode {
        id: row.try_get("id")?,
        route_id: row.try_get("route_id")?,
        stop_id: row.try_get("stop_id")?,
        price: row.try_get("price")?,
        booking_capacity: row.try_get("booking_capacity")?,
        pickup_time: row.try_get("pickup_time")?,
        is_active: row.try_get("is_active")?,
        next_stop_id: row.try_get("next_stop_id")?,
    })
}

fn resolve(map: &AHashMap<i64, i64>, id: i64, what: &str) -> Result<i64, ChainError> {
    if id >= 0 {
        return Ok(id);
    }
    map.get(&id)
        .copied()
        .ok_or_else(|| ChainError::Storage(anyhow!("unresolved provisional {what} id {id}")))
}

#[async_trait]
impl ChainStore for PostgresChainStore {
    async fn load_graph(&self) -> Result<ChainGraph, ChainError> {
        let rows = sqlx::query(
            "SELECT id, route_id, stop_id, price, booking_capacity, pickup_time, is_active, \
             next_stop_id FROM stop_nodes",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut nodes = Vec::with_capacity(rows.len());
        for row in &rows {
            nodes.push(node_from_row(row).map_err(db_err)?);
        }
        Ok(ChainGraph::from_nodes(nodes))
    }

    async fn get_route(&self, route_id: i64) -> Result<Option<Route>, ChainError> {
        let row = sqlx::query(
            "SELECT id, name, start_location, destination, is_active, schedule_day_id, group_id \
             FROM routes WHERE id = $1",
        )
        .bind(route_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(route_from_row).transpose().map_err(db_err)
    }

    async fn list_routes(&self) -> Result<Vec<Route>, ChainError> {
        let rows = sqlx::query(
            "SELECT id, name, start_location, destination, is_active, schedule_day_id, group_id \
             FROM routes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(route_from_row).collect::<Result<_, _>>().map_err(db_err)
    }

    async fn routes_for_day(&self, day_id: i64) -> Result<Vec<Route>, ChainError> {
        let rows = sqlx::query(
            "SELECT id, name, start_location, destination, is_active, schedule_day_id, group_id \
             FROM routes WHERE schedule_day_id = $1 ORDER BY id",
        )
        .bind(day_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(route_from_row).collect::<Result<_, _>>().map_err(db_err)
    }

    async fn get_day(&self, day_id: i64) -> Result<Option<ScheduleDay>, ChainError> {
        let row = sqlx::query("SELECT id, name, service_date FROM schedule_days WHERE id = $1")
            .bind(day_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(Some(ScheduleDay {
                id: row.try_get("id").map_err(db_err)?,
                name: row.try_get("name").map_err(db_err)?,
                service_date: row.try_get("service_date").map_err(db_err)?,
            })),
            None => Ok(None),
        }
    }

    async fn missing_stops(&self, stop_ids: &[i64]) -> Result<Vec<i64>, ChainError> {
        if stop_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query("SELECT id FROM stops WHERE id = ANY($1)")
            .bind(stop_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut known: Vec<i64> = Vec::with_capacity(rows.len());
        for row in &rows {
            known.push(row.try_get("id").map_err(db_err)?);
        }
        Ok(stop_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect())
    }

    async fn list_route_groups(&self) -> Result<Vec<RouteGroup>, ChainError> {
        let group_rows = sqlx::query("SELECT id, name FROM route_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let member_rows =
            sqlx::query("SELECT group_id, route_id FROM route_group_members ORDER BY route_id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        let mut members: AHashMap<i64, Vec<i64>> = AHashMap::new();
        for row in &member_rows {
            let group_id: i64 = row.try_get("group_id").map_err(db_err)?;
            let route_id: i64 = row.try_get("route_id").map_err(db_err)?;
            members.entry(group_id).or_default().push(route_id);
        }

        let mut groups = Vec::with_capacity(group_rows.len());
        for row in &group_rows {
            let id: i64 = row.try_get("id").map_err(db_err)?;
            groups.push(RouteGroup {
                id,
                name: row.try_get("name").map_err(db_err)?,
                route_ids: members.remove(&id).unwrap_or_default(),
            });
        }
        Ok(groups)
    }

    async fn apply(&self, plan: MutationPlan) -> Result<AppliedIds, ChainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut applied = AppliedIds::default();

        for step in plan.into_steps() {
            match step {
                PlanStep::InsertRoute(route) => {
                    let id: i64 = sqlx::query_scalar(
                        "INSERT INTO routes \
                         (name, start_location, destination, is_active, schedule_day_id, group_id) \
                         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
                    )
                    .bind(&route.name)
                    .bind(&route.start_location)
                    .bind(&route.destination)
                    .bind(route.is_active)
                    .bind(route.schedule_day_id)
                    .bind(route.group_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_err)?;
                    applied.routes.insert(route.id, id);
                }
                PlanStep::UpdateRoute(route) => {
                    sqlx::query(
                        "UPDATE routes SET name = $1, start_location = $2, destination = $3, \
                         is_active = $4, schedule_day_id = $5, group_id = $6 WHERE id = $7",
                    )
                    .bind(&route.name)
                    .bind(&route.start_location)
                    .bind(&route.destination)
                    .bind(route.is_active)
                    .bind(route.schedule_day_id)
                    .bind(route.group_id)
                    .bind(route.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
                }
                PlanStep::DeleteRoute(route_id) => {
                    sqlx::query("DELETE FROM routes WHERE id = $1")
                        .bind(route_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                }
                PlanStep::InsertNode(node) => {
                    let route_id = resolve(&applied.routes, node.route_id, "route")?;
                    let next = node
                        .next_stop_id
                        .map(|next| resolve(&applied.nodes, next, "node"))
                        .transpose()?;
                    let id: i64 = sqlx::query_scalar(
                        "INSERT INTO stop_nodes \
                         (route_id, stop_id, price, booking_capacity, pickup_time, is_active, \
                         next_stop_id) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
                    )
                    .bind(route_id)
                    .bind(node.stop_id)
                    .bind(node.price)
                    .bind(node.booking_capacity)
                    .bind(node.pickup_time)
                    .bind(node.is_active)
                    .bind(next)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_err)?;
                    applied.nodes.insert(node.id, id);
                }
                PlanStep::SetNext { node_id, next } => {
                    let node_id = resolve(&applied.nodes, node_id, "node")?;
                    let next = next
                        .map(|next| resolve(&applied.nodes, next, "node"))
                        .transpose()?;
                    sqlx::query("UPDATE stop_nodes SET next_stop_id = $1 WHERE id = $2")
                        .bind(next)
                        .bind(node_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                }
                PlanStep::DeleteNode(node_id) => {
                    let node_id = resolve(&applied.nodes, node_id, "node")?;
                    sqlx::query("DELETE FROM stop_nodes WHERE id = $1")
                        .bind(node_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;
                }
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(applied)
    }
}
