use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A named ordered sequence of stops, exposed as one logical entity.
///
/// A route owns the stop nodes it created. It does not own nodes it merely
/// merges into; those keep the owner id of the route that created them, even
/// after that route is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub start_location: String,
    pub destination: String,
    pub is_active: bool,
    /// Parent schedule day, when the route was created through a day-level
    /// bulk replacement.
    pub schedule_day_id: Option<i64>,
    /// Orthogonal tagging association, read-only for this engine.
    pub group_id: Option<i64>,
}

/// One persisted chain element: a stop reference plus a single forward
/// pointer. The "previous" relationship is never stored; it is derived from
/// which nodes point here via `next_stop_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopNode {
    pub id: i64,
    /// Owning route, immutable from creation.
    pub route_id: i64,
    pub stop_id: i64,
    pub price: Decimal,
    pub booking_capacity: Option<i32>,
    pub pickup_time: Option<NaiveDateTime>,
    pub is_active: bool,
    pub next_stop_id: Option<i64>,
}

/// Parent entity whose child routes can be bulk-replaced in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: i64,
    pub name: String,
    pub service_date: NaiveDate,
}

/// Stop catalog record. Static metadata only; read-only input to the engine,
/// used to reject payloads referencing nonexistent stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: i64,
    pub name: String,
    pub county_id: i64,
    pub location: String,
    pub lat: f64,
    pub lng: f64,
}

/// Many-to-many route tagging. Orthogonal to chain structure, read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGroup {
    pub id: i64,
    pub name: String,
    pub route_ids: Vec<i64>,
}

/// One position of an incoming route payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSpec {
    pub stop_id: i64,
    pub price: Decimal,
    pub booking_capacity: Option<i32>,
    pub pickup_time: Option<NaiveDateTime>,
    pub is_active: bool,
}

/// Route attributes carried by create/update payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAttrs {
    pub name: String,
    pub start_location: String,
    pub destination: String,
    pub is_active: bool,
    pub group_id: Option<i64>,
}

/// One child route of a day-level bulk replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub attrs: RouteAttrs,
    pub stops: Vec<StopSpec>,
}

/// Route listing entry with its owned-node count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub id: i64,
    pub name: String,
    pub start_location: String,
    pub destination: String,
    pub is_active: bool,
    pub stop_count: usize,
}

impl StopSpec {
    pub fn new(stop_id: i64, price: Decimal) -> StopSpec {
        StopSpec {
            stop_id,
            price,
            booking_capacity: None,
            pickup_time: None,
            is_active: true,
        }
    }
}
