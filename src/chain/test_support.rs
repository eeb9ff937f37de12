use crate::models::StopNode;
use rust_decimal::Decimal;

pub fn node(id: i64, route_id: i64, stop_id: i64, next_stop_id: Option<i64>) -> StopNode {
    StopNode {
        id,
        route_id,
        stop_id,
        price: Decimal::new(500, 2),
        booking_capacity: None,
        pickup_time: None,
        is_active: true,
        next_stop_id,
    }
}
