#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::op_ref
)]

//! Booking-platform route engine.
//!
//! Routes are persisted as chains of stop nodes, one forward pointer per
//! node. A route whose trailing stop sequence already exists as another
//! route's chain splices onto that chain instead of duplicating it, so the
//! stored structure is a converging DAG: out-degree at most one, in-degree
//! above one only at merge points. The `chain` module holds the pure graph
//! logic, `store` the persistence boundary, and `service` the atomic
//! create/update/delete orchestration on top of both.

pub mod chain;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use error::ChainError;
pub use service::RouteService;
