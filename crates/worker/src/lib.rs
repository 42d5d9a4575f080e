//! Compute service: multiplies one tile pair and forwards the product to
//! the aggregator. Holds no job state.

pub mod compute;
pub mod config;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
