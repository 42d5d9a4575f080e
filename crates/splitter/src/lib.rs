//! Splitter service: decomposes `A x B` into tile tasks, registers the job
//! with the aggregator, and fans the tasks out to workers through a bounded
//! dispatch pool.

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
