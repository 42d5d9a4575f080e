//! Reducer service: accepts partial tile products, sums them per output
//! cell, and stitches the final matrix once every tile has arrived.

pub mod background;
pub mod config;
pub mod handlers;
pub mod job;
pub mod registry;
pub mod router;
pub mod routes;
pub mod state;
