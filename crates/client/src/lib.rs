//! Typed HTTP clients for the aggregator and worker APIs.
//!
//! Wraps the JSON endpoints using [`reqwest`]. Every call carries an
//! explicit timeout; a timed-out call surfaces as [`ClientError::Request`]
//! and is never retried here.

mod aggregator;
mod error;
mod response;
mod worker;

pub use aggregator::AggregatorClient;
pub use error::ClientError;
pub use worker::WorkerClient;
