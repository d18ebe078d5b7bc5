//! Transport layer for the Parse REST backend.
//!
//! Builds HTTP requests (query encoding, auth headers, body), executes them
//! with a per-call timeout, and classifies responses by their declared kind
//! (text, JSON, or binary). Every call produces exactly one well-formed
//! [`Response`] envelope - network errors and timeouts resolve to failure
//! envelopes, never to an `Err` the caller has to unwind.
//!
//! On any failure or empty body, the decode path transparently substitutes
//! the previously cached value for the caller-supplied cache key.

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::NetClient;
pub use error::NetError;
pub use request::{RequestOptions, RequestParams, ResponseKind};
pub use response::{Response, ResponseBody};
