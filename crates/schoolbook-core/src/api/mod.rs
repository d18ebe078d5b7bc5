//! Domain façade over the transport layer.
//!
//! This module provides the `Api` struct: login and the typed queries for
//! schools, sections, students, and connections, together with their
//! synchronous cached accessors. Queries cache their decoded payloads under
//! well-known keys and sequentially fetch-and-cache the images of the
//! records they return.

pub mod client;
pub mod hydrate;

pub use client::{sequential_for_each, Api};
