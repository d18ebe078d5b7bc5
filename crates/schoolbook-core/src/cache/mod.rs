//! Local caching module for offline data access.
//!
//! This module provides the `CacheStore`, a flat string-keyed persistent
//! store with one JSON file per key. Entries are written on successful
//! fetches and read back when the network is unavailable; they have no
//! expiry and live until overwritten.
//!
//! Well-known keys live in [`keys`]; images are cached under one dynamic
//! key per owning record.

pub mod keys;
pub mod store;

pub use store::{CacheEntry, CacheStore};
