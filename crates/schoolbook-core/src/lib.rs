//! Offline-first data access for a Parse-backed school directory.
//!
//! Two layers, consumed leaf-first:
//!
//! - [`net`]: builds and executes backend requests, classifies responses,
//!   and transparently falls back to the local cache when the network is
//!   unavailable.
//! - [`api`]: the domain façade - login, schools, sections, students,
//!   connections, and their images - returning typed records from
//!   [`models`].
//!
//! The [`cache`] module is the single point of contact with persistent
//! local storage; [`config`] holds the backend coordinates.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod net;

pub use api::Api;
pub use config::Config;
