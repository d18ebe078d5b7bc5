//! Well-known cache keys.
//!
//! Each key is owned by exactly one resource kind, so last-write-wins
//! writes from a single operation never race each other. Images use one
//! dynamic key per owning record (its name) instead of a fixed constant.

/// Currently authenticated user, written by login
pub const LOGGED_IN_USER: &str = "logged_in_user";

/// Result of the most recent school-by-code lookup
pub const SELECTED_SCHOOL: &str = "selected_school";

/// Connections of the logged-in user
pub const CONNECTIONS: &str = "current_connections";

/// Sections of the most recently queried school
pub const SECTIONS: &str = "sections";

/// Students of the most recently queried section
pub const STUDENTS: &str = "students";
