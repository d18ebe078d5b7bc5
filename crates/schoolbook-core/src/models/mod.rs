//! Domain records mirroring the backend resource shapes.
//!
//! Records are value objects: hydrated fresh from decoded payloads and
//! replaced wholesale, never mutated field by field. Relations are
//! expressed as [`Pointer`] references (inlined full objects when
//! eager-loaded); binary assets are [`FilePointer`] references resolved
//! separately through the image path. Unknown payload fields are kept on
//! each record's `extra` map.

pub mod connection;
pub mod pointer;
pub mod school;
pub mod section;
pub mod student;
pub mod user;

pub use connection::Connection;
pub use pointer::{FilePointer, Pointer};
pub use school::School;
pub use section::Section;
pub use student::Student;
pub use user::LoggedInUser;
