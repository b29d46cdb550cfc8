//! Repository implementations module.
//!
//! - `local`: in-memory implementation for unit testing and local development.
//!   Production document storage plugs in by implementing
//!   [`FullRepository`](crate::db::repository::FullRepository).
pub mod local;

pub use local::LocalRepository;
