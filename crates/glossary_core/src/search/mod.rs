//! Term query entry points.
//!
//! # Responsibility
//! - Answer search + filter + sort + paginate requests over a term snapshot.
//! - Track list view state between control changes.

pub mod query;
pub mod state;
