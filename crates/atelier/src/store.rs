//! Local store operations: mirror upserts, detail writes and the run ledger.
//!
//! Every list-level upsert commits one record (mirror row, junction rows,
//! extension row) in its own transaction, so a failure never leaves a
//! record half-written and never rolls back its neighbours.

pub mod artists;
pub mod artworks;
pub mod contacts;
mod errors;
pub mod ledger;
mod mirror;

pub use errors::{Result, StoreError};
pub use mirror::Upserted;
