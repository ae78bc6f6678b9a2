//! SeaORM entity definitions for the mirror schema.

pub mod artist;
pub mod artist_extended;
pub mod artwork;
pub mod artwork_artist;
pub mod artwork_extended;
pub mod contact;
pub mod contact_extended;
pub mod prelude;
pub mod sync_log;
pub mod sync_status;
