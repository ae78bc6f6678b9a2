//! Common re-exports for convenient entity usage.

pub use super::artist::{
    ActiveModel as ArtistActiveModel, Column as ArtistColumn, Entity as Artist,
    Model as ArtistModel,
};
pub use super::artist_extended::Entity as ArtistExtended;
pub use super::artwork::{
    ActiveModel as ArtworkActiveModel, Column as ArtworkColumn, Entity as Artwork,
    Model as ArtworkModel,
};
pub use super::artwork_artist::{
    Column as ArtworkArtistColumn, Entity as ArtworkArtist, Model as ArtworkArtistModel,
};
pub use super::artwork_extended::Entity as ArtworkExtended;
pub use super::contact::{
    ActiveModel as ContactActiveModel, Column as ContactColumn, Entity as Contact,
    Model as ContactModel,
};
pub use super::contact_extended::Entity as ContactExtended;
pub use super::sync_log::{
    ActiveModel as SyncLogActiveModel, Column as SyncLogColumn, Entity as SyncLog,
    Model as SyncLogModel,
};
pub use super::sync_status::{SyncDirection, SyncStatus};
