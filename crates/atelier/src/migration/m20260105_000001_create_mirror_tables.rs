//! Mirror tables for artworks, artists and contacts, their extension rows,
//! and the artwork/artist junction.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_artworks(manager).await?;
        self.create_artists(manager).await?;
        self.create_contacts(manager).await?;
        self.create_artwork_artists(manager).await?;
        self.create_extensions(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContactsExtended::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArtistsExtended::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArtworksExtended::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArtworkArtists::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artists::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artworks::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

/// `remote_created_at`, `remote_updated_at`, `synced_at`, `detail_synced_at`.
fn tracking_columns<T: IntoIden + Copy>(
    table: &mut TableCreateStatement,
    remote_created_at: T,
    remote_updated_at: T,
    synced_at: T,
    detail_synced_at: T,
) {
    table
        .col(
            ColumnDef::new(remote_created_at)
                .timestamp_with_time_zone()
                .null(),
        )
        .col(
            ColumnDef::new(remote_updated_at)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(synced_at)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(detail_synced_at)
                .timestamp_with_time_zone()
                .null(),
        );
}

impl Migration {
    async fn create_artworks(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(Artworks::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Artworks::Id)
                    .big_integer()
                    .not_null()
                    .primary_key(),
            )
            // List projection
            .col(ColumnDef::new(Artworks::Title).string().not_null())
            .col(ColumnDef::new(Artworks::Year).string().null())
            .col(ColumnDef::new(Artworks::Medium).string().null())
            .col(ColumnDef::new(Artworks::Dimensions).string().null())
            .col(ColumnDef::new(Artworks::Price).double().null())
            .col(ColumnDef::new(Artworks::Currency).string().null())
            .col(ColumnDef::new(Artworks::Status).string().null())
            .col(ColumnDef::new(Artworks::InventoryNumber).string().null())
            .col(ColumnDef::new(Artworks::ImageUrl).text().null())
            .col(
                ColumnDef::new(Artworks::ArtistNames)
                    .json()
                    .not_null()
                    .default(Expr::cust("'[]'")),
            )
            // Detail fields
            .col(ColumnDef::new(Artworks::Images).json().null())
            .col(ColumnDef::new(Artworks::Statistics).json().null())
            .col(ColumnDef::new(Artworks::Description).text().null())
            .col(ColumnDef::new(Artworks::Provenance).text().null())
            .col(ColumnDef::new(Artworks::ExhibitionHistory).json().null())
            .col(ColumnDef::new(Artworks::Notes).text().null());
        tracking_columns(
            &mut table,
            Artworks::RemoteCreatedAt,
            Artworks::RemoteUpdatedAt,
            Artworks::SyncedAt,
            Artworks::DetailSyncedAt,
        );
        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_artworks_detail_synced_at")
                    .table(Artworks::Table)
                    .col(Artworks::DetailSyncedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_artists(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(Artists::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Artists::Id)
                    .big_integer()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Artists::FirstName).string().null())
            .col(ColumnDef::new(Artists::LastName).string().null())
            .col(ColumnDef::new(Artists::Name).string().not_null())
            .col(ColumnDef::new(Artists::Nationality).string().null())
            .col(ColumnDef::new(Artists::BirthYear).integer().null())
            .col(ColumnDef::new(Artists::DeathYear).integer().null())
            .col(ColumnDef::new(Artists::Website).string().null())
            .col(ColumnDef::new(Artists::Biography).text().null())
            .col(ColumnDef::new(Artists::Images).json().null())
            .col(ColumnDef::new(Artists::Statistics).json().null())
            .col(ColumnDef::new(Artists::Notes).text().null());
        tracking_columns(
            &mut table,
            Artists::RemoteCreatedAt,
            Artists::RemoteUpdatedAt,
            Artists::SyncedAt,
            Artists::DetailSyncedAt,
        );
        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_artists_detail_synced_at")
                    .table(Artists::Table)
                    .col(Artists::DetailSyncedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_contacts(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(Contacts::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Contacts::Id)
                    .big_integer()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Contacts::FirstName).string().null())
            .col(ColumnDef::new(Contacts::LastName).string().null())
            .col(ColumnDef::new(Contacts::Email).string().null())
            .col(ColumnDef::new(Contacts::Phone).string().null())
            .col(ColumnDef::new(Contacts::Company).string().null())
            .col(ColumnDef::new(Contacts::City).string().null())
            .col(ColumnDef::new(Contacts::Country).string().null())
            .col(
                ColumnDef::new(Contacts::Tags)
                    .json()
                    .not_null()
                    .default(Expr::cust("'[]'")),
            )
            .col(ColumnDef::new(Contacts::Notes).text().null())
            .col(ColumnDef::new(Contacts::Activities).json().null())
            .col(ColumnDef::new(Contacts::Statistics).json().null());
        tracking_columns(
            &mut table,
            Contacts::RemoteCreatedAt,
            Contacts::RemoteUpdatedAt,
            Contacts::SyncedAt,
            Contacts::DetailSyncedAt,
        );
        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contacts_detail_synced_at")
                    .table(Contacts::Table)
                    .col(Contacts::DetailSyncedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_artwork_artists(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        // No FK on artist_id: artworks sync before artists.
        manager
            .create_table(
                Table::create()
                    .table(ArtworkArtists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArtworkArtists::ArtworkId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArtworkArtists::ArtistId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ArtworkArtists::ArtistName).string().null())
                    .col(
                        ColumnDef::new(ArtworkArtists::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(ArtworkArtists::ArtworkId)
                            .col(ArtworkArtists::ArtistId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artwork_artists_artwork")
                            .from(ArtworkArtists::Table, ArtworkArtists::ArtworkId)
                            .to(Artworks::Table, Artworks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_artwork_artists_artist")
                    .table(ArtworkArtists::Table)
                    .col(ArtworkArtists::ArtistId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_extensions(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(extension_table(
                ArtworksExtended::Table,
                ArtworksExtended::ArtworkId,
                Artworks::Table,
                Artworks::Id,
                "fk_artworks_extended_artwork",
            ))
            .await?;
        manager
            .create_table(extension_table(
                ArtistsExtended::Table,
                ArtistsExtended::ArtistId,
                Artists::Table,
                Artists::Id,
                "fk_artists_extended_artist",
            ))
            .await?;
        manager
            .create_table(extension_table(
                ContactsExtended::Table,
                ContactsExtended::ContactId,
                Contacts::Table,
                Contacts::Id,
                "fk_contacts_extended_contact",
            ))
            .await?;
        Ok(())
    }
}

/// Extension rows share one shape: parent id, enrichment placeholders.
fn extension_table(
    table: impl IntoIden + Copy + 'static,
    parent_col: impl IntoIden + Copy + 'static,
    parent_table: impl IntoIden + Copy + 'static,
    parent_id: impl IntoIden + Copy + 'static,
    fk_name: &str,
) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(
            ColumnDef::new(parent_col)
                .big_integer()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Alias::new("ai_summary")).text().null())
        .col(ColumnDef::new(Alias::new("embedding")).json().null())
        .col(
            ColumnDef::new(Alias::new("enriched_at"))
                .timestamp_with_time_zone()
                .null(),
        )
        .col(
            ColumnDef::new(Alias::new("created_at"))
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table, parent_col)
                .to(parent_table, parent_id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "artworks")]
enum Artworks {
    Table,
    Id,
    Title,
    Year,
    Medium,
    Dimensions,
    Price,
    Currency,
    Status,
    InventoryNumber,
    ImageUrl,
    ArtistNames,
    RemoteCreatedAt,
    RemoteUpdatedAt,
    Images,
    Statistics,
    Description,
    Provenance,
    ExhibitionHistory,
    Notes,
    SyncedAt,
    DetailSyncedAt,
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "artists")]
enum Artists {
    Table,
    Id,
    FirstName,
    LastName,
    Name,
    Nationality,
    BirthYear,
    DeathYear,
    Website,
    RemoteCreatedAt,
    RemoteUpdatedAt,
    Biography,
    Images,
    Statistics,
    Notes,
    SyncedAt,
    DetailSyncedAt,
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "contacts")]
enum Contacts {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    Company,
    City,
    Country,
    Tags,
    RemoteCreatedAt,
    RemoteUpdatedAt,
    Notes,
    Activities,
    Statistics,
    SyncedAt,
    DetailSyncedAt,
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "artwork_artists")]
enum ArtworkArtists {
    Table,
    ArtworkId,
    ArtistId,
    ArtistName,
    Position,
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "artworks_extended")]
enum ArtworksExtended {
    Table,
    ArtworkId,
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "artists_extended")]
enum ArtistsExtended {
    Table,
    ArtistId,
}

#[derive(DeriveIden, Clone, Copy)]
#[sea_orm(iden = "contacts_extended")]
enum ContactsExtended {
    Table,
    ContactId,
}
