//! Sync run ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SyncLogs::EntityType).string().not_null())
                    .col(
                        ColumnDef::new(SyncLogs::Direction)
                            .string()
                            .not_null()
                            .default("pull"),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::Status)
                            .string()
                            .not_null()
                            .default("running"),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::RecordsProcessed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::RecordsCreated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::RecordsUpdated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncLogs::Error).text().null())
                    .col(
                        ColumnDef::new(SyncLogs::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SyncLogs::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SyncLogs::TriggeredBy).string().null())
                    .to_owned(),
            )
            .await?;

        // Cutoff lookup: latest completed run per scope
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_logs_cutoff")
                    .table(SyncLogs::Table)
                    .col(SyncLogs::EntityType)
                    .col(SyncLogs::Status)
                    .col(SyncLogs::CompletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_logs_started_at")
                    .table(SyncLogs::Table)
                    .col(SyncLogs::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_logs")]
enum SyncLogs {
    Table,
    Id,
    EntityType,
    Direction,
    Status,
    RecordsProcessed,
    RecordsCreated,
    RecordsUpdated,
    Error,
    StartedAt,
    CompletedAt,
    TriggeredBy,
}
