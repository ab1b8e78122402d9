//! Migration to create the providers table.
//!
//! One row per configured payment channel. The nested policy objects (api
//! config, fee schedule, limits, availability, status log, rotation policy)
//! are stored as JSONB documents; the `version` column is the optimistic
//! concurrency token checked on every save.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Providers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Providers::Code)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Providers::Name).text().not_null())
                    .col(ColumnDef::new(Providers::ProviderType).text().not_null())
                    .col(
                        ColumnDef::new(Providers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Providers::ApiConfig).json_binary().not_null())
                    .col(ColumnDef::new(Providers::Fees).json_binary().not_null())
                    .col(ColumnDef::new(Providers::Limits).json_binary().not_null())
                    .col(
                        ColumnDef::new(Providers::Availability)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Providers::StatusLog).json_binary().not_null())
                    .col(
                        ColumnDef::new(Providers::KeyRotation)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Providers::AccountDetails).json_binary())
                    .col(ColumnDef::new(Providers::ContactInfo).json_binary())
                    .col(ColumnDef::new(Providers::Metadata).json_binary())
                    .col(
                        ColumnDef::new(Providers::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Providers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Providers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Providers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Providers {
    Table,
    Code,
    Name,
    ProviderType,
    IsActive,
    ApiConfig,
    Fees,
    Limits,
    Availability,
    StatusLog,
    KeyRotation,
    AccountDetails,
    ContactInfo,
    Metadata,
    Version,
    CreatedAt,
    UpdatedAt,
}
