use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260105_000001_create_facility_and_program_tables::{FacilityTypes, Programs};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // orderable_id has no foreign key: approvals follow the orderable's
        // latest version, which is resolved at query time.
        manager
            .create_table(
                Table::create()
                    .table(FacilityTypeApprovedProducts::Table)
                    .if_not_exists()
                    .col(uuid(FacilityTypeApprovedProducts::Id))
                    .col(big_integer(FacilityTypeApprovedProducts::VersionId))
                    .col(uuid(FacilityTypeApprovedProducts::OrderableId))
                    .col(uuid(FacilityTypeApprovedProducts::ProgramId))
                    .col(uuid(FacilityTypeApprovedProducts::FacilityTypeId))
                    .col(double(FacilityTypeApprovedProducts::MaxPeriodsOfStock))
                    .col(double_null(FacilityTypeApprovedProducts::MinPeriodsOfStock))
                    .col(double_null(FacilityTypeApprovedProducts::EmergencyOrderPoint))
                    .col(boolean(FacilityTypeApprovedProducts::Active).default(true))
                    .col(
                        timestamp_with_time_zone(FacilityTypeApprovedProducts::LastUpdated)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(FacilityTypeApprovedProducts::Id)
                            .col(FacilityTypeApprovedProducts::VersionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ftap_program_id")
                            .from(
                                FacilityTypeApprovedProducts::Table,
                                FacilityTypeApprovedProducts::ProgramId,
                            )
                            .to(Programs::Table, Programs::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ftap_facility_type_id")
                            .from(
                                FacilityTypeApprovedProducts::Table,
                                FacilityTypeApprovedProducts::FacilityTypeId,
                            )
                            .to(FacilityTypes::Table, FacilityTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_ftap_facility_type_id", FacilityTypeApprovedProducts::FacilityTypeId),
            ("idx_ftap_program_id", FacilityTypeApprovedProducts::ProgramId),
            ("idx_ftap_orderable_id", FacilityTypeApprovedProducts::OrderableId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(FacilityTypeApprovedProducts::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(FacilityTypeApprovedProducts::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum FacilityTypeApprovedProducts {
    Table,
    Id,
    VersionId,
    OrderableId,
    ProgramId,
    FacilityTypeId,
    MaxPeriodsOfStock,
    MinPeriodsOfStock,
    EmergencyOrderPoint,
    Active,
    LastUpdated,
}
