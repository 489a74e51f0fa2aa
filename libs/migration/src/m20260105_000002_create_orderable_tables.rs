use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260105_000001_create_facility_and_program_tables::Programs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dispensables::Table)
                    .if_not_exists()
                    .col(pk_uuid(Dispensables::Id))
                    .col(string_null(Dispensables::DispensingUnit))
                    .col(string_null(Dispensables::SizeCode))
                    .col(string_null(Dispensables::RouteOfAdministration))
                    .to_owned(),
            )
            .await?;

        // Every edit inserts a new (id, version_id) row; old versions are kept.
        manager
            .create_table(
                Table::create()
                    .table(Orderables::Table)
                    .if_not_exists()
                    .col(uuid(Orderables::Id))
                    .col(big_integer(Orderables::VersionId))
                    .col(string(Orderables::ProductCode))
                    .col(string(Orderables::FullProductName))
                    .col(text_null(Orderables::Description))
                    .col(uuid(Orderables::DispensableId))
                    .col(big_integer(Orderables::NetContent))
                    .col(big_integer(Orderables::PackRoundingThreshold))
                    .col(boolean(Orderables::RoundToZero).default(false))
                    .col(json_binary(Orderables::Identifiers).default("{}"))
                    .col(json_binary(Orderables::ExtraData).default("{}"))
                    .col(
                        timestamp_with_time_zone(Orderables::LastUpdated)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Orderables::Id)
                            .col(Orderables::VersionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orderables_dispensable_id")
                            .from(Orderables::Table, Orderables::DispensableId)
                            .to(Dispensables::Table, Dispensables::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("unq_orderables_product_code_version")
                    .table(Orderables::Table)
                    .col(Orderables::ProductCode)
                    .col(Orderables::VersionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductCategories::Table)
                    .if_not_exists()
                    .col(pk_uuid(ProductCategories::Id))
                    .col(string_uniq(ProductCategories::Code))
                    .col(string(ProductCategories::DisplayName))
                    .col(integer(ProductCategories::DisplayOrder).default(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProgramOrderables::Table)
                    .if_not_exists()
                    .col(pk_uuid(ProgramOrderables::Id))
                    .col(uuid(ProgramOrderables::ProgramId))
                    .col(uuid(ProgramOrderables::OrderableId))
                    .col(big_integer(ProgramOrderables::OrderableVersionId))
                    .col(uuid_null(ProgramOrderables::CategoryId))
                    .col(boolean(ProgramOrderables::Active).default(true))
                    .col(boolean(ProgramOrderables::FullSupply).default(true))
                    .col(integer(ProgramOrderables::DisplayOrder).default(0))
                    .col(integer_null(ProgramOrderables::DosesPerPatient))
                    .col(timestamp_with_time_zone_null(ProgramOrderables::ValidFrom))
                    .col(timestamp_with_time_zone_null(ProgramOrderables::ValidTo))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_program_orderables_program_id")
                            .from(ProgramOrderables::Table, ProgramOrderables::ProgramId)
                            .to(Programs::Table, Programs::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_program_orderables_orderable")
                            .from(
                                ProgramOrderables::Table,
                                (
                                    ProgramOrderables::OrderableId,
                                    ProgramOrderables::OrderableVersionId,
                                ),
                            )
                            .to(Orderables::Table, (Orderables::Id, Orderables::VersionId)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_program_orderables_category_id")
                            .from(ProgramOrderables::Table, ProgramOrderables::CategoryId)
                            .to(ProductCategories::Table, ProductCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_program_orderables_orderable")
                    .table(ProgramOrderables::Table)
                    .col(ProgramOrderables::OrderableId)
                    .col(ProgramOrderables::OrderableVersionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_program_orderables_program_id")
                    .table(ProgramOrderables::Table)
                    .col(ProgramOrderables::ProgramId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProgramOrderables::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orderables::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dispensables::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Dispensables {
    Table,
    Id,
    DispensingUnit,
    SizeCode,
    RouteOfAdministration,
}

#[derive(DeriveIden)]
enum Orderables {
    Table,
    Id,
    VersionId,
    ProductCode,
    FullProductName,
    Description,
    DispensableId,
    NetContent,
    PackRoundingThreshold,
    RoundToZero,
    Identifiers,
    ExtraData,
    LastUpdated,
}

#[derive(DeriveIden)]
enum ProductCategories {
    Table,
    Id,
    Code,
    DisplayName,
    DisplayOrder,
}

#[derive(DeriveIden)]
enum ProgramOrderables {
    Table,
    Id,
    ProgramId,
    OrderableId,
    OrderableVersionId,
    CategoryId,
    Active,
    FullSupply,
    DisplayOrder,
    DosesPerPatient,
    ValidFrom,
    ValidTo,
}
