use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FacilityTypes::Table)
                    .if_not_exists()
                    .col(pk_uuid(FacilityTypes::Id))
                    .col(string_uniq(FacilityTypes::Code))
                    .col(string_null(FacilityTypes::Name))
                    .col(integer_null(FacilityTypes::DisplayOrder))
                    .col(boolean(FacilityTypes::Active).default(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Facilities::Table)
                    .if_not_exists()
                    .col(pk_uuid(Facilities::Id))
                    .col(string_uniq(Facilities::Code))
                    .col(string_null(Facilities::Name))
                    .col(uuid(Facilities::TypeId))
                    .col(boolean(Facilities::Active).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_facilities_type_id")
                            .from(Facilities::Table, Facilities::TypeId)
                            .to(FacilityTypes::Table, FacilityTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_facilities_type_id")
                    .table(Facilities::Table)
                    .col(Facilities::TypeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Programs::Table)
                    .if_not_exists()
                    .col(pk_uuid(Programs::Id))
                    .col(string_uniq(Programs::Code))
                    .col(string_null(Programs::Name))
                    .col(boolean(Programs::Active).default(true))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Facilities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FacilityTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Programs::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum FacilityTypes {
    Table,
    Id,
    Code,
    Name,
    DisplayOrder,
    Active,
}

#[derive(DeriveIden)]
enum Facilities {
    Table,
    Id,
    Code,
    Name,
    TypeId,
    Active,
}

#[derive(DeriveIden)]
pub(crate) enum Programs {
    Table,
    Id,
    Code,
    Name,
    Active,
}
