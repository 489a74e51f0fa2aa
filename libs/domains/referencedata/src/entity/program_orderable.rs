use sea_orm::entity::prelude::*;

/// Links one orderable version to a program.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "program_orderables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub program_id: Uuid,
    pub orderable_id: Uuid,
    pub orderable_version_id: i64,
    pub category_id: Option<Uuid>,
    pub active: bool,
    pub full_supply: bool,
    pub display_order: i32,
    pub doses_per_patient: Option<i32>,
    pub valid_from: Option<DateTimeWithTimeZone>,
    pub valid_to: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
