use sea_orm::entity::prelude::*;

/// One version of an approval. `orderable_id` has no version: the approval
/// always refers to the orderable's latest version.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "facility_type_approved_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub version_id: i64,
    pub orderable_id: Uuid,
    pub program_id: Uuid,
    pub facility_type_id: Uuid,
    #[sea_orm(column_type = "Double")]
    pub max_periods_of_stock: f64,
    #[sea_orm(column_type = "Double", nullable)]
    pub min_periods_of_stock: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub emergency_order_point: Option<f64>,
    pub active: bool,
    pub last_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
