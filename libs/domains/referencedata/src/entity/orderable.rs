use sea_orm::entity::prelude::*;

/// One version of an orderable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orderables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub version_id: i64,
    pub product_code: String,
    pub full_product_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub dispensable_id: Uuid,
    pub net_content: i64,
    pub pack_rounding_threshold: i64,
    pub round_to_zero: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub identifiers: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub extra_data: Json,
    pub last_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
