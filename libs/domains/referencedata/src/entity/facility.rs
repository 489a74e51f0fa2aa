use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "facilities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: Option<String>,
    pub type_id: Uuid,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::facility_type::Entity",
        from = "Column::TypeId",
        to = "super::facility_type::Column::Id"
    )]
    FacilityType,
}

impl Related<super::facility_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FacilityType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
