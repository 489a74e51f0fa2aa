use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "dispensables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dispensing_unit: Option<String>,
    pub size_code: Option<String>,
    pub route_of_administration: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Dispensable {
    fn from(model: Model) -> Self {
        Self {
            dispensing_unit: model.dispensing_unit,
            size_code: model.size_code,
            route_of_administration: model.route_of_administration,
        }
    }
}
