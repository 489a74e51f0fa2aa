use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::{
    entity::{
        dispensable, facility, facility_type, facility_type_approved_product as ftap, orderable,
        product_category, program, program_orderable,
    },
    error::ReferenceDataResult,
    models::{
        Code, Dispensable, FacilityType, FacilityTypeApprovedProduct, IdentityList, Orderable,
        ProductCategory, Program, ProgramOrderable, VersionedIdentity,
    },
    query::{IdentityQuery, any_id, identity_condition},
    repository::FtapRepository,
    search::IdentityCriteria,
};

pub struct PgFtapRepository {
    db: DatabaseConnection,
}

impl PgFtapRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn latest_orderables(&self, ids: BTreeSet<Uuid>) -> Result<Vec<orderable::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let latest = orderable::Entity::find()
            .select_only()
            .column(orderable::Column::Id)
            .column_as(orderable::Column::VersionId.max(), "version_id")
            .filter(any_id(orderable::Column::Id, ids))
            .group_by(orderable::Column::Id)
            .into_model::<VersionedIdentity>()
            .all(&self.db)
            .await?;

        if latest.is_empty() {
            return Ok(Vec::new());
        }

        orderable::Entity::find()
            .filter(identity_condition(
                orderable::Column::Id,
                orderable::Column::VersionId,
                &latest,
            ))
            .all(&self.db)
            .await
    }

    /// Program associations of the given orderable versions, with categories.
    async fn program_orderables(
        &self,
        orderables: &[orderable::Model],
    ) -> Result<HashMap<VersionedIdentity, Vec<ProgramOrderable>>, DbErr> {
        if orderables.is_empty() {
            return Ok(HashMap::new());
        }

        let identities: Vec<VersionedIdentity> = orderables
            .iter()
            .map(|o| VersionedIdentity::new(o.id, o.version_id))
            .collect();

        let rows = program_orderable::Entity::find()
            .filter(identity_condition(
                program_orderable::Column::OrderableId,
                program_orderable::Column::OrderableVersionId,
                &identities,
            ))
            .all(&self.db)
            .await?;

        let category_ids: BTreeSet<Uuid> = rows.iter().filter_map(|po| po.category_id).collect();
        let categories: HashMap<Uuid, ProductCategory> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            product_category::Entity::find()
                .filter(any_id(product_category::Column::Id, category_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|m| to_category(m).map(|c| (c.id, c)))
                .collect::<Result<_, DbErr>>()?
        };

        let mut grouped: HashMap<VersionedIdentity, Vec<ProgramOrderable>> = HashMap::new();
        for row in rows {
            let key = VersionedIdentity::new(row.orderable_id, row.orderable_version_id);
            let category = row.category_id.and_then(|id| categories.get(&id).cloned());
            grouped.entry(key).or_default().push(ProgramOrderable {
                id: row.id,
                program_id: row.program_id,
                category,
                active: row.active,
                full_supply: row.full_supply,
                display_order: row.display_order,
                doses_per_patient: row.doses_per_patient,
                valid_from: row.valid_from.map(Into::into),
                valid_to: row.valid_to.map(Into::into),
            });
        }
        Ok(grouped)
    }

    /// Latest versions of the given orderables, fully assembled, keyed by id.
    async fn orderables(&self, ids: BTreeSet<Uuid>) -> Result<HashMap<Uuid, Orderable>, DbErr> {
        let models = self.latest_orderables(ids).await?;
        if models.is_empty() {
            return Ok(HashMap::new());
        }

        let dispensable_ids: BTreeSet<Uuid> = models.iter().map(|o| o.dispensable_id).collect();
        let dispensables: HashMap<Uuid, Dispensable> = dispensable::Entity::find()
            .filter(any_id(dispensable::Column::Id, dispensable_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m.into()))
            .collect();

        let mut programs = self.program_orderables(&models).await?;

        models
            .into_iter()
            .map(|model| {
                let identity = VersionedIdentity::new(model.id, model.version_id);
                let dispensable = dispensables
                    .get(&model.dispensable_id)
                    .cloned()
                    .unwrap_or_default();
                let associations = programs.remove(&identity).unwrap_or_default();
                to_orderable(model, dispensable, associations).map(|o| (o.id, o))
            })
            .collect()
    }
}

#[async_trait]
impl FtapRepository for PgFtapRepository {
    async fn find_facility_type_id(&self, facility_id: Uuid) -> ReferenceDataResult<Option<Uuid>> {
        let type_id = facility::Entity::find_by_id(facility_id)
            .join(JoinType::InnerJoin, facility::Relation::FacilityType.def())
            .select_only()
            .column(facility::Column::TypeId)
            .into_tuple::<Uuid>()
            .one(&self.db)
            .await?;

        Ok(type_id)
    }

    async fn resolve_identities(
        &self,
        criteria: &IdentityCriteria,
    ) -> ReferenceDataResult<IdentityList> {
        let query = IdentityQuery::from_criteria(criteria);
        let backend = self.db.get_database_backend();
        let statement = backend.build(&query.build());

        tracing::debug!(
            predicates = query.predicates().len(),
            sql = %statement.sql,
            "Resolving FTAP identities"
        );

        let identities = VersionedIdentity::find_by_statement(statement)
            .all(&self.db)
            .await?;

        Ok(IdentityList::from_ordered(identities))
    }

    async fn hydrate(
        &self,
        identities: &[VersionedIdentity],
    ) -> ReferenceDataResult<Vec<FacilityTypeApprovedProduct>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let records = ftap::Entity::find()
            .filter(identity_condition(
                ftap::Column::Id,
                ftap::Column::VersionId,
                identities,
            ))
            .all(&self.db)
            .await?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let program_ids: BTreeSet<Uuid> = records.iter().map(|r| r.program_id).collect();
        let facility_type_ids: BTreeSet<Uuid> = records.iter().map(|r| r.facility_type_id).collect();
        let orderable_ids: BTreeSet<Uuid> = records.iter().map(|r| r.orderable_id).collect();

        let programs: HashMap<Uuid, Program> = program::Entity::find()
            .filter(any_id(program::Column::Id, program_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| to_program(m).map(|p| (p.id, p)))
            .collect::<Result<_, DbErr>>()?;

        let facility_types: HashMap<Uuid, FacilityType> = facility_type::Entity::find()
            .filter(any_id(facility_type::Column::Id, facility_type_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| to_facility_type(m).map(|ft| (ft.id, ft)))
            .collect::<Result<_, DbErr>>()?;

        let orderables = self.orderables(orderable_ids).await?;

        let mut by_identity: HashMap<VersionedIdentity, FacilityTypeApprovedProduct> =
            HashMap::with_capacity(records.len());
        for record in records {
            let identity = VersionedIdentity::new(record.id, record.version_id);
            let (Some(orderable), Some(program), Some(facility_type)) = (
                orderables.get(&record.orderable_id),
                programs.get(&record.program_id),
                facility_types.get(&record.facility_type_id),
            ) else {
                tracing::warn!(
                    ftap_id = %record.id,
                    version_id = record.version_id,
                    orderable_id = %record.orderable_id,
                    "Skipping approved product with missing references"
                );
                continue;
            };

            by_identity.insert(
                identity,
                FacilityTypeApprovedProduct {
                    id: record.id,
                    version_id: record.version_id,
                    orderable: orderable.clone(),
                    program: program.clone(),
                    facility_type: facility_type.clone(),
                    max_periods_of_stock: record.max_periods_of_stock,
                    min_periods_of_stock: record.min_periods_of_stock,
                    emergency_order_point: record.emergency_order_point,
                    active: record.active,
                    last_updated: record.last_updated.into(),
                },
            );
        }

        Ok(identities
            .iter()
            .filter_map(|identity| by_identity.remove(identity))
            .collect())
    }
}

fn code(value: String, table: &str) -> Result<Code, DbErr> {
    Code::try_from(value).map_err(|e| DbErr::Type(format!("{table}.code: {e}")))
}

fn string_map(value: serde_json::Value, column: &str) -> Result<BTreeMap<String, String>, DbErr> {
    serde_json::from_value(value).map_err(|e| DbErr::Json(format!("{column}: {e}")))
}

fn to_program(model: program::Model) -> Result<Program, DbErr> {
    Ok(Program {
        id: model.id,
        code: code(model.code, "programs")?,
        name: model.name,
        active: model.active,
    })
}

fn to_facility_type(model: facility_type::Model) -> Result<FacilityType, DbErr> {
    Ok(FacilityType {
        id: model.id,
        code: code(model.code, "facility_types")?,
        name: model.name,
        display_order: model.display_order,
        active: model.active,
    })
}

fn to_category(model: product_category::Model) -> Result<ProductCategory, DbErr> {
    Ok(ProductCategory {
        id: model.id,
        code: code(model.code, "product_categories")?,
        display_name: model.display_name,
        display_order: model.display_order,
    })
}

fn to_orderable(
    model: orderable::Model,
    dispensable: Dispensable,
    programs: Vec<ProgramOrderable>,
) -> Result<Orderable, DbErr> {
    Ok(Orderable {
        id: model.id,
        version_id: model.version_id,
        product_code: Code::try_from(model.product_code)
            .map_err(|e| DbErr::Type(format!("orderables.product_code: {e}")))?,
        full_product_name: model.full_product_name,
        description: model.description,
        dispensable,
        net_content: model.net_content,
        pack_rounding_threshold: model.pack_rounding_threshold,
        round_to_zero: model.round_to_zero,
        programs,
        identifiers: string_map(model.identifiers, "orderables.identifiers")?,
        extra_data: string_map(model.extra_data, "orderables.extra_data")?,
        last_updated: model.last_updated.into(),
    })
}
