//! Parameterized identity query.
//!
//! Filters become typed [`Predicate`]s over table-qualified columns; sea-query
//! renders them with every user-supplied value bound as a parameter.
//!
//! ```sql
//! SELECT DISTINCT ftap.id, ftap.version_id
//! FROM facility_type_approved_products ftap
//! JOIN (latest ftap version per id) latest_ftap ON ...
//! JOIN programs p ON p.id = ftap.program_id
//! JOIN orderables o ON o.id = ftap.orderable_id
//! JOIN (latest orderable version per id) latest_o ON ...
//! JOIN program_orderables po ON po.orderable_id = o.id
//!      AND po.orderable_version_id = o.version_id AND po.program_id = p.id
//! JOIN facility_types ft ON ft.id = ftap.facility_type_id
//! WHERE <predicates>
//! ORDER BY ftap.id, ftap.version_id
//! ```

use sea_orm::sea_query::{
    Alias, Condition, Expr, ExprTrait, Func, JoinType, Order, Query, SelectStatement, SimpleExpr,
};
use sea_orm::{ColumnTrait, EntityTrait, IdenStatic, Value};
use uuid::Uuid;

use crate::entity::{
    facility_type, facility_type_approved_product as ftap, orderable, program, program_orderable,
};
use crate::models::VersionedIdentity;
use crate::search::{FacilityTypeFilter, IdentityCriteria, ProgramFilter};

const FTAP: &str = "ftap";
const LATEST_FTAP: &str = "latest_ftap";
const PROGRAM: &str = "p";
const ORDERABLE: &str = "o";
const LATEST_ORDERABLE: &str = "latest_o";
const PROGRAM_ORDERABLE: &str = "po";
const FACILITY_TYPE: &str = "ft";

/// A column qualified by its table alias in the identity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedColumn {
    pub table: &'static str,
    pub column: &'static str,
}

impl QualifiedColumn {
    pub fn new(table: &'static str, column: impl IdenStatic) -> Self {
        Self {
            table,
            column: column.as_str(),
        }
    }

    fn expr(&self) -> Expr {
        Expr::col((Alias::new(self.table), Alias::new(self.column)))
    }
}

impl std::fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(QualifiedColumn, Value),
    Within(QualifiedColumn, Vec<Value>),
    IsTrue(QualifiedColumn),
}

impl Predicate {
    pub fn column(&self) -> QualifiedColumn {
        match self {
            Self::Equals(column, _) | Self::Within(column, _) | Self::IsTrue(column) => *column,
        }
    }

    fn into_expr(self) -> SimpleExpr {
        match self {
            Self::Equals(column, value) => column.expr().eq(value),
            Self::Within(column, values) => column.expr().is_in(values),
            Self::IsTrue(column) => column.expr().is(Expr::cust("TRUE")),
        }
    }
}

/// The identity resolver's query for one set of criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityQuery {
    predicates: Vec<Predicate>,
}

impl IdentityQuery {
    pub fn from_criteria(criteria: &IdentityCriteria) -> Self {
        let mut predicates = vec![
            Predicate::IsTrue(QualifiedColumn::new(
                PROGRAM_ORDERABLE,
                program_orderable::Column::Active,
            )),
            Predicate::Equals(
                QualifiedColumn::new(FTAP, ftap::Column::Active),
                criteria.active.into(),
            ),
        ];

        match &criteria.program {
            Some(ProgramFilter::Id(id)) => predicates.push(Predicate::Equals(
                QualifiedColumn::new(PROGRAM, program::Column::Id),
                (*id).into(),
            )),
            Some(ProgramFilter::Code(code)) => predicates.push(Predicate::Equals(
                QualifiedColumn::new(PROGRAM, program::Column::Code),
                code.clone().into(),
            )),
            None => {}
        }

        if let Some(full_supply) = criteria.full_supply {
            predicates.push(Predicate::Equals(
                QualifiedColumn::new(PROGRAM_ORDERABLE, program_orderable::Column::FullSupply),
                full_supply.into(),
            ));
        }

        if !criteria.orderable_ids.is_empty() {
            predicates.push(Predicate::Within(
                QualifiedColumn::new(ORDERABLE, orderable::Column::Id),
                criteria.orderable_ids.iter().map(|id| (*id).into()).collect(),
            ));
        }

        match &criteria.facility_type {
            Some(FacilityTypeFilter::Id(id)) => predicates.push(Predicate::Equals(
                QualifiedColumn::new(FACILITY_TYPE, facility_type::Column::Id),
                (*id).into(),
            )),
            Some(FacilityTypeFilter::Codes(codes)) => predicates.push(Predicate::Within(
                QualifiedColumn::new(FACILITY_TYPE, facility_type::Column::Code),
                codes.iter().cloned().map(Value::from).collect(),
            )),
            None => {}
        }

        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn build(&self) -> SelectStatement {
        let filter = self
            .predicates
            .iter()
            .cloned()
            .fold(Condition::all(), |condition, predicate| {
                condition.add(predicate.into_expr())
            });

        Query::select()
            .distinct()
            .column((Alias::new(FTAP), ftap::Column::Id))
            .column((Alias::new(FTAP), ftap::Column::VersionId))
            .from_as(ftap::Entity, Alias::new(FTAP))
            .join_subquery(
                JoinType::InnerJoin,
                latest_versions(ftap::Entity, ftap::Column::Id, ftap::Column::VersionId),
                Alias::new(LATEST_FTAP),
                Condition::all()
                    .add(
                        Expr::col((Alias::new(LATEST_FTAP), ftap::Column::Id))
                            .equals((Alias::new(FTAP), ftap::Column::Id)),
                    )
                    .add(
                        Expr::col((Alias::new(LATEST_FTAP), ftap::Column::VersionId))
                            .equals((Alias::new(FTAP), ftap::Column::VersionId)),
                    ),
            )
            .join_as(
                JoinType::InnerJoin,
                program::Entity,
                Alias::new(PROGRAM),
                Expr::col((Alias::new(PROGRAM), program::Column::Id))
                    .equals((Alias::new(FTAP), ftap::Column::ProgramId)),
            )
            .join_as(
                JoinType::InnerJoin,
                orderable::Entity,
                Alias::new(ORDERABLE),
                Expr::col((Alias::new(ORDERABLE), orderable::Column::Id))
                    .equals((Alias::new(FTAP), ftap::Column::OrderableId)),
            )
            .join_subquery(
                JoinType::InnerJoin,
                latest_versions(
                    orderable::Entity,
                    orderable::Column::Id,
                    orderable::Column::VersionId,
                ),
                Alias::new(LATEST_ORDERABLE),
                Condition::all()
                    .add(
                        Expr::col((Alias::new(LATEST_ORDERABLE), orderable::Column::Id))
                            .equals((Alias::new(ORDERABLE), orderable::Column::Id)),
                    )
                    .add(
                        Expr::col((Alias::new(LATEST_ORDERABLE), orderable::Column::VersionId))
                            .equals((Alias::new(ORDERABLE), orderable::Column::VersionId)),
                    ),
            )
            .join_as(
                JoinType::InnerJoin,
                program_orderable::Entity,
                Alias::new(PROGRAM_ORDERABLE),
                Condition::all()
                    .add(
                        Expr::col((
                            Alias::new(PROGRAM_ORDERABLE),
                            program_orderable::Column::OrderableId,
                        ))
                        .equals((Alias::new(ORDERABLE), orderable::Column::Id)),
                    )
                    .add(
                        Expr::col((
                            Alias::new(PROGRAM_ORDERABLE),
                            program_orderable::Column::OrderableVersionId,
                        ))
                        .equals((Alias::new(ORDERABLE), orderable::Column::VersionId)),
                    )
                    .add(
                        Expr::col((
                            Alias::new(PROGRAM_ORDERABLE),
                            program_orderable::Column::ProgramId,
                        ))
                        .equals((Alias::new(PROGRAM), program::Column::Id)),
                    ),
            )
            .join_as(
                JoinType::InnerJoin,
                facility_type::Entity,
                Alias::new(FACILITY_TYPE),
                Expr::col((Alias::new(FACILITY_TYPE), facility_type::Column::Id))
                    .equals((Alias::new(FTAP), ftap::Column::FacilityTypeId)),
            )
            .cond_where(filter)
            .order_by((Alias::new(FTAP), ftap::Column::Id), Order::Asc)
            .order_by((Alias::new(FTAP), ftap::Column::VersionId), Order::Asc)
            .to_owned()
    }
}

/// `SELECT id, MAX(version_id) AS version_id FROM <table> GROUP BY id`
fn latest_versions<E, C>(entity: E, id: C, version: C) -> SelectStatement
where
    E: EntityTrait,
    C: ColumnTrait,
{
    Query::select()
        .column(id)
        .expr_as(Func::max(Expr::col(version)), Alias::new(version.as_str()))
        .from(entity)
        .group_by_col(id)
        .to_owned()
}

/// `("id", "version_id") IN (SELECT * FROM unnest(?, ?))` over exact identities.
///
/// The window is bound as two arrays, so the statement carries two parameters
/// however many identities it holds. Never a range.
pub fn identity_condition<C>(id: C, version: C, identities: &[VersionedIdentity]) -> Condition
where
    C: ColumnTrait,
{
    let (ids, versions): (Vec<Uuid>, Vec<i64>) = identities
        .iter()
        .map(|identity| (identity.id, identity.version_id))
        .unzip();

    Condition::all().add(Expr::cust_with_values(
        format!(
            r#"("{}", "{}") IN (SELECT * FROM unnest(?::uuid[], ?::bigint[]))"#,
            id.as_str(),
            version.as_str()
        ),
        [Value::from(ids), Value::from(versions)],
    ))
}

/// `column = ANY(?)` with `ids` bound as one array.
pub fn any_id<C>(column: C, ids: impl IntoIterator<Item = Uuid>) -> Condition
where
    C: ColumnTrait,
{
    let ids: Vec<Uuid> = ids.into_iter().collect();
    Condition::all().add(
        Expr::col(column).eq(Expr::cust_with_values("ANY(?::uuid[])", [Value::from(ids)])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{PostgresQueryBuilder, QueryStatementWriter};
    use sea_orm::{DbBackend, QueryFilter, QueryTrait};

    fn sql(criteria: &IdentityCriteria) -> (String, Vec<Value>) {
        let (sql, values) = IdentityQuery::from_criteria(criteria)
            .build()
            .build(PostgresQueryBuilder);
        (sql, values.0)
    }

    #[test]
    fn test_default_criteria_only_constrain_activity() {
        let query = IdentityQuery::from_criteria(&IdentityCriteria::default());

        assert_eq!(
            query.predicates(),
            &[
                Predicate::IsTrue(QualifiedColumn::new("po", program_orderable::Column::Active)),
                Predicate::Equals(QualifiedColumn::new("ftap", ftap::Column::Active), true.into()),
            ]
        );
    }

    #[test]
    fn test_query_selects_distinct_identities_in_stable_order() {
        let (sql, _) = sql(&IdentityCriteria::default());

        assert!(sql.starts_with(r#"SELECT DISTINCT "ftap"."id", "ftap"."version_id""#));
        assert!(sql.contains(r#"AS "latest_ftap""#));
        assert!(sql.contains(r#"AS "latest_o""#));
        assert!(sql.contains(r#"MAX("version_id") AS "version_id""#));
        assert!(sql.contains(r#""po"."active" IS TRUE"#));
        assert!(sql.ends_with(r#"ORDER BY "ftap"."id" ASC, "ftap"."version_id" ASC"#));
    }

    #[test]
    fn test_user_input_is_bound_not_inlined() {
        let hostile = "EPI'; DROP TABLE programs; --";
        let criteria = IdentityCriteria {
            program: Some(ProgramFilter::Code(hostile.to_string())),
            facility_type: Some(FacilityTypeFilter::Codes(vec![
                "health_center".to_string(),
                "district_store".to_string(),
            ])),
            ..IdentityCriteria::default()
        };

        let (sql, values) = sql(&criteria);

        assert!(!sql.contains("DROP TABLE"));
        assert!(!sql.contains("health_center"));
        assert!(sql.contains(r#""p"."code" = $"#));
        assert!(sql.contains(r#""ft"."code" IN ($"#));
        assert!(values.contains(&Value::from(hostile.to_string())));
        assert!(values.contains(&Value::from("district_store".to_string())));
    }

    #[test]
    fn test_every_present_filter_adds_a_predicate() {
        let orderables = vec![Uuid::now_v7(), Uuid::now_v7()];
        let criteria = IdentityCriteria {
            facility_type: Some(FacilityTypeFilter::Id(Uuid::now_v7())),
            program: Some(ProgramFilter::Id(Uuid::now_v7())),
            full_supply: Some(false),
            orderable_ids: orderables.clone(),
            active: false,
        };

        let query = IdentityQuery::from_criteria(&criteria);
        let columns: Vec<String> = query
            .predicates()
            .iter()
            .map(|p| p.column().to_string())
            .collect();

        assert_eq!(
            columns,
            vec![
                "po.active",
                "ftap.active",
                "p.id",
                "po.full_supply",
                "o.id",
                "ft.id"
            ]
        );
        assert!(query.predicates().contains(&Predicate::Within(
            QualifiedColumn::new("o", orderable::Column::Id),
            orderables.into_iter().map(Value::from).collect(),
        )));
    }

    #[test]
    fn test_identity_condition_binds_two_arrays_for_any_window() {
        let identities: Vec<VersionedIdentity> = (0..40_000)
            .map(|version| VersionedIdentity::new(Uuid::now_v7(), version))
            .collect();

        let statement = ftap::Entity::find()
            .filter(identity_condition(
                ftap::Column::Id,
                ftap::Column::VersionId,
                &identities,
            ))
            .build(DbBackend::Postgres);

        assert!(statement.sql.contains(r#"("id", "version_id") IN (SELECT * FROM unnest("#));
        assert!(!statement.sql.contains(" OR "));
        assert!(!statement.sql.contains("$3"));

        let values = statement.values.unwrap().0;
        let ids: Vec<Uuid> = identities.iter().map(|i| i.id).collect();
        let versions: Vec<i64> = identities.iter().map(|i| i.version_id).collect();
        assert_eq!(values, vec![Value::from(ids), Value::from(versions)]);
    }

    #[test]
    fn test_any_id_binds_one_array() {
        let ids: Vec<Uuid> = (0..70_000).map(|_| Uuid::now_v7()).collect();

        let statement = program::Entity::find()
            .filter(any_id(program::Column::Id, ids.clone()))
            .build(DbBackend::Postgres);

        assert!(statement.sql.contains("ANY("));
        assert!(!statement.sql.contains("$2"));
        assert_eq!(statement.values.unwrap().0, vec![Value::from(ids)]);
    }

    #[test]
    fn test_latest_versions_groups_by_id() {
        let sql = latest_versions(
            orderable::Entity,
            orderable::Column::Id,
            orderable::Column::VersionId,
        )
        .to_string(PostgresQueryBuilder);

        assert_eq!(
            sql,
            r#"SELECT "id", MAX("version_id") AS "version_id" FROM "orderables" GROUP BY "id""#
        );
    }
}
