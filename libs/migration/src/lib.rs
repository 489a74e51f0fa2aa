pub use sea_orm_migration::prelude::*;

mod m20260105_000001_create_facility_and_program_tables;
mod m20260105_000002_create_orderable_tables;
mod m20260105_000003_create_facility_type_approved_products;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_facility_and_program_tables::Migration),
            Box::new(m20260105_000002_create_orderable_tables::Migration),
            Box::new(m20260105_000003_create_facility_type_approved_products::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_by_name() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 3);
    }
}
