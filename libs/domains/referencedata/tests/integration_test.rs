//! Integration tests for the reference-data domain
//!
//! These use real PostgreSQL via testcontainers to ensure:
//! - The identity query joins and filters as intended
//! - Only latest versions are resolved and hydrated
//! - Hydration assembles related rows and keeps window order

use chrono::Utc;
use domain_referencedata::entity::{
    dispensable, facility, facility_type, facility_type_approved_product as ftap, orderable,
    product_category, program, program_orderable,
};
use domain_referencedata::*;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use serde_json::json;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};
use uuid::Uuid;

// ============================================================================
// Seeding
// ============================================================================

struct Seeder {
    db: DatabaseConnection,
    builder: TestDataBuilder,
    dispensable_id: Uuid,
}

impl Seeder {
    async fn new(db: &TestDatabase, test_name: &str) -> Self {
        let builder = TestDataBuilder::from_test_name(test_name);
        let dispensable_id = builder.id("dispensable");

        dispensable::ActiveModel {
            id: Set(dispensable_id),
            dispensing_unit: Set(Some("vial".to_string())),
            size_code: Set(None),
            route_of_administration: Set(Some("oral".to_string())),
        }
        .insert(&db.connection)
        .await
        .unwrap();

        Self {
            db: db.connection(),
            builder,
            dispensable_id,
        }
    }

    async fn facility_type(&self, code: &str) -> Uuid {
        let id = self.builder.id(&format!("facility_type/{code}"));
        facility_type::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            name: Set(Some(code.replace('_', " "))),
            display_order: Set(Some(1)),
            active: Set(true),
        }
        .insert(&self.db)
        .await
        .unwrap();
        id
    }

    async fn facility(&self, code: &str, type_id: Uuid) -> Uuid {
        let id = self.builder.id(&format!("facility/{code}"));
        facility::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            name: Set(None),
            type_id: Set(type_id),
            active: Set(true),
        }
        .insert(&self.db)
        .await
        .unwrap();
        id
    }

    async fn program(&self, code: &str) -> Uuid {
        let id = self.builder.id(&format!("program/{code}"));
        program::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            name: Set(Some(format!("{code} program"))),
            active: Set(true),
        }
        .insert(&self.db)
        .await
        .unwrap();
        id
    }

    async fn category(&self, code: &str) -> Uuid {
        let id = self.builder.id(&format!("category/{code}"));
        product_category::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            display_name: Set(code.to_lowercase()),
            display_order: Set(2),
        }
        .insert(&self.db)
        .await
        .unwrap();
        id
    }

    async fn orderable(&self, id: Uuid, version_id: i64, code: &str) {
        orderable::ActiveModel {
            id: Set(id),
            version_id: Set(version_id),
            product_code: Set(code.to_string()),
            full_product_name: Set(format!("{code} v{version_id}")),
            description: Set(None),
            dispensable_id: Set(self.dispensable_id),
            net_content: Set(10),
            pack_rounding_threshold: Set(5),
            round_to_zero: Set(false),
            identifiers: Set(json!({ "tradeItem": format!("ti-{code}") })),
            extra_data: Set(json!({})),
            last_updated: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .unwrap();
    }

    async fn program_orderable(
        &self,
        program_id: Uuid,
        orderable: VersionedIdentity,
        full_supply: bool,
        category_id: Option<Uuid>,
    ) {
        program_orderable::ActiveModel {
            id: Set(Uuid::now_v7()),
            program_id: Set(program_id),
            orderable_id: Set(orderable.id),
            orderable_version_id: Set(orderable.version_id),
            category_id: Set(category_id),
            active: Set(true),
            full_supply: Set(full_supply),
            display_order: Set(0),
            doses_per_patient: Set(None),
            valid_from: Set(None),
            valid_to: Set(None),
        }
        .insert(&self.db)
        .await
        .unwrap();
    }

    async fn approval(
        &self,
        identity: VersionedIdentity,
        orderable_id: Uuid,
        program_id: Uuid,
        facility_type_id: Uuid,
        active: bool,
    ) {
        ftap::ActiveModel {
            id: Set(identity.id),
            version_id: Set(identity.version_id),
            orderable_id: Set(orderable_id),
            program_id: Set(program_id),
            facility_type_id: Set(facility_type_id),
            max_periods_of_stock: Set(3.0),
            min_periods_of_stock: Set(Some(1.0)),
            emergency_order_point: Set(None),
            active: Set(active),
            last_updated: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .unwrap();
    }

    /// An orderable at version 1 in `program_id`, approved for `facility_type_id`.
    async fn approved_product(
        &self,
        code: &str,
        program_id: Uuid,
        facility_type_id: Uuid,
        full_supply: bool,
    ) -> (VersionedIdentity, Uuid) {
        let orderable_id = self.builder.id(&format!("orderable/{code}"));
        self.orderable(orderable_id, 1, code).await;
        self.program_orderable(
            program_id,
            VersionedIdentity::new(orderable_id, 1),
            full_supply,
            None,
        )
        .await;

        let identity = VersionedIdentity::new(self.builder.id(&format!("ftap/{code}")), 1);
        self.approval(identity, orderable_id, program_id, facility_type_id, true)
            .await;
        (identity, orderable_id)
    }
}

fn service(db: &TestDatabase) -> FtapSearchService<PgFtapRepository> {
    FtapSearchService::new(PgFtapRepository::new(db.connection()))
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_health_center_epi_first_page() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "health_center_epi").await;

    let health_center = seed.facility_type("health_center").await;
    let warehouse = seed.facility_type("warehouse").await;
    let epi = seed.program("EPI").await;
    let family_planning = seed.program("FP").await;

    let mut expected = Vec::new();
    for i in 0..15 {
        let (identity, _) = seed
            .approved_product(&format!("EPI{i:02}"), epi, health_center, true)
            .await;
        expected.push(identity);
    }
    // Noise: other facility type, other program.
    seed.approved_product("WH01", epi, warehouse, true).await;
    seed.approved_product("FP01", family_planning, health_center, true)
        .await;
    expected.sort();

    let service = service(&db);
    let params = FtapSearchParams::new()
        .facility_type_codes(["health_center"])
        .program_code("EPI")
        .active(true);
    let request = PageRequest::of(0, 10);

    let first = service.search(&params, &request).await.unwrap();
    let second = service.search(&params, &request).await.unwrap();

    assert_eq!(first.total_elements, 15);
    assert_eq!(first.content.len(), 10);

    let first_ids: Vec<_> = first.content.iter().map(|f| f.identity()).collect();
    let second_ids: Vec<_> = second.content.iter().map(|f| f.identity()).collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(first_ids.as_slice(), &expected[..10]);

    let last = service
        .search(&params, &PageRequest::of(1, 10))
        .await
        .unwrap();
    assert_eq!(last.total_elements, 15);
    assert_eq!(last.content.len(), 5);
}

#[tokio::test]
async fn test_only_latest_approval_version_is_returned() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "latest_approval").await;

    let health_center = seed.facility_type("health_center").await;
    let epi = seed.program("EPI").await;
    let (v1, orderable_id) = seed
        .approved_product("C100", epi, health_center, true)
        .await;
    let v2 = VersionedIdentity::new(v1.id, 2);
    seed.approval(v2, orderable_id, epi, health_center, true)
        .await;

    let service = service(&db);
    let resolved = service
        .resolve_identities(&FtapSearchParams::new())
        .await
        .unwrap();
    assert_eq!(resolved.as_slice(), &[v2]);

    // A retired latest version hides the approval from the default search.
    let v3 = VersionedIdentity::new(v1.id, 3);
    seed.approval(v3, orderable_id, epi, health_center, false)
        .await;

    let active = service
        .resolve_identities(&FtapSearchParams::new())
        .await
        .unwrap();
    assert!(active.is_empty());

    let inactive = service
        .resolve_identities(&FtapSearchParams::new().active(false))
        .await
        .unwrap();
    assert_eq!(inactive.as_slice(), &[v3]);
}

#[tokio::test]
async fn test_orderable_latest_version_drives_matching_and_hydration() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "orderable_latest").await;

    let health_center = seed.facility_type("health_center").await;
    let epi = seed.program("EPI").await;
    let vaccines = seed.category("VACCINES").await;

    // Version 2 of C100 stays in EPI, with a category.
    let (kept, kept_orderable) = seed
        .approved_product("C100", epi, health_center, true)
        .await;
    seed.orderable(kept_orderable, 2, "C100").await;
    seed.program_orderable(
        epi,
        VersionedIdentity::new(kept_orderable, 2),
        true,
        Some(vaccines),
    )
    .await;

    // Version 2 of C200 dropped out of EPI.
    let (dropped, dropped_orderable) = seed
        .approved_product("C200", epi, health_center, true)
        .await;
    seed.orderable(dropped_orderable, 2, "C200").await;

    let service = service(&db);
    let page = service
        .search(&FtapSearchParams::new(), &PageRequest::unpaged())
        .await
        .unwrap();

    let ids: Vec<_> = page.content.iter().map(|f| f.identity()).collect();
    assert_eq!(ids, vec![kept]);
    assert!(!ids.contains(&dropped));

    let hydrated = &page.content[0];
    assert_eq!(hydrated.orderable.version_id, 2);
    assert_eq!(hydrated.orderable.full_product_name, "C100 v2");
    assert_eq!(hydrated.orderable.trade_item_identifier(), Some("ti-C100"));
    assert!(
        hydrated
            .orderable
            .has_dispensable(&Dispensable {
                dispensing_unit: Some("vial".to_string()),
                size_code: None,
                route_of_administration: Some("oral".to_string()),
            })
    );

    let association = assert_some(
        hydrated.orderable.program_orderable(epi),
        "latest orderable version should be in EPI",
    );
    let category = assert_some(association.category.as_ref(), "category should be hydrated");
    assert_uuid_eq(category.id, vaccines, "category id");
    assert_eq!(category.display_name, "vaccines");
    assert_eq!(hydrated.program.code.as_str(), "EPI");
    assert_eq!(hydrated.facility_type.code.as_str(), "health_center");
    assert_eq!(hydrated.min_periods_of_stock, Some(1.0));
}

#[tokio::test]
async fn test_facility_is_resolved_to_its_type() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "facility_lookup").await;

    let health_center = seed.facility_type("health_center").await;
    let warehouse = seed.facility_type("warehouse").await;
    let clinic = seed.facility("CLINIC-1", health_center).await;
    let epi = seed.program("EPI").await;

    let (at_clinic, _) = seed
        .approved_product("C100", epi, health_center, true)
        .await;
    seed.approved_product("C200", epi, warehouse, true).await;

    let service = service(&db);
    let page = service
        .search(
            &FtapSearchParams::new().facility(clinic).program(epi),
            &PageRequest::of(0, 10),
        )
        .await
        .unwrap();

    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].identity(), at_clinic);

    let unknown = Uuid::now_v7();
    let error = service
        .search(
            &FtapSearchParams::new().facility(unknown),
            &PageRequest::of(0, 10),
        )
        .await
        .unwrap_err();
    match error {
        ReferenceDataError::NotFound { key, id } => {
            assert_eq!(key, MessageKey::FacilityNotFound);
            assert_uuid_eq(id, unknown, "not found id");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_supply_and_orderable_filters() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "full_supply_filters").await;

    let health_center = seed.facility_type("health_center").await;
    let epi = seed.program("EPI").await;
    let (full, _) = seed
        .approved_product("C100", epi, health_center, true)
        .await;
    let (partial, partial_orderable) = seed
        .approved_product("C200", epi, health_center, false)
        .await;

    let service = service(&db);

    let full_only = service
        .resolve_identities(&FtapSearchParams::new().full_supply(true))
        .await
        .unwrap();
    assert_eq!(full_only.as_slice(), &[full]);

    let non_full = service
        .resolve_identities(&FtapSearchParams::new().full_supply(false))
        .await
        .unwrap();
    assert_eq!(non_full.as_slice(), &[partial]);

    let by_orderable = service
        .resolve_identities(&FtapSearchParams::new().orderable_ids([partial_orderable]))
        .await
        .unwrap();
    assert_eq!(by_orderable.as_slice(), &[partial]);
}

#[tokio::test]
async fn test_round_trip_and_window_order() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "round_trip").await;

    let health_center = seed.facility_type("health_center").await;
    let epi = seed.program("EPI").await;
    for i in 0..6 {
        seed.approved_product(&format!("C{i}"), epi, health_center, i % 2 == 0)
            .await;
    }

    let service = service(&db);
    let resolved = service
        .resolve_identities(&FtapSearchParams::new())
        .await
        .unwrap();
    assert_eq!(resolved.len(), 6);

    let hydrated = service.hydrate(resolved.as_slice()).await.unwrap();
    let rederived: Vec<_> = hydrated.iter().map(|f| f.identity()).collect();
    assert_eq!(rederived.as_slice(), resolved.as_slice());

    let mut reversed = resolved.clone().into_inner();
    reversed.reverse();
    let hydrated = service.hydrate(&reversed).await.unwrap();
    let rederived: Vec<_> = hydrated.iter().map(|f| f.identity()).collect();
    assert_eq!(rederived, reversed);
}

#[tokio::test]
async fn test_hydrate_window_beyond_bind_parameter_limit() {
    let db = TestDatabase::new().await;
    let seed = Seeder::new(&db, "wide_window").await;

    let health_center = seed.facility_type("health_center").await;
    let epi = seed.program("EPI").await;
    let (stored, _) = seed
        .approved_product("C100", epi, health_center, true)
        .await;

    // More pairs than a statement could carry as individual parameters.
    let mut window: Vec<VersionedIdentity> = (0..40_000)
        .map(|version| VersionedIdentity::new(Uuid::now_v7(), version))
        .collect();
    window.insert(20_000, stored);

    let hydrated = service(&db).hydrate(&window).await.unwrap();

    let ids: Vec<_> = hydrated.iter().map(|f| f.identity()).collect();
    assert_eq!(ids, vec![stored]);
    assert_eq!(hydrated[0].orderable.product_code.as_str(), "C100");
}
