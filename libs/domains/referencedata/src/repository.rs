use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ReferenceDataResult;
use crate::models::{
    FacilityType, FacilityTypeApprovedProduct, IdentityList, Orderable, Program,
    VersionedIdentity,
};
use crate::search::{FacilityTypeFilter, IdentityCriteria, ProgramFilter};

/// Read access to facility type approved products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FtapRepository: Send + Sync {
    /// Type of the facility, or `None` when the facility (or its type) does
    /// not exist.
    async fn find_facility_type_id(&self, facility_id: Uuid) -> ReferenceDataResult<Option<Uuid>>;

    /// Latest FTAP identities matching `criteria`, ordered by id then version.
    async fn resolve_identities(
        &self,
        criteria: &IdentityCriteria,
    ) -> ReferenceDataResult<IdentityList>;

    /// FTAPs at exactly these identities, in the same order. Identities that
    /// no longer exist are skipped.
    async fn hydrate(
        &self,
        identities: &[VersionedIdentity],
    ) -> ReferenceDataResult<Vec<FacilityTypeApprovedProduct>>;
}

/// One stored FTAP version, with references by id.
#[derive(Debug, Clone, PartialEq)]
pub struct FtapRecord {
    pub id: Uuid,
    pub version_id: i64,
    pub orderable_id: Uuid,
    pub program_id: Uuid,
    pub facility_type_id: Uuid,
    pub max_periods_of_stock: f64,
    pub min_periods_of_stock: Option<f64>,
    pub emergency_order_point: Option<f64>,
    pub active: bool,
    pub last_updated: DateTime<Utc>,
}

impl FtapRecord {
    pub fn new(orderable_id: Uuid, program_id: Uuid, facility_type_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            version_id: 1,
            orderable_id,
            program_id,
            facility_type_id,
            max_periods_of_stock: 3.0,
            min_periods_of_stock: None,
            emergency_order_point: None,
            active: true,
            last_updated: Utc::now(),
        }
    }

    pub fn identity(&self) -> VersionedIdentity {
        VersionedIdentity::new(self.id, self.version_id)
    }

    /// The same approval one version later.
    pub fn next_version(&self) -> Self {
        Self {
            version_id: self.version_id + 1,
            last_updated: Utc::now(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    facility_types: HashMap<Uuid, FacilityType>,
    facilities: HashMap<Uuid, Uuid>,
    programs: HashMap<Uuid, Program>,
    orderables: HashMap<VersionedIdentity, Orderable>,
    approvals: HashMap<VersionedIdentity, FtapRecord>,
}

impl Store {
    fn latest_orderable(&self, id: Uuid) -> Option<&Orderable> {
        self.orderables
            .values()
            .filter(|o| o.id == id)
            .max_by_key(|o| o.version_id)
    }

    fn latest_approval_versions(&self) -> HashMap<Uuid, i64> {
        let mut latest: HashMap<Uuid, i64> = HashMap::new();
        for identity in self.approvals.keys() {
            let version = latest.entry(identity.id).or_insert(identity.version_id);
            *version = (*version).max(identity.version_id);
        }
        latest
    }

    fn matches(&self, record: &FtapRecord, criteria: &IdentityCriteria) -> bool {
        if record.active != criteria.active {
            return false;
        }

        let Some(program) = self.programs.get(&record.program_id) else {
            return false;
        };
        match &criteria.program {
            Some(ProgramFilter::Id(id)) if program.id != *id => return false,
            Some(ProgramFilter::Code(code)) if program.code.as_str() != code => return false,
            _ => {}
        }

        let Some(orderable) = self.latest_orderable(record.orderable_id) else {
            return false;
        };
        if !criteria.orderable_ids.is_empty() && !criteria.orderable_ids.contains(&orderable.id) {
            return false;
        }
        let in_program = orderable.programs.iter().any(|po| {
            po.program_id == program.id
                && po.active
                && criteria.full_supply.is_none_or(|fs| po.full_supply == fs)
        });
        if !in_program {
            return false;
        }

        let Some(facility_type) = self.facility_types.get(&record.facility_type_id) else {
            return false;
        };
        match &criteria.facility_type {
            Some(FacilityTypeFilter::Id(id)) => facility_type.id == *id,
            Some(FacilityTypeFilter::Codes(codes)) => {
                codes.iter().any(|code| facility_type.code.as_str() == code)
            }
            None => true,
        }
    }

    fn assemble(&self, record: &FtapRecord) -> Option<FacilityTypeApprovedProduct> {
        Some(FacilityTypeApprovedProduct {
            id: record.id,
            version_id: record.version_id,
            orderable: self.latest_orderable(record.orderable_id)?.clone(),
            program: self.programs.get(&record.program_id)?.clone(),
            facility_type: self.facility_types.get(&record.facility_type_id)?.clone(),
            max_periods_of_stock: record.max_periods_of_stock,
            min_periods_of_stock: record.min_periods_of_stock,
            emergency_order_point: record.emergency_order_point,
            active: record.active,
            last_updated: record.last_updated,
        })
    }
}

/// In-memory implementation of FtapRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryFtapRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryFtapRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_facility_type(&self, facility_type: FacilityType) {
        let mut store = self.store.write().await;
        store.facility_types.insert(facility_type.id, facility_type);
    }

    pub async fn insert_facility(&self, facility_id: Uuid, type_id: Uuid) {
        let mut store = self.store.write().await;
        store.facilities.insert(facility_id, type_id);
    }

    pub async fn insert_program(&self, program: Program) {
        let mut store = self.store.write().await;
        store.programs.insert(program.id, program);
    }

    /// Stores one orderable version, replacing any with the same identity.
    pub async fn insert_orderable(&self, orderable: Orderable) {
        let mut store = self.store.write().await;
        store.orderables.insert(orderable.identity(), orderable);
    }

    pub async fn insert_approval(&self, record: FtapRecord) {
        let mut store = self.store.write().await;
        store.approvals.insert(record.identity(), record);
    }
}

#[async_trait]
impl FtapRepository for InMemoryFtapRepository {
    async fn find_facility_type_id(&self, facility_id: Uuid) -> ReferenceDataResult<Option<Uuid>> {
        let store = self.store.read().await;
        Ok(store
            .facilities
            .get(&facility_id)
            .copied()
            .filter(|type_id| store.facility_types.contains_key(type_id)))
    }

    async fn resolve_identities(
        &self,
        criteria: &IdentityCriteria,
    ) -> ReferenceDataResult<IdentityList> {
        let store = self.store.read().await;

        let mut identities: Vec<VersionedIdentity> = store
            .latest_approval_versions()
            .into_iter()
            .map(|(id, version_id)| VersionedIdentity::new(id, version_id))
            .filter(|identity| {
                store
                    .approvals
                    .get(identity)
                    .is_some_and(|record| store.matches(record, criteria))
            })
            .collect();
        identities.sort();

        tracing::debug!(count = identities.len(), "Resolved identities in memory");
        Ok(IdentityList::from_ordered(identities))
    }

    async fn hydrate(
        &self,
        identities: &[VersionedIdentity],
    ) -> ReferenceDataResult<Vec<FacilityTypeApprovedProduct>> {
        let store = self.store.read().await;

        Ok(identities
            .iter()
            .filter_map(|identity| store.approvals.get(identity))
            .filter_map(|record| store.assemble(record))
            .collect())
    }
}
