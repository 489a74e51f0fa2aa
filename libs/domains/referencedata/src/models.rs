use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifier key holding the trade item reference of an orderable.
pub const TRADE_ITEM_IDENTIFIER: &str = "tradeItem";
/// Identifier key holding the commodity type reference of an orderable.
pub const COMMODITY_TYPE_IDENTIFIER: &str = "commodityType";

// ============================================================================
// Versioned identity
// ============================================================================

/// Composite key of a versioned entity.
///
/// Ordering is by `id`, then `version_id`, which is also the order the
/// identity query sorts by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    FromQueryResult,
)]
#[serde(rename_all = "camelCase")]
pub struct VersionedIdentity {
    pub id: Uuid,
    pub version_id: i64,
}

impl VersionedIdentity {
    pub fn new(id: Uuid, version_id: i64) -> Self {
        Self { id, version_id }
    }
}

/// Ordered, duplicate-free identities produced by the identity resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityList {
    identities: Vec<VersionedIdentity>,
}

impl IdentityList {
    /// Keeps the first occurrence of each identity and the input order.
    pub fn from_ordered(identities: impl IntoIterator<Item = VersionedIdentity>) -> Self {
        let mut seen = HashSet::new();
        let identities = identities
            .into_iter()
            .filter(|identity| seen.insert(*identity))
            .collect();
        Self { identities }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn as_slice(&self) -> &[VersionedIdentity] {
        &self.identities
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionedIdentity> {
        self.identities.iter()
    }

    pub fn into_inner(self) -> Vec<VersionedIdentity> {
        self.identities
    }
}

impl FromIterator<VersionedIdentity> for IdentityList {
    fn from_iter<I: IntoIterator<Item = VersionedIdentity>>(iter: I) -> Self {
        Self::from_ordered(iter)
    }
}

// ============================================================================
// Codes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("code must not be blank")]
pub struct BlankCode;

/// A business code. Comparison ignores case; blank codes cannot be built.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "C100")]
pub struct Code(String);

impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Code {
    type Error = BlankCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(BlankCode);
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for Code {
    type Error = BlankCode;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_lowercase() == other.0.to_lowercase()
    }
}

impl Eq for Code {}

impl Hash for Code {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_lowercase().hash(state);
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Reference entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacilityType {
    pub id: Uuid,
    pub code: Code,
    pub name: Option<String>,
    pub display_order: Option<i32>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: Uuid,
    pub code: Code,
    pub name: Option<String>,
    pub active: bool,
}

/// How an orderable is dispensed. Equal when all attributes match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dispensable {
    pub dispensing_unit: Option<String>,
    pub size_code: Option<String>,
    pub route_of_administration: Option<String>,
}

impl Dispensable {
    pub fn of_dispensing_unit(unit: impl Into<String>) -> Self {
        Self {
            dispensing_unit: Some(unit.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: Uuid,
    pub code: Code,
    pub display_name: String,
    pub display_order: i32,
}

impl ProductCategory {
    /// Copies the display value; id and code are left alone.
    pub fn update_from(&mut self, other: &ProductCategory) {
        self.display_name = other.display_name.clone();
        self.display_order = other.display_order;
    }
}

/// Association of an orderable version with a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOrderable {
    pub id: Uuid,
    pub program_id: Uuid,
    pub category: Option<ProductCategory>,
    pub active: bool,
    pub full_supply: bool,
    pub display_order: i32,
    pub doses_per_patient: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

// ============================================================================
// Orderable
// ============================================================================

/// A product version that can be ordered.
///
/// Two orderables are equal when their product codes match, whatever their
/// identities. Hashing follows the same rule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Orderable {
    pub id: Uuid,
    pub version_id: i64,
    pub product_code: Code,
    pub full_product_name: String,
    pub description: Option<String>,
    pub dispensable: Dispensable,
    pub net_content: i64,
    pub pack_rounding_threshold: i64,
    pub round_to_zero: bool,
    pub programs: Vec<ProgramOrderable>,
    pub identifiers: BTreeMap<String, String>,
    pub extra_data: BTreeMap<String, String>,
    pub last_updated: DateTime<Utc>,
}

impl Orderable {
    pub fn identity(&self) -> VersionedIdentity {
        VersionedIdentity::new(self.id, self.version_id)
    }

    /// The active association with `program_id`, if any.
    pub fn program_orderable(&self, program_id: Uuid) -> Option<&ProgramOrderable> {
        self.programs
            .iter()
            .find(|po| po.program_id == program_id && po.active)
    }

    pub fn trade_item_identifier(&self) -> Option<&str> {
        self.identifiers
            .get(TRADE_ITEM_IDENTIFIER)
            .map(String::as_str)
    }

    pub fn commodity_type_identifier(&self) -> Option<&str> {
        self.identifiers
            .get(COMMODITY_TYPE_IDENTIFIER)
            .map(String::as_str)
    }

    pub fn has_dispensable(&self, dispensable: &Dispensable) -> bool {
        self.dispensable == *dispensable
    }
}

impl PartialEq for Orderable {
    fn eq(&self, other: &Self) -> bool {
        self.product_code == other.product_code
    }
}

impl Eq for Orderable {}

impl Hash for Orderable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.product_code.hash(state);
    }
}

// ============================================================================
// Facility type approved product
// ============================================================================

/// Approval of an orderable for a facility type within a program.
///
/// `orderable` is always the orderable's latest version.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacilityTypeApprovedProduct {
    pub id: Uuid,
    pub version_id: i64,
    pub orderable: Orderable,
    pub program: Program,
    pub facility_type: FacilityType,
    pub max_periods_of_stock: f64,
    pub min_periods_of_stock: Option<f64>,
    pub emergency_order_point: Option<f64>,
    pub active: bool,
    pub last_updated: DateTime<Utc>,
}

impl FacilityTypeApprovedProduct {
    pub fn identity(&self) -> VersionedIdentity {
        VersionedIdentity::new(self.id, self.version_id)
    }
}
