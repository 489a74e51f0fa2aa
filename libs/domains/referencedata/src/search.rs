//! Search inputs.
//!
//! [`FtapSearchParams`] is what callers ask for. [`IdentityCriteria`] is what
//! the identity resolver filters on once a facility has been reduced to its
//! facility type and the defaults have been applied.

use uuid::Uuid;

/// Where the approvals should apply: one facility or a set of facility types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityReference {
    Facility(Uuid),
    FacilityTypeCodes(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramReference {
    Id(Uuid),
    Code(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FtapSearchParams {
    pub facility: Option<FacilityReference>,
    pub program: Option<ProgramReference>,
    pub full_supply: Option<bool>,
    pub orderable_ids: Vec<Uuid>,
    /// Unset means active approvals only.
    pub active: Option<bool>,
}

impl FtapSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facility(mut self, facility_id: Uuid) -> Self {
        self.facility = Some(FacilityReference::Facility(facility_id));
        self
    }

    pub fn facility_type_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facility = Some(FacilityReference::FacilityTypeCodes(
            codes.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn program(mut self, program_id: Uuid) -> Self {
        self.program = Some(ProgramReference::Id(program_id));
        self
    }

    pub fn program_code(mut self, code: impl Into<String>) -> Self {
        self.program = Some(ProgramReference::Code(code.into()));
        self
    }

    pub fn full_supply(mut self, full_supply: bool) -> Self {
        self.full_supply = Some(full_supply);
        self
    }

    pub fn orderable_ids(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.orderable_ids = ids.into_iter().collect();
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityTypeFilter {
    Id(Uuid),
    Codes(Vec<String>),
}

impl FacilityTypeFilter {
    /// `None` when no non-blank code remains.
    pub fn codes<I, S>(codes: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: Vec<String> = codes
            .into_iter()
            .map(|code| code.as_ref().trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();

        (!codes.is_empty()).then_some(Self::Codes(codes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramFilter {
    Id(Uuid),
    Code(String),
}

/// Normalized filters for the identity resolver. Absent filters match
/// everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCriteria {
    pub facility_type: Option<FacilityTypeFilter>,
    pub program: Option<ProgramFilter>,
    pub full_supply: Option<bool>,
    pub orderable_ids: Vec<Uuid>,
    pub active: bool,
}

impl Default for IdentityCriteria {
    fn default() -> Self {
        Self {
            facility_type: None,
            program: None,
            full_supply: None,
            orderable_ids: Vec::new(),
            active: true,
        }
    }
}

impl IdentityCriteria {
    /// Build criteria from caller params.
    ///
    /// `facility_type_id` is the type of the facility the caller named, when
    /// it named one. It wins over any codes in `params`.
    pub fn from_params(params: &FtapSearchParams, facility_type_id: Option<Uuid>) -> Self {
        let facility_type = match (facility_type_id, &params.facility) {
            (Some(id), _) => Some(FacilityTypeFilter::Id(id)),
            (None, Some(FacilityReference::FacilityTypeCodes(codes))) => {
                FacilityTypeFilter::codes(codes)
            }
            (None, _) => None,
        };

        let program = match &params.program {
            Some(ProgramReference::Id(id)) => Some(ProgramFilter::Id(*id)),
            Some(ProgramReference::Code(code)) if !code.trim().is_empty() => {
                Some(ProgramFilter::Code(code.trim().to_string()))
            }
            _ => None,
        };

        Self {
            facility_type,
            program,
            full_supply: params.full_supply,
            orderable_ids: params.orderable_ids.clone(),
            active: params.active.unwrap_or(true),
        }
    }
}
