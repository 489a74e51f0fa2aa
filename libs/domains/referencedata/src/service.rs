use observability::{SearchMetrics, SearchOutcome, SearchStage};
use std::sync::Arc;

use crate::error::{ReferenceDataError, ReferenceDataResult};
use crate::models::{FacilityTypeApprovedProduct, IdentityList, VersionedIdentity};
use crate::pagination::{Page, PageRequest, paginate};
use crate::repository::FtapRepository;
use crate::search::{FacilityReference, FtapSearchParams, IdentityCriteria};

/// Paged search over facility type approved products.
///
/// Each search resolves identities, pages them and hydrates only the page.
/// Nothing is written and no state is kept between calls.
#[derive(Clone)]
pub struct FtapSearchService<R: FtapRepository> {
    repository: Arc<R>,
}

impl<R: FtapRepository> FtapSearchService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Latest FTAP identities matching `params`, ordered by id then version.
    ///
    /// A facility id is first reduced to its facility type; an unknown
    /// facility fails with `NotFound`.
    pub async fn resolve_identities(
        &self,
        params: &FtapSearchParams,
    ) -> ReferenceDataResult<IdentityList> {
        let facility_type_id = match &params.facility {
            Some(FacilityReference::Facility(facility_id)) => {
                let timer = SearchMetrics::stage(SearchStage::FacilityTypeLookup);
                let type_id = self
                    .repository
                    .find_facility_type_id(*facility_id)
                    .await?
                    .ok_or_else(|| ReferenceDataError::facility_not_found(*facility_id))?;
                timer.finish();
                Some(type_id)
            }
            _ => None,
        };

        let criteria = IdentityCriteria::from_params(params, facility_type_id);

        let timer = SearchMetrics::stage(SearchStage::ResolveIdentities);
        let identities = self.repository.resolve_identities(&criteria).await?;
        timer.finish();

        Ok(identities)
    }

    /// FTAPs at exactly `identities`. An empty window never reaches the store.
    pub async fn hydrate(
        &self,
        identities: &[VersionedIdentity],
    ) -> ReferenceDataResult<Vec<FacilityTypeApprovedProduct>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let timer = SearchMetrics::stage(SearchStage::Hydrate);
        let hydrated = self.repository.hydrate(identities).await?;
        timer.finish();

        Ok(hydrated)
    }

    pub async fn search(
        &self,
        params: &FtapSearchParams,
        page: &PageRequest,
    ) -> ReferenceDataResult<Page<FacilityTypeApprovedProduct>> {
        let result = self.search_page(params, page).await;

        match &result {
            Ok(found) => {
                SearchMetrics::record_search(
                    SearchOutcome::Success,
                    found.total_elements,
                    found.content.len(),
                );
                tracing::info!(
                    total = found.total_elements,
                    returned = found.content.len(),
                    page = page.page,
                    size = ?page.size,
                    "Approved product search completed"
                );
            }
            Err(error) => {
                let outcome = match error {
                    ReferenceDataError::NotFound { .. } => SearchOutcome::NotFound,
                    ReferenceDataError::Validation { .. } => SearchOutcome::Invalid,
                    ReferenceDataError::DataAccess(_) => SearchOutcome::Failed,
                };
                SearchMetrics::record_search(outcome, 0, 0);
                tracing::warn!(error = %error, "Approved product search failed");
            }
        }

        result
    }

    async fn search_page(
        &self,
        params: &FtapSearchParams,
        page: &PageRequest,
    ) -> ReferenceDataResult<Page<FacilityTypeApprovedProduct>> {
        let identities = self.resolve_identities(params).await?;
        if identities.is_empty() {
            return Ok(Page::empty(page));
        }

        let window = paginate(&identities, page);
        let content = self.hydrate(&window.identities).await?;

        Ok(Page::new(content, page, window.total))
    }
}
