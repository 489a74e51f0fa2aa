//! Reference Data Domain
//!
//! Versioned search over facility type approved products (FTAPs).
//!
//! Orderables and FTAPs are versioned: each edit stores a new
//! `(id, version_id)` row and only the highest version per id is current.
//! A search therefore runs in two phases. First the matching identities are
//! resolved and paged, then exactly those identities are hydrated.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← GET /facilityTypeApprovedProducts, query parsing
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Service    │  ← facility lookup → resolve → paginate → hydrate
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  Repository  │  ← identity query (sea-query) + batched hydration
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │    Models    │  ← versioned identities, orderables, FTAPs, pages
//! └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_referencedata::{
//!     handlers,
//!     repository::InMemoryFtapRepository,
//!     service::FtapSearchService,
//! };
//!
//! let repository = InMemoryFtapRepository::new();
//! let service = FtapSearchService::new(repository);
//!
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod search;
pub mod service;

pub use error::{MessageKey, ReferenceDataError, ReferenceDataResult};
pub use models::{
    Code, Dispensable, FacilityType, FacilityTypeApprovedProduct, IdentityList, Orderable,
    ProductCategory, Program, ProgramOrderable, VersionedIdentity,
};
pub use pagination::{IdentityWindow, Page, PageRequest, paginate};
pub use postgres::PgFtapRepository;
pub use repository::{FtapRecord, FtapRepository, InMemoryFtapRepository};
pub use search::{
    FacilityReference, FacilityTypeFilter, FtapSearchParams, IdentityCriteria, ProgramFilter,
    ProgramReference,
};
pub use service::FtapSearchService;
