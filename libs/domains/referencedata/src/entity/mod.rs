//! Sea-ORM entities for the reference-data tables.
//!
//! Versioned tables (`orderables`, `facility_type_approved_products`) have a
//! composite `(id, version_id)` primary key.

pub mod dispensable;
pub mod facility;
pub mod facility_type;
pub mod facility_type_approved_product;
pub mod orderable;
pub mod product_category;
pub mod program;
pub mod program_orderable;
