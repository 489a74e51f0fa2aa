//! Shared test utilities for the reference-data crates.
//!
//! - `TestDatabase`: migrated PostgreSQL container with automatic cleanup
//! - `TestDataBuilder`: deterministic ids and codes derived from a test name
//! - `assertions`: assertion helpers
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let program_id = builder.id("program");
//!     let code = builder.code("FT", "health_center");
//! }
//! ```

use uuid::Uuid;

mod postgres;

pub use postgres::TestDatabase;

/// Deterministic test data keyed by a seed.
///
/// Ids and codes are stable across runs for the same test name and distinct
/// between tests, so containers can be shared without unique-key collisions.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name.
    pub fn from_test_name(name: &str) -> Self {
        Self::new(fnv1a(name.as_bytes()))
    }

    /// A UUID unique to this builder and `label`.
    pub fn id(&self, label: &str) -> Uuid {
        let high = self.seed.to_be_bytes();
        let low = fnv1a(label.as_bytes()).to_be_bytes();
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&high);
        bytes[8..].copy_from_slice(&low);
        Uuid::from_bytes(bytes)
    }

    /// A business code such as `FT-1234-health_center`.
    pub fn code(&self, prefix: &str, suffix: &str) -> String {
        format!("{}-{}-{}", prefix, self.seed % 100_000, suffix)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Test assertion helpers
pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected UUID {}, got {}",
            context, expected, actual
        );
    }

    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
