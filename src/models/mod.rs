pub mod product;

pub use product::{Product, ProductFields, ProductPayload};

use chrono::Utc;

/// Current UTC time as ISO-8601 with microseconds and a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
