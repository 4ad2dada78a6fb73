// SPDX-License-Identifier: GPL-3.0-only
pub mod error;
pub mod filter;
pub mod models;
pub mod sqlite;
pub mod store;
pub mod traits;
pub mod validation;

pub use error::{DiscoveryError, DiscoveryResult};
pub use filter::{Filter, WILDCARD, matches};
pub use models::{MetadataValue, Record, Status};
pub use sqlite::SqlitePersistence;
pub use store::RegistryStore;
pub use traits::Persistence;
pub use validation::{ValidRecord, validate_for_publish, validate_for_update};
