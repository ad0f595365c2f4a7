//! Lead storage backends.

pub mod cache;
pub mod fixtures;
pub mod memory;
pub mod rest;

pub use cache::{CacheError, CachedSnapshot, SnapshotCache};
pub use fixtures::mock_leads;
pub use memory::InMemoryLeadRepository;
pub use rest::{RestLeadRepository, RestSettings};
