//! # curtail-io: External Interfaces
//!
//! Everything that touches the outside world: source feed descriptors and
//! their column-alias schemas, the robust raw CSV reader, the persisted
//! monthly history store, the entity-to-company mapping file, and the
//! month-keyed fetcher with its local cache.
//!
//! The computation core (`curtail-agg`) only ever sees already-retrieved
//! tabular data and an injected store handle; no path or URL is baked into it.

pub mod fetch;
pub mod mapping;
pub mod reader;
pub mod schema;
pub mod source;
pub mod store;

pub use fetch::MonthFetcher;
pub use mapping::CompanyMap;
pub use reader::read_raw_samples;
pub use schema::{ResolvedColumns, SourceSchema};
pub use source::{CurtailVariant, RestrictionPolicy, SourceKind, SourceSpec};
pub use store::HistoryStore;
