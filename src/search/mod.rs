//! Multi-type search orchestration: fan-out execution, global ranking,
//! facet merging, pagination and export.

pub mod engine;
pub mod executor;
pub mod export;
pub mod facets;
pub mod pagination;
pub mod ranker;

pub use engine::MultiTypeSearchEngine;
pub use executor::{SearchExecutor, TypeOutcome};
pub use export::{ExportBundle, ExportFormat, ExportOutcome, ExportRow, FlatRow};
pub use facets::merge_facets;
pub use pagination::{Page, paginate};
pub use ranker::sort_by_global_relevance;
