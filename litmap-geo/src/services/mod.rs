//! Resolution services
//!
//! Disambiguation, anachronism flagging, the cache with its id assigner and
//! persistence, the resolver that composes them, and the batch pipeline.

pub mod cache;
pub mod cache_store;
pub mod disambiguator;
pub mod flagger;
pub mod pipeline;
pub mod resolver;

pub use cache::{CacheRow, IdAssigner, ResolutionCache};
pub use cache_store::{CacheStore, CsvCacheStore, MemoryCacheStore, CACHE_HEADER};
pub use disambiguator::{disambiguate, Locatable, Preference, Selection};
pub use flagger::Flagger;
pub use pipeline::{annotate_authors, PipelineStats};
pub use resolver::{Resolution, Resolver};
