//! Author dataset adapters
//!
//! CSV in, annotated CSV out, plus the clean/bad split, the coverage audit
//! and the JSON cache export. Spreadsheet formats are not handled here.

pub mod audit;
pub mod authors;
pub mod export;
pub mod filter;
pub mod projection;

pub use audit::GeocodingAudit;
pub use authors::{AuthorColumns, AuthorRecord, AuthorTable};
pub use export::{cache_export, write_cache_json, ExportedPlace};
pub use filter::{is_clean, split_clean};
pub use projection::{annotated_headers, project_author, write_annotated, AnnotatedAuthor, RoleOutput};
