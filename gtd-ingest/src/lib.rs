//! gtd-ingest: deterministic extraction of candidate task fields from free text.

pub mod parsers;
pub mod types;

pub use parsers::natural_date::parse_natural_date;
pub use parsers::task_text::extract_task_fields;
pub use types::ExtractedTask;
