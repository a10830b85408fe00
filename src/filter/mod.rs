//! Condition model: the static filter catalogue and condition records.

pub mod condition;
pub mod table;

pub use condition::{validate_conditions, Condition, CONDITION_FORMAT};
pub use table::{Category, FilterInfo, FilterKind, FILTER_KIND_MAX, FILTER_TABLE};
