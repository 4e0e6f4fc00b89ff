pub mod arrow;
pub mod columns;

pub use self::arrow::{build_unified_schema, merge_columns};
pub use columns::missing_required;
