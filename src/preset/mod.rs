mod columns;
mod lint;
mod parser;

pub use columns::{ColumnDef, ColumnType, Importance};
pub use lint::{Diagnostic, lint, missing_required};
pub use parser::{DEFAULT_EXPORT_AS, ParsedPreset, parse};
