pub mod ai;
pub mod error;
pub mod input;
pub mod model;
pub mod preset;
pub mod render;

pub use error::{AiError, CoerceError, InvalidPresetFormat, RowError};
pub use model::{Row, Table};
pub use preset::{ColumnDef, ColumnType, Importance, ParsedPreset};
pub use render::Export;
