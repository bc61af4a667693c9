mod handler;
mod model;

pub use handler::{extract_table, extract_table_json};
pub use model::NO_TABLES_SUGGESTION;
