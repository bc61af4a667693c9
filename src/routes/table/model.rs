pub const NO_TABLES_SUGGESTION: &str =
    "Please upload a clearer image with visible table structure";

/// Download name for a single-image workbook.
pub fn workbook_name(stem: &str) -> String {
    format!("table_extracted_{stem}.xlsx")
}
