use serde::Serialize;

use crate::pdf::PdfInfo;
use crate::quota::UsageInfo;

pub const PAGES_TOTAL_HEADER: &str = "x-pages-total";
pub const PAGES_SUCCESSFUL_HEADER: &str = "x-pages-successful";
pub const PAGES_FAILED_HEADER: &str = "x-pages-failed";

#[derive(Debug, Serialize)]
pub struct PdfInfoResponse {
    pub filename: String,
    #[serde(flatten)]
    pub info: PdfInfo,
    pub quota: UsageInfo,
}

pub fn workbook_name(stem: &str) -> String {
    format!("{stem}_tables.xlsx")
}
