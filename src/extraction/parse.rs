use serde::Deserialize;
use serde_json::Value;

use crate::table::{CellValue, ExtractedTable, lenient_string, null_as_default};

/// Pulls the JSON payload out of a model reply.
///
/// Order: a ```json fence, any ``` fence, the bare reply when it already
/// starts like JSON, and finally the outermost `{...}` span.
pub fn extract_json_block(reply: &str) -> &str {
    let trimmed = reply.trim();

    if let Some(start) = trimmed.find("```json") {
        return fenced_body(&trimmed[start + 7..]);
    }

    if let Some(start) = trimmed.find("```") {
        let body = fenced_body(&trimmed[start + 3..]);
        // drop a language tag such as ```JSON
        if !body.starts_with('{') && !body.starts_with('[') {
            if let Some((_, rest)) = body.split_once('\n') {
                return rest.trim();
            }
        }
        return body;
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn fenced_body(after_fence: &str) -> &str {
    match after_fence.find("```") {
        Some(end) => after_fence[..end].trim(),
        None => after_fence.trim(),
    }
}

/// Reply shape requested for a single table image.
#[derive(Debug, Deserialize)]
struct TableReply {
    #[serde(default)]
    table_metadata: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    column_headers: Vec<CellValue>,
    #[serde(deserialize_with = "null_as_default")]
    table_data: Vec<Vec<CellValue>>,
    #[serde(default, deserialize_with = "lenient_string")]
    extraction_notes: String,
}

pub fn parse_table_reply(reply: &str) -> Result<ExtractedTable, serde_json::Error> {
    let parsed: TableReply = serde_json::from_str(extract_json_block(reply))?;
    Ok(ExtractedTable {
        table_id: 1,
        metadata: parsed.table_metadata,
        headers: parsed.column_headers,
        data: parsed.table_data,
        notes: parsed.extraction_notes,
    })
}

/// Reply shape requested for one PDF page.
#[derive(Debug, Deserialize)]
pub struct PageReply {
    #[serde(deserialize_with = "null_as_default")]
    pub tables: Vec<ExtractedTable>,
    #[serde(default)]
    pub tables_found: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extraction_notes: String,
}

pub fn parse_page_reply(reply: &str) -> Result<PageReply, serde_json::Error> {
    let mut parsed: PageReply = serde_json::from_str(extract_json_block(reply))?;
    for (idx, table) in parsed.tables.iter_mut().enumerate() {
        if table.table_id == 0 {
            table.table_id = idx as u32 + 1;
        }
    }
    Ok(parsed)
}
