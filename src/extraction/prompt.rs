use crate::gemini::GenerationConfig;

/// Low temperature keeps transcription deterministic.
pub fn table_generation_config() -> GenerationConfig {
    GenerationConfig {
        temperature: Some(0.1),
        top_p: Some(0.95),
        top_k: Some(40),
        max_output_tokens: Some(8192),
        ..Default::default()
    }
}

pub const TABLE_EXTRACTION_PROMPT: &str = r#"You are an expert OCR and table extraction system.

Analyze this table image and extract every cell exactly as written.

The table may be handwritten (cursive, print or messy), printed (books, forms,
invoices), a digital screenshot (spreadsheets, web pages), mixed printed and
handwritten content, a scanned page with skew, noise or stamps, or a phone
photo with angles, shadows or glare. Content may be in any language.

Reading rules:
1. Handwriting: read character by character and use neighbouring cells to
   resolve unclear letters. Correct rotation or skew mentally before reading.
2. Numbers: copy exact digits (2250, not 2200), keep decimal points (49.50,
   not 4950), currency symbols, negative forms such as -125 or (125), and
   thousands separators.
3. Text: keep spelling, capitalisation, special characters and abbreviations
   exactly. Report ticks as "✓" or "Yes".
4. Scripts: preserve the original script and right-to-left text; cells may
   mix languages.
5. Empty and special cells: empty cells are "", placeholder dashes are "-",
   N/A stays "N/A", checkboxes are "☐" or "☑". For merged cells put the full
   text in the first cell and "" in the cells it spans.
6. Structure: follow solid, dashed or implied borders, align borderless tables
   by whitespace, identify header rows and ignore logos, watermarks and stamps.
7. Quality: make the best contextual reading of blurred, faded or smudged
   text and extract whatever is legible under overlapping marks.

Process: determine the table type and languages, count the columns and rows,
read the header row (if there is none, name the columns "Column 1",
"Column 2", ...), read the data row by row from left to right, then verify the
row and column counts and that no cell was skipped.

Respond with JSON only, in exactly this shape:
{
  "table_metadata": {
    "total_rows": <row count including headers>,
    "total_columns": <column count>,
    "total_cells": <rows x columns>,
    "cells_with_content": <non-empty cell count>,
    "extraction_confidence": "high|medium|low",
    "table_type": "handwritten|printed|mixed|digital|scanned|form|invoice|ledger|inventory|other",
    "detected_languages": ["English", ...],
    "has_merged_cells": true|false,
    "image_quality": "excellent|good|fair|poor"
  },
  "column_headers": ["Header1", "Header2", ...],
  "table_data": [
    ["row1_col1", "row1_col2", ...],
    ["row2_col1", "row2_col2", ...]
  ],
  "extraction_notes": "short notes on image quality and confidence"
}"#;

pub const PAGE_EXTRACTION_PROMPT: &str = r#"You are an expert table extraction system. Extract all tables from this PDF page.

1. Find every table: bordered tables, borderless tables with aligned columns,
   and any other tabular data on the page.
2. Count the exact rows and columns, identify header rows, and for merged
   cells put the text in the first cell.
3. Copy each cell exactly as shown: precise numbers (2250, not 2200),
   currency symbols and decimals. Empty cells are "".

Respond with JSON only, in exactly this shape:
{
  "page_number": <page number or 1>,
  "tables_found": <number of tables on this page>,
  "tables": [
    {
      "table_id": <1, 2, 3, ...>,
      "metadata": {
        "total_rows": <row count>,
        "total_columns": <column count>,
        "has_headers": true|false
      },
      "headers": ["Column1", "Column2", ...],
      "data": [
        ["row1_col1", "row1_col2", ...],
        ["row2_col1", "row2_col2", ...]
      ]
    }
  ],
  "extraction_notes": "short quality notes"
}

If the page contains no tables, return "tables": []."#;
