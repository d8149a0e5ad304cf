//! Mapping CSV Parser
//!
//! Legacy uploads pair result files with a two-column CSV that maps result item identifiers onto
//! assessment item identifiers:
//!
//! ```text
//! resultItemIdentifier,itemIdentifier
//! Q1,item-1
//! "Q,2",item-2
//! ```
//!
//! Fields follow RFC 4180 quoting (`""` escapes a quote inside a quoted field). A UTF-8 BOM and
//! CRLF line endings are tolerated, blank lines are dropped, rows with an empty side are skipped and
//! later rows override earlier ones.

use crate::error::QtiError;
use crate::traits::parser::Parser;
use serde::Serialize;
use std::collections::BTreeMap;

/// Bidirectional result-identifier / item-identifier lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingTable {
    result_to_item: BTreeMap<String, String>,
    item_to_result: BTreeMap<String, String>,
}

impl MappingTable {
    pub fn insert(&mut self, result_identifier: impl Into<String>, item_identifier: impl Into<String>) {
        let result_identifier = result_identifier.into();
        let item_identifier = item_identifier.into();
        self.result_to_item
            .insert(result_identifier.clone(), item_identifier.clone());
        self.item_to_result.insert(item_identifier, result_identifier);
    }

    pub fn item_for_result(&self, result_identifier: &str) -> Option<&str> {
        self.result_to_item.get(result_identifier).map(String::as_str)
    }

    pub fn result_for_item(&self, item_identifier: &str) -> Option<&str> {
        self.item_to_result.get(item_identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.result_to_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_to_item.is_empty()
    }
}

/// Parser for the legacy mapping CSV.
pub struct MappingCsvParser;

impl<'a> Parser<&'a str, MappingTable> for MappingCsvParser {
    fn parse(&self, csv: &'a str) -> Result<MappingTable, QtiError> {
        let normalized = csv.replace("\r\n", "\n");
        let mut lines = normalized
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| QtiError::InvalidMapping("mapping CSV is empty".into()))?;
        let header = header.trim_start_matches('\u{feff}');
        let columns: Vec<String> = split_csv_line(header)
            .into_iter()
            .map(|field| field.chars().filter(|c| !c.is_whitespace()).collect())
            .collect();
        if columns.first().map(String::as_str) != Some("resultItemIdentifier")
            || columns.get(1).map(String::as_str) != Some("itemIdentifier")
        {
            return Err(QtiError::InvalidMapping(format!(
                "expected header 'resultItemIdentifier,itemIdentifier', found '{header}'"
            )));
        }

        let mut table = MappingTable::default();
        for line in lines {
            let fields = split_csv_line(line);
            let result_id = fields.first().map(|f| f.trim()).unwrap_or_default();
            let item_id = fields.get(1).map(|f| f.trim()).unwrap_or_default();
            if result_id.is_empty() || item_id.is_empty() {
                continue;
            }
            table.insert(result_id, item_id);
        }
        Ok(table)
    }
}

/// Convenience wrapper around [`MappingCsvParser`].
pub fn parse_mapping_csv(csv: &str) -> Result<MappingTable, QtiError> {
    MappingCsvParser.parse(csv)
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}
