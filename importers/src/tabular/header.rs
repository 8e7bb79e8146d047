use crate::field_mapper::{map_header, normalize_label, FieldRole};
use std::collections::HashMap;

/// Only this many leading rows are considered when looking for the header.
pub const HEADER_SCAN_LIMIT: usize = 10;

const HEADER_STEMS: [&str; 6] = ["name", "email", "phone", "address", "first", "last"];

/// Index of the first row in the scan window that looks like a header, `0` if none does.
pub fn detect_header_row(rows: &[Vec<String>]) -> usize {
    rows.iter()
        .take(HEADER_SCAN_LIMIT)
        .position(|row| looks_like_header(row))
        .unwrap_or(0)
}

fn looks_like_header(row: &[String]) -> bool {
    let normalized: Vec<String> = row.iter().map(|cell| normalize_label(cell)).collect();

    let keyword_cells = normalized
        .iter()
        .filter(|cell| HEADER_STEMS.iter().any(|stem| cell.contains(stem)))
        .count();
    let filled_cells = normalized.iter().filter(|cell| !cell.is_empty()).count();

    keyword_cells >= 1 && filled_cells >= 2
}

/// Role to column index. When several columns map to one role the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<FieldRole, usize>,
}

impl ColumnMap {
    pub fn from_header(header: &[String]) -> Self {
        let mut columns = HashMap::new();
        for (index, label) in header.iter().enumerate() {
            if let Some(role) = map_header(label) {
                columns.insert(role, index);
            }
        }
        Self { columns }
    }

    pub fn index_of(&self, role: FieldRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn has(&self, role: FieldRole) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Trimmed cell for `role`, empty when the role is unmapped or the row is short.
    pub fn cell<'a>(&self, row: &'a [String], role: FieldRole) -> &'a str {
        self.index_of(role)
            .and_then(|index| row.get(index))
            .map(|value| value.trim())
            .unwrap_or("")
    }
}
