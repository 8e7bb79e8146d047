mod header;

pub use header::{detect_header_row, ColumnMap, HEADER_SCAN_LIMIT};

use crate::field_mapper::FieldRole;
use shared_types::{split_full_name, CustomerRecord};

/// Output of [`TabularNormalizer::normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedImport {
    pub records: Vec<CustomerRecord>,
    pub header_row_index: usize,
    pub skipped: usize,
}

impl NormalizedImport {
    /// Rows below the header, i.e. `records.len() + skipped`.
    pub fn data_rows(&self) -> usize {
        self.records.len() + self.skipped
    }
}

/// Turns raw rows with an unknown header position and column order into customer records.
///
/// The normalizer does no I/O. Batching the records to the roster service is left to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct TabularNormalizer;

impl TabularNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, rows: &[Vec<String>]) -> NormalizedImport {
        self.normalize_at(rows, chrono::Utc::now().timestamp())
    }

    /// Same as [`normalize`](Self::normalize) with a fixed `createdAt` for every record.
    pub fn normalize_at(&self, rows: &[Vec<String>], created_at: i64) -> NormalizedImport {
        if rows.is_empty() {
            return NormalizedImport::default();
        }

        let header_row_index = detect_header_row(rows);
        let columns = ColumnMap::from_header(&rows[header_row_index]);
        if columns.is_empty() {
            tracing::warn!(
                header_row_index,
                "No recognizable columns in header row, every data row will be skipped"
            );
        }

        let mut records = Vec::new();
        let mut skipped = 0;

        for row in &rows[header_row_index + 1..] {
            match transform_row(&columns, row, created_at) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        tracing::debug!(
            header_row_index,
            records = records.len(),
            skipped,
            "Normalized tabular import"
        );

        NormalizedImport {
            records,
            header_row_index,
            skipped,
        }
    }
}

fn transform_row(columns: &ColumnMap, row: &[String], created_at: i64) -> Option<CustomerRecord> {
    let mut first_name = columns.cell(row, FieldRole::FirstName).to_string();
    let mut last_name = columns.cell(row, FieldRole::LastName).to_string();
    let name = columns.cell(row, FieldRole::Name);
    let email = columns.cell(row, FieldRole::Email).to_string();
    let phone = columns.cell(row, FieldRole::Phone).to_string();
    // Only a mapped address column may fill the address.
    let address = if columns.has(FieldRole::Address) {
        columns.cell(row, FieldRole::Address).to_string()
    } else {
        String::new()
    };

    if first_name.is_empty() && last_name.is_empty() && !name.is_empty() {
        (first_name, last_name) = split_full_name(name);
    }

    if first_name.is_empty() && last_name.is_empty() && email.is_empty() && phone.is_empty() {
        return None;
    }

    let mut record = CustomerRecord::new_pending(first_name, last_name, created_at);
    record.email = email;
    record.phone = phone;
    record.address = address;
    Some(record)
}
