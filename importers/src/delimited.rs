use csv::ReaderBuilder;
use shared_types::ImportError;
use std::path::Path;

use crate::tabular::HEADER_SCAN_LIMIT;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Reads delimited text into raw rows without assuming where the header is.
pub struct DelimitedReader {
    delimiter: Option<u8>,
}

impl DelimitedReader {
    /// Reader that sniffs the delimiter from the leading lines.
    pub fn new() -> Self {
        Self { delimiter: None }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<Vec<String>>, ImportError> {
        let content = std::fs::read(path).map_err(|e| {
            ImportError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.read_rows(&content)
    }

    pub fn read_rows(&self, content: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content);

        let mut rows = Vec::new();

        for (line, result) in reader.byte_records().enumerate() {
            match result {
                Ok(record) => {
                    let row = record
                        .iter()
                        .map(|field| String::from_utf8_lossy(field).into_owned())
                        .collect();
                    rows.push(row);
                }
                Err(e) if e.is_io_error() => {
                    return Err(ImportError::ParseError(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!(line, "Failed to parse delimited row: {}", e);
                }
            }
        }

        Ok(rows)
    }
}

impl Default for DelimitedReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate that appears on the most of the first [`HEADER_SCAN_LIMIT`] non-empty lines,
/// outside quotes. Title rows above the header rarely contain the delimiter, so a single
/// line is not enough. Ties go to the higher total count, then to comma.
fn sniff_delimiter(content: &[u8]) -> u8 {
    let window: Vec<&[u8]> = content
        .split(|byte| *byte == b'\n')
        .filter(|line| line.iter().any(|byte| !byte.is_ascii_whitespace()))
        .take(HEADER_SCAN_LIMIT)
        .collect();

    let mut best = b',';
    let mut best_score = (0, 0);
    for candidate in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = window
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect();
        let score = (
            counts.iter().filter(|count| **count > 0).count(),
            counts.iter().sum::<usize>(),
        );
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }
    best
}

fn count_unquoted(line: &[u8], delimiter: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for byte in line {
        match *byte {
            b'"' => quoted = !quoted,
            b if b == delimiter && !quoted => count += 1,
            _ => {}
        }
    }
    count
}
