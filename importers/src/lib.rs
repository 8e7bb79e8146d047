//! Importers Crate
//!
//! Turns arbitrary tabular input into canonical customer records. Header position and
//! column order are not known up front, so both are detected heuristically.
//!
//! # Architecture
//!
//! - **Types**: `CustomerRecord` and friends live in the `shared-types` crate
//! - **Reading**: `DelimitedReader` turns bytes into raw rows (delimiter is sniffed)
//! - **Mapping**: `map_header` assigns a canonical role to a header label
//! - **Normalizing**: `TabularNormalizer` finds the header row and builds records
//!
//! # Example
//!
//! ```rust,ignore
//! use importers::{DelimitedReader, TabularNormalizer};
//!
//! let rows = DelimitedReader::new().read_rows(&bytes)?;
//! let import = TabularNormalizer::new().normalize(&rows);
//! println!("{} records, {} skipped", import.records.len(), import.skipped);
//! ```

pub mod delimited;
pub mod field_mapper;
pub mod tabular;

pub use delimited::DelimitedReader;
pub use field_mapper::{map_header, normalize_label, FieldRole};
pub use tabular::{NormalizedImport, TabularNormalizer};
