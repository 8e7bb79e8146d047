//! Classification of the legacy free-text `notes` field.
//!
//! Older records kept either an address or a call comment in one `notes` column. When such a
//! record is read back without an explicit `address` or `comments` attribute, [`classify`]
//! decides which of the two the text most likely is. The rule is a heuristic: addresses
//! without numbers, suffixes or a locality after a comma are read as comments, and that is
//! accepted rather than patched with more guessing.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Address,
    Comment,
}

fn leading_street_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\s+[A-Za-z]").unwrap())
}

fn street_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(street|st|avenue|ave|road|rd|drive|dr|lane|ln|boulevard|blvd|court|ct)\b",
        )
        .unwrap()
    })
}

/// A comma followed by a capitalized word or a number, as in `Main St, Springfield` or `Springfield, IL`.
fn comma_locality() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*[A-Z0-9]").unwrap())
}

pub fn classify(notes: &str) -> NoteKind {
    if comma_locality().is_match(notes)
        || leading_street_number().is_match(notes)
        || street_suffix().is_match(notes)
    {
        NoteKind::Address
    } else {
        NoteKind::Comment
    }
}
