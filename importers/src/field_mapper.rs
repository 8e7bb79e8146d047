use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Canonical identity attribute an import column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRole {
    FirstName,
    LastName,
    Name,
    Email,
    Phone,
    Address,
}

/// Exact labels, checked before the first/last name token rules.
const EXACT_LABELS: [(&str, FieldRole); 9] = [
    ("name", FieldRole::Name),
    ("email", FieldRole::Email),
    ("phone", FieldRole::Phone),
    ("mobile", FieldRole::Phone),
    ("contact", FieldRole::Phone),
    ("address", FieldRole::Address),
    ("state", FieldRole::Address),
    ("address line", FieldRole::Address),
    ("address1", FieldRole::Address),
];

fn separator_run() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Lower-cases a label and collapses every run of non-alphanumerics into one space.
///
/// `"  First_Name:"` becomes `"first name"`, `"E-Mail"` becomes `"e mail"`.
pub fn normalize_label(label: &str) -> String {
    let lowered = label.to_lowercase();
    separator_run()
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// Maps a header label to its canonical role, or `None` when the column should be ignored.
pub fn map_header(label: &str) -> Option<FieldRole> {
    let normalized = normalize_label(label);
    if normalized.is_empty() {
        return None;
    }

    if let Some((_, role)) = EXACT_LABELS
        .iter()
        .find(|(exact, _)| *exact == normalized)
    {
        return Some(*role);
    }

    if normalized.contains("name") {
        if normalized.contains("first") {
            return Some(FieldRole::FirstName);
        }
        if normalized.contains("last") {
            return Some(FieldRole::LastName);
        }
    }

    None
}
