use chrono::{DateTime, NaiveDate};
use shared_types::{
    display_name, lenient_number, opaque_id, split_full_name, CallStatus, CustomerRecord,
    CustomerStatus, RawRecord,
};

use crate::notes::{classify, NoteKind};

/// Builds a presentable record from whatever the roster service returned.
///
/// Explicit `address` and `comments` win. A legacy `notes` value only fills the attribute
/// [`classify`] points at, and only when that attribute is absent or blank, so it never lands
/// in both.
pub fn reconcile_record(raw: RawRecord) -> CustomerRecord {
    let mut first_name = clean(raw.first_name);
    let mut last_name = clean(raw.last_name);
    let name = clean(raw.name);
    if first_name.is_empty() && last_name.is_empty() && !name.is_empty() {
        (first_name, last_name) = split_full_name(&name);
    }

    let mut address = present(raw.address);
    let mut comments = present(raw.comments);
    let notes = clean(raw.notes);
    if !notes.is_empty() {
        match classify(&notes) {
            NoteKind::Address if address.is_none() => address = Some(notes),
            NoteKind::Comment if comments.is_none() => comments = Some(notes),
            _ => {}
        }
    }

    let status = raw
        .status
        .as_deref()
        .map(parse_status)
        .unwrap_or(CustomerStatus::Pending);
    let call_status = raw
        .call_status
        .as_deref()
        .and_then(|value| value.parse::<CallStatus>().ok())
        .unwrap_or(CallStatus::NotCalled);
    let previous_status = raw
        .previous_status
        .as_deref()
        .and_then(|value| value.parse::<CustomerStatus>().ok());

    CustomerRecord {
        id: raw.id.as_ref().and_then(opaque_id),
        name: display_name(&first_name, &last_name),
        first_name,
        last_name,
        phone: clean(raw.phone),
        email: clean(raw.email),
        address: address.unwrap_or_default(),
        archived: raw.archived.unwrap_or(status == CustomerStatus::Archived),
        status,
        call_status,
        comments: comments.unwrap_or_default(),
        assigned_to: raw.assigned_to.as_ref().and_then(opaque_id).unwrap_or_default(),
        previous_status,
        created_at: raw.created_at.as_ref().map(parse_timestamp).unwrap_or(0),
    }
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Trimmed value, `None` when missing or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_status(value: &str) -> CustomerStatus {
    match value.parse::<CustomerStatus>() {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!("{}, treating record as pending", e);
            CustomerStatus::Pending
        }
    }
}

/// Accepts RFC 3339, plain `YYYY-MM-DD` or epoch seconds. Anything else becomes `0`.
fn parse_timestamp(value: &serde_json::Value) -> i64 {
    if let Some(text) = value.as_str() {
        let text = text.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return datetime.timestamp();
        }
        if let Some(datetime) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return datetime.and_utc().timestamp();
        }
    }

    lenient_number(value)
        .filter(|n| n.is_finite())
        .map(|n| n as i64)
        .unwrap_or(0)
}
