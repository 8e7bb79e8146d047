use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// A roster entry as presented to the dashboard and sent to bulk-create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    /// Assigned by the external store, absent on records that were never persisted.
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Display convenience, rebuilt from first and last name. Never authoritative.
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub status: CustomerStatus,
    pub call_status: CallStatus,
    pub comments: String,
    pub assigned_to: String,
    pub archived: bool,
    pub previous_status: Option<CustomerStatus>,
    pub created_at: i64,
}

impl CustomerRecord {
    /// Fresh, unassigned record in the `pending` / `not_called` state.
    pub fn new_pending(first_name: String, last_name: String, created_at: i64) -> Self {
        let name = display_name(&first_name, &last_name);
        Self {
            id: None,
            first_name,
            last_name,
            name,
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            status: CustomerStatus::Pending,
            call_status: CallStatus::NotCalled,
            comments: String::new(),
            assigned_to: String::new(),
            archived: false,
            previous_status: None,
            created_at,
        }
    }

    /// True when none of the identity fields carries a value; such records are never persisted.
    pub fn lacks_identity(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
    }

    pub fn archive(&mut self) {
        if self.archived {
            return;
        }
        self.previous_status = Some(self.status);
        self.status = CustomerStatus::Archived;
        self.archived = true;
    }

    pub fn unarchive(&mut self) {
        if !self.archived {
            return;
        }
        self.status = self
            .previous_status
            .take()
            .filter(|status| *status != CustomerStatus::Archived)
            .unwrap_or(CustomerStatus::Pending);
        self.archived = false;
    }
}

/// Joins first and last name with a single space, skipping empty parts.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name).trim().to_string()
}

/// Splits a combined name on whitespace: first token is the first name, the rest the last name.
pub fn split_full_name(name: &str) -> (String, String) {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let rest = tokens.collect::<Vec<_>>().join(" ");
    (first, rest)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Pending,
    NotCalled,
    FollowUp,
    VoiceMail,
    #[serde(rename = "w2_received")]
    W2Received,
    CallBack,
    NotInService,
    Citizen,
    Dnd,
    Interested,
    Potential,
    Archived,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 12] = [
        CustomerStatus::Pending,
        CustomerStatus::NotCalled,
        CustomerStatus::FollowUp,
        CustomerStatus::VoiceMail,
        CustomerStatus::W2Received,
        CustomerStatus::CallBack,
        CustomerStatus::NotInService,
        CustomerStatus::Citizen,
        CustomerStatus::Dnd,
        CustomerStatus::Interested,
        CustomerStatus::Potential,
        CustomerStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Pending => "pending",
            CustomerStatus::NotCalled => "not_called",
            CustomerStatus::FollowUp => "follow_up",
            CustomerStatus::VoiceMail => "voice_mail",
            CustomerStatus::W2Received => "w2_received",
            CustomerStatus::CallBack => "call_back",
            CustomerStatus::NotInService => "not_in_service",
            CustomerStatus::Citizen => "citizen",
            CustomerStatus::Dnd => "dnd",
            CustomerStatus::Interested => "interested",
            CustomerStatus::Potential => "potential",
            CustomerStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusParseError {
    #[error("unknown status: {0}")]
    Unknown(String),

    #[error("{0} is a pseudo-filter, not a stored status")]
    PseudoStatus(String),
}

impl FromStr for CustomerStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        if normalized == "old_clients" || normalized == "old_clients_pseudo" {
            return Err(StatusParseError::PseudoStatus(s.to_string()));
        }
        CustomerStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusParseError::Unknown(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    NotCalled,
    Called,
    VoiceMail,
}

impl FromStr for CallStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "not_called" => Ok(CallStatus::NotCalled),
            "called" => Ok(CallStatus::Called),
            "voice_mail" | "voicemail" => Ok(CallStatus::VoiceMail),
            _ => Err(StatusParseError::Unknown(s.to_string())),
        }
    }
}

/// Response of the bulk-create endpoint. Both counts are surfaced, full success is never assumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResponse {
    #[serde(default)]
    pub imported_count: u64,
    #[serde(default)]
    pub error_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkCreateRequest {
    pub customers: Vec<CustomerRecord>,
}
