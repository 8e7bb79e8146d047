//! Roster ingestion and presentation engine.
//!
//! Imports tabular customer lists into a roster service and pages through the roster with
//! filters, recovering a usable total when the service's own count is missing or wrong.

pub mod config;
pub mod controller;
pub mod count;
pub mod error;
pub mod filter;
pub mod guard;
pub mod http;
pub mod import;
pub mod notes;
pub mod reconcile;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::EngineConfig;
pub use controller::{Delivery, PendingFetch, RosterPageController};
pub use error::{EngineError, Result};
pub use filter::{FilterState, PseudoFilter, RosterQuery};
pub use guard::{Generation, RenderGuard};
pub use http::HttpRosterService;
pub use import::{ImportReport, RosterImporter};
pub use notes::{classify, NoteKind};
pub use service::{RosterListener, RosterService};
