//! Domain layer: record types, normalization, presentation and events.
//!
//! This module contains the canonical purchase, alert and stats records,
//! the lenient readers that normalize stored documents into them, the
//! badge/format mapping used by the monitor views, and the event bus that
//! carries document changes to live queries.

pub mod alert;
pub mod document_event;
pub mod event_bus;
pub mod fields;
pub mod path;
pub mod presentation;
pub mod purchase;
pub mod stats;

pub use alert::{AlertRecord, AlertResolution, Severity};
pub use document_event::{ChangeKind, DocumentChange};
pub use event_bus::EventBus;
pub use path::{CollectionPath, DocumentPath};
pub use purchase::{ProcessingStatus, PurchaseRecord};
pub use stats::DailyStats;
