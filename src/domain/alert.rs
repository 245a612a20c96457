//! Operator alerts raised by the webhook writer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::fields::{flag_at, parse_timestamp, string_list, stringify, stringify_at, text_at, timestamp_value};
use crate::store::Document;

/// Field names written when an alert is resolved.
pub mod field {
    /// `resolved` flag.
    pub const RESOLVED: &str = "resolved";
    /// Resolution timestamp.
    pub const RESOLVED_AT: &str = "resolvedAt";
    /// Operator who resolved the alert.
    pub const RESOLVED_BY: &str = "resolvedBy";
    /// Operator notes.
    pub const NOTES: &str = "notes";
    /// Last modification timestamp.
    pub const UPDATED_AT: &str = "updatedAt";
    /// Alert severity.
    pub const SEVERITY: &str = "severity";
    /// Creation timestamp.
    pub const CREATED_AT: &str = "createdAt";
}

/// Alert severity. Exactly three levels exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Needs immediate action (e.g. a paid order with no user).
    Critical,
    /// Processing failed.
    Error,
    /// Worth a look.
    Warning,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Self; 3] = [Self::Critical, Self::Error, Self::Warning];

    /// Parses a stored severity string.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "critical" => Some(Self::Critical),
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertDetails {
    /// Human-readable description.
    pub message: Option<String>,
    /// Related order number.
    pub order_number: Option<String>,
    /// Related order id.
    pub order_id: Option<String>,
    /// Titles of the products involved.
    pub products: Vec<String>,
}

/// Canonical alert record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    /// Document id.
    pub id: String,
    /// Free-form category, e.g. `no_user_found`.
    pub alert_type: String,
    /// Severity level.
    pub severity: Severity,
    /// Whether an operator resolved it.
    pub resolved: bool,
    /// Alert context.
    pub details: AlertDetails,
    /// When the alert was raised.
    pub created_at: DateTime<Utc>,
    /// When it was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved it.
    pub resolved_by: Option<String>,
    /// Resolution notes.
    pub notes: Option<String>,
}

fn product_titles(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return string_list(value);
    };
    items
        .iter()
        .filter_map(|item| stringify_at(item, "/title").or_else(|| stringify(item)))
        .collect()
}

impl AlertRecord {
    /// Normalizes a stored alert document. Never fails: each field is read
    /// on its own, so one malformed field only loses that field.
    ///
    /// Severities outside the three known levels are read as
    /// [`Severity::Error`].
    #[must_use]
    pub fn from_document(doc: &Document, now: DateTime<Utc>) -> Self {
        let data = &doc.data;

        let severity = match text_at(data, "/severity") {
            Some(s) => Severity::parse(&s).unwrap_or_else(|| {
                tracing::warn!(id = %doc.id, severity = %s, "unknown alert severity");
                Severity::Error
            }),
            None => Severity::Error,
        };

        let created_at = data
            .get(field::CREATED_AT)
            .and_then(parse_timestamp)
            .unwrap_or_else(|| {
                if data.get(field::CREATED_AT).is_some() {
                    tracing::warn!(id = %doc.id, "unreadable alert createdAt");
                }
                now
            });

        Self {
            id: doc.id.clone(),
            alert_type: text_at(data, "/type").unwrap_or_else(|| "unknown".to_string()),
            severity,
            resolved: flag_at(data, "/resolved").unwrap_or(false),
            details: AlertDetails {
                message: text_at(data, "/details/message"),
                order_number: stringify_at(data, "/details/orderNumber"),
                order_id: stringify_at(data, "/details/orderId"),
                products: product_titles(data.pointer("/details/products")),
            },
            created_at,
            resolved_at: data.get(field::RESOLVED_AT).and_then(parse_timestamp),
            resolved_by: text_at(data, "/resolvedBy"),
            notes: text_at(data, "/notes"),
        }
    }

    /// `true` while the alert is unresolved.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.resolved
    }

    /// `true` for unresolved critical alerts.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.is_active() && self.severity == Severity::Critical
    }
}

/// Number of unresolved alerts in a list.
#[must_use]
pub fn alert_count(alerts: &[AlertRecord]) -> usize {
    alerts.iter().filter(|a| a.is_active()).count()
}

/// Number of unresolved critical alerts in a list.
#[must_use]
pub fn critical_alert_count(alerts: &[AlertRecord]) -> usize {
    alerts.iter().filter(|a| a.is_critical()).count()
}

/// The patch applied to an alert document on resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertResolution {
    /// Resolved alert id.
    pub alert_id: String,
    /// Operator who resolved it.
    pub resolved_by: String,
    /// Operator notes.
    pub notes: String,
    /// Resolution time (also written as `updatedAt`).
    pub resolved_at: DateTime<Utc>,
}

impl AlertResolution {
    /// Builds the field map for the store update.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(field::RESOLVED.to_string(), Value::Bool(true));
        fields.insert(field::RESOLVED_AT.to_string(), timestamp_value(self.resolved_at));
        fields.insert(
            field::RESOLVED_BY.to_string(),
            Value::String(self.resolved_by.clone()),
        );
        fields.insert(field::NOTES.to_string(), Value::String(self.notes.clone()));
        fields.insert(field::UPDATED_AT.to_string(), timestamp_value(self.resolved_at));
        fields
    }
}
