//! Purchase records: one per processed `orders/*` webhook.
//!
//! Stored documents come in two shapes. Older writers nest the order, user and
//! product (`order.id`, `user.email`, `product.title`); newer ones flatten
//! them (`orderId`, `userEmail`, `productTitle`). Some documents mix both.
//! [`RawPurchase`] tags the shape and falls back to the flat keys per field;
//! [`PurchaseRecord::from_document`] then reads every other field leniently.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::fields::{flag_at, parse_timestamp, string_list, stringify, stringify_at, text_at};
use crate::store::Document;

/// Product title used when a record names no product.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Outcome of the webhook handler for one purchase.
///
/// Parsing is total: unrecognised strings are kept verbatim in
/// [`ProcessingStatus::Unrecognized`] so they still filter and render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ProcessingStatus {
    /// Order processed and user provisioned.
    Success,
    /// Processing failed.
    Error,
    /// Processed with warnings.
    Warning,
    /// No platform user matched the order.
    NoUser,
    /// The order carried no usable email.
    NoEmail,
    /// Some line items failed.
    PartialFailure,
    /// The handler has not finished yet.
    Processing,
    /// No status recorded.
    #[default]
    Unknown,
    /// Any other status string.
    Unrecognized(String),
}

impl ProcessingStatus {
    /// Every status the webhook writer is known to emit.
    pub const KNOWN: [Self; 8] = [
        Self::Success,
        Self::Error,
        Self::Warning,
        Self::NoUser,
        Self::NoEmail,
        Self::PartialFailure,
        Self::Processing,
        Self::Unknown,
    ];

    /// Parses a raw status string. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "no_user" => Self::NoUser,
            "no_email" => Self::NoEmail,
            "partial_failure" => Self::PartialFailure,
            "processing" => Self::Processing,
            "unknown" | "" => Self::Unknown,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Returns the raw string stored in `processingResult.status`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::NoUser => "no_user",
            Self::NoEmail => "no_email",
            Self::PartialFailure => "partial_failure",
            Self::Processing => "processing",
            Self::Unknown => "unknown",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProcessingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProcessingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Which of the order's emails was used to match a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    /// The gift recipient's email (from note attributes).
    Recipient,
    /// The purchaser's checkout email.
    Purchaser,
}

impl EmailSource {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "recipient" => Some(Self::Recipient),
            "purchaser" => Some(Self::Purchaser),
            _ => None,
        }
    }

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recipient => "recipient",
            Self::Purchaser => "purchaser",
        }
    }
}

/// One Shopify order note attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value, stringified.
    pub value: String,
}

// ── Stored shapes ───────────────────────────────────────────────────────

/// The identifying fields of a purchase, wherever the writer put them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderIdentity {
    /// Upstream order id.
    pub order_id: Option<String>,
    /// Human-facing order number.
    pub order_number: Option<String>,
    /// Resolved user email.
    pub user_email: Option<String>,
    /// Product title.
    pub product_title: Option<String>,
}

impl OrderIdentity {
    fn nested(data: &Value) -> Self {
        Self {
            order_id: stringify_at(data, "/order/id"),
            order_number: stringify_at(data, "/order/orderNumber"),
            user_email: text_at(data, "/user/email"),
            product_title: text_at(data, "/product/title"),
        }
    }

    fn flat(data: &Value) -> Self {
        Self {
            order_id: stringify_at(data, "/orderId"),
            order_number: stringify_at(data, "/orderNumber"),
            user_email: text_at(data, "/userEmail"),
            product_title: text_at(data, "/productTitle"),
        }
    }

    /// Fills each missing field from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            order_id: self.order_id.or(fallback.order_id),
            order_number: self.order_number.or(fallback.order_number),
            user_email: self.user_email.or(fallback.user_email),
            product_title: self.product_title.or(fallback.product_title),
        }
    }
}

/// A stored purchase document, tagged by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPurchase {
    /// Document carries an `order` object. Fields it leaves out are taken
    /// from the flat keys.
    Nested(OrderIdentity),
    /// Document carries flattened order fields only.
    Flat(OrderIdentity),
}

impl RawPurchase {
    /// Reads the identifying fields, picking the shape by the presence of an
    /// `order` object. Never fails: a field with an unexpected type reads as
    /// absent.
    #[must_use]
    pub fn from_value(data: &Value) -> Self {
        if data.get("order").is_some_and(Value::is_object) {
            Self::Nested(OrderIdentity::nested(data).or(OrderIdentity::flat(data)))
        } else {
            Self::Flat(OrderIdentity::flat(data))
        }
    }

    /// Drops the shape tag.
    #[must_use]
    pub fn into_identity(self) -> OrderIdentity {
        match self {
            Self::Nested(identity) | Self::Flat(identity) => identity,
        }
    }
}

fn note_attributes(value: Option<&Value>) -> Vec<NoteAttribute> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| NoteAttribute {
                name: text_at(item, "/name").unwrap_or_default(),
                value: stringify_at(item, "/value").unwrap_or_default(),
            })
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| NoteAttribute {
                name: name.clone(),
                value: stringify(value).unwrap_or_default(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

// ── Canonical record ────────────────────────────────────────────────────

/// Canonical, flattened purchase record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    /// Document id.
    pub id: String,
    /// Upstream Shopify order id.
    pub order_id: Option<String>,
    /// Human-facing order number, stringified.
    pub order_number: Option<String>,
    /// Email of the resolved platform user.
    pub user_email: Option<String>,
    /// Purchased product title (defaults to [`UNKNOWN_PRODUCT`]).
    pub product_title: String,
    /// Derived processing status.
    pub status: ProcessingStatus,
    /// Handler errors.
    pub errors: Vec<String>,
    /// Handler warnings.
    pub warnings: Vec<String>,
    /// Shopify webhook topic, e.g. `orders/paid`.
    pub webhook_topic: Option<String>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
    /// Whether the handler created a new user.
    pub user_created: bool,
    /// Whether the handler found an existing user.
    pub user_found: bool,
    /// Platform user id.
    pub user_id: Option<String>,
    /// Gift recipient email.
    pub recipient_email: Option<String>,
    /// Purchaser email.
    pub purchaser_email: Option<String>,
    /// Which email the handler matched on.
    pub email_used: Option<EmailSource>,
    /// Order note attributes, in order.
    pub note_attributes: Vec<NoteAttribute>,
    /// Handler processing time.
    pub processing_time_ms: Option<u64>,
    /// Order total, as the writer stored it.
    pub total_price: Option<String>,
    /// Order currency code.
    pub currency: Option<String>,
    /// Echo of the original webhook body.
    pub full_payload: Option<Value>,
}

impl PurchaseRecord {
    /// Normalizes a stored document. Never fails: each field is read on its
    /// own, so one malformed field only loses that field.
    #[must_use]
    pub fn from_document(doc: &Document, now: DateTime<Utc>) -> Self {
        let data = &doc.data;
        let identity = RawPurchase::from_value(data).into_identity();

        let created_at = written_at(data).unwrap_or_else(|| {
            if data.get("createdAt").is_some() {
                tracing::warn!(id = %doc.id, "unreadable purchase createdAt");
            }
            now
        });

        Self {
            id: doc.id.clone(),
            order_id: identity.order_id,
            order_number: identity.order_number,
            user_email: identity.user_email,
            product_title: identity
                .product_title
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            status: text_at(data, "/processingResult/status")
                .map(|raw| ProcessingStatus::parse(&raw))
                .unwrap_or_default(),
            errors: string_list(data.pointer("/processingResult/errors")),
            warnings: string_list(data.pointer("/processingResult/warnings")),
            webhook_topic: text_at(data, "/webhookTopic"),
            created_at,
            user_created: flag_at(data, "/userCreated").unwrap_or(false),
            user_found: flag_at(data, "/userFound").unwrap_or(false),
            user_id: stringify_at(data, "/userId"),
            recipient_email: text_at(data, "/recipientEmail"),
            purchaser_email: text_at(data, "/purchaserEmail"),
            email_used: text_at(data, "/emailUsed").as_deref().and_then(EmailSource::parse),
            note_attributes: note_attributes(data.get("noteAttributes")),
            processing_time_ms: data.get("processingTimeMs").and_then(Value::as_u64),
            total_price: stringify_at(data, "/totalPrice"),
            currency: text_at(data, "/currency"),
            full_payload: data.get("fullPayload").cloned(),
        }
    }

    /// Fields a search term is matched against, in display order.
    pub fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.order_id.as_deref(),
            self.order_number.as_deref(),
            self.user_email.as_deref(),
            self.recipient_email.as_deref(),
            self.purchaser_email.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

fn written_at(data: &Value) -> Option<DateTime<Utc>> {
    data.get("createdAt")
        .and_then(parse_timestamp)
        .or_else(|| data.get("timestamp").and_then(parse_timestamp))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document::new(id, data)
    }

    #[test]
    fn nested_shape_normalizes() {
        let now = Utc::now();
        let record = PurchaseRecord::from_document(
            &doc(
                "p1",
                json!({
                    "order": {"id": 5_551_234, "orderNumber": 1001},
                    "user": {"email": "jane@example.com"},
                    "product": {"title": "Grade 9 Math"},
                    "processingResult": {"status": "success", "errors": [], "warnings": ["late"]},
                    "webhookTopic": "orders/paid",
                    "createdAt": "2026-10-18T09:00:00Z",
                    "emailUsed": "recipient",
                    "noteAttributes": [{"name": "student", "value": "Sam"}, {"name": "grade", "value": 9}]
                }),
            ),
            now,
        );
        assert_eq!(record.order_id.as_deref(), Some("5551234"));
        assert_eq!(record.order_number.as_deref(), Some("1001"));
        assert_eq!(record.user_email.as_deref(), Some("jane@example.com"));
        assert_eq!(record.product_title, "Grade 9 Math");
        assert_eq!(record.status, ProcessingStatus::Success);
        assert_eq!(record.warnings, vec!["late".to_string()]);
        assert_eq!(record.email_used, Some(EmailSource::Recipient));
        assert_eq!(record.note_attributes.len(), 2);
        assert_eq!(record.note_attributes.get(1).map(|a| a.value.as_str()), Some("9"));
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).single().unwrap_or(now)
        );
    }

    #[test]
    fn flat_shape_normalizes() {
        let record = PurchaseRecord::from_document(
            &doc(
                "p2",
                json!({
                    "orderId": "gid://shopify/Order/9",
                    "orderNumber": "1002",
                    "userEmail": "sam@example.com",
                    "processingResult": {"status": "no_user"},
                }),
            ),
            Utc::now(),
        );
        assert_eq!(record.order_id.as_deref(), Some("gid://shopify/Order/9"));
        assert_eq!(record.order_number.as_deref(), Some("1002"));
        assert_eq!(record.user_email.as_deref(), Some("sam@example.com"));
        assert_eq!(record.status, ProcessingStatus::NoUser);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let now = Utc::now();
        let record = PurchaseRecord::from_document(&doc("p3", json!({})), now);
        assert_eq!(record.product_title, UNKNOWN_PRODUCT);
        assert_eq!(record.status, ProcessingStatus::Unknown);
        assert_eq!(record.created_at, now);
        assert!(record.errors.is_empty());
        assert!(!record.user_created);
    }

    #[test]
    fn created_at_falls_back_to_timestamp_field() {
        let record = PurchaseRecord::from_document(
            &doc("p4", json!({"timestamp": {"_seconds": 1_700_000_000, "_nanoseconds": 0}})),
            Utc::now(),
        );
        assert_eq!(record.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn malformed_field_only_loses_that_field() {
        let record = PurchaseRecord::from_document(
            &doc(
                "p5",
                json!({
                    "orderId": 5001,
                    "orderNumber": 1001,
                    "userEmail": "jane@example.com",
                    "processingResult": {"status": "success", "errors": {"code": 1}},
                    "noteAttributes": {"student": "Sam"},
                    "userCreated": "yes",
                    "createdAt": "2026-10-18T09:00:00Z"
                }),
            ),
            Utc::now(),
        );
        assert_eq!(record.id, "p5");
        assert_eq!(record.status, ProcessingStatus::Success);
        assert_eq!(record.order_id.as_deref(), Some("5001"));
        assert_eq!(record.order_number.as_deref(), Some("1001"));
        assert_eq!(record.user_email.as_deref(), Some("jane@example.com"));
        assert_eq!(record.created_at.timestamp(), 1_792_314_000);
        assert!(record.errors.is_empty());
        assert!(!record.user_created);
        assert_eq!(
            record.note_attributes,
            vec![NoteAttribute {
                name: "student".to_string(),
                value: "Sam".to_string()
            }]
        );
    }

    #[test]
    fn lone_error_string_reads_as_list() {
        let record = PurchaseRecord::from_document(
            &doc("p7", json!({"processingResult": {"status": "error", "errors": "token expired"}})),
            Utc::now(),
        );
        assert_eq!(record.status, ProcessingStatus::Error);
        assert_eq!(record.errors, vec!["token expired".to_string()]);
    }

    #[test]
    fn nested_shape_falls_back_to_flat_fields() {
        let data = json!({
            "order": {"id": 5002},
            "orderNumber": 1002,
            "user": {},
            "userEmail": "sam@example.com",
            "product": {"title": "Grade 9 Math"},
            "productTitle": "ignored"
        });
        let RawPurchase::Nested(identity) = RawPurchase::from_value(&data) else {
            panic!("order object selects the nested shape");
        };
        assert_eq!(identity.order_id.as_deref(), Some("5002"));
        assert_eq!(identity.order_number.as_deref(), Some("1002"));
        assert_eq!(identity.user_email.as_deref(), Some("sam@example.com"));
        assert_eq!(identity.product_title.as_deref(), Some("Grade 9 Math"));

        let record = PurchaseRecord::from_document(&doc("p8", data), Utc::now());
        let fields: Vec<&str> = record.search_fields().collect();
        assert_eq!(fields, vec!["5002", "1002", "sam@example.com"]);
    }

    #[test]
    fn status_parse_is_total() {
        for status in ProcessingStatus::KNOWN {
            assert_eq!(ProcessingStatus::parse(status.as_str()), status);
        }
        let other = ProcessingStatus::parse("refunded");
        assert_eq!(other, ProcessingStatus::Unrecognized("refunded".to_string()));
        assert_eq!(other.as_str(), "refunded");
    }

    #[test]
    fn status_serializes_as_raw_string() {
        let json = serde_json::to_string(&ProcessingStatus::PartialFailure).unwrap_or_default();
        assert_eq!(json, "\"partial_failure\"");
        let parsed: Result<ProcessingStatus, _> = serde_json::from_str("\"whatever\"");
        let Ok(parsed) = parsed else {
            panic!("status deserialization failed");
        };
        assert_eq!(parsed.as_str(), "whatever");
    }

    #[test]
    fn search_fields_skip_missing() {
        let record = PurchaseRecord::from_document(
            &doc("p6", json!({"orderNumber": 7, "purchaserEmail": "buyer@example.com"})),
            Utc::now(),
        );
        let fields: Vec<&str> = record.search_fields().collect();
        assert_eq!(fields, vec!["7", "buyer@example.com"]);
    }
}
