//! Badge styles and display formatting for the monitor views.
//!
//! The status mapping is total: any status without a dedicated style gets the
//! neutral "processing" treatment.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ProcessingStatus, Severity};

/// Icon and colours for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeStyle {
    /// Icon name.
    pub icon: &'static str,
    /// Background colour token.
    pub background: &'static str,
    /// Text colour token.
    pub text: &'static str,
}

/// Neutral style shared by `processing`, `unknown` and unrecognised statuses.
pub const PROCESSING_BADGE: BadgeStyle = BadgeStyle {
    icon: "clock",
    background: "blue-100",
    text: "blue-800",
};

/// Returns the badge style for a processing status.
#[must_use]
pub const fn status_badge(status: &ProcessingStatus) -> BadgeStyle {
    match status {
        ProcessingStatus::Success => BadgeStyle {
            icon: "check-circle",
            background: "green-100",
            text: "green-800",
        },
        ProcessingStatus::Error => BadgeStyle {
            icon: "x-circle",
            background: "red-100",
            text: "red-800",
        },
        ProcessingStatus::Warning => BadgeStyle {
            icon: "alert-triangle",
            background: "yellow-100",
            text: "yellow-800",
        },
        ProcessingStatus::NoUser => BadgeStyle {
            icon: "user-x",
            background: "orange-100",
            text: "orange-800",
        },
        ProcessingStatus::NoEmail => BadgeStyle {
            icon: "mail-x",
            background: "orange-100",
            text: "orange-800",
        },
        ProcessingStatus::PartialFailure => BadgeStyle {
            icon: "alert-circle",
            background: "amber-100",
            text: "amber-800",
        },
        ProcessingStatus::Processing
        | ProcessingStatus::Unknown
        | ProcessingStatus::Unrecognized(_) => PROCESSING_BADGE,
    }
}

/// Badge label: the status in upper case with underscores as spaces.
#[must_use]
pub fn status_label(status: &ProcessingStatus) -> String {
    status.as_str().replace('_', " ").to_uppercase()
}

/// Border, badge and icon style for an alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityStyle {
    /// Icon name.
    pub icon: &'static str,
    /// Card border colour token.
    pub border: &'static str,
    /// Badge background colour token.
    pub background: &'static str,
    /// Badge text colour token.
    pub text: &'static str,
}

/// Returns the style for an alert severity.
#[must_use]
pub const fn severity_badge(severity: Severity) -> SeverityStyle {
    match severity {
        Severity::Critical => SeverityStyle {
            icon: "alert-octagon",
            border: "red-500",
            background: "red-100",
            text: "red-800",
        },
        Severity::Error => SeverityStyle {
            icon: "x-circle",
            border: "orange-500",
            background: "orange-100",
            text: "orange-800",
        },
        Severity::Warning => SeverityStyle {
            icon: "alert-triangle",
            border: "yellow-500",
            background: "yellow-100",
            text: "yellow-800",
        },
    }
}

/// Formats an absolute timestamp, e.g. `Oct 18, 2026, 9:05:00 AM UTC`.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y, %-I:%M:%S %p UTC").to_string()
}

/// Formats `ts` relative to `now`, e.g. `5 minutes ago`.
#[must_use]
pub fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(ts).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let (amount, unit) = if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else {
        (seconds / 86_400, "day")
    };
    if amount == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{amount} {unit}s ago")
    }
}

/// Formats an order number as `#1001`, or `N/A` when absent.
#[must_use]
pub fn format_order_number(order_number: Option<&str>) -> String {
    match order_number {
        Some(n) => format!("#{}", n.trim_start_matches('#')),
        None => "N/A".to_string(),
    }
}

/// Formats a price with its currency, e.g. `49.99 CAD`.
#[must_use]
pub fn format_price(total: Option<&str>, currency: Option<&str>) -> Option<String> {
    let total = total?;
    Some(match currency {
        Some(code) => format!("{total} {code}"),
        None => total.to_string(),
    })
}
