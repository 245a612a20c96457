//! Webhook repository: the read side of the webhook log plus alert
//! resolution.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Serialize, Serializer};

use super::live::LiveQuery;
use crate::config::clamp_max_results;
use crate::domain::alert::field;
use crate::domain::path::is_valid_document_id;
use crate::domain::stats::stats_document_id;
use crate::domain::{
    AlertRecord, AlertResolution, CollectionPath, DailyStats, ProcessingStatus, PurchaseRecord,
    Severity,
};
use crate::error::MonitorError;
use crate::store::{Direction, DocumentStore, Query, StoreError};

/// Default purchase page size.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Field purchases are filtered on.
const STATUS_FIELD: &str = "processingResult.status";

/// Processing-status filter for the purchase list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every status.
    #[default]
    All,
    /// One status only.
    Only(ProcessingStatus),
}

impl StatusFilter {
    /// Parses `"all"` or a known status string.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidFilter`] for unrecognized statuses.
    pub fn parse(raw: &str) -> Result<Self, MonitorError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match ProcessingStatus::parse(raw) {
            ProcessingStatus::Unrecognized(other) => {
                Err(MonitorError::InvalidFilter(format!("unknown status: {other}")))
            }
            status => Ok(Self::Only(status)),
        }
    }

    /// `true` if a record with `status` passes the filter.
    #[must_use]
    pub fn accepts(&self, status: &ProcessingStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }

    /// String form used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Severity filter for the alert list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    /// Every severity.
    #[default]
    All,
    /// One severity only.
    Only(Severity),
}

impl SeverityFilter {
    /// Parses `"all"` or a severity string.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidFilter`] for unknown severities.
    pub fn parse(raw: &str) -> Result<Self, MonitorError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Severity::parse(raw)
            .map(Self::Only)
            .ok_or_else(|| MonitorError::InvalidFilter(format!("unknown severity: {raw}")))
    }

    /// `true` if an alert with `severity` passes the filter.
    #[must_use]
    pub fn accepts(&self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == severity,
        }
    }

    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(severity) => severity.as_str(),
        }
    }
}

impl Serialize for SeverityFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Parameters of the purchase list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseQuery {
    /// Page size, in `1..=500`.
    pub max_results: usize,
    /// Status filter.
    pub status: StatusFilter,
}

impl PurchaseQuery {
    /// Creates a query, clamping `max_results`.
    #[must_use]
    pub fn new(max_results: usize, status: StatusFilter) -> Self {
        Self {
            max_results: clamp_max_results(max_results),
            status,
        }
    }
}

impl Default for PurchaseQuery {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS, StatusFilter::All)
    }
}

/// Store-backed repository for purchases, alerts and daily stats.
///
/// Cheap to clone; every clone shares the same store.
#[derive(Debug, Clone)]
pub struct WebhookRepository {
    store: Arc<dyn DocumentStore>,
    resolved_by: String,
}

impl WebhookRepository {
    /// Creates a repository. `resolved_by` is recorded on resolutions that
    /// name no operator.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, resolved_by: impl Into<String>) -> Self {
        Self {
            store,
            resolved_by: resolved_by.into(),
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Store query behind the purchase list.
    #[must_use]
    pub fn purchases_query(params: &PurchaseQuery) -> Query {
        let mut query = Query::collection(CollectionPath::purchases());
        if let StatusFilter::Only(status) = &params.status {
            query = query.where_eq(STATUS_FIELD, status.as_str());
        }
        query
            .order_by(field::CREATED_AT, Direction::Descending)
            .limit(params.max_results)
    }

    /// Store query behind the active alert list.
    #[must_use]
    pub fn alerts_query(severity: SeverityFilter) -> Query {
        let mut query = Query::collection(CollectionPath::alerts()).where_eq(field::RESOLVED, false);
        if let SeverityFilter::Only(severity) = severity {
            query = query.where_eq(field::SEVERITY, severity.as_str());
        }
        query.order_by(field::CREATED_AT, Direction::Descending)
    }

    /// Live purchase list, newest first.
    #[must_use]
    pub fn subscribe_purchases(&self, params: &PurchaseQuery) -> LiveQuery<Vec<PurchaseRecord>> {
        LiveQuery::spawn(
            Arc::clone(&self.store),
            Self::purchases_query(params),
            |docs| {
                let now = Utc::now();
                docs.iter()
                    .map(|doc| PurchaseRecord::from_document(doc, now))
                    .collect()
            },
        )
    }

    /// One-shot read of the purchase list.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Store`] on store failure.
    pub async fn fetch_purchases(
        &self,
        params: &PurchaseQuery,
    ) -> Result<Vec<PurchaseRecord>, MonitorError> {
        let docs = self.store.query(&Self::purchases_query(params)).await?;
        let now = Utc::now();
        Ok(docs
            .iter()
            .map(|doc| PurchaseRecord::from_document(doc, now))
            .collect())
    }

    /// Live list of unresolved alerts, newest first.
    #[must_use]
    pub fn subscribe_alerts(&self, severity: SeverityFilter) -> LiveQuery<Vec<AlertRecord>> {
        LiveQuery::spawn(
            Arc::clone(&self.store),
            Self::alerts_query(severity),
            |docs| {
                let now = Utc::now();
                docs.iter()
                    .map(|doc| AlertRecord::from_document(doc, now))
                    .collect()
            },
        )
    }

    /// One-shot read of unresolved alerts.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Store`] on store failure.
    pub async fn fetch_active_alerts(
        &self,
        severity: SeverityFilter,
    ) -> Result<Vec<AlertRecord>, MonitorError> {
        let docs = self.store.query(&Self::alerts_query(severity)).await?;
        let now = Utc::now();
        Ok(docs
            .iter()
            .map(|doc| AlertRecord::from_document(doc, now))
            .collect())
    }

    /// Today's (UTC) counters; zeros when no document exists.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Store`] on store failure.
    pub async fn fetch_stats(&self) -> Result<DailyStats, MonitorError> {
        self.fetch_stats_for(Utc::now().date_naive()).await
    }

    /// Counters for `date`; zeros when no document exists.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Store`] on store failure.
    pub async fn fetch_stats_for(&self, date: NaiveDate) -> Result<DailyStats, MonitorError> {
        let path = CollectionPath::daily_stats().doc(stats_document_id(date));
        let doc = self.store.get(&path).await?;
        Ok(doc.map_or_else(DailyStats::default, |d| DailyStats::from_document_data(&d.data)))
    }

    /// Marks an alert resolved.
    ///
    /// Resolving an already-resolved alert overwrites the resolution fields
    /// and succeeds.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::InvalidRequest`] for an unusable id.
    /// - [`MonitorError::AlertNotFound`] if no such alert exists.
    /// - [`MonitorError::Store`] on store failure.
    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        notes: &str,
        resolved_by: Option<&str>,
    ) -> Result<AlertResolution, MonitorError> {
        if !is_valid_document_id(alert_id) {
            return Err(MonitorError::InvalidRequest(format!(
                "invalid alert id: {alert_id:?}"
            )));
        }

        let resolution = AlertResolution {
            alert_id: alert_id.to_string(),
            resolved_by: resolved_by
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(&self.resolved_by)
                .to_string(),
            notes: notes.to_string(),
            resolved_at: Utc::now(),
        };

        let path = CollectionPath::alerts().doc(alert_id);
        match self.store.update(&path, resolution.to_fields()).await {
            Ok(()) => {
                tracing::info!(
                    alert_id,
                    resolved_by = %resolution.resolved_by,
                    "alert resolved"
                );
                Ok(resolution)
            }
            Err(StoreError::NotFound(_)) => Err(MonitorError::AlertNotFound(alert_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Fresh read of one purchase record.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidRequest`] for an unusable id, or
    /// [`MonitorError::Store`] on store failure.
    pub async fn get_webhook_details(
        &self,
        id: &str,
    ) -> Result<Option<PurchaseRecord>, MonitorError> {
        if !is_valid_document_id(id) {
            return Err(MonitorError::InvalidRequest(format!("invalid webhook id: {id:?}")));
        }
        let doc = self.store.get(&CollectionPath::purchases().doc(id)).await?;
        Ok(doc.map(|d| PurchaseRecord::from_document(&d, Utc::now())))
    }

    /// Most recent alerts regardless of resolution state.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Store`] on store failure.
    pub async fn get_alert_history(&self, limit: usize) -> Result<Vec<AlertRecord>, MonitorError> {
        let query = Query::collection(CollectionPath::alerts())
            .order_by(field::CREATED_AT, Direction::Descending)
            .limit(limit);
        let docs = self.store.query(&query).await?;
        let now = Utc::now();
        Ok(docs
            .iter()
            .map(|doc| AlertRecord::from_document(doc, now))
            .collect())
    }
}
