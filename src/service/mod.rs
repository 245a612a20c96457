//! Service layer: repository, live queries and stats polling.
//!
//! [`WebhookRepository`] translates monitor operations into store queries
//! and writes. [`LiveQuery`] keeps a query's result current through the
//! store's change feed, and [`StatsPoller`] re-reads today's counters on a
//! timer.

pub mod live;
pub mod repository;
pub mod stats_poller;

pub use live::{LiveQuery, SubscriptionState};
pub use repository::{PurchaseQuery, SeverityFilter, StatusFilter, WebhookRepository};
pub use stats_poller::StatsPoller;
