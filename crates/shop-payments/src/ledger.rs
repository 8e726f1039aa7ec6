//! Processed Event Ledger
//!
//! Stripe delivers webhooks at least once and retries on any non-2xx
//! answer, so the same event id can arrive several times. The ledger records
//! which events have been fulfilled; a second delivery finds its id already
//! claimed and is skipped.
//!
//! Stripe gives up redelivering after three days, so older claims are
//! dropped by the in-memory ledger.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use crate::error::{PaymentError, Result};

/// How long a claim is kept; matches Stripe's redelivery window
pub const DEFAULT_RETENTION_HOURS: i64 = 72;

/// A claimed webhook event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessedEvent {
    /// Stripe event id (`evt_...`)
    pub event_id: String,

    /// Event type, e.g. `checkout.session.completed`
    pub event_type: String,

    /// When the claim was taken
    pub processed_at: DateTime<Utc>,
}

/// Ledger storage trait
pub trait EventLedger: Send + Sync {
    /// Claim `event_id` for processing.
    ///
    /// Returns `false` when the id was already claimed. Check and insert
    /// happen under one lock so concurrent deliveries cannot both win.
    fn claim(&self, event_id: &str, event_type: &str) -> Result<bool>;

    /// Drop a claim after a failed fulfillment so a redelivery can retry
    fn release(&self, event_id: &str) -> Result<()>;

    /// Look up a claimed event
    fn get(&self, event_id: &str) -> Result<Option<ProcessedEvent>>;
}

/// In-memory ledger (for development and single-instance deployments)
pub struct MemoryEventLedger {
    events: RwLock<HashMap<String, ProcessedEvent>>,
    retention: Duration,
}

impl Default for MemoryEventLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEventLedger {
    pub fn new() -> Self {
        Self::with_retention(Duration::hours(DEFAULT_RETENTION_HOURS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Drop claims taken before `cutoff`; returns how many were removed
    pub fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut events = self.events.write().map_err(poisoned)?;
        Ok(prune_before(&mut events, cutoff))
    }

    /// Number of claimed events
    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prune_before(events: &mut HashMap<String, ProcessedEvent>, cutoff: DateTime<Utc>) -> usize {
    let before = events.len();
    events.retain(|_, event| event.processed_at >= cutoff);
    before - events.len()
}

fn poisoned<T>(_: T) -> PaymentError {
    PaymentError::Storage("event ledger lock poisoned".into())
}

impl EventLedger for MemoryEventLedger {
    fn claim(&self, event_id: &str, event_type: &str) -> Result<bool> {
        let mut events = self.events.write().map_err(poisoned)?;
        let now = Utc::now();
        let pruned = prune_before(&mut events, now - self.retention);
        if pruned > 0 {
            tracing::debug!(pruned, "Dropped expired webhook claims");
        }

        match events.entry(event_id.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(ProcessedEvent {
                    event_id: event_id.to_string(),
                    event_type: event_type.to_string(),
                    processed_at: now,
                });
                Ok(true)
            }
        }
    }

    fn release(&self, event_id: &str) -> Result<()> {
        let mut events = self.events.write().map_err(poisoned)?;
        events.remove(event_id);
        Ok(())
    }

    fn get(&self, event_id: &str) -> Result<Option<ProcessedEvent>> {
        let events = self.events.read().map_err(poisoned)?;
        Ok(events.get(event_id).cloned())
    }
}
