//! Diffs each new snapshot against the last published one and commits
//! the new one only when every change has been published.
//!
//! The reference snapshot is replaced in exactly one place, after a
//! fully successful publish.  A cycle with any failed publish leaves it
//! untouched, so the next cycle recomputes the same changes and sends
//! them again.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::events::EventPublisher;
use crate::types::{ChangeRecord, ChangeSet, EventPayload, Snapshot};

/// Result of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing discovered, or nothing changed.
    NoOp,
    /// Every change was published and the reference was replaced.
    Committed { published: usize },
    /// At least one publish failed; the reference is unchanged.
    Aborted { published: usize, total: usize },
}

pub struct ReconciliationEngine {
    publisher: Arc<dyn EventPublisher>,
    bus: String,
    project: String,
    env_name: String,
    reference: Snapshot,
}

impl ReconciliationEngine {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        bus: String,
        project: String,
        env_name: String,
    ) -> Self {
        Self {
            publisher,
            bus,
            project,
            env_name,
            reference: Snapshot::new(),
        }
    }

    /// The last snapshot that was fully published.
    pub fn reference(&self) -> &Snapshot {
        &self.reference
    }

    /// Forgets the reference, so the next cycle republishes everything.
    pub fn reset(&mut self) {
        self.reference.clear();
    }

    pub async fn reconcile(&mut self, current: Snapshot) -> Outcome {
        if current.is_empty() {
            // An empty discovery is treated as a transient glitch, not as
            // every exporter having gone away.
            info!("Did not find any exporter");
            return Outcome::NoOp;
        }
        debug!("Current exporters: {:?}", current);
        debug!("Reference exporters: {:?}", self.reference);

        if current == self.reference {
            info!("Current exporters are already declared");
            return Outcome::NoOp;
        }

        let changes = change_set(&current, &self.reference);
        if changes.is_empty() {
            return Outcome::NoOp;
        }

        for (name, keys) in colliding_event_names(&changes, &self.project, &self.env_name) {
            warn!("Exporters {:?} all publish under event name {}", keys, name);
        }

        let total = changes.len();
        let mut published = 0;
        for record in changes.values() {
            let purge = !current.contains_key(&record.key);
            if self.publish(record, purge).await {
                published += 1;
            }
        }
        info!("Successfully sent {}/{} events", published, total);

        if published == total {
            info!("Saving current exporter state");
            self.reference = current;
            Outcome::Committed { published }
        } else {
            error!("Problem while creating events, keeping the previous exporter state");
            Outcome::Aborted { published, total }
        }
    }

    async fn publish(&self, record: &ChangeRecord, purge: bool) -> bool {
        let name = event_name(&record.key, &self.project, &self.env_name);
        if purge {
            info!("Purging exporter {} as {}", record.key, name);
        } else {
            info!("Sending exporter {} as {}", record.key, name);
        }

        let payload = EventPayload::from([(name.clone(), record.endpoints.clone())]);
        match self.publisher.publish_event(&self.bus, &name, &payload).await {
            Ok(receipt) => receipt.success(),
            Err(e) => {
                error!("Failed to publish {}: {}", name, e);
                false
            }
        }
    }
}

/// Records for every exporter that is new or changed in `current`, plus
/// an empty record for every exporter only present in `reference`.
pub fn change_set(current: &Snapshot, reference: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for (key, endpoints) in current {
        if reference.get(key) != Some(endpoints) {
            changes.insert(key.clone(), ChangeRecord::update(key.clone(), endpoints.clone()));
        }
    }
    for key in reference.keys().filter(|k| !current.contains_key(*k)) {
        changes.insert(key.clone(), ChangeRecord::purge(key.clone()));
    }

    changes
}

/// Event names shared by more than one key of `changes`, with the keys
/// that map to each.
pub fn colliding_event_names<'a>(
    changes: &'a ChangeSet,
    project: &str,
    env_name: &str,
) -> BTreeMap<String, Vec<&'a str>> {
    let mut by_name: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for key in changes.keys() {
        by_name
            .entry(event_name(key, project, env_name))
            .or_default()
            .push(key);
    }
    by_name.retain(|_, keys| keys.len() > 1);
    by_name
}

/// `<exporter>-<project>-<env>`: the exporter key loses its
/// non-alphanumeric characters, and everything is lower-cased.
pub fn event_name(key: &str, project: &str, env_name: &str) -> String {
    let exporter: String = key
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!("{}-{}-{}", exporter, project, env_name).to_lowercase()
}
