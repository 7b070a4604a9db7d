use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use papo_db::Store;
use papo_types::models::{MessageId, NewMessage, Participant};

use crate::clock::Clock;
use crate::error::{ChatError, ChatResult};
use crate::messages::MessageStore;

pub const JOINED_TEXT: &str = "joined";
pub const LEFT_TEXT: &str = "left";

/// Outcome of one eviction pass.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub evicted: Vec<String>,
    /// Participants whose eviction could not be completed. They are still
    /// registered and will be retried on the next pass.
    pub failed: Vec<(String, ChatError)>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.failed.is_empty()
    }
}

/// Active participants and their last heartbeat.
///
/// Every mutation runs under one registry-wide lock, so a name can only be
/// claimed once and a heartbeat never interleaves with the eviction of the
/// same participant. The lock is always taken before any store lock.
pub struct PresenceRegistry {
    store: Arc<dyn Store>,
    messages: MessageStore,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl PresenceRegistry {
    pub fn new(store: Arc<dyn Store>, messages: MessageStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            messages,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data, so a poisoned lock is still usable
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Claims `name` and announces the join. Rolled back if the announcement
    /// cannot be stored.
    pub fn register(&self, name: &str) -> ChatResult<Participant> {
        let _guard = self.lock();
        let now = self.clock.now();

        if !self.store.insert_participant(name, now)? {
            return Err(ChatError::AlreadyExists(name.to_string()));
        }

        if let Err(e) = self.messages.append(NewMessage::status(name, JOINED_TEXT)) {
            if let Err(rollback) = self.store.remove_participant(name) {
                warn!(participant = %name, "Rollback of registration failed: {}", rollback);
            }
            return Err(e);
        }

        info!(participant = %name, "Participant joined");
        Ok(Participant {
            name: name.to_string(),
            last_activity: now,
        })
    }

    pub fn heartbeat(&self, name: &str) -> ChatResult<()> {
        let _guard = self.lock();
        if self.store.touch_participant(name, self.clock.now())? {
            Ok(())
        } else {
            Err(ChatError::NotFound(name.to_string()))
        }
    }

    /// Appends `message` on behalf of its sender, who must still be
    /// registered. Holds the registry lock so an eviction cannot land between
    /// the check and the append.
    pub fn post_as(&self, message: NewMessage) -> ChatResult<MessageId> {
        let _guard = self.lock();
        if self.store.participant(&message.from)?.is_none() {
            return Err(ChatError::Forbidden(format!("'{}' is not a participant", message.from)));
        }
        self.messages.append(message)
    }

    pub fn is_registered(&self, name: &str) -> ChatResult<bool> {
        Ok(self.store.participant(name)?.is_some())
    }

    /// Snapshot; may be stale as soon as it returns.
    pub fn list(&self) -> ChatResult<Vec<Participant>> {
        Ok(self.store.participants()?)
    }

    /// Removes everyone idle for longer than `ttl` at `now` and posts a
    /// departure notice for each. Failures are per participant; the rest of
    /// the pass continues. Errors only if the roster itself cannot be read.
    pub fn evict_stale(&self, now: DateTime<Utc>, ttl: TimeDelta) -> ChatResult<SweepReport> {
        let _guard = self.lock();
        let mut report = SweepReport::default();

        let stale: Vec<Participant> = self
            .store
            .participants()?
            .into_iter()
            .filter(|p| now.signed_duration_since(p.last_activity) > ttl)
            .collect();

        for participant in stale {
            let name = participant.name;
            match self.store.remove_participant(&name) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(participant = %name, "Eviction failed: {}", e);
                    report.failed.push((name, e.into()));
                    continue;
                }
            }

            match self.messages.append(NewMessage::status(&name, LEFT_TEXT)) {
                Ok(_) => {
                    info!(participant = %name, "Participant evicted after inactivity");
                    report.evicted.push(name);
                }
                Err(e) => {
                    warn!(participant = %name, "Departure notice failed, keeping participant: {}", e);
                    if let Err(restore) = self.store.insert_participant(&name, participant.last_activity) {
                        warn!(participant = %name, "Restore after failed eviction failed: {}", restore);
                    }
                    report.failed.push((name, e));
                }
            }
        }

        Ok(report)
    }
}
