use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use papo_db::{MemoryStore, MessageLog, ParticipantTable, StoreError};
use papo_types::models::{Message, MessageId, NewMessage, Participant};

/// In-memory store with switchable failures and slow participant lookups.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_all_appends: AtomicBool,
    fail_appends_from: Mutex<HashSet<String>>,
    fail_removals: AtomicBool,
    lookup_delay_ms: AtomicU64,
}

impl FlakyStore {
    pub fn fail_appends(&self, on: bool) {
        self.fail_all_appends.store(on, Ordering::SeqCst);
    }

    pub fn fail_appends_from(&self, name: &str) {
        self.fail_appends_from.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_removals(&self, on: bool) {
        self.fail_removals.store(on, Ordering::SeqCst);
    }

    /// Makes every single-participant lookup sleep for `delay`.
    pub fn slow_lookups(&self, delay: Duration) {
        self.lookup_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl MessageLog for FlakyStore {
    fn append_message(&self, message: &NewMessage, time: &str) -> Result<MessageId, StoreError> {
        if self.fail_all_appends.load(Ordering::SeqCst)
            || self.fail_appends_from.lock().unwrap().contains(&message.from)
        {
            return Err(StoreError::Unavailable("injected append failure".into()));
        }
        self.inner.append_message(message, time)
    }

    fn messages(&self, perspective: Option<&str>, limit: Option<u32>) -> Result<Vec<Message>, StoreError> {
        self.inner.messages(perspective, limit)
    }
}

impl ParticipantTable for FlakyStore {
    fn insert_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.inner.insert_participant(name, at)
    }

    fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.inner.touch_participant(name, at)
    }

    fn remove_participant(&self, name: &str) -> Result<bool, StoreError> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected removal failure".into()));
        }
        self.inner.remove_participant(name)
    }

    fn participant(&self, name: &str) -> Result<Option<Participant>, StoreError> {
        let delay = self.lookup_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        self.inner.participant(name)
    }

    fn participants(&self) -> Result<Vec<Participant>, StoreError> {
        self.inner.participants()
    }
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(0, 0).unwrap()
}
