//! Durable key-value preferences
//!
//! A flat map from string keys to scalar values, flushed to a JSON file on
//! every write. Observers receive a decoded [`PreferencesSnapshot`] when
//! they subscribe and again after each write.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::model::{
    ATTEMPTS_KEY, AttemptInput, BEST_PREFIX, IN_PROGRESS_PREFIX, LAST_AT_PREFIX, LAST_PREFIX,
    PrefValue, PreferencesSnapshot, QuizAttemptRecord, QuizInProgressState, SAVED_PREFIX,
};
use crate::error::PrefsError;

type Values = BTreeMap<String, PrefValue>;

/// Current values and the version stamped on the last write
pub(crate) struct Stored {
    version: u64,
    values: Values,
}

/// Per-observer delivery bookkeeping
#[derive(Default)]
struct Delivery {
    /// Newest version handed out or queued
    latest: u64,
    running: bool,
    pending: Option<PreferencesSnapshot>,
}

struct ObserverSlot {
    callback: Box<dyn Fn(&PreferencesSnapshot) + Send + Sync>,
    delivery: Mutex<Delivery>,
}

impl ObserverSlot {
    /// Hand a snapshot to the callback unless a newer one already went out.
    ///
    /// A snapshot arriving while the callback runs, from another thread or
    /// from a write made inside the callback, is parked and delivered once
    /// the callback returns. Each observer therefore sees versions in
    /// increasing order and always ends on the newest.
    fn deliver(&self, version: u64, snapshot: PreferencesSnapshot) {
        {
            let mut delivery = lock(&self.delivery);
            if version <= delivery.latest {
                return;
            }
            delivery.latest = version;
            if delivery.running {
                delivery.pending = Some(snapshot);
                return;
            }
            delivery.running = true;
        }

        let mut snapshot = snapshot;
        loop {
            (self.callback)(&snapshot);
            let mut delivery = lock(&self.delivery);
            match delivery.pending.take() {
                Some(next) => snapshot = next,
                None => {
                    delivery.running = false;
                    return;
                }
            }
        }
    }
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    slots: Vec<(u64, Arc<ObserverSlot>)>,
}

struct Inner {
    path: Option<PathBuf>,
    stored: Mutex<Stored>,
    /// Version of the values last written to disk
    written: Mutex<u64>,
    observers: Mutex<Observers>,
}

impl Inner {
    fn stored(&self) -> MutexGuard<'_, Stored> {
        lock(&self.stored)
    }

    fn observers(&self) -> MutexGuard<'_, Observers> {
        lock(&self.observers)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle returned by [`PreferencesStore::observe`]; dropping it unregisters the observer
#[must_use = "dropping a subscription unregisters its observer"]
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Subscription {
    /// Unregister explicitly
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.observers().slots.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Preferences store shared between the quizzes screen and the quiz runner
#[derive(Clone)]
pub struct PreferencesStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("path", &self.inner.path)
            .field("keys", &self.inner.stored().values.len())
            .finish()
    }
}

impl PreferencesStore {
    /// Open a file-backed store, starting empty if the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Values::new()
        };
        tracing::debug!("Opened preferences at {:?} ({} keys)", path, values.len());
        Ok(Self::with_values(Some(path), values))
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::with_values(None, Values::new())
    }

    fn with_values(path: Option<PathBuf>, values: Values) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                stored: Mutex::new(Stored { version: 1, values }),
                written: Mutex::new(0),
                observers: Mutex::new(Observers::default()),
            }),
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<PrefValue> {
        self.inner.stored().values.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, PrefsError> {
        match self.get(key) {
            None => Ok(None),
            Some(PrefValue::Bool(b)) => Ok(Some(b)),
            Some(_) => Err(mismatch(key, "bool")),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i32>, PrefsError> {
        match self.get(key) {
            None => Ok(None),
            Some(PrefValue::Int(i)) => Ok(Some(i)),
            Some(PrefValue::Long(l)) => i32::try_from(l).map(Some).map_err(|_| mismatch(key, "int")),
            Some(_) => Err(mismatch(key, "int")),
        }
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>, PrefsError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => as_long(&value).map(Some).ok_or_else(|| mismatch(key, "long")),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, PrefsError> {
        match self.get(key) {
            None => Ok(None),
            Some(PrefValue::Str(s)) => Ok(Some(s)),
            Some(_) => Err(mismatch(key, "string")),
        }
    }

    /// Set a value, flush and notify observers
    pub fn set(&self, key: impl Into<String>, value: PrefValue) -> Result<(), PrefsError> {
        let key = key.into();
        self.update(move |values| {
            values.insert(key, value);
            Ok(())
        })
    }

    /// Remove a key, flush and notify observers
    pub fn remove(&self, key: &str) -> Result<(), PrefsError> {
        self.update(|values| {
            values.remove(key);
            Ok(())
        })
    }

    /// Decode the current values into a snapshot
    pub fn snapshot(&self) -> PreferencesSnapshot {
        decode_snapshot(&self.inner.stored().values)
    }

    /// Register an observer; it is called at once with the current snapshot
    pub fn observe(
        &self,
        callback: impl Fn(&PreferencesSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let slot = Arc::new(ObserverSlot {
            callback: Box::new(callback),
            delivery: Mutex::new(Delivery::default()),
        });
        let id = {
            let mut observers = self.inner.observers();
            observers.next_id += 1;
            let id = observers.next_id;
            observers.slots.push((id, slot.clone()));
            id
        };

        let (version, snapshot) = {
            let stored = self.inner.stored();
            (stored.version, decode_snapshot(&stored.values))
        };
        slot.deliver(version, snapshot);
        Subscription { id, store: Arc::downgrade(&self.inner) }
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.observers().slots.len()
    }

    /// Bookmark or un-bookmark a quiz
    pub fn set_quiz_saved(&self, quiz_id: &str, saved: bool) -> Result<(), PrefsError> {
        self.set(format!("{SAVED_PREFIX}{quiz_id}"), PrefValue::Bool(saved))
    }

    /// Write the started-but-not-finished marker for a quiz
    pub fn mark_quiz_started(&self, quiz_id: &str, at: i64) -> Result<(), PrefsError> {
        self.set(format!("{IN_PROGRESS_PREFIX}{quiz_id}"), PrefValue::Long(at))
    }

    /// Drop the in-progress marker without recording an attempt
    pub fn clear_quiz_started(&self, quiz_id: &str) -> Result<(), PrefsError> {
        self.remove(&format!("{IN_PROGRESS_PREFIX}{quiz_id}"))
    }

    /// Log a finished attempt: bumps best/last score, appends the attempt
    /// record and clears the in-progress marker in one write
    pub fn record_quiz_attempt(&self, input: AttemptInput) -> Result<QuizAttemptRecord, PrefsError> {
        self.update(move |values| {
            let mut attempts = match values.get(ATTEMPTS_KEY) {
                None => Vec::new(),
                Some(PrefValue::Str(json)) => serde_json::from_str::<Vec<QuizAttemptRecord>>(json)?,
                Some(_) => return Err(mismatch(ATTEMPTS_KEY, "string")),
            };

            let best_key = format!("{BEST_PREFIX}{}", input.quiz_id);
            let previous_best = values.get(&best_key).and_then(as_long).unwrap_or(0);
            let best = previous_best.max(i64::from(input.score));

            let record = QuizAttemptRecord {
                id: uuid::Uuid::new_v4().to_string(),
                quiz_id: input.quiz_id.clone(),
                track_id: input.track_id,
                score: input.score,
                total_questions: input.total_questions,
                level: input.level,
                duration_minutes: input.duration_minutes,
                completed_at: input.completed_at,
            };
            attempts.push(record.clone());

            values.insert(best_key, int_value(best));
            values.insert(format!("{LAST_PREFIX}{}", input.quiz_id), int_value(input.score.into()));
            values.insert(
                format!("{LAST_AT_PREFIX}{}", input.quiz_id),
                PrefValue::Long(input.completed_at),
            );
            values.remove(&format!("{IN_PROGRESS_PREFIX}{}", input.quiz_id));
            values.insert(ATTEMPTS_KEY.to_string(), PrefValue::Str(serde_json::to_string(&attempts)?));

            Ok(record)
        })
    }

    /// Apply a mutation under the lock, then flush and notify.
    ///
    /// Every successful mutation bumps the version; the snapshot handed to
    /// observers is decoded under the same lock, so a version always
    /// matches its values. A failed mutation leaves the map untouched. A
    /// failed flush still notifies observers, since the in-memory values
    /// did change.
    fn update<R>(
        &self,
        mutate: impl FnOnce(&mut Values) -> Result<R, PrefsError>,
    ) -> Result<R, PrefsError> {
        let (result, version, values, snapshot) = {
            let mut stored = self.inner.stored();
            let mut staged = stored.values.clone();
            let result = mutate(&mut staged)?;
            stored.version += 1;
            let snapshot = decode_snapshot(&staged);
            stored.values = staged.clone();
            (result, stored.version, staged, snapshot)
        };

        let flushed = self.flush(version, &values);
        if let Err(ref e) = flushed {
            tracing::error!("Failed to flush preferences: {}", e);
        }

        self.notify(version, snapshot);
        flushed.map(|_| result)
    }

    /// Write `values` unless a newer version is already on disk
    fn flush(&self, version: u64, values: &Values) -> Result<(), PrefsError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        let mut written = lock(&self.inner.written);
        if *written >= version {
            tracing::debug!("Skipping flush of preferences v{}, v{} already written", version, *written);
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        fs::write(path, contents)?;
        *written = version;
        Ok(())
    }

    fn notify(&self, version: u64, snapshot: PreferencesSnapshot) {
        let slots: Vec<Arc<ObserverSlot>> =
            self.inner.observers().slots.iter().map(|(_, slot)| slot.clone()).collect();
        for slot in slots {
            slot.deliver(version, snapshot.clone());
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_values(&self) -> MutexGuard<'_, Stored> {
        self.inner.stored()
    }
}

fn mismatch(key: &str, expected: &'static str) -> PrefsError {
    PrefsError::TypeMismatch { key: key.to_string(), expected }
}

fn as_long(value: &PrefValue) -> Option<i64> {
    match value {
        PrefValue::Int(i) => Some(i64::from(*i)),
        PrefValue::Long(l) => Some(*l),
        _ => None,
    }
}

fn as_score(value: &PrefValue) -> Option<u32> {
    as_long(value).and_then(|l| u32::try_from(l).ok())
}

fn int_value(value: i64) -> PrefValue {
    match i32::try_from(value) {
        Ok(i) => PrefValue::Int(i),
        Err(_) => PrefValue::Long(value),
    }
}

/// Turn the flat key space into typed progress records
fn decode_snapshot(values: &Values) -> PreferencesSnapshot {
    let mut snapshot = PreferencesSnapshot::default();

    for (key, value) in values {
        if let Some(id) = key.strip_prefix(SAVED_PREFIX) {
            match value {
                PrefValue::Bool(true) => {
                    snapshot.saved_quiz_ids.insert(id.to_string());
                }
                PrefValue::Bool(false) => {}
                other => skip(key, other, "bool"),
            }
        } else if let Some(id) = key.strip_prefix(BEST_PREFIX) {
            match as_score(value) {
                Some(score) => snapshot.quiz_progress.entry(id.to_string()).or_default().best_score = score,
                None => skip(key, value, "int"),
            }
        } else if let Some(id) = key.strip_prefix(LAST_AT_PREFIX) {
            match as_long(value) {
                Some(at) => snapshot.quiz_progress.entry(id.to_string()).or_default().last_attempt_at = at,
                None => skip(key, value, "long"),
            }
        } else if let Some(id) = key.strip_prefix(LAST_PREFIX) {
            match as_score(value) {
                Some(score) => snapshot.quiz_progress.entry(id.to_string()).or_default().last_score = score,
                None => skip(key, value, "int"),
            }
        } else if let Some(id) = key.strip_prefix(IN_PROGRESS_PREFIX) {
            match as_long(value) {
                Some(updated_at) => {
                    snapshot.quiz_in_progress.insert(id.to_string(), QuizInProgressState { updated_at });
                }
                None => skip(key, value, "long"),
            }
        } else if key == ATTEMPTS_KEY {
            match value {
                PrefValue::Str(json) => match serde_json::from_str(json) {
                    Ok(attempts) => snapshot.quiz_attempts = attempts,
                    Err(e) => tracing::warn!("Ignoring malformed attempt log: {}", e),
                },
                other => skip(key, other, "string"),
            }
        }
    }

    snapshot
}

fn skip(key: &str, value: &PrefValue, expected: &str) {
    tracing::warn!("Ignoring preference '{}': expected {}, found {}", key, expected, value.type_name());
}
