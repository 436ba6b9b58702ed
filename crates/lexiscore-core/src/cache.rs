//! Lazily initialised, shared handle for expensive read-only resources.
//!
//! Annotation models and lexical indexes are loaded at most once and then
//! shared across analyses. A failed load is remembered too, so a missing
//! file is read and reported once rather than on every lookup. A
//! [`ModelCache`] is constructed explicitly and passed to whoever needs it;
//! [`ModelCache::reset`] clears the slot so tests can start from a clean
//! slate.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Loader<T> = Box<dyn Fn() -> anyhow::Result<T> + Send + Sync>;
/// Loaded value, or the rendered error of the failed attempt.
type Slot<T> = Option<Result<Arc<T>, String>>;

pub struct ModelCache<T> {
    name: String,
    loader: Loader<T>,
    slot: Mutex<Slot<T>>,
    loads: AtomicU32,
    attempts: AtomicU32,
}

impl<T> ModelCache<T> {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            slot: Mutex::new(None),
            loads: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the shared value, running the loader on first use.
    ///
    /// A failed load is logged once and cached; later calls return the same
    /// error without running the loader until [`reset`](Self::reset).
    pub fn get(&self) -> anyhow::Result<Arc<T>> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(Ok(value)) => return Ok(Arc::clone(value)),
            Some(Err(message)) => anyhow::bail!("{} unavailable: {}", self.name, message),
            None => {}
        }
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match (self.loader)() {
            Ok(value) => {
                let value = Arc::new(value);
                self.loads.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(cache = %self.name, "resource loaded");
                *slot = Some(Ok(Arc::clone(&value)));
                Ok(value)
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(cache = %self.name, "failed to load resource: {}", message);
                *slot = Some(Err(message.clone()));
                anyhow::bail!("{} unavailable: {}", self.name, message)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock(), Some(Ok(_)))
    }

    /// Whether the last load attempt failed.
    pub fn has_failed(&self) -> bool {
        matches!(*self.lock(), Some(Err(_)))
    }

    /// Clear the cached value or failure. Handles already returned by
    /// [`get`](Self::get) stay valid.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    /// Number of successful loads so far.
    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Number of times the loader has run, successful or not.
    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> fmt::Debug for ModelCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .field("failed", &self.has_failed())
            .field("loads", &self.load_count())
            .finish()
    }
}
