//! Exclusive-lock cell for state shared across workers

use std::sync::Mutex;

/// Stores a thread-safe read/write value.
///
/// A thin wrapper around a mutex exposing closure-based access so the lock is
/// held only for the duration of one read or one read-modify-write and can
/// never be held across an await point or task creation.
#[derive(Debug)]
pub struct Guarded<T> {
    inner: Mutex<T>,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with shared access to the value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Runs `f` with exclusive access to the value, as one atomic
    /// read-modify-write
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl<T: Clone> Guarded<T> {
    /// Returns a clone of the current value
    pub fn snapshot(&self) -> T {
        self.with(|value| value.clone())
    }
}
