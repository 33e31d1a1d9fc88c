use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of entity ids with an operation currently running.
///
/// `try_acquire` hands out a guard that removes the id again when dropped, so
/// the flag is released on success, error, and early return alike.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when an operation for `key` is already outstanding.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<InFlightGuard> {
        let key = key.into();
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: self.clone(),
            key,
        })
    }

    #[cfg(test)]
    pub fn is_active(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    // A poisoned set still holds valid ids; keep using it.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: String,
}

#[cfg(test)]
impl InFlightGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
