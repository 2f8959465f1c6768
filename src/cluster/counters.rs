//! Ordinals for unique namespace and resource names

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

#[derive(Debug, Default)]
struct Ordinals {
    namespace: u64,
    resource: u64,
}

/// Two monotonic counters behind a single lock
///
/// Each `next_*` call reads and increments under the lock, so concurrent
/// callers never see the same value. Counters start at zero and are
/// never reset.
#[derive(Debug, Default)]
pub struct Counters {
    inner: Mutex<Ordinals>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters shared by everything in this process
    pub fn global() -> Arc<Counters> {
        static GLOBAL: OnceLock<Arc<Counters>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Counters::new())))
    }

    fn lock(&self) -> MutexGuard<'_, Ordinals> {
        // The guarded data is two integers, always consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn next_namespace(&self) -> u64 {
        let mut ordinals = self.lock();
        let current = ordinals.namespace;
        ordinals.namespace += 1;
        current
    }

    pub fn next_resource(&self) -> u64 {
        let mut ordinals = self.lock();
        let current = ordinals.resource;
        ordinals.resource += 1;
        current
    }

    /// `prefix` followed by the next namespace ordinal
    pub fn next_namespace_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_namespace())
    }

    /// `base` followed by the next resource ordinal
    pub fn next_resource_name(&self, base: &str) -> String {
        format!("{}{}", base, self.next_resource())
    }
}
