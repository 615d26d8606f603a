//! Registry of tracked-key providers.

use revmeta_model::TrackedKeyProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Default priority; lower runs earlier.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Handle returned by [`KeyRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

struct Registration {
    id: ProviderId,
    priority: i32,
    provider: Arc<dyn TrackedKeyProvider>,
}

/// Collects providers and computes the tracked key set on demand.
///
/// Nothing is cached: every call to [`KeyRegistry::tracked_keys`] re-runs
/// the provider chain, so registration changes apply to the next event.
#[derive(Default)]
pub struct KeyRegistry {
    providers: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
}

impl KeyRegistry {
    /// An empty registry. Tracks nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider at [`DEFAULT_PRIORITY`].
    pub fn register(&self, provider: impl TrackedKeyProvider + 'static) -> ProviderId {
        self.register_with_priority(DEFAULT_PRIORITY, provider)
    }

    /// Registers a provider. Providers run in ascending priority, ties in
    /// registration order.
    pub fn register_with_priority(
        &self,
        priority: i32,
        provider: impl TrackedKeyProvider + 'static,
    ) -> ProviderId {
        let id = ProviderId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut providers = self.providers.write().unwrap();
        let at = providers
            .iter()
            .position(|r| r.priority > priority)
            .unwrap_or(providers.len());
        providers.insert(
            at,
            Registration {
                id,
                priority,
                provider: Arc::new(provider),
            },
        );
        debug!("registered tracked-key provider {:?} at priority {}", id, priority);
        id
    }

    /// Removes a provider. Returns whether it was registered.
    pub fn unregister(&self, id: ProviderId) -> bool {
        let mut providers = self.providers.write().unwrap();
        let before = providers.len();
        providers.retain(|r| r.id != id);
        providers.len() != before
    }

    /// Removes every provider.
    pub fn clear(&self) {
        self.providers.write().unwrap().clear();
    }

    pub fn provider_count(&self) -> usize {
        self.providers.read().unwrap().len()
    }

    /// Runs the provider chain and returns the tracked keys, deduplicated
    /// with first occurrence winning.
    pub fn tracked_keys(&self) -> Vec<String> {
        let chain: Vec<Arc<dyn TrackedKeyProvider>> = self
            .providers
            .read()
            .unwrap()
            .iter()
            .map(|r| Arc::clone(&r.provider))
            .collect();

        let keys = chain
            .iter()
            .fold(Vec::new(), |keys, provider| provider.filter_keys(keys));

        let mut unique: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        unique
    }

    pub fn is_tracked(&self, key: &str) -> bool {
        self.tracked_keys().iter().any(|k| k == key)
    }
}
