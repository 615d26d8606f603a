/// Extension point deciding which metadata keys are versioned.
///
/// Providers form a filter chain: each receives the list produced so far
/// (empty for the first provider) and returns the list to pass on. The
/// registry re-runs the chain on every lifecycle event, so a provider may
/// answer differently over time.
pub trait TrackedKeyProvider: Send + Sync {
    fn filter_keys(&self, keys: Vec<String>) -> Vec<String>;
}

impl<F> TrackedKeyProvider for F
where
    F: Fn(Vec<String>) -> Vec<String> + Send + Sync,
{
    fn filter_keys(&self, keys: Vec<String>) -> Vec<String> {
        self(keys)
    }
}

/// Appends a fixed list of keys.
#[derive(Debug, Clone, Default)]
pub struct StaticKeys(Vec<String>);

impl StaticKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

impl TrackedKeyProvider for StaticKeys {
    fn filter_keys(&self, mut keys: Vec<String>) -> Vec<String> {
        keys.extend(self.0.iter().cloned());
        keys
    }
}
