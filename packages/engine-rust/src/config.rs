use std::time::Duration;

/// Engine-level configuration for the dispatch core.
///
/// Controls the bounds of the chain resolution cache. Loading these values
/// from files or the environment is left to the embedding application.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of resolved chains kept in the resolution cache.
    /// `0` disables caching; every dispatch then resolves its chain afresh.
    pub cache_capacity: usize,
    /// A cached chain not accessed for this long is resolved again on next use.
    pub cache_idle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            cache_idle_timeout: Duration::from_secs(10 * 60),
        }
    }
}
