use moka::future::Cache;
use std::time::Duration;

use crate::model::global_config::GlobalConfig;

/// Short-lived copy of the singleton policy record.
///
/// Reads may be up to `ttl` stale; writers call [`ConfigCache::invalidate`].
#[derive(Clone)]
pub struct ConfigCache {
    inner: Cache<(), GlobalConfig>,
}

impl ConfigCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self) -> Option<GlobalConfig> {
        self.inner.get(&()).await
    }

    pub async fn put(&self, config: GlobalConfig) {
        self.inner.insert((), config).await;
    }

    pub async fn invalidate(&self) {
        self.inner.invalidate(&()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn caches_until_invalidated() {
        let cache = ConfigCache::new(Duration::from_secs(60));
        assert_eq!(cache.get().await, None);

        let config = GlobalConfig {
            auto_approve_managers: true,
            ..Default::default()
        };
        cache.put(config.clone()).await;
        assert_eq!(cache.get().await, Some(config));

        cache.invalidate().await;
        assert_eq!(cache.get().await, None);
    }
}
