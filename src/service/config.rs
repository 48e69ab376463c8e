use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::model::audit_log::{AuditAction, NewAuditEntry};
use crate::model::global_config::{ConfigPatch, GlobalConfig};
use crate::model::principal::Principal;
use crate::service::audit::AuditLog;
use crate::store::{ConfigStore, StoreResult};
use crate::utils::config_cache::ConfigCache;

const CONFIG_TARGET: &str = "global-config";

/// Owner of the singleton [`GlobalConfig`].
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    cache: ConfigCache,
    audit: Arc<AuditLog>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>, audit: Arc<AuditLog>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: ConfigCache::new(cache_ttl),
            audit,
        }
    }

    /// Never reports "not found": a missing record is created with defaults.
    pub async fn get_config(&self) -> Result<GlobalConfig, AppError> {
        if let Some(config) = self.cache.get().await {
            return Ok(config);
        }

        let config = self.load_or_create().await?;
        self.cache.put(config.clone()).await;
        Ok(config)
    }

    pub async fn update_config(&self, principal: &Principal, patch: ConfigPatch) -> Result<GlobalConfig, AppError> {
        principal.require_admin()?;

        // Patch the stored record, never a cached copy.
        let current = self.load_or_create().await?;
        let updated = current.apply(&patch, principal.id, Utc::now());
        let saved = self.store.save(&updated).await?;
        self.cache.invalidate().await;

        info!(actor_id = principal.id, changes = %patch.describe(), "Global config updated");

        self.audit
            .record_best_effort(NewAuditEntry {
                actor_id: principal.id,
                action: AuditAction::ConfigUpdated,
                target_id: CONFIG_TARGET.to_string(),
                details: patch.describe(),
            })
            .await;

        Ok(saved)
    }

    async fn load_or_create(&self) -> StoreResult<GlobalConfig> {
        match self.store.load().await? {
            Some(config) => Ok(config),
            None => {
                debug!("No global config stored yet, creating defaults");
                self.store.insert_default().await
            }
        }
    }
}
