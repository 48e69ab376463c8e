use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::init_db;
use crate::model::leave_request::LeaveRequest;
use crate::model::reimbursement::ReimbursementClaim;
use crate::service::audit::AuditLog;
use crate::service::config::ConfigService;
use crate::service::notifications::NotificationCenter;
use crate::service::requests::RequestEngine;
use crate::store::memory::{MemoryAuditStore, MemoryConfigStore, MemoryDirectory, MemoryRequestStore};
use crate::store::mysql::MySqlStore;
use crate::store::{AuditStore, ConfigStore, RequestStore, UserDirectory};

/// Storage handles the services are built on.
pub struct Backends {
    pub leave: Arc<dyn RequestStore<LeaveRequest>>,
    pub claims: Arc<dyn RequestStore<ReimbursementClaim>>,
    pub config: Arc<dyn ConfigStore>,
    pub audit: Arc<dyn AuditStore>,
    pub directory: Arc<dyn UserDirectory>,
}

impl Backends {
    pub fn mysql(store: MySqlStore) -> Self {
        let store = Arc::new(store);
        Self {
            leave: store.clone(),
            claims: store.clone(),
            config: store.clone(),
            audit: store.clone(),
            directory: store,
        }
    }

    pub fn memory(directory: Arc<MemoryDirectory>) -> Self {
        Self {
            leave: Arc::new(MemoryRequestStore::<LeaveRequest>::default()),
            claims: Arc::new(MemoryRequestStore::<ReimbursementClaim>::default()),
            config: Arc::new(MemoryConfigStore::default()),
            audit: Arc::new(MemoryAuditStore::default()),
            directory,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let pool = init_db(url).await?;
                info!("Connected to MySQL backend");
                Ok(Self::mysql(MySqlStore::new(pool)))
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory backend; data is lost on restart");
                Ok(Self::memory(Arc::new(MemoryDirectory::default())))
            }
        }
    }
}

/// Services shared by every worker.
pub struct AppState {
    pub config: Arc<ConfigService>,
    pub audit: Arc<AuditLog>,
    pub leave: Arc<RequestEngine<LeaveRequest>>,
    pub claims: Arc<RequestEngine<ReimbursementClaim>>,
    pub notifications: NotificationCenter,
}

impl AppState {
    pub fn new(backends: Backends, config: &Config) -> Self {
        let audit = Arc::new(AuditLog::new(backends.audit, config.audit_query_cap));
        let config_service = Arc::new(ConfigService::new(
            backends.config,
            audit.clone(),
            config.config_cache_ttl,
        ));

        let leave = Arc::new(RequestEngine::new(
            backends.leave,
            backends.directory.clone(),
            config_service.clone(),
            audit.clone(),
        ));
        let claims = Arc::new(RequestEngine::new(
            backends.claims,
            backends.directory,
            config_service.clone(),
            audit.clone(),
        ));

        Self {
            notifications: NotificationCenter::new(leave.clone(), claims.clone()),
            config: config_service,
            audit,
            leave,
            claims,
        }
    }
}
