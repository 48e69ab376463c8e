use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::model::audit_log::{AuditFilter, AuditLogEntry, NewAuditEntry};
use crate::model::global_config::GlobalConfig;
use crate::model::request::{Decision, Lifecycle, RequestStatus, WorkflowRequest};
use crate::model::role::Role;
use crate::model::user::User;
use crate::store::{AuditStore, ConfigStore, RequestStore, StoreError, StoreResult, UserDirectory};

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| poisoned())
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| poisoned())
}

fn newest_first<R: WorkflowRequest>(mut rows: Vec<R>) -> Vec<R> {
    rows.sort_by(|a, b| {
        (b.lifecycle().created_at, b.id()).cmp(&(a.lifecycle().created_at, a.id()))
    });
    rows
}

/// Request rows keyed by id.
pub struct MemoryRequestStore<R> {
    rows: RwLock<BTreeMap<u64, R>>,
    next_id: AtomicU64,
}

impl<R> Default for MemoryRequestStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<R: WorkflowRequest> MemoryRequestStore<R> {
    fn collect(&self, keep: impl Fn(&R) -> bool) -> StoreResult<Vec<R>> {
        let rows = read(&self.rows)?;
        Ok(newest_first(rows.values().filter(|r| keep(r)).cloned().collect()))
    }
}

#[async_trait]
impl<R: WorkflowRequest> RequestStore<R> for MemoryRequestStore<R> {
    async fn insert(&self, employee_id: u64, owner_role: Role, draft: R::Draft, status: RequestStatus) -> StoreResult<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = R::materialize(id, employee_id, draft, Lifecycle::new(owner_role, status, Utc::now()));
        write(&self.rows)?.insert(id, request.clone());
        Ok(request)
    }

    async fn fetch(&self, id: u64) -> StoreResult<Option<R>> {
        Ok(read(&self.rows)?.get(&id).cloned())
    }

    async fn list_for_employee(&self, employee_id: u64) -> StoreResult<Vec<R>> {
        self.collect(|r| r.employee_id() == employee_id)
    }

    async fn list_all(&self) -> StoreResult<Vec<R>> {
        self.collect(|_| true)
    }

    async fn apply_decision(&self, id: u64, expected_version: u32, decision: &Decision) -> StoreResult<R> {
        let mut rows = write(&self.rows)?;
        let request = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if request.lifecycle().version != expected_version {
            return Err(StoreError::Conflict);
        }
        request.lifecycle_mut().apply(decision);
        Ok(request.clone())
    }

    async fn unseen_decisions(&self, employee_id: u64) -> StoreResult<Vec<R>> {
        self.collect(|r| r.employee_id() == employee_id && r.has_unseen_decision())
    }

    async fn mark_notified(&self, employee_id: u64, seen: &[(u64, u32)]) -> StoreResult<u64> {
        let mut rows = write(&self.rows)?;
        let mut changed = 0;
        for (id, version) in seen {
            let Some(request) = rows.get_mut(id) else { continue };
            if request.employee_id() != employee_id || request.lifecycle().version != *version {
                continue;
            }
            let lifecycle = request.lifecycle_mut();
            if !lifecycle.notified {
                lifecycle.notified = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[derive(Default)]
pub struct MemoryConfigStore {
    record: RwLock<Option<GlobalConfig>>,
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> StoreResult<Option<GlobalConfig>> {
        Ok(read(&self.record)?.clone())
    }

    async fn insert_default(&self) -> StoreResult<GlobalConfig> {
        let mut record = write(&self.record)?;
        Ok(record.get_or_insert_with(GlobalConfig::default).clone())
    }

    async fn save(&self, config: &GlobalConfig) -> StoreResult<GlobalConfig> {
        *write(&self.record)? = Some(config.clone());
        Ok(config.clone())
    }
}

/// Append-only vector of audit entries.
pub struct MemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
    next_id: AtomicU64,
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
        let stored = AuditLogEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            actor_id: entry.actor_id,
            action: entry.action,
            target_id: entry.target_id,
            details: entry.details,
            timestamp: Utc::now(),
        };
        write(&self.entries)?.push(stored.clone());
        Ok(stored)
    }

    async fn query(&self, filter: &AuditFilter, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        let entries = read(&self.entries)?;
        let mut matched: Vec<AuditLogEntry> =
            entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        matched.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        matched.truncate(limit);
        Ok(matched)
    }
}

#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<u64, User>>,
}

impl MemoryDirectory {
    pub fn upsert(&self, user: User) -> StoreResult<()> {
        write(&self.users)?.insert(user.id, user);
        Ok(())
    }

    pub fn remove(&self, id: u64) -> StoreResult<()> {
        write(&self.users)?.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn lookup(&self, ids: &[u64]) -> StoreResult<HashMap<u64, User>> {
        let users = read(&self.users)?;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|u| (*id, u.clone())))
            .collect())
    }
}
