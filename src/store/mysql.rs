use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use crate::model::audit_log::{AuditFilter, AuditLogEntry, NewAuditEntry};
use crate::model::global_config::GlobalConfig;
use crate::model::leave_request::{LeaveDraft, LeaveRequest};
use crate::model::reimbursement::{ClaimDraft, ReimbursementClaim};
use crate::model::request::{Decision, Lifecycle, RequestStatus};
use crate::model::role::Role;
use crate::model::user::User;
use crate::store::{AuditStore, ConfigStore, RequestStore, StoreError, StoreResult, UserDirectory};

const LEAVE_TABLE: &str = "leave_requests";
const CLAIM_TABLE: &str = "reimbursement_claims";

const LIFECYCLE_COLUMNS: &str =
    "owner_role_id, status, admin_reason, updated_by, notified, version, created_at, updated_at";

const CONFIG_ROW_ID: u8 = 1;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::Unavailable(format!("corrupt {what} column value: {value}"))
}

#[derive(FromRow)]
struct LifecycleRow {
    owner_role_id: u8,
    status: String,
    admin_reason: String,
    updated_by: Option<u64>,
    notified: bool,
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LifecycleRow> for Lifecycle {
    type Error = StoreError;

    fn try_from(row: LifecycleRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RequestStatus>()
            .map_err(|_| corrupt("status", &row.status))?;
        let owner_role =
            Role::from_id(row.owner_role_id).ok_or_else(|| corrupt("owner_role_id", &row.owner_role_id.to_string()))?;
        Ok(Lifecycle {
            owner_role,
            status,
            admin_reason: row.admin_reason,
            updated_by: row.updated_by,
            notified: row.notified,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    from_date: NaiveDate,
    to_date: NaiveDate,
    reason: String,
    #[sqlx(flatten)]
    lifecycle: LifecycleRow,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row.leave_type,
            from_date: row.from_date,
            to_date: row.to_date,
            reason: row.reason,
            lifecycle: row.lifecycle.try_into()?,
        })
    }
}

#[derive(FromRow)]
struct ClaimRow {
    id: u64,
    employee_id: u64,
    title: String,
    amount: f64,
    proof: Option<String>,
    #[sqlx(flatten)]
    lifecycle: LifecycleRow,
}

impl TryFrom<ClaimRow> for ReimbursementClaim {
    type Error = StoreError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        Ok(ReimbursementClaim {
            id: row.id,
            employee_id: row.employee_id,
            title: row.title,
            amount: row.amount,
            proof: row.proof,
            lifecycle: row.lifecycle.try_into()?,
        })
    }
}

fn convert_all<Row, T>(rows: Vec<Row>) -> StoreResult<Vec<T>>
where
    T: TryFrom<Row, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn leave_select() -> String {
    format!(
        "SELECT id, employee_id, leave_type, from_date, to_date, reason, {LIFECYCLE_COLUMNS} FROM {LEAVE_TABLE}"
    )
}

fn claim_select() -> String {
    format!("SELECT id, employee_id, title, amount, proof, {LIFECYCLE_COLUMNS} FROM {CLAIM_TABLE}")
}

const NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

const UNSEEN: &str = " WHERE employee_id = ? AND status <> 'Pending' AND notified = FALSE";

/* =========================
Shared request-table statements
========================= */

/// Version-guarded status write; distinguishes a missing row from a lost race.
async fn apply_decision_in(
    pool: &MySqlPool,
    table: &str,
    id: u64,
    expected_version: u32,
    decision: &Decision,
) -> StoreResult<()> {
    let sql = format!(
        r#"
        UPDATE {table}
        SET status = ?, admin_reason = ?, updated_by = ?, updated_at = ?,
            notified = FALSE, version = version + 1
        WHERE id = ? AND version = ?
        "#
    );

    let result = sqlx::query(&sql)
        .bind(decision.status.as_ref())
        .bind(&decision.admin_reason)
        .bind(decision.updated_by)
        .bind(decision.decided_at)
        .bind(id)
        .bind(expected_version)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let exists_sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)");
    let exists = sqlx::query_scalar::<_, i64>(&exists_sql)
        .bind(id)
        .fetch_one(pool)
        .await?;

    Err(if exists != 0 { StoreError::Conflict } else { StoreError::NotFound })
}

/// Only rows still at the version the owner was shown are marked.
async fn mark_notified_in(pool: &MySqlPool, table: &str, employee_id: u64, seen: &[(u64, u32)]) -> StoreResult<u64> {
    if seen.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<MySql>::new(format!("UPDATE {table} SET notified = TRUE WHERE employee_id = "));
    builder.push_bind(employee_id).push(" AND notified = FALSE AND (");
    for (i, (id, version)) in seen.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder
            .push("(id = ")
            .push_bind(*id)
            .push(" AND version = ")
            .push_bind(*version)
            .push(")");
    }
    builder.push(")");

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/* =========================
Leave requests
========================= */

#[async_trait]
impl RequestStore<LeaveRequest> for MySqlStore {
    async fn insert(
        &self,
        employee_id: u64,
        owner_role: Role,
        draft: LeaveDraft,
        status: RequestStatus,
    ) -> StoreResult<LeaveRequest> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, owner_role_id, leave_type, from_date, to_date, reason, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(owner_role.id())
        .bind(&draft.leave_type)
        .bind(draft.from_date)
        .bind(draft.to_date)
        .bind(&draft.reason)
        .bind(status.as_ref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        RequestStore::<LeaveRequest>::fetch(self, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn fetch(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("{} WHERE id = ?", leave_select());
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list_for_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!("{} WHERE employee_id = ?{NEWEST_FIRST}", leave_select());
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn list_all(&self) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!("{}{NEWEST_FIRST}", leave_select());
        let rows = sqlx::query_as::<_, LeaveRow>(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn apply_decision(&self, id: u64, expected_version: u32, decision: &Decision) -> StoreResult<LeaveRequest> {
        apply_decision_in(&self.pool, LEAVE_TABLE, id, expected_version, decision).await?;
        RequestStore::<LeaveRequest>::fetch(self, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn unseen_decisions(&self, employee_id: u64) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!("{}{UNSEEN}{NEWEST_FIRST}", leave_select());
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn mark_notified(&self, employee_id: u64, seen: &[(u64, u32)]) -> StoreResult<u64> {
        mark_notified_in(&self.pool, LEAVE_TABLE, employee_id, seen).await
    }
}

/* =========================
Reimbursement claims
========================= */

#[async_trait]
impl RequestStore<ReimbursementClaim> for MySqlStore {
    async fn insert(
        &self,
        employee_id: u64,
        owner_role: Role,
        draft: ClaimDraft,
        status: RequestStatus,
    ) -> StoreResult<ReimbursementClaim> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO reimbursement_claims
                (employee_id, owner_role_id, title, amount, proof, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(owner_role.id())
        .bind(&draft.title)
        .bind(draft.amount)
        .bind(&draft.proof)
        .bind(status.as_ref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        RequestStore::<ReimbursementClaim>::fetch(self, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn fetch(&self, id: u64) -> StoreResult<Option<ReimbursementClaim>> {
        let sql = format!("{} WHERE id = ?", claim_select());
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ReimbursementClaim::try_from).transpose()
    }

    async fn list_for_employee(&self, employee_id: u64) -> StoreResult<Vec<ReimbursementClaim>> {
        let sql = format!("{} WHERE employee_id = ?{NEWEST_FIRST}", claim_select());
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn list_all(&self) -> StoreResult<Vec<ReimbursementClaim>> {
        let sql = format!("{}{NEWEST_FIRST}", claim_select());
        let rows = sqlx::query_as::<_, ClaimRow>(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn apply_decision(
        &self,
        id: u64,
        expected_version: u32,
        decision: &Decision,
    ) -> StoreResult<ReimbursementClaim> {
        apply_decision_in(&self.pool, CLAIM_TABLE, id, expected_version, decision).await?;
        RequestStore::<ReimbursementClaim>::fetch(self, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn unseen_decisions(&self, employee_id: u64) -> StoreResult<Vec<ReimbursementClaim>> {
        let sql = format!("{}{UNSEEN}{NEWEST_FIRST}", claim_select());
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn mark_notified(&self, employee_id: u64, seen: &[(u64, u32)]) -> StoreResult<u64> {
        mark_notified_in(&self.pool, CLAIM_TABLE, employee_id, seen).await
    }
}

/* =========================
Global config singleton
========================= */

#[derive(FromRow)]
struct ConfigRow {
    auto_approve_managers: bool,
    strict_role_validation: bool,
    mfa_enabled: bool,
    updated_by: Option<u64>,
    last_updated: Option<DateTime<Utc>>,
}

impl From<ConfigRow> for GlobalConfig {
    fn from(row: ConfigRow) -> Self {
        GlobalConfig {
            auto_approve_managers: row.auto_approve_managers,
            strict_role_validation: row.strict_role_validation,
            mfa_enabled: row.mfa_enabled,
            updated_by: row.updated_by,
            last_updated: row.last_updated,
        }
    }
}

#[async_trait]
impl ConfigStore for MySqlStore {
    async fn load(&self) -> StoreResult<Option<GlobalConfig>> {
        let row = sqlx::query_as::<_, ConfigRow>(
            r#"
            SELECT auto_approve_managers, strict_role_validation, mfa_enabled, updated_by, last_updated
            FROM global_config
            WHERE id = ?
            "#,
        )
        .bind(CONFIG_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(GlobalConfig::from))
    }

    async fn insert_default(&self) -> StoreResult<GlobalConfig> {
        let defaults = GlobalConfig::default();
        // IGNORE keeps a concurrently created row intact.
        sqlx::query(
            r#"
            INSERT IGNORE INTO global_config
                (id, auto_approve_managers, strict_role_validation, mfa_enabled)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(CONFIG_ROW_ID)
        .bind(defaults.auto_approve_managers)
        .bind(defaults.strict_role_validation)
        .bind(defaults.mfa_enabled)
        .execute(&self.pool)
        .await?;

        self.load().await?.ok_or(StoreError::NotFound)
    }

    async fn save(&self, config: &GlobalConfig) -> StoreResult<GlobalConfig> {
        sqlx::query(
            r#"
            INSERT INTO global_config
                (id, auto_approve_managers, strict_role_validation, mfa_enabled, updated_by, last_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                auto_approve_managers = VALUES(auto_approve_managers),
                strict_role_validation = VALUES(strict_role_validation),
                mfa_enabled = VALUES(mfa_enabled),
                updated_by = VALUES(updated_by),
                last_updated = VALUES(last_updated)
            "#,
        )
        .bind(CONFIG_ROW_ID)
        .bind(config.auto_approve_managers)
        .bind(config.strict_role_validation)
        .bind(config.mfa_enabled)
        .bind(config.updated_by)
        .bind(config.last_updated)
        .execute(&self.pool)
        .await?;

        self.load().await?.ok_or(StoreError::NotFound)
    }
}

/* =========================
Audit log
========================= */

#[derive(FromRow)]
struct AuditRow {
    id: u64,
    actor_id: u64,
    action: String,
    target_id: String,
    details: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let action = row.action.parse().map_err(|_| corrupt("action", &row.action))?;
        Ok(AuditLogEntry {
            id: row.id,
            actor_id: row.actor_id,
            action,
            target_id: row.target_id,
            details: row.details,
            timestamp: row.created_at,
        })
    }
}

#[async_trait]
impl AuditStore for MySqlStore {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (actor_id, action, target_id, details, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action.as_ref())
        .bind(&entry.target_id)
        .bind(&entry.details)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(AuditLogEntry {
            id: result.last_insert_id(),
            actor_id: entry.actor_id,
            action: entry.action,
            target_id: entry.target_id,
            details: entry.details,
            timestamp: now,
        })
    }

    async fn query(&self, filter: &AuditFilter, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        let mut builder = QueryBuilder::<MySql>::new(
            "SELECT id, actor_id, action, target_id, details, created_at FROM audit_log WHERE 1=1",
        );

        if let Some(actor_id) = filter.actor_id {
            builder.push(" AND actor_id = ").push_bind(actor_id);
        }
        if let Some(action) = filter.action {
            builder.push(" AND action = ").push_bind(action.as_ref().to_string());
        }
        if let Some(target_id) = &filter.target_id {
            builder.push(" AND target_id = ").push_bind(target_id.clone());
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit as u64);

        let rows = builder
            .build_query_as::<AuditRow>()
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }
}

/* =========================
Employee directory
========================= */

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    role_id: u8,
    department: Option<String>,
}

#[async_trait]
impl UserDirectory for MySqlStore {
    async fn lookup(&self, ids: &[u64]) -> StoreResult<HashMap<u64, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder =
            QueryBuilder::<MySql>::new("SELECT id, name, role_id, department FROM users WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut users = HashMap::with_capacity(rows.len());
        for row in rows {
            // Rows with an unknown role behave like deleted users.
            let Some(role) = Role::from_id(row.role_id) else {
                tracing::warn!(user_id = row.id, role_id = row.role_id, "Skipping user with unknown role");
                continue;
            };
            users.insert(
                row.id,
                User {
                    id: row.id,
                    name: row.name,
                    role,
                    department: row.department,
                },
            );
        }
        Ok(users)
    }
}
