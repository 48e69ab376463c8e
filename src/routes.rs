use crate::{
    api::{admin, auth, leave_request, notification, reimbursement},
    auth::middleware::auth_middleware,
    config::Config,
    error::{AppError, ValidationErrors},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Limiter state, built once so every worker shares the same quotas.
pub struct RateLimits {
    protected: LimiterConfig,
    submit: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            protected: build_limiter("RATE_PROTECTED_PER_MIN", config.rate_protected_per_min)?,
            submit: build_limiter("RATE_SUBMIT_PER_MIN", config.rate_submit_per_min)?,
        })
    }
}

fn build_limiter(name: &str, requests_per_min: u32) -> Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("{name} must be greater than zero"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationErrors::single("body", err.to_string())).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationErrors::single("query", err.to_string())).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.app_data(json_config()).app_data(query_config());

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limits.protected)) // rate limiting
            .route("/auth/me", web::get().to(auth::me))
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/config")
                            .route(web::get().to(admin::get_config))
                            .route(web::put().to(admin::update_config)),
                    )
                    .route("/logs", web::get().to(admin::audit_logs)),
            )
            .service(
                web::scope("/leave")
                    // /leave/apply
                    .service(
                        web::resource("/apply")
                            .wrap(Governor::new(&limits.submit))
                            .route(web::post().to(leave_request::apply_leave)),
                    )
                    .route("/all", web::get().to(leave_request::all_leaves))
                    .route("/user/{user_id}", web::get().to(leave_request::user_leaves))
                    .route("/{id}", web::get().to(leave_request::get_leave))
                    .route("/{id}/status", web::put().to(leave_request::update_leave_status)),
            )
            .service(
                web::scope("/reimbursement")
                    // /reimbursement/apply
                    .service(
                        web::resource("/apply")
                            .wrap(Governor::new(&limits.submit))
                            .route(web::post().to(reimbursement::apply_claim)),
                    )
                    .route("/all", web::get().to(reimbursement::all_claims))
                    .route("/user/{user_id}", web::get().to(reimbursement::user_claims))
                    .route("/{id}", web::get().to(reimbursement::get_claim))
                    .route("/{id}/status", web::put().to(reimbursement::update_claim_status)),
            )
            .service(
                web::scope("/notifications")
                    .route("/pending", web::get().to(notification::pending))
                    .route("/mark-seen", web::post().to(notification::mark_seen))
                    .route("/mark-seen-batch", web::post().to(notification::mark_seen_batch)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::sign_token;
    use crate::model::role::Role;
    use crate::model::user::User;
    use crate::models::TokenType;
    use crate::state::{AppState, Backends};
    use crate::store::memory::MemoryDirectory;
    use actix_web::http::{Method, StatusCode};
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    const SECRET: &str = "test-secret";
    const ADMIN: u64 = 1;
    const MANAGER: u64 = 2;
    const EMPLOYEE: u64 = 3;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn test_state(config: &Config) -> web::Data<AppState> {
        let directory = Arc::new(MemoryDirectory::default());
        for (id, name, role) in [
            (ADMIN, "Ada Admin", Role::Admin),
            (MANAGER, "Max Manager", Role::Manager),
            (EMPLOYEE, "Jane Doe", Role::Employee),
        ] {
            directory
                .upsert(User {
                    id,
                    name: name.to_string(),
                    role,
                    department: None,
                })
                .unwrap();
        }
        web::Data::new(AppState::new(Backends::memory(directory), config))
    }

    macro_rules! test_app {
        () => {{
            let config = test_config();
            let state = test_state(&config);
            test_app!(config, state)
        }};
        ($config:expr, $state:expr) => {{
            let config = $config;
            let state = $state;
            let limits = RateLimits::from_config(&config).unwrap();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config.clone()))
                    .app_data(state)
                    .configure(|cfg| configure(cfg, &config, &limits)),
            )
            .await
        }};
    }

    fn token(user_id: u64, role: Role) -> String {
        sign_token(user_id, role.id(), TokenType::Access, SECRET)
    }

    fn call(method: Method, uri: &str, bearer: Option<&str>) -> test::TestRequest {
        let req = test::TestRequest::default()
            .method(method)
            .uri(uri)
            .peer_addr("127.0.0.1:8080".parse().unwrap());
        match bearer {
            Some(t) => req.insert_header(("Authorization", format!("Bearer {t}"))),
            None => req,
        }
    }

    fn leave_body() -> Value {
        json!({
            "leave_type": "annual",
            "from_date": "2026-02-02",
            "to_date": "2026-02-04",
            "reason": "family event"
        })
    }

    #[actix_web::test]
    async fn missing_or_refresh_tokens_are_rejected() {
        let app = test_app!();

        let resp = test::call_service(&app, call(Method::GET, "/api/auth/me", None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let refresh = sign_token(EMPLOYEE, Role::Employee.id(), TokenType::Refresh, SECRET);
        let resp = test::call_service(&app, call(Method::GET, "/api/auth/me", Some(&refresh)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let bad_role = sign_token(EMPLOYEE, 9, TokenType::Access, SECRET);
        let resp = test::call_service(&app, call(Method::GET, "/api/auth/me", Some(&bad_role)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn me_returns_the_principal() {
        let app = test_app!();
        let manager = token(MANAGER, Role::Manager);

        let body: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/auth/me", Some(&manager)).to_request(),
        )
        .await;
        assert_eq!(body, json!({"id": MANAGER, "role": "Manager"}));
    }

    #[actix_web::test]
    async fn leave_lifecycle_over_http() {
        let app = test_app!();
        let employee = token(EMPLOYEE, Role::Employee);
        let manager = token(MANAGER, Role::Manager);
        let admin = token(ADMIN, Role::Admin);

        let resp = test::call_service(
            &app,
            call(Method::POST, "/api/leave/apply", Some(&employee))
                .set_json(leave_body())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let leave: Value = test::read_body_json(resp).await;
        assert_eq!(leave["status"], "Pending");
        let id = leave["id"].as_u64().unwrap();
        let status_uri = format!("/api/leave/{id}/status");

        let body: Value = test::call_and_read_body_json(
            &app,
            call(Method::PUT, &status_uri, Some(&manager))
                .set_json(json!({"status": "Rejected", "reason": "insufficient coverage"}))
                .to_request(),
        )
        .await;
        assert_eq!(body["message"], "Leave Rejected");
        assert_eq!(body["leave"]["admin_reason"], "insufficient coverage");

        let resp = test::call_service(
            &app,
            call(Method::PUT, &status_uri, Some(&manager))
                .set_json(json!({"status": "Approved"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: Value = test::call_and_read_body_json(
            &app,
            call(Method::PUT, &status_uri, Some(&admin))
                .set_json(json!({"status": "Approved", "reason": "override"}))
                .to_request(),
        )
        .await;
        assert_eq!(body["message"], "Leave Approved");
        assert_eq!(body["leave"]["updated_by"], ADMIN);

        let history: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, &format!("/api/leave/user/{EMPLOYEE}"), Some(&employee)).to_request(),
        )
        .await;
        assert_eq!(history[0]["status"], "Approved");
        assert_eq!(history[0]["applicant"]["name"], "Jane Doe");
    }

    #[actix_web::test]
    async fn employees_cannot_list_everything() {
        let app = test_app!();
        let employee = token(EMPLOYEE, Role::Employee);

        for uri in ["/api/leave/all", "/api/reimbursement/all", "/api/admin/logs"] {
            let resp = test::call_service(&app, call(Method::GET, uri, Some(&employee)).to_request()).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[actix_web::test]
    async fn invalid_payloads_are_bad_requests() {
        let app = test_app!();
        let employee = token(EMPLOYEE, Role::Employee);

        let resp = test::call_service(
            &app,
            call(Method::POST, "/api/reimbursement/apply", Some(&employee))
                .set_json(json!({"title": "Taxi", "amount": -5, "proof": "../etc/passwd.pdf"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["amount", "proof"]);

        let resp = test::call_service(
            &app,
            call(Method::POST, "/api/leave/apply", Some(&employee))
                .insert_header(("Content-Type", "application/json"))
                .set_payload("{not json")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn claim_decision_notifies_owner_only() {
        let app = test_app!();
        let employee = token(EMPLOYEE, Role::Employee);
        let manager = token(MANAGER, Role::Manager);
        let peer = token(42, Role::Employee);

        let claim: Value = test::call_and_read_body_json(
            &app,
            call(Method::POST, "/api/reimbursement/apply", Some(&employee))
                .set_json(json!({"title": "Taxi", "amount": 500, "proof": "uploads/receipt.pdf"}))
                .to_request(),
        )
        .await;
        let id = claim["id"].as_u64().unwrap();

        let body: Value = test::call_and_read_body_json(
            &app,
            call(Method::PUT, &format!("/api/reimbursement/{id}/status"), Some(&manager))
                .set_json(json!({"status": "Approved", "reason": "ok"}))
                .to_request(),
        )
        .await;
        assert_eq!(body["message"], "Claim Approved successfully");

        let body: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/notifications/pending", Some(&employee)).to_request(),
        )
        .await;
        assert_eq!(body["updates"][0]["category"], "Expense");
        assert_eq!(body["updates"][0]["label"], "Taxi | 500");
        let version = body["updates"][0]["version"].clone();
        assert_eq!(version, 1);

        let resp = test::call_service(
            &app,
            call(Method::POST, "/api/notifications/mark-seen", Some(&peer))
                .set_json(json!({"id": id, "category": "Expense"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            call(Method::POST, "/api/notifications/mark-seen", Some(&employee))
                .set_json(json!({"id": id, "category": "Expense", "version": version}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/notifications/pending", Some(&employee)).to_request(),
        )
        .await;
        assert_eq!(body["updates"], json!([]));
    }

    #[actix_web::test]
    async fn config_updates_are_admin_only_and_audited() {
        let app = test_app!();
        let manager = token(MANAGER, Role::Manager);
        let admin = token(ADMIN, Role::Admin);

        let config: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/admin/config", Some(&manager)).to_request(),
        )
        .await;
        assert_eq!(config["auto_approve_managers"], false);
        assert_eq!(config["strict_role_validation"], true);

        let resp = test::call_service(
            &app,
            call(Method::PUT, "/api/admin/config", Some(&manager))
                .set_json(json!({"auto_approve_managers": true}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let updated: Value = test::call_and_read_body_json(
            &app,
            call(Method::PUT, "/api/admin/config", Some(&admin))
                .set_json(json!({"auto_approve_managers": true}))
                .to_request(),
        )
        .await;
        assert_eq!(updated["auto_approve_managers"], true);
        assert_eq!(updated["updated_by"], ADMIN);

        let leave: Value = test::call_and_read_body_json(
            &app,
            call(Method::POST, "/api/leave/apply", Some(&manager))
                .set_json(leave_body())
                .to_request(),
        )
        .await;
        assert_eq!(leave["status"], "Approved");

        let logs: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/admin/logs?action=CONFIG_UPDATED&limit=5", Some(&admin)).to_request(),
        )
        .await;
        assert_eq!(logs.as_array().unwrap().len(), 1);
        assert_eq!(logs[0]["details"], "auto_approve_managers=true");
    }

    #[actix_web::test]
    async fn unknown_request_is_not_found() {
        let app = test_app!();
        let admin = token(ADMIN, Role::Admin);

        let resp = test::call_service(&app, call(Method::GET, "/api/leave/999", Some(&admin)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn default_memory_backend_hides_admin_leave_from_managers() {
        let config = test_config();
        assert!(config.database_url.is_none());
        let backends = Backends::from_config(&config).await.unwrap();
        let state = web::Data::new(AppState::new(backends, &config));
        let app = test_app!(config, state);

        let admin = token(ADMIN, Role::Admin);
        let manager = token(MANAGER, Role::Manager);

        let leave: Value = test::call_and_read_body_json(
            &app,
            call(Method::POST, "/api/leave/apply", Some(&admin))
                .set_json(leave_body())
                .to_request(),
        )
        .await;
        assert_eq!(leave["status"], "Approved");
        assert_eq!(leave["owner_role"], "Admin");

        let seen: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/leave/all", Some(&manager)).to_request(),
        )
        .await;
        assert_eq!(seen.as_array().unwrap().len(), 0);

        let all: Value = test::call_and_read_body_json(
            &app,
            call(Method::GET, "/api/leave/all", Some(&admin)).to_request(),
        )
        .await;
        assert_eq!(all.as_array().unwrap().len(), 1);
        assert_eq!(all[0]["applicant"]["name"], "System User");
    }

    #[actix_web::test]
    async fn overlong_text_is_a_bad_request() {
        let app = test_app!();
        let employee = token(EMPLOYEE, Role::Employee);
        let manager = token(MANAGER, Role::Manager);

        let resp = test::call_service(
            &app,
            call(Method::POST, "/api/reimbursement/apply", Some(&employee))
                .set_json(json!({"title": "t".repeat(256), "amount": 12}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["fields"][0]["field"], "title");

        let leave: Value = test::call_and_read_body_json(
            &app,
            call(Method::POST, "/api/leave/apply", Some(&employee))
                .set_json(leave_body())
                .to_request(),
        )
        .await;
        let id = leave["id"].as_u64().unwrap();

        let resp = test::call_service(
            &app,
            call(Method::PUT, &format!("/api/leave/{id}/status"), Some(&manager))
                .set_json(json!({"status": "Rejected", "reason": "r".repeat(1025)}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["fields"][0]["field"], "reason");
    }
}
