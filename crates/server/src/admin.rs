//! Admin surface: session login plus CRUD over configurations and catalog
//! tables. The wizard never calls anything here; status and catalog edits
//! happen out-of-band after submission.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use portico_core::domain::catalog::{CatalogItem, CatalogItemId, CatalogKind, ProductLine};
use portico_core::domain::configuration::ConfigurationId;
use portico_db::repositories::{CatalogRepository, ConfigurationRepository};
use portico_db::DbPool;

#[derive(Clone)]
pub struct AdminState {
    pub db_pool: DbPool,
    pub catalog: Arc<dyn CatalogRepository>,
    pub configurations: Arc<dyn ConfigurationRepository>,
    pub password: Option<SecretString>,
    pub session_ttl_secs: u64,
}

#[derive(Debug, Serialize)]
struct AdminError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

#[derive(Debug, Deserialize)]
struct CatalogItemPayload {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    price_modifier: Option<Decimal>,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    display_order: Option<i64>,
}

fn default_active() -> bool {
    true
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/configurations/{line}", get(list_configurations))
        .route(
            "/api/admin/configurations/{line}/{id}",
            get(get_configuration).patch(update_configuration_status).delete(delete_configuration),
        )
        .route("/api/admin/catalog/{line}/{kind}", get(list_catalog).post(create_catalog_item))
        .route(
            "/api/admin/catalog/{line}/{kind}/{id}",
            put(update_catalog_item).delete(delete_catalog_item),
        )
        .with_state(state)
}

pub async fn issue_session(state: &AdminState) -> Result<SessionGrant, sqlx::Error> {
    let token = Uuid::new_v4().to_string();
    let now = Utc::now();
    let expires_at = now + Duration::seconds(state.session_ttl_secs as i64);

    // Opportunistic cleanup keeps the table from accumulating stale rows.
    sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
        .bind(now.to_rfc3339())
        .execute(&state.db_pool)
        .await?;

    sqlx::query("INSERT INTO admin_sessions (token, created_at, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&state.db_pool)
        .await?;

    Ok(SessionGrant { token, expires_at: expires_at.to_rfc3339() })
}

pub async fn token_is_valid(pool: &DbPool, token: &str) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM admin_sessions WHERE token = ? AND expires_at > ?",
    )
    .bind(token)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

async fn authorize(state: &AdminState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let Some(token) = token else {
        return Err(unauthorized("missing bearer token"));
    };

    match token_is_valid(&state.db_pool, token).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(unauthorized("invalid or expired session")),
        Err(err) => {
            error!(
                event_name = "admin.session.check_failed",
                error = %err,
                "session lookup failed"
            );
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(AdminError { error: "session store is unavailable".to_string() }),
            )
                .into_response())
        }
    }
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(AdminError { error: reason.to_string() })).into_response()
}

fn parse_line(raw: &str) -> Result<ProductLine, Response> {
    ProductLine::parse(raw).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(AdminError { error: format!("unknown product line `{raw}`") }),
        )
            .into_response()
    })
}

fn parse_kind(raw: &str) -> Result<CatalogKind, Response> {
    CatalogKind::parse(raw).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(AdminError { error: format!("unknown catalog kind `{raw}`") }),
        )
            .into_response()
    })
}

fn repository_failure(context: &'static str, err: impl std::fmt::Display) -> Response {
    error!(event_name = "admin.repository.failed", context, error = %err, "admin operation failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(AdminError { error: "the backend is temporarily unavailable".to_string() }),
    )
        .into_response()
}

async fn login(State(state): State<AdminState>, Json(request): Json<LoginRequest>) -> Response {
    let Some(expected) = &state.password else {
        warn!(
            event_name = "admin.login.unconfigured",
            "admin login attempted but no password is configured"
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(AdminError { error: "admin login is not configured".to_string() }),
        )
            .into_response();
    };

    if request.password != expected.expose_secret() {
        warn!(event_name = "admin.login.rejected", "admin login rejected");
        return unauthorized("wrong password");
    }

    match issue_session(&state).await {
        Ok(grant) => {
            info!(event_name = "admin.login.accepted", "admin session issued");
            (StatusCode::OK, Json(grant)).into_response()
        }
        Err(err) => repository_failure("issue_session", err),
    }
}

async fn list_configurations(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path(line_raw): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };

    match state.configurations.list(product_line).await {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(err) => repository_failure("list_configurations", err),
    }
}

async fn get_configuration(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, id)): Path<(String, String)>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };

    match state.configurations.find_by_id(product_line, &ConfigurationId(id)).await {
        Ok(Some(row)) => (StatusCode::OK, Json(row)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => repository_failure("get_configuration", err),
    }
}

async fn update_configuration_status(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, id)): Path<(String, String)>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };

    if update.status.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AdminError { error: "status must not be empty".to_string() }),
        )
            .into_response();
    }

    match state
        .configurations
        .update_status(product_line, &ConfigurationId(id), update.status.trim())
        .await
    {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => repository_failure("update_configuration_status", err),
    }
}

async fn delete_configuration(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, id)): Path<(String, String)>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };

    match state.configurations.delete(product_line, &ConfigurationId(id)).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => repository_failure("delete_configuration", err),
    }
}

async fn list_catalog(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, kind_raw)): Path<(String, String)>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };
    let kind = match parse_kind(&kind_raw) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state.catalog.list_all(product_line, kind).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => repository_failure("list_catalog", err),
    }
}

async fn create_catalog_item(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, kind_raw)): Path<(String, String)>,
    Json(payload): Json<CatalogItemPayload>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };
    let kind = match parse_kind(&kind_raw) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let item = item_from_payload(payload, None);
    match state.catalog.save(product_line, kind, item.clone()).await {
        Ok(()) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => repository_failure("create_catalog_item", err),
    }
}

async fn update_catalog_item(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, kind_raw, id)): Path<(String, String, String)>,
    Json(payload): Json<CatalogItemPayload>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };
    let kind = match parse_kind(&kind_raw) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let item = item_from_payload(payload, Some(id));
    match state.catalog.save(product_line, kind, item.clone()).await {
        Ok(()) => (StatusCode::OK, Json(item)).into_response(),
        Err(err) => repository_failure("update_catalog_item", err),
    }
}

async fn delete_catalog_item(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path((line_raw, kind_raw, id)): Path<(String, String, String)>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let product_line = match parse_line(&line_raw) {
        Ok(line) => line,
        Err(response) => return response,
    };
    let kind = match parse_kind(&kind_raw) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state.catalog.delete(product_line, kind, &CatalogItemId(id)).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => repository_failure("delete_catalog_item", err),
    }
}

fn item_from_payload(payload: CatalogItemPayload, id_override: Option<String>) -> CatalogItem {
    let id = id_override
        .or(payload.id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    CatalogItem {
        id: CatalogItemId(id),
        name: payload.name,
        description: payload.description,
        image_url: payload.image_url,
        price_modifier: payload.price_modifier.unwrap_or(Decimal::ZERO),
        active: payload.active,
        display_order: payload.display_order,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use axum::Json;
    use chrono::Utc;

    use portico_db::repositories::{
        ConfigurationRepository, InMemoryCatalogRepository, InMemoryConfigurationRepository,
    };
    use portico_db::{connect_with_settings, migrations, DbPool};

    use super::{
        issue_session, login, token_is_valid, update_configuration_status, AdminState,
        LoginRequest, StatusUpdate,
    };

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn state(pool: DbPool, password: Option<&str>) -> AdminState {
        AdminState {
            db_pool: pool,
            catalog: Arc::new(InMemoryCatalogRepository::default()),
            configurations: Arc::new(InMemoryConfigurationRepository::default()),
            password: password.map(|value| value.to_string().into()),
            session_ttl_secs: 3_600,
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers
    }

    #[tokio::test]
    async fn login_is_refused_when_no_password_is_configured() {
        let pool = setup_pool().await;
        let response = login(
            State(state(pool.clone(), None)),
            Json(LoginRequest { password: "anything".to_string() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        pool.close().await;
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let pool = setup_pool().await;
        let response = login(
            State(state(pool.clone(), Some("correct-horse"))),
            Json(LoginRequest { password: "wrong".to_string() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        pool.close().await;
    }

    #[tokio::test]
    async fn issued_sessions_validate_until_expiry() {
        let pool = setup_pool().await;
        let admin = state(pool.clone(), Some("correct-horse"));

        let grant = issue_session(&admin).await.expect("issue session");
        assert!(token_is_valid(&pool, &grant.token).await.expect("check token"));
        assert!(!token_is_valid(&pool, "forged-token").await.expect("check forged"));

        // An expired row no longer authorizes.
        sqlx::query("UPDATE admin_sessions SET expires_at = ? WHERE token = ?")
            .bind((Utc::now() - chrono::Duration::seconds(5)).to_rfc3339())
            .bind(&grant.token)
            .execute(&pool)
            .await
            .expect("expire session");
        assert!(!token_is_valid(&pool, &grant.token).await.expect("check expired"));

        pool.close().await;
    }

    #[tokio::test]
    async fn status_update_requires_a_valid_session() {
        let pool = setup_pool().await;
        let admin = state(pool.clone(), Some("correct-horse"));

        let response = update_configuration_status(
            State(admin.clone()),
            bearer("forged-token"),
            Path(("wood".to_string(), "cfg-1".to_string())),
            Json(StatusUpdate { status: "in_progress".to_string() }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        pool.close().await;
    }

    #[tokio::test]
    async fn status_update_happy_path_returns_no_content() {
        let pool = setup_pool().await;
        let configurations = Arc::new(InMemoryConfigurationRepository::default());
        let admin = AdminState {
            configurations: configurations.clone(),
            ..state(pool.clone(), Some("correct-horse"))
        };

        let record = portico_core::domain::configuration::StoredConfiguration::Wood(
            portico_core::domain::configuration::WoodRecord {
                structure_type_id: "st-1".to_string(),
                model_id: "m-1".to_string(),
                coverage_id: "c-1".to_string(),
                color_id: "col-1".to_string(),
                surface_id: "s-1".to_string(),
                package_id: None,
                dimensions: portico_core::domain::configuration::Dimensions {
                    width_cm: rust_decimal::Decimal::from(300),
                    depth_cm: rust_decimal::Decimal::from(400),
                    height_cm: rust_decimal::Decimal::from(250),
                },
                customer: portico_core::domain::configuration::CustomerContact {
                    name: "Gaia Demetz".to_string(),
                    email: "gaia@example.com".to_string(),
                    phone: "+39 339 0001112".to_string(),
                    address: "Via Rezia 14".to_string(),
                    city: "Ortisei".to_string(),
                    postal_code: "39046".to_string(),
                    province: None,
                },
                contact_preference:
                    portico_core::domain::configuration::ContactPreference::Email,
                total_price: rust_decimal::Decimal::from(7_000),
                notes: None,
            },
        );
        let id = configurations.insert(&record).await.expect("seed row");

        let grant = issue_session(&admin).await.expect("issue session");
        let response = update_configuration_status(
            State(admin),
            bearer(&grant.token),
            Path(("wood".to_string(), id.0.clone())),
            Json(StatusUpdate { status: "in_progress".to_string() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        pool.close().await;
    }
}
