//! Route handlers. Each one resolves the session's portal and renders JSON.

use super::auth::Bearer;
use super::state::AppState;
use crate::error::AppError;
use crate::portal::{
    CatalogPage, DashboardView, DeviceDetailsView, OrderFormView, OrdersView, PlaceOrder, Placed,
    PortalError, ProfileEdit, ProfileUpdated, ProfileView,
};
use crate::store::Credentials;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use govmobile_core::catalog::CatalogQuery;
use govmobile_core::demo::DEMO_CODE;
use govmobile_core::page::{CONTACT, ContactInfo, NAVIGATION, NavItem, Page, Redirect};
use govmobile_core::status::StatusTab;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

// =============================================================================
// PUBLIC
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub demo: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.live.backend().to_string(),
        demo: state.demo.is_some(),
    })
}

pub async fn contact() -> Json<ContactInfo> {
    Json(CONTACT)
}

pub async fn navigation() -> Json<Vec<NavItem>> {
    Json(NAVIGATION.to_vec())
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryLoginRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DemoLoginRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub redirect: Redirect,
}

impl LoginResponse {
    fn dashboard(token: String) -> Json<Self> {
        Json(Self {
            token,
            redirect: Redirect::to(Page::Dashboard),
        })
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials = Credentials {
        email: body.email,
        secret: body.password,
        full_name: body.full_name,
        trusted: false,
    };
    let session = state.live.login(&credentials).await?;
    Ok(LoginResponse::dashboard(session.token))
}

pub async fn directory_login(
    State(state): State<AppState>,
    Json(body): Json<DirectoryLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = state
        .live
        .directory_login(&state.directory, &body.name)
        .await?;
    Ok(LoginResponse::dashboard(session.token))
}

/// Open a demo session for the exact code, compared in constant time.
pub async fn demo_login(
    State(state): State<AppState>,
    Json(body): Json<DemoLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let demo = state.demo.as_ref().ok_or(AppError::DemoDisabled)?;

    let matches: bool = body.code.as_bytes().ct_eq(DEMO_CODE.as_bytes()).into();
    if !matches {
        tracing::info!("rejected demo code");
        return Err(AppError::InvalidDemoCode);
    }

    let session = demo.login(&Credentials::default()).await?;
    Ok(LoginResponse::dashboard(session.token))
}

pub async fn logout(
    State(state): State<AppState>,
    Bearer(session): Bearer,
) -> Result<StatusCode, AppError> {
    state.portal(&session)?.logout(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PAGES
// =============================================================================

pub async fn dashboard(
    State(state): State<AppState>,
    Bearer(session): Bearer,
) -> Result<Json<DashboardView>, AppError> {
    Ok(Json(state.portal(&session)?.dashboard(&session).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DevicesParams {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

pub async fn devices(
    State(state): State<AppState>,
    Bearer(session): Bearer,
    Query(params): Query<DevicesParams>,
) -> Result<Json<CatalogPage>, AppError> {
    let query = CatalogQuery::parse(
        params.search.as_deref(),
        params.brand.as_deref(),
        params.category.as_deref(),
        params.sort.as_deref(),
    )
    .map_err(PortalError::from)?;
    Ok(Json(state.portal(&session)?.catalog(&session, &query).await?))
}

pub async fn device_details(
    State(state): State<AppState>,
    Bearer(session): Bearer,
    Path(id): Path<String>,
) -> Result<Json<DeviceDetailsView>, AppError> {
    Ok(Json(
        state.portal(&session)?.device_details(&session, &id).await?,
    ))
}

pub async fn order_form(
    State(state): State<AppState>,
    Bearer(session): Bearer,
    Path(id): Path<String>,
) -> Result<Json<OrderFormView>, AppError> {
    Ok(Json(state.portal(&session)?.order_form(&session, &id).await?))
}

pub async fn place_order(
    State(state): State<AppState>,
    Bearer(session): Bearer,
    Json(request): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<Placed>), AppError> {
    let placed = state.portal(&session)?.place_order(&session, &request).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersParams {
    pub status: Option<String>,
}

pub async fn orders(
    State(state): State<AppState>,
    Bearer(session): Bearer,
    Query(params): Query<OrdersParams>,
) -> Result<Json<OrdersView>, AppError> {
    let tab: StatusTab = params
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(PortalError::from)?;
    Ok(Json(state.portal(&session)?.orders(&session, tab).await?))
}

pub async fn profile(
    State(state): State<AppState>,
    Bearer(session): Bearer,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(state.portal(&session)?.profile(&session).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Bearer(session): Bearer,
    Json(edit): Json<ProfileEdit>,
) -> Result<Json<ProfileUpdated>, AppError> {
    Ok(Json(
        state.portal(&session)?.update_profile(&session, &edit).await?,
    ))
}
