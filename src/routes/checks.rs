use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::checks::{AttachOrderRequest, CloseCheckRequest, OpenCheckList, OpenCheckRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Check,
    response::ApiResponse,
    services::check_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_check))
        .route("/open", get(find_open_active_store))
        .route("/open/{store_id}", get(find_open))
        .route("/{id}/add-order", post(attach_order))
        .route("/{id}/close", post(close_check))
        .route("/{id}/cancel", post(cancel_check))
}

#[utoipa::path(
    post,
    path = "/api/checks",
    request_body = OpenCheckRequest,
    responses(
        (status = 200, description = "Open a new check", body = ApiResponse<Check>),
        (status = 400, description = "No store id available"),
        (status = 404, description = "Store not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checks"
)]
pub async fn open_check(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OpenCheckRequest>,
) -> AppResult<Json<ApiResponse<Check>>> {
    let resp = check_service::open_check(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checks/open/{store_id}",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Open checks with attached orders", body = ApiResponse<OpenCheckList>),
        (status = 403, description = "Store not assigned to caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checks"
)]
pub async fn find_open(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OpenCheckList>>> {
    let resp = check_service::find_open(&state, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checks/open",
    responses(
        (status = 200, description = "Open checks for the caller's active store", body = ApiResponse<OpenCheckList>),
        (status = 400, description = "No active store in token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checks"
)]
pub async fn find_open_active_store(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OpenCheckList>>> {
    let store_id = user.resolve_store_id(None)?;
    let resp = check_service::find_open(&state, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checks/{id}/add-order",
    params(("id" = Uuid, Path, description = "Check ID")),
    request_body = AttachOrderRequest,
    responses(
        (status = 200, description = "Attach an order and recompute totals", body = ApiResponse<Check>),
        (status = 404, description = "Check or order not found"),
        (status = 409, description = "Check not open or order already attached"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checks"
)]
pub async fn attach_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachOrderRequest>,
) -> AppResult<Json<ApiResponse<Check>>> {
    let resp = check_service::attach_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checks/{id}/close",
    params(("id" = Uuid, Path, description = "Check ID")),
    request_body = CloseCheckRequest,
    responses(
        (status = 200, description = "Close a check and record payment", body = ApiResponse<Check>),
        (status = 400, description = "Negative tip"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Check is not open"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checks"
)]
pub async fn close_check(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseCheckRequest>,
) -> AppResult<Json<ApiResponse<Check>>> {
    let resp = check_service::close_check(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checks/{id}/cancel",
    params(("id" = Uuid, Path, description = "Check ID")),
    responses(
        (status = 200, description = "Cancel an open check and release its orders", body = ApiResponse<Check>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Check is not open"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checks"
)]
pub async fn cancel_check(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Check>>> {
    let resp = check_service::cancel_check(&state, &user, id).await?;
    Ok(Json(resp))
}
