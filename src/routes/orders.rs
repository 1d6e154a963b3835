use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        AddItemsRequest, CreateOrderRequest, KitchenQueue, OrderWithItems, UpdateOrderStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderStatus},
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/kitchen", get(kitchen_queue_active_store))
        .route("/kitchen/{store_id}", get(kitchen_queue))
        .route("/{id}", get(get_order))
        .route("/{id}/items", post(add_items))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/start", patch(start_order))
        .route("/{id}/ready", patch(ready_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Create a new order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Store or product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddItemsRequest,
    responses(
        (status = 200, description = "Add items to an existing order", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn add_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemsRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::add_items(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not permitted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/start",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Mark order as IN_PROGRESS", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not permitted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn start_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let payload = UpdateOrderStatusRequest {
        status: OrderStatus::InProgress,
    };
    let resp = order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/ready",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Mark order as READY", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not permitted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn ready_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let payload = UpdateOrderStatusRequest {
        status: OrderStatus::Ready,
    };
    let resp = order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/kitchen/{store_id}",
    params(("store_id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Kitchen queue for a store", body = ApiResponse<KitchenQueue>),
        (status = 403, description = "Store not assigned to caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn kitchen_queue(
    State(state): State<AppState>,
    user: AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<KitchenQueue>>> {
    let resp = order_service::kitchen_queue(&state, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/kitchen",
    responses(
        (status = 200, description = "Kitchen queue for the caller's active store", body = ApiResponse<KitchenQueue>),
        (status = 400, description = "No active store in token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn kitchen_queue_active_store(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<KitchenQueue>>> {
    let store_id = user.resolve_store_id(None)?;
    let resp = order_service::kitchen_queue(&state, &user, store_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Get an order with items and modifiers", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}
