use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_entry,
    dto::checks::{
        AttachOrderRequest, CheckWithOrders, CloseCheckRequest, OpenCheckList, OpenCheckRequest,
    },
    entity::{
        check_orders::{
            ActiveModel as CheckOrderActive, Column as CheckOrderCol, Entity as CheckOrders,
        },
        checks::{
            self, ActiveModel as CheckActive, Column as CheckCol, Entity as Checks,
            Model as CheckModel,
        },
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        stores::Column as StoreCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Check, CheckStatus, Order, OrderStatus},
    response::{ApiResponse, Meta},
    scope,
    services::order_service::order_from_entity,
    state::AppState,
};

pub async fn open_check(
    state: &AppState,
    user: &AuthUser,
    payload: OpenCheckRequest,
) -> AppResult<ApiResponse<Check>> {
    let store_id = user.resolve_store_id(payload.store_id)?;

    let txn = state.orm.begin().await?;

    scope::find_store(&txn, user.tenant_id, store_id).await?;
    let number = scope::next_check_number(&txn, store_id).await?;

    let check = CheckActive {
        id: Set(Uuid::new_v4()),
        number: Set(number),
        status: Set(CheckStatus::Open),
        subtotal: Set(Decimal::ZERO),
        tax: Set(Decimal::ZERO),
        tip: Set(Decimal::ZERO),
        total: Set(Decimal::ZERO),
        store_id: Set(store_id),
        waiter_id: Set(user.user_id),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "check_open",
        Some("checks"),
        Some(serde_json::json!({ "check_id": check.id, "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Check opened",
        check_from_entity(check),
        Some(Meta::empty()),
    ))
}

/// All OPEN checks of a store with their attached orders.
pub async fn find_open(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<ApiResponse<OpenCheckList>> {
    user.ensure_store_access(store_id)?;

    let open_checks = Checks::find()
        .filter(CheckCol::StoreId.eq(store_id))
        .filter(CheckCol::Status.eq(CheckStatus::Open))
        .join(JoinType::InnerJoin, checks::Relation::Stores.def())
        .filter(StoreCol::TenantId.eq(user.tenant_id))
        .order_by_asc(CheckCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let check_ids: Vec<Uuid> = open_checks.iter().map(|c| c.id).collect();
    let links = if check_ids.is_empty() {
        Vec::new()
    } else {
        CheckOrders::find()
            .filter(CheckOrderCol::CheckId.is_in(check_ids))
            .all(&state.orm)
            .await?
    };

    let order_ids: Vec<Uuid> = links.iter().map(|l| l.order_id).collect();
    let orders = if order_ids.is_empty() {
        Vec::new()
    } else {
        Orders::find()
            .filter(OrderCol::Id.is_in(order_ids))
            .all(&state.orm)
            .await?
    };
    let mut orders_by_id: HashMap<Uuid, Order> = orders
        .into_iter()
        .map(|o| (o.id, order_from_entity(o)))
        .collect();

    let mut orders_by_check: HashMap<Uuid, Vec<Order>> = HashMap::new();
    for link in links {
        if let Some(order) = orders_by_id.remove(&link.order_id) {
            orders_by_check.entry(link.check_id).or_default().push(order);
        }
    }

    let items = open_checks
        .into_iter()
        .map(|check| {
            let orders = orders_by_check.remove(&check.id).unwrap_or_default();
            CheckWithOrders {
                check: check_from_entity(check),
                orders,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OpenCheckList { items },
        Some(Meta::empty()),
    ))
}

/// Fold an order into a check's running totals.
///
/// The whole read-modify-write runs in one transaction with the check row
/// locked, so concurrent attachments serialize instead of losing updates.
pub async fn attach_order(
    state: &AppState,
    user: &AuthUser,
    check_id: Uuid,
    payload: AttachOrderRequest,
) -> AppResult<ApiResponse<Check>> {
    let order_id = payload.order_id;

    let txn = state.orm.begin().await?;

    let check = scope::find_check_for_update(&txn, user.tenant_id, check_id).await?;
    if check.status != CheckStatus::Open {
        return Err(AppError::InvalidState(
            "orders can only be attached to an open check".into(),
        ));
    }

    // Scoped to the check's own store: an order from a sibling store of the
    // same tenant is a miss, not a cross-store attachment.
    let order = Orders::find()
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::StoreId.eq(check.store_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id}")))?;

    if order.status == OrderStatus::Cancelled {
        return Err(AppError::InvalidState(
            "cancelled orders cannot be attached to a check".into(),
        ));
    }

    // One non-cancelled check per order; the UNIQUE index on
    // check_orders.order_id backs this up under races.
    let already_attached = CheckOrders::find()
        .filter(CheckOrderCol::OrderId.eq(order_id))
        .one(&txn)
        .await?;
    if already_attached.is_some() {
        return Err(AppError::InvalidState(
            "order is already attached to a check".into(),
        ));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    let order_total: Decimal = items.iter().map(|i| i.total_price).sum();

    let store = scope::find_store(&txn, user.tenant_id, check.store_id).await?;

    let subtotal = check.subtotal + order_total;
    let tax = (subtotal * store.tax_rate)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total = subtotal + tax;

    CheckOrderActive {
        id: Set(Uuid::new_v4()),
        check_id: Set(check.id),
        order_id: Set(order.id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut active: CheckActive = check.into();
    active.subtotal = Set(subtotal);
    active.tax = Set(tax);
    active.total = Set(total);
    active.updated_at = Set(Utc::now().into());
    let check = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "check_attach_order",
        Some("checks"),
        Some(serde_json::json!({ "check_id": check.id, "order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order attached",
        check_from_entity(check),
        Some(Meta::empty()),
    ))
}

pub async fn close_check(
    state: &AppState,
    user: &AuthUser,
    check_id: Uuid,
    payload: CloseCheckRequest,
) -> AppResult<ApiResponse<Check>> {
    let tip = payload.tip.unwrap_or(Decimal::ZERO);
    if tip < Decimal::ZERO {
        return Err(AppError::Validation("tip must not be negative".into()));
    }

    let txn = state.orm.begin().await?;

    let check = scope::find_check_for_update(&txn, user.tenant_id, check_id).await?;
    if check.status != CheckStatus::Open {
        return Err(AppError::InvalidState(
            "only an open check can be closed".into(),
        ));
    }

    let total = check.total + tip;
    let mut active: CheckActive = check.into();
    active.tip = Set(tip);
    active.total = Set(total);
    active.status = Set(CheckStatus::Paid);
    active.paid_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let check = active.update(&txn).await?;

    txn.commit().await?;

    let body = check_from_entity(check);

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "check_close",
        Some("checks"),
        Some(serde_json::json!({ "check_id": body.id, "tip": tip })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    state.events.notify(body.store_id, "check.paid", &body);

    Ok(ApiResponse::success("Check paid", body, Some(Meta::empty())))
}

/// Cancel an open check and release its orders so they can be folded into
/// another check.
pub async fn cancel_check(
    state: &AppState,
    user: &AuthUser,
    check_id: Uuid,
) -> AppResult<ApiResponse<Check>> {
    let txn = state.orm.begin().await?;

    let check = scope::find_check_for_update(&txn, user.tenant_id, check_id).await?;
    if check.status != CheckStatus::Open {
        return Err(AppError::InvalidState(
            "only an open check can be cancelled".into(),
        ));
    }

    CheckOrders::delete_many()
        .filter(CheckOrderCol::CheckId.eq(check.id))
        .exec(&txn)
        .await?;

    let mut active: CheckActive = check.into();
    active.status = Set(CheckStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    let check = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "check_cancel",
        Some("checks"),
        Some(serde_json::json!({ "check_id": check.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Check cancelled",
        check_from_entity(check),
        Some(Meta::empty()),
    ))
}

fn check_from_entity(model: CheckModel) -> Check {
    Check {
        id: model.id,
        number: model.number,
        status: model.status,
        subtotal: model.subtotal,
        tax: model.tax,
        tip: model.tip,
        total: model.total,
        store_id: model.store_id,
        waiter_id: model.waiter_id,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
