use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_entry,
    dto::orders::{
        AddItemsRequest, CreateOrderRequest, KitchenQueue, OrderItemDetail, OrderItemRequest,
        OrderWithItems, UpdateOrderStatusRequest,
    },
    entity::{
        order_item_modifiers::{
            ActiveModel as ModifierActive, Column as ModifierCol, Entity as OrderItemModifiers,
            Model as ModifierModel,
        },
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders,
            Model as OrderModel,
        },
        stores::Column as StoreCol,
    },
    error::{AppError, AppResult},
    events::PrintReason,
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderItemModifier, OrderStatus},
    pricing::{Catalog, VariantChoice},
    response::{ApiResponse, Meta},
    scope,
    state::AppState,
};

/// Kitchen queue convention: everything a cook still has to look at.
const QUEUE_STATUSES: [OrderStatus; 3] = [
    OrderStatus::Pending,
    OrderStatus::InProgress,
    OrderStatus::Ready,
];

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let store_id = user.resolve_store_id(payload.store_id)?;
    if payload.items.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one item".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    scope::find_store(&txn, user.tenant_id, store_id).await?;
    let catalog = load_catalog_for_items(&txn, store_id, &payload.items).await?;

    let number = scope::next_order_number(&txn, store_id).await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        number: Set(number),
        order_type: Set(payload.order_type),
        status: Set(OrderStatus::Pending),
        table_number: Set(payload.table_number),
        customer_name: Set(payload.customer_name),
        notes: Set(payload.notes),
        store_id: Set(store_id),
        waiter_id: Set(user.user_id),
        started_at: Set(None),
        ready_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let items = insert_items(&txn, &catalog, order.id, &payload.items).await?;

    txn.commit().await?;

    let body = OrderWithItems {
        order: order_from_entity(order),
        items,
    };

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": body.order.id, "store_id": store_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    state.events.notify(store_id, "order.created", &body);
    state.events.request_print(body.order.id, PrintReason::NewOrder);

    Ok(ApiResponse::success("Order created", body, Some(Meta::empty())))
}

pub async fn add_items(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AddItemsRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::Validation("items must not be empty".into()));
    }

    let txn = state.orm.begin().await?;

    let order = scope::find_order_for_update(&txn, user.tenant_id, order_id).await?;

    let order = match order.status {
        OrderStatus::Cancelled => {
            return Err(AppError::InvalidState(
                "cannot add items to a cancelled order".into(),
            ));
        }
        // Reopen: the kitchen must re-acknowledge, so the order goes back
        // to IN_PROGRESS with a fresh started_at. ready_at is kept as
        // service history.
        OrderStatus::Ready | OrderStatus::Completed => {
            let mut active: OrderActive = order.into();
            active.status = Set(OrderStatus::InProgress);
            active.started_at = Set(Some(Utc::now().into()));
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        OrderStatus::Pending | OrderStatus::InProgress => order,
    };

    let catalog = load_catalog_for_items(&txn, order.store_id, &payload.items).await?;
    insert_items(&txn, &catalog, order.id, &payload.items).await?;

    // Respond with the whole order, not just the delta.
    let items = load_item_details(&txn, &[order.id]).await?.remove(&order.id).unwrap_or_default();

    txn.commit().await?;

    let store_id = order.store_id;
    let body = OrderWithItems {
        order: order_from_entity(order),
        items,
    };

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "order_add_items",
        Some("orders"),
        Some(serde_json::json!({ "order_id": body.order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    state.events.notify(store_id, "order.updated", &body);
    state.events.request_print(body.order.id, PrintReason::ItemsAdded);

    Ok(ApiResponse::success("Items added", body, Some(Meta::empty())))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next = payload.status;
    let txn = state.orm.begin().await?;

    let order = scope::find_order_for_update(&txn, user.tenant_id, order_id).await?;
    let current = order.status;

    if !current.can_transition_to(next) {
        return Err(AppError::InvalidState(format!(
            "order cannot go from {current:?} to {next:?}"
        )));
    }

    let order = if current == next {
        // Idempotent re-entry: nothing to restamp.
        order
    } else {
        let mut active: OrderActive = order.into();
        active.status = Set(next);
        match next {
            OrderStatus::InProgress => active.started_at = Set(Some(Utc::now().into())),
            OrderStatus::Ready => active.ready_at = Set(Some(Utc::now().into())),
            _ => {}
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    };

    txn.commit().await?;

    let changed = current != next;
    let body = order_from_entity(order);

    if changed {
        match next {
            OrderStatus::InProgress => state.events.notify(body.store_id, "order.started", &body),
            OrderStatus::Ready => state.events.notify(body.store_id, "order.ready", &body),
            _ => {}
        }
    }

    if let Err(err) = log_entry(
        &state.pool,
        Some(user.tenant_id),
        Some(user.user_id),
        "order_status",
        Some("orders"),
        Some(serde_json::json!({ "order_id": body.id, "status": next })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Status updated", body, Some(Meta::empty())))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = scope::find_order(&state.orm, user.tenant_id, order_id).await?;
    let items = load_item_details(&state.orm, &[order.id])
        .await?
        .remove(&order.id)
        .unwrap_or_default();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// In-flight orders for a store, oldest first, hydrated for the kitchen.
pub async fn kitchen_queue(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<ApiResponse<KitchenQueue>> {
    user.ensure_store_access(store_id)?;

    let orders = Orders::find()
        .filter(OrderCol::StoreId.eq(store_id))
        .filter(OrderCol::Status.is_in(QUEUE_STATUSES))
        .join(JoinType::InnerJoin, orders::Relation::Stores.def())
        .filter(StoreCol::TenantId.eq(user.tenant_id))
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut details = load_item_details(&state.orm, &order_ids).await?;

    let orders = orders
        .into_iter()
        .map(|order| {
            let items = details.remove(&order.id).unwrap_or_default();
            OrderWithItems {
                order: order_from_entity(order),
                items,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        KitchenQueue { orders },
        Some(Meta::empty()),
    ))
}

async fn load_catalog_for_items<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    items: &[OrderItemRequest],
) -> AppResult<Catalog> {
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let catalog = Catalog::load(conn, store_id, &product_ids).await?;

    let missing = catalog.missing_products(&product_ids);
    if !missing.is_empty() {
        let ids = missing
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::NotFound(format!(
            "Products not found in this store: {ids}"
        )));
    }

    Ok(catalog)
}

/// Price and persist a batch of incoming items for an order.
async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    catalog: &Catalog,
    order_id: Uuid,
    items: &[OrderItemRequest],
) -> AppResult<Vec<OrderItemDetail>> {
    let mut details = Vec::with_capacity(items.len());

    for request in items {
        let choices: Vec<VariantChoice> = request
            .selected_variants
            .iter()
            .map(|v| VariantChoice {
                variant_group_id: v.variant_group_id,
                option_id: v.option_id,
            })
            .collect();

        let priced =
            catalog.price_item(request.product_id, &choices, &request.modifier_ids, request.quantity)?;

        let snapshot = serde_json::to_value(&priced.selected_variants)
            .map_err(|e| AppError::Internal(e.into()))?;

        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(request.product_id),
            quantity: Set(request.quantity),
            unit_price: Set(priced.unit_price),
            total_price: Set(priced.total_price),
            notes: Set(request.notes.clone()),
            selected_variants: Set(Some(snapshot)),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;

        let mut modifiers = Vec::with_capacity(priced.modifiers.len());
        for applied in &priced.modifiers {
            let modifier = ModifierActive {
                id: Set(Uuid::new_v4()),
                order_item_id: Set(item.id),
                modifier_id: Set(applied.modifier_id),
                modifier_type: Set(applied.modifier_type),
                price: Set(applied.price),
                created_at: NotSet,
            }
            .insert(conn)
            .await?;
            modifiers.push(modifier_from_entity(modifier));
        }

        details.push(OrderItemDetail {
            item: item_from_entity(item)?,
            modifiers,
        });
    }

    Ok(details)
}

/// Batch-hydrate items and their modifiers for a set of orders: one query
/// per table, grouped in memory.
pub(crate) async fn load_item_details<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<OrderItemDetail>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.to_vec()))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?;

    let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let modifiers = OrderItemModifiers::find()
        .filter(ModifierCol::OrderItemId.is_in(item_ids))
        .all(conn)
        .await?;

    let mut modifiers_by_item: HashMap<Uuid, Vec<OrderItemModifier>> = HashMap::new();
    for modifier in modifiers {
        modifiers_by_item
            .entry(modifier.order_item_id)
            .or_default()
            .push(modifier_from_entity(modifier));
    }

    let mut details: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for item in items {
        let modifiers = modifiers_by_item.remove(&item.id).unwrap_or_default();
        details.entry(item.order_id).or_default().push(OrderItemDetail {
            item: item_from_entity(item)?,
            modifiers,
        });
    }

    Ok(details)
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        number: model.number,
        order_type: model.order_type,
        status: model.status,
        table_number: model.table_number,
        customer_name: model.customer_name,
        notes: model.notes,
        store_id: model.store_id,
        waiter_id: model.waiter_id,
        started_at: model.started_at.map(|dt| dt.with_timezone(&Utc)),
        ready_at: model.ready_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn item_from_entity(model: OrderItemModel) -> AppResult<OrderItem> {
    let selected_variants = match model.selected_variants {
        Some(value) => serde_json::from_value(value).map_err(|e| AppError::Internal(e.into()))?,
        None => Vec::new(),
    };
    Ok(OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
        notes: model.notes,
        selected_variants,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn modifier_from_entity(model: ModifierModel) -> OrderItemModifier {
    OrderItemModifier {
        id: model.id,
        order_item_id: model.order_item_id,
        modifier_id: model.modifier_id,
        modifier_type: model.modifier_type,
        price: model.price,
    }
}
