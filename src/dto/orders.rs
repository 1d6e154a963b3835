use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderItemModifier, OrderStatus, OrderType};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SelectedVariantRequest {
    pub variant_group_id: Uuid,
    pub option_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub selected_variants: Vec<SelectedVariantRequest>,
    #[serde(default)]
    pub modifier_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Falls back to the principal's active store when omitted.
    pub store_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemsRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub modifiers: Vec<OrderItemModifier>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct KitchenQueue {
    pub orders: Vec<OrderWithItems>,
}
