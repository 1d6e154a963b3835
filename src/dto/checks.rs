use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Check, Order};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenCheckRequest {
    /// Falls back to the principal's active store when omitted.
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachOrderRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseCheckRequest {
    /// Defaults to zero; must not be negative.
    #[schema(value_type = Option<String>)]
    pub tip: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckWithOrders {
    pub check: Check,
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpenCheckList {
    pub items: Vec<CheckWithOrders>,
}
