use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        checks::{AttachOrderRequest, CheckWithOrders, CloseCheckRequest, OpenCheckList, OpenCheckRequest},
        orders::{
            AddItemsRequest, CreateOrderRequest, KitchenQueue, OrderItemDetail, OrderItemRequest,
            OrderWithItems, SelectedVariantRequest, UpdateOrderStatusRequest,
        },
    },
    models::{
        Check, CheckStatus, ModifierType, Order, OrderItem, OrderItemModifier, OrderStatus,
        OrderType, Product, Store, VariantSelection,
    },
    response::{ApiResponse, Meta},
    routes::{checks, health, orders},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::add_items,
        orders::update_status,
        orders::start_order,
        orders::ready_order,
        orders::kitchen_queue,
        orders::kitchen_queue_active_store,
        orders::get_order,
        checks::open_check,
        checks::find_open,
        checks::find_open_active_store,
        checks::attach_order,
        checks::close_check,
        checks::cancel_check
    ),
    components(
        schemas(
            Store,
            Product,
            Order,
            OrderItem,
            OrderItemModifier,
            Check,
            OrderType,
            OrderStatus,
            CheckStatus,
            ModifierType,
            VariantSelection,
            SelectedVariantRequest,
            OrderItemRequest,
            CreateOrderRequest,
            AddItemsRequest,
            UpdateOrderStatusRequest,
            OrderItemDetail,
            OrderWithItems,
            KitchenQueue,
            OpenCheckRequest,
            AttachOrderRequest,
            CloseCheckRequest,
            CheckWithOrders,
            OpenCheckList,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderWithItems>,
            ApiResponse<KitchenQueue>,
            ApiResponse<Check>,
            ApiResponse<OpenCheckList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order lifecycle and kitchen queue"),
        (name = "Checks", description = "Guest check lifecycle"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
