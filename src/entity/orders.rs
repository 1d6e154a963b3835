use sea_orm::entity::prelude::*;

use crate::models::{OrderStatus, OrderType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    /// Unique within the owning store (see store_counters).
    pub number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub store_id: Uuid,
    pub waiter_id: Uuid,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub ready_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stores::Entity",
        from = "Column::StoreId",
        to = "super::stores::Column::Id"
    )]
    Stores,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::WaiterId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::check_orders::Entity")]
    CheckOrders,
}

impl Related<super::stores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stores.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::check_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
