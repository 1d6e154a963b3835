use sea_orm::entity::prelude::*;

use crate::models::ModifierType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_item_modifiers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub modifier_id: Uuid,
    pub modifier_type: ModifierType,
    /// Applied contribution: option delta for ADD, zero for REMOVE.
    pub price: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_items::Entity",
        from = "Column::OrderItemId",
        to = "super::order_items::Column::Id"
    )]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
