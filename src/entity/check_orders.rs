use sea_orm::entity::prelude::*;

// Join recording that an order has been folded into a check's total.
// order_id carries a UNIQUE index: an order belongs to at most one
// non-cancelled check (cancelling a check deletes its join rows).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "check_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub check_id: Uuid,
    pub order_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checks::Entity",
        from = "Column::CheckId",
        to = "super::checks::Column::Id"
    )]
    Checks,
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
}

impl Related<super::checks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checks.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
