use sea_orm::entity::prelude::*;

use crate::models::ModifierType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_modifier_options")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub modifier_group_id: Uuid,
    pub name: String,
    pub modifier_type: ModifierType,
    pub price_delta: Decimal,
    pub sort_order: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_modifier_groups::Entity",
        from = "Column::ModifierGroupId",
        to = "super::product_modifier_groups::Column::Id"
    )]
    ModifierGroups,
}

impl Related<super::product_modifier_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModifierGroups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
