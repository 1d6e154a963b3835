use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_variant_options")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub variant_group_id: Uuid,
    pub name: String,
    pub price_delta: Decimal,
    pub sort_order: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_variant_groups::Entity",
        from = "Column::VariantGroupId",
        to = "super::product_variant_groups::Column::Id"
    )]
    VariantGroups,
}

impl Related<super::product_variant_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantGroups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
