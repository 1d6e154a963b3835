use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{
        product_modifier_groups::{Column as ModGroupCol, Entity as ProductModifierGroups},
        product_modifier_options::{
            Column as ModOptCol, Entity as ProductModifierOptions, Model as ModifierOptionModel,
        },
        product_variant_groups::{
            Column as VarGroupCol, Entity as ProductVariantGroups, Model as VariantGroupModel,
        },
        product_variant_options::{
            Column as VarOptCol, Entity as ProductVariantOptions, Model as VariantOptionModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{ModifierType, VariantSelection},
};

/// One variant choice in an incoming item: which group, which option.
#[derive(Debug, Clone, Copy)]
pub struct VariantChoice {
    pub variant_group_id: Uuid,
    pub option_id: Uuid,
}

/// A modifier as it will be recorded on the order item. REMOVE modifiers
/// carry a zero price but are kept for kitchen prep.
#[derive(Debug, Clone)]
pub struct AppliedModifier {
    pub modifier_id: Uuid,
    pub modifier_type: ModifierType,
    pub price: Decimal,
}

/// Fully priced line item, ready to persist.
#[derive(Debug)]
pub struct PricedItem {
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub selected_variants: Vec<VariantSelection>,
    pub modifiers: Vec<AppliedModifier>,
}

struct CatalogVariantGroup {
    group: VariantGroupModel,
    options: HashMap<Uuid, VariantOptionModel>,
}

struct CatalogProduct {
    product: ProductModel,
    variant_groups: HashMap<Uuid, CatalogVariantGroup>,
    // modifier option id -> option; ownership via the group's product_id
    // is resolved at load time, so membership here implies ownership.
    modifier_options: HashMap<Uuid, ModifierOptionModel>,
}

/// In-memory snapshot of the catalog rows a request needs, batch-loaded
/// once so pricing N items never goes back to the database. Products are
/// filtered by store at load time, so membership implies store ownership.
pub struct Catalog {
    products: HashMap<Uuid, CatalogProduct>,
}

impl Catalog {
    /// Batch-load the given products of one store together with their
    /// variant and modifier structure.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        store_id: Uuid,
        product_ids: &[Uuid],
    ) -> AppResult<Catalog> {
        let unique_ids: Vec<Uuid> = product_ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let products = Products::find()
            .filter(ProdCol::StoreId.eq(store_id))
            .filter(ProdCol::Id.is_in(unique_ids.clone()))
            .all(conn)
            .await?;

        let loaded_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

        let variant_groups = ProductVariantGroups::find()
            .filter(VarGroupCol::ProductId.is_in(loaded_ids.clone()))
            .all(conn)
            .await?;
        let variant_group_ids: Vec<Uuid> = variant_groups.iter().map(|g| g.id).collect();
        let variant_options = ProductVariantOptions::find()
            .filter(VarOptCol::VariantGroupId.is_in(variant_group_ids))
            .all(conn)
            .await?;

        let modifier_groups = ProductModifierGroups::find()
            .filter(ModGroupCol::ProductId.is_in(loaded_ids.clone()))
            .all(conn)
            .await?;
        let modifier_group_ids: Vec<Uuid> = modifier_groups.iter().map(|g| g.id).collect();
        let modifier_options = ProductModifierOptions::find()
            .filter(ModOptCol::ModifierGroupId.is_in(modifier_group_ids))
            .all(conn)
            .await?;

        let mut catalog = Catalog::from_rows(products, variant_groups, variant_options);
        catalog.attach_modifiers(modifier_groups_by_product(&modifier_groups), modifier_options);
        Ok(catalog)
    }

    /// Assemble a catalog from already-loaded rows. Pure; this is also the
    /// entry point unit tests use.
    pub fn from_rows(
        products: Vec<ProductModel>,
        variant_groups: Vec<VariantGroupModel>,
        variant_options: Vec<VariantOptionModel>,
    ) -> Catalog {
        let mut options_by_group: HashMap<Uuid, Vec<VariantOptionModel>> = HashMap::new();
        for option in variant_options {
            options_by_group
                .entry(option.variant_group_id)
                .or_default()
                .push(option);
        }

        let mut groups_by_product: HashMap<Uuid, Vec<VariantGroupModel>> = HashMap::new();
        for group in variant_groups {
            groups_by_product
                .entry(group.product_id)
                .or_default()
                .push(group);
        }

        let products = products
            .into_iter()
            .map(|product| {
                let variant_groups = groups_by_product
                    .remove(&product.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|group| {
                        let options = options_by_group
                            .remove(&group.id)
                            .unwrap_or_default()
                            .into_iter()
                            .map(|o| (o.id, o))
                            .collect();
                        (group.id, CatalogVariantGroup { group, options })
                    })
                    .collect();
                (
                    product.id,
                    CatalogProduct {
                        product,
                        variant_groups,
                        modifier_options: HashMap::new(),
                    },
                )
            })
            .collect();

        Catalog { products }
    }

    /// Attach modifier options, resolving each option's owning product
    /// through its group.
    pub fn attach_modifiers(
        &mut self,
        group_to_product: HashMap<Uuid, Uuid>,
        options: Vec<ModifierOptionModel>,
    ) {
        for option in options {
            let Some(product_id) = group_to_product.get(&option.modifier_group_id) else {
                continue;
            };
            if let Some(entry) = self.products.get_mut(product_id) {
                entry.modifier_options.insert(option.id, option);
            }
        }
    }

    /// Ids from `wanted` that this catalog could not resolve in the store.
    pub fn missing_products(&self, wanted: &[Uuid]) -> Vec<Uuid> {
        wanted
            .iter()
            .copied()
            .filter(|id| !self.products.contains_key(id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect()
    }

    /// Compute a line item's effective prices and snapshots.
    ///
    /// unit_price = base_price + Σ variant deltas + Σ ADD modifier deltas;
    /// total_price = unit_price × quantity. Pure over the loaded rows.
    pub fn price_item(
        &self,
        product_id: Uuid,
        selected_variants: &[VariantChoice],
        modifier_ids: &[Uuid],
        quantity: i32,
    ) -> AppResult<PricedItem> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "quantity must be a positive integer".into(),
            ));
        }

        let entry = self
            .products
            .get(&product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;

        let mut unit_price = entry.product.base_price;
        let mut snapshot = Vec::with_capacity(selected_variants.len());
        let mut seen_groups: HashSet<Uuid> = HashSet::new();

        for choice in selected_variants {
            let group = entry
                .variant_groups
                .get(&choice.variant_group_id)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "variant group {} does not belong to product {}",
                        choice.variant_group_id, product_id
                    ))
                })?;
            let option = group.options.get(&choice.option_id).ok_or_else(|| {
                AppError::Validation(format!(
                    "variant option {} does not belong to variant group {}",
                    choice.option_id, choice.variant_group_id
                ))
            })?;
            // Variants are mutually exclusive within a group.
            if !seen_groups.insert(group.group.id) {
                return Err(AppError::Validation(format!(
                    "variant group {} selected more than once",
                    group.group.id
                )));
            }

            unit_price += option.price_delta;
            snapshot.push(VariantSelection {
                variant_group_id: group.group.id,
                option_id: option.id,
                name: option.name.clone(),
                price_delta: option.price_delta,
            });
        }

        let mut modifiers = Vec::with_capacity(modifier_ids.len());
        for modifier_id in modifier_ids {
            let option = entry.modifier_options.get(modifier_id).ok_or_else(|| {
                AppError::Validation(format!(
                    "modifier option {} does not belong to product {}",
                    modifier_id, product_id
                ))
            })?;
            let applied_price = match option.modifier_type {
                ModifierType::Add => option.price_delta,
                ModifierType::Remove => Decimal::ZERO,
            };
            unit_price += applied_price;
            modifiers.push(AppliedModifier {
                modifier_id: option.id,
                modifier_type: option.modifier_type,
                price: applied_price,
            });
        }

        let total_price = unit_price * Decimal::from(quantity);

        Ok(PricedItem {
            unit_price,
            total_price,
            selected_variants: snapshot,
            modifiers,
        })
    }
}

fn modifier_groups_by_product(
    groups: &[crate::entity::product_modifier_groups::Model],
) -> HashMap<Uuid, Uuid> {
    groups.iter().map(|g| (g.id, g.product_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{
        product_modifier_options::Model as ModifierOptionModel,
        product_variant_groups::Model as VariantGroupModel,
        product_variant_options::Model as VariantOptionModel, products::Model as ProductModel,
    };
    use chrono::Utc;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    struct Fixture {
        catalog: Catalog,
        product_id: Uuid,
        size_group_id: Uuid,
        large_option_id: Uuid,
        small_option_id: Uuid,
        extra_cheese_id: Uuid,
        no_onions_id: Uuid,
    }

    fn fixture() -> Fixture {
        let now = Utc::now().into();
        let store_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let size_group_id = Uuid::new_v4();
        let large_option_id = Uuid::new_v4();
        let small_option_id = Uuid::new_v4();
        let modifier_group_id = Uuid::new_v4();
        let extra_cheese_id = Uuid::new_v4();
        let no_onions_id = Uuid::new_v4();

        let product = ProductModel {
            id: product_id,
            store_id,
            name: "Burger".into(),
            description: None,
            base_price: d("10.00"),
            is_active: true,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        let size_group = VariantGroupModel {
            id: size_group_id,
            product_id,
            name: "Size".into(),
            sort_order: 0,
            created_at: now,
        };
        let large = VariantOptionModel {
            id: large_option_id,
            variant_group_id: size_group_id,
            name: "Large".into(),
            price_delta: d("2.00"),
            sort_order: 0,
            created_at: now,
        };
        let small = VariantOptionModel {
            id: small_option_id,
            variant_group_id: size_group_id,
            name: "Small".into(),
            price_delta: d("0.00"),
            sort_order: 1,
            created_at: now,
        };

        let mut catalog =
            Catalog::from_rows(vec![product], vec![size_group], vec![large, small]);

        let extra_cheese = ModifierOptionModel {
            id: extra_cheese_id,
            modifier_group_id,
            name: "Extra cheese".into(),
            modifier_type: ModifierType::Add,
            price_delta: d("1.50"),
            sort_order: 0,
            created_at: now,
        };
        let no_onions = ModifierOptionModel {
            id: no_onions_id,
            modifier_group_id,
            name: "No onions".into(),
            modifier_type: ModifierType::Remove,
            price_delta: d("0.75"),
            sort_order: 1,
            created_at: now,
        };
        let mut group_to_product = HashMap::new();
        group_to_product.insert(modifier_group_id, product_id);
        catalog.attach_modifiers(group_to_product, vec![extra_cheese, no_onions]);

        Fixture {
            catalog,
            product_id,
            size_group_id,
            large_option_id,
            small_option_id,
            extra_cheese_id,
            no_onions_id,
        }
    }

    #[test]
    fn base_plus_variant_plus_add_modifier_times_quantity() {
        let f = fixture();
        let priced = f
            .catalog
            .price_item(
                f.product_id,
                &[VariantChoice {
                    variant_group_id: f.size_group_id,
                    option_id: f.large_option_id,
                }],
                &[f.extra_cheese_id],
                3,
            )
            .unwrap();

        assert_eq!(priced.unit_price, d("13.50"));
        assert_eq!(priced.total_price, d("40.50"));
        assert_eq!(priced.selected_variants.len(), 1);
        assert_eq!(priced.selected_variants[0].name, "Large");
        assert_eq!(priced.modifiers.len(), 1);
    }

    #[test]
    fn remove_modifier_is_recorded_at_zero_price() {
        let f = fixture();
        let priced = f
            .catalog
            .price_item(f.product_id, &[], &[f.no_onions_id], 1)
            .unwrap();

        assert_eq!(priced.unit_price, d("10.00"));
        assert_eq!(priced.modifiers.len(), 1);
        assert_eq!(priced.modifiers[0].price, Decimal::ZERO);
        assert_eq!(priced.modifiers[0].modifier_type, ModifierType::Remove);
    }

    #[test]
    fn price_is_independent_of_modifier_order() {
        let f = fixture();
        let a = f
            .catalog
            .price_item(
                f.product_id,
                &[],
                &[f.extra_cheese_id, f.no_onions_id],
                2,
            )
            .unwrap();
        let b = f
            .catalog
            .price_item(
                f.product_id,
                &[],
                &[f.no_onions_id, f.extra_cheese_id],
                2,
            )
            .unwrap();
        assert_eq!(a.unit_price, b.unit_price);
        assert_eq!(a.total_price, b.total_price);
    }

    #[test]
    fn rejects_zero_and_negative_quantity() {
        let f = fixture();
        assert!(matches!(
            f.catalog.price_item(f.product_id, &[], &[], 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            f.catalog.price_item(f.product_id, &[], &[], -2),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.catalog.price_item(Uuid::new_v4(), &[], &[], 1),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn variant_group_of_another_product_is_rejected() {
        let f = fixture();
        let err = f
            .catalog
            .price_item(
                f.product_id,
                &[VariantChoice {
                    variant_group_id: Uuid::new_v4(),
                    option_id: f.large_option_id,
                }],
                &[],
                1,
            )
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("does not belong to product")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn option_outside_its_group_is_rejected() {
        let f = fixture();
        let err = f
            .catalog
            .price_item(
                f.product_id,
                &[VariantChoice {
                    variant_group_id: f.size_group_id,
                    option_id: Uuid::new_v4(),
                }],
                &[],
                1,
            )
            .unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("does not belong to variant group"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_variant_group_selection_is_rejected() {
        let f = fixture();
        let choices = [
            VariantChoice {
                variant_group_id: f.size_group_id,
                option_id: f.large_option_id,
            },
            VariantChoice {
                variant_group_id: f.size_group_id,
                option_id: f.small_option_id,
            },
        ];
        assert!(matches!(
            f.catalog.price_item(f.product_id, &choices, &[], 1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn foreign_modifier_is_rejected() {
        let f = fixture();
        assert!(matches!(
            f.catalog
                .price_item(f.product_id, &[], &[Uuid::new_v4()], 1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn missing_products_reports_unresolved_ids() {
        let f = fixture();
        let unknown = Uuid::new_v4();
        let missing = f.catalog.missing_products(&[f.product_id, unknown]);
        assert_eq!(missing, vec![unknown]);
    }
}
