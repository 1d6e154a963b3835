pub mod check_orders;
pub mod checks;
pub mod log_entries;
pub mod order_item_modifiers;
pub mod order_items;
pub mod orders;
pub mod product_modifier_groups;
pub mod product_modifier_options;
pub mod product_variant_groups;
pub mod product_variant_options;
pub mod products;
pub mod store_counters;
pub mod stores;
pub mod tenants;
pub mod users;

pub use check_orders::Entity as CheckOrders;
pub use checks::Entity as Checks;
pub use log_entries::Entity as LogEntries;
pub use order_item_modifiers::Entity as OrderItemModifiers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_modifier_groups::Entity as ProductModifierGroups;
pub use product_modifier_options::Entity as ProductModifierOptions;
pub use product_variant_groups::Entity as ProductVariantGroups;
pub use product_variant_options::Entity as ProductVariantOptions;
pub use products::Entity as Products;
pub use store_counters::Entity as StoreCounters;
pub use stores::Entity as Stores;
pub use tenants::Entity as Tenants;
pub use users::Entity as Users;
