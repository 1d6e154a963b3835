#![allow(dead_code)]

use axum_pos_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        product_modifier_groups::ActiveModel as ModifierGroupActive,
        product_modifier_options::ActiveModel as ModifierOptionActive,
        product_variant_groups::ActiveModel as VariantGroupActive,
        product_variant_options::ActiveModel as VariantOptionActive,
        products::ActiveModel as ProductActive, stores::ActiveModel as StoreActive,
        tenants::ActiveModel as TenantActive, users::ActiveModel as UserActive,
    },
    events::EventBus,
    middleware::auth::AuthUser,
    models::ModifierType,
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Connects to the test database, or returns None so callers can skip when
/// no database is configured in the environment.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let (events, _print_rx) = EventBus::new();
    Ok(Some(AppState { pool, orm, events }))
}

/// One tenant with one store and a small menu. Each test seeds its own
/// fixture under fresh ids, so suites stay independent without truncation.
pub struct Fixture {
    pub tenant_id: Uuid,
    pub store_id: Uuid,
    pub waiter: AuthUser,
    /// 10.00 base, Size variants (Regular +0.00 / Large +2.00), toppings
    /// (Extra Cheese ADD 1.50, No Onions REMOVE 0.00).
    pub burger_id: Uuid,
    pub size_group_id: Uuid,
    pub large_option_id: Uuid,
    pub regular_option_id: Uuid,
    pub cheese_option_id: Uuid,
    pub no_onions_option_id: Uuid,
    /// 20.00 base, no variants or modifiers.
    pub steak_id: Uuid,
}

pub async fn seed_fixture(state: &AppState) -> anyhow::Result<Fixture> {
    let tenant_id = seed_tenant(state).await?;
    let store_id = seed_store(state, tenant_id, "Main Street").await?;

    let waiter_id = UserActive {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        name: Set("Test Waiter".into()),
        role: Set("waiter".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?
    .id;

    let burger_id = seed_product(state, store_id, "Burger", Decimal::new(1000, 2)).await?;
    let steak_id = seed_product(state, store_id, "Steak", Decimal::new(2000, 2)).await?;

    let size_group_id = VariantGroupActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(burger_id),
        name: Set("Size".into()),
        sort_order: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?
    .id;

    let regular_option_id =
        seed_variant_option(state, size_group_id, "Regular", Decimal::ZERO).await?;
    let large_option_id =
        seed_variant_option(state, size_group_id, "Large", Decimal::new(200, 2)).await?;

    let toppings_group_id = ModifierGroupActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(burger_id),
        name: Set("Toppings".into()),
        sort_order: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?
    .id;

    let cheese_option_id = seed_modifier_option(
        state,
        toppings_group_id,
        "Extra Cheese",
        ModifierType::Add,
        Decimal::new(150, 2),
    )
    .await?;
    let no_onions_option_id = seed_modifier_option(
        state,
        toppings_group_id,
        "No Onions",
        ModifierType::Remove,
        Decimal::ZERO,
    )
    .await?;

    let waiter = AuthUser {
        user_id: waiter_id,
        tenant_id,
        role: "waiter".into(),
        store_ids: vec![store_id],
        active_store_id: Some(store_id),
    };

    Ok(Fixture {
        tenant_id,
        store_id,
        waiter,
        burger_id,
        size_group_id,
        large_option_id,
        regular_option_id,
        cheese_option_id,
        no_onions_option_id,
        steak_id,
    })
}

pub async fn seed_tenant(state: &AppState) -> anyhow::Result<Uuid> {
    let tenant = TenantActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("tenant-{}", Uuid::new_v4())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(tenant.id)
}

pub async fn seed_store(state: &AppState, tenant_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        name: Set(name.into()),
        tax_rate: Set(Decimal::new(1000, 4)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(store.id)
}

pub async fn seed_product(
    state: &AppState,
    store_id: Uuid,
    name: &str,
    base_price: Decimal,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        name: Set(name.into()),
        description: Set(None),
        base_price: Set(base_price),
        is_active: Set(true),
        sort_order: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

async fn seed_variant_option(
    state: &AppState,
    group_id: Uuid,
    name: &str,
    price_delta: Decimal,
) -> anyhow::Result<Uuid> {
    let option = VariantOptionActive {
        id: Set(Uuid::new_v4()),
        variant_group_id: Set(group_id),
        name: Set(name.into()),
        price_delta: Set(price_delta),
        sort_order: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(option.id)
}

async fn seed_modifier_option(
    state: &AppState,
    group_id: Uuid,
    name: &str,
    modifier_type: ModifierType,
    price_delta: Decimal,
) -> anyhow::Result<Uuid> {
    let option = ModifierOptionActive {
        id: Set(Uuid::new_v4()),
        modifier_group_id: Set(group_id),
        name: Set(name.into()),
        modifier_type: Set(modifier_type),
        price_delta: Set(price_delta),
        sort_order: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(option.id)
}
