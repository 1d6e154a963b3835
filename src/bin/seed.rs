use axum_pos_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let tenant_id = ensure_tenant(&pool, "Demo Hospitality Group").await?;
    let store_id = ensure_store(&pool, tenant_id, "Downtown Diner", "0.1000").await?;
    let waiter_id = ensure_user(&pool, tenant_id, "Dana Waiter", "waiter").await?;
    ensure_user(&pool, tenant_id, "Kim Kitchen", "kitchen").await?;
    seed_menu(&pool, store_id).await?;

    println!("Seed completed. Tenant: {tenant_id}, Store: {store_id}, Waiter: {waiter_id}");
    Ok(())
}

async fn ensure_tenant(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM tenants WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((existing,)) = row {
        println!("Tenant {name} already present");
        return Ok(existing);
    }

    sqlx::query("INSERT INTO tenants (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    println!("Created tenant {name}");
    Ok(id)
}

async fn ensure_store(
    pool: &sqlx::PgPool,
    tenant_id: Uuid,
    name: &str,
    tax_rate: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM stores WHERE tenant_id = $1 AND name = $2")
            .bind(tenant_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((existing,)) = row {
        println!("Store {name} already present");
        return Ok(existing);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO stores (id, tenant_id, name, tax_rate) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .bind(tax_rate.parse::<Decimal>()?)
        .execute(pool)
        .await?;
    println!("Created store {name} (tax rate {tax_rate})");
    Ok(id)
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    tenant_id: Uuid,
    name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE tenant_id = $1 AND name = $2")
            .bind(tenant_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((existing,)) = row {
        println!("User {name} already present");
        return Ok(existing);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, tenant_id, name, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .bind(role)
        .execute(pool)
        .await?;
    println!("Ensured user {name} (role={role})");
    Ok(id)
}

async fn seed_menu(pool: &sqlx::PgPool, store_id: Uuid) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE store_id = $1 LIMIT 1")
            .bind(store_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        println!("Menu already seeded");
        return Ok(());
    }

    let burger_id = insert_product(pool, store_id, "Classic Burger", "10.00", 1).await?;
    let coffee_id = insert_product(pool, store_id, "House Coffee", "4.50", 2).await?;
    insert_product(pool, store_id, "Garden Salad", "8.00", 3).await?;

    // Burger: size variants plus add/remove topping modifiers.
    let size_group = insert_variant_group(pool, burger_id, "Size", 1).await?;
    insert_variant_option(pool, size_group, "Regular", "0.00", 1).await?;
    insert_variant_option(pool, size_group, "Large", "2.00", 2).await?;

    let toppings = insert_modifier_group(pool, burger_id, "Toppings", 1).await?;
    insert_modifier_option(pool, toppings, "Extra Cheese", "ADD", "1.50", 1).await?;
    insert_modifier_option(pool, toppings, "Bacon", "ADD", "2.50", 2).await?;
    insert_modifier_option(pool, toppings, "No Onions", "REMOVE", "0.00", 3).await?;

    // Coffee: size variants only.
    let cup_group = insert_variant_group(pool, coffee_id, "Cup", 1).await?;
    insert_variant_option(pool, cup_group, "Small", "0.00", 1).await?;
    insert_variant_option(pool, cup_group, "Large", "1.00", 2).await?;

    println!("Seeded menu for store {store_id}");
    Ok(())
}

async fn insert_product(
    pool: &sqlx::PgPool,
    store_id: Uuid,
    name: &str,
    price: &str,
    sort_order: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (id, store_id, name, base_price, sort_order) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(store_id)
    .bind(name)
    .bind(price.parse::<Decimal>()?)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn insert_variant_group(
    pool: &sqlx::PgPool,
    product_id: Uuid,
    name: &str,
    sort_order: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO product_variant_groups (id, product_id, name, sort_order) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(product_id)
    .bind(name)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn insert_variant_option(
    pool: &sqlx::PgPool,
    group_id: Uuid,
    name: &str,
    price_delta: &str,
    sort_order: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO product_variant_options (id, variant_group_id, name, price_delta, sort_order) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(group_id)
    .bind(name)
    .bind(price_delta.parse::<Decimal>()?)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn insert_modifier_group(
    pool: &sqlx::PgPool,
    product_id: Uuid,
    name: &str,
    sort_order: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO product_modifier_groups (id, product_id, name, sort_order) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(product_id)
    .bind(name)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn insert_modifier_option(
    pool: &sqlx::PgPool,
    group_id: Uuid,
    name: &str,
    modifier_type: &str,
    price_delta: &str,
    sort_order: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO product_modifier_options (id, modifier_group_id, name, modifier_type, price_delta, sort_order) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(group_id)
    .bind(name)
    .bind(modifier_type)
    .bind(price_delta.parse::<Decimal>()?)
    .bind(sort_order)
    .execute(pool)
    .await?;
    Ok(id)
}
