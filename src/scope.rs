//! Tenant-scoped lookups. Every finder takes the caller's tenant id as a
//! mandatory first argument and filters through the owning store, so a hit
//! on another tenant's row is indistinguishable from a miss.

use sea_orm::sea_query::LockType;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait, Statement,
};
use uuid::Uuid;

use crate::{
    entity::{
        checks::{self, Column as CheckCol, Entity as Checks},
        orders::{self, Column as OrderCol, Entity as Orders},
        stores::{Column as StoreCol, Entity as Stores},
    },
    error::{AppError, AppResult},
};

pub async fn find_store<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    store_id: Uuid,
) -> AppResult<crate::entity::stores::Model> {
    Stores::find()
        .filter(StoreCol::Id.eq(store_id))
        .filter(StoreCol::TenantId.eq(tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {store_id}")))
}

pub async fn find_order<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    order_id: Uuid,
) -> AppResult<orders::Model> {
    scoped_order_query(tenant_id, order_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id}")))
}

/// Scoped order lookup that takes a row lock for a read-modify-write.
pub async fn find_order_for_update<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    order_id: Uuid,
) -> AppResult<orders::Model> {
    scoped_order_query(tenant_id, order_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id}")))
}

fn scoped_order_query(tenant_id: Uuid, order_id: Uuid) -> sea_orm::Select<Orders> {
    Orders::find()
        .filter(OrderCol::Id.eq(order_id))
        .join(JoinType::InnerJoin, orders::Relation::Stores.def())
        .filter(StoreCol::TenantId.eq(tenant_id))
}

pub async fn find_check<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    check_id: Uuid,
) -> AppResult<checks::Model> {
    scoped_check_query(tenant_id, check_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Check {check_id}")))
}

/// Scoped check lookup that takes a row lock, serializing concurrent
/// attach/close calls on the same check.
pub async fn find_check_for_update<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    check_id: Uuid,
) -> AppResult<checks::Model> {
    scoped_check_query(tenant_id, check_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Check {check_id}")))
}

fn scoped_check_query(tenant_id: Uuid, check_id: Uuid) -> sea_orm::Select<Checks> {
    Checks::find()
        .filter(CheckCol::Id.eq(check_id))
        .join(JoinType::InnerJoin, checks::Relation::Stores.def())
        .filter(StoreCol::TenantId.eq(tenant_id))
}

/// Draw the next order number for a store. The upsert-increment is atomic
/// and runs inside the caller's transaction, so concurrent creations get
/// distinct numbers and a rolled-back creation leaves a gap, never a dupe.
pub async fn next_order_number<C: ConnectionTrait>(conn: &C, store_id: Uuid) -> AppResult<String> {
    let seq = bump_counter(conn, store_id, CounterKind::Order).await?;
    Ok(format!("ORDER-{seq:06}"))
}

pub async fn next_check_number<C: ConnectionTrait>(conn: &C, store_id: Uuid) -> AppResult<String> {
    let seq = bump_counter(conn, store_id, CounterKind::Check).await?;
    Ok(format!("CHECK-{seq:06}"))
}

enum CounterKind {
    Order,
    Check,
}

async fn bump_counter<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    kind: CounterKind,
) -> AppResult<i64> {
    let sql = match kind {
        CounterKind::Order => {
            r#"
            INSERT INTO store_counters (store_id, order_seq, check_seq)
            VALUES ($1, 1, 0)
            ON CONFLICT (store_id)
            DO UPDATE SET order_seq = store_counters.order_seq + 1
            RETURNING order_seq AS seq
            "#
        }
        CounterKind::Check => {
            r#"
            INSERT INTO store_counters (store_id, order_seq, check_seq)
            VALUES ($1, 0, 1)
            ON CONFLICT (store_id)
            DO UPDATE SET check_seq = store_counters.check_seq + 1
            RETURNING check_seq AS seq
            "#
        }
    };

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [store_id.into()],
        ))
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("counter upsert returned no row")))?;

    let seq: i64 = row.try_get("", "seq")?;
    Ok(seq)
}
