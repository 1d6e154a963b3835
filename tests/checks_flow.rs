mod common;

use axum_pos_api::{
    dto::{
        checks::{AttachOrderRequest, CloseCheckRequest, OpenCheckRequest},
        orders::{CreateOrderRequest, OrderItemRequest, UpdateOrderStatusRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{CheckStatus, OrderStatus, OrderType},
    services::{check_service, order_service},
    state::AppState,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{Fixture, seed_fixture, seed_product, seed_store, setup_state};

async fn create_steak_order(
    state: &AppState,
    fixture: &Fixture,
) -> anyhow::Result<Uuid> {
    let order = order_service::create_order(
        state,
        &fixture.waiter,
        CreateOrderRequest {
            store_id: Some(fixture.store_id),
            order_type: OrderType::DineIn,
            table_number: Some("4".into()),
            customer_name: None,
            notes: None,
            items: vec![OrderItemRequest {
                product_id: fixture.steak_id,
                quantity: 1,
                selected_variants: vec![],
                modifier_ids: vec![],
                notes: None,
            }],
        },
    )
    .await?
    .data
    .unwrap()
    .order;
    Ok(order.id)
}

fn open_request(fixture: &Fixture) -> OpenCheckRequest {
    OpenCheckRequest {
        store_id: Some(fixture.store_id),
    }
}

// Open a check, fold two orders in at a 10% tax rate, then settle with a tip.
#[tokio::test]
async fn aggregation_and_payment_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = seed_fixture(&state).await?;
    let waiter = &fixture.waiter;

    let check = check_service::open_check(&state, waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();
    assert_eq!(check.number, "CHECK-000001");
    assert_eq!(check.status, CheckStatus::Open);
    assert_eq!(check.subtotal, Decimal::ZERO);
    assert_eq!(check.total, Decimal::ZERO);

    let order_a = create_steak_order(&state, &fixture).await?;
    let order_b = create_steak_order(&state, &fixture).await?;

    let check = check_service::attach_order(
        &state,
        waiter,
        check.id,
        AttachOrderRequest { order_id: order_a },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(check.subtotal, Decimal::new(2000, 2));
    assert_eq!(check.tax, Decimal::new(200, 2));
    assert_eq!(check.total, Decimal::new(2200, 2));

    let check = check_service::attach_order(
        &state,
        waiter,
        check.id,
        AttachOrderRequest { order_id: order_b },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(check.subtotal, Decimal::new(4000, 2));
    assert_eq!(check.tax, Decimal::new(400, 2));
    assert_eq!(check.total, Decimal::new(4400, 2));

    // The same order cannot be folded in twice.
    let err = check_service::attach_order(
        &state,
        waiter,
        check.id,
        AttachOrderRequest { order_id: order_a },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let paid = check_service::close_check(
        &state,
        waiter,
        check.id,
        CloseCheckRequest {
            tip: Some(Decimal::new(500, 2)),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(paid.status, CheckStatus::Paid);
    assert_eq!(paid.tip, Decimal::new(500, 2));
    assert_eq!(paid.total, Decimal::new(4900, 2));
    assert!(paid.paid_at.is_some());

    // Settled means settled.
    let err = check_service::close_check(&state, waiter, check.id, CloseCheckRequest { tip: None })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    let err = check_service::attach_order(
        &state,
        waiter,
        check.id,
        AttachOrderRequest { order_id: order_b },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    Ok(())
}

#[tokio::test]
async fn negative_tips_are_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = seed_fixture(&state).await?;

    let check = check_service::open_check(&state, &fixture.waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();

    let err = check_service::close_check(
        &state,
        &fixture.waiter,
        check.id,
        CloseCheckRequest {
            tip: Some(Decimal::new(-100, 2)),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn cancelling_a_check_releases_its_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = seed_fixture(&state).await?;
    let waiter = &fixture.waiter;

    let order_id = create_steak_order(&state, &fixture).await?;

    let first = check_service::open_check(&state, waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();
    check_service::attach_order(
        &state,
        waiter,
        first.id,
        AttachOrderRequest { order_id },
    )
    .await?;

    let cancelled = check_service::cancel_check(&state, waiter, first.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.status, CheckStatus::Cancelled);

    // The order is free again and can land on another check.
    let second = check_service::open_check(&state, waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();
    let second = check_service::attach_order(
        &state,
        waiter,
        second.id,
        AttachOrderRequest { order_id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(second.subtotal, Decimal::new(2000, 2));

    Ok(())
}

#[tokio::test]
async fn cancelled_orders_cannot_be_attached() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = seed_fixture(&state).await?;
    let waiter = &fixture.waiter;

    let order_id = create_steak_order(&state, &fixture).await?;
    order_service::update_status(
        &state,
        waiter,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?;

    let check = check_service::open_check(&state, waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();
    let err = check_service::attach_order(&state, waiter, check.id, AttachOrderRequest { order_id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    Ok(())
}

#[tokio::test]
async fn orders_from_another_store_are_a_miss() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = seed_fixture(&state).await?;

    // Sibling store of the same tenant, assigned to the same waiter.
    let other_store_id = seed_store(&state, fixture.tenant_id, "Annex").await?;
    let other_product_id =
        seed_product(&state, other_store_id, "Soup", Decimal::new(600, 2)).await?;
    let waiter = AuthUser {
        store_ids: vec![fixture.store_id, other_store_id],
        ..fixture.waiter.clone()
    };

    let order = order_service::create_order(
        &state,
        &waiter,
        CreateOrderRequest {
            store_id: Some(other_store_id),
            order_type: OrderType::ToGo,
            table_number: None,
            customer_name: None,
            notes: None,
            items: vec![OrderItemRequest {
                product_id: other_product_id,
                quantity: 1,
                selected_variants: vec![],
                modifier_ids: vec![],
                notes: None,
            }],
        },
    )
    .await?
    .data
    .unwrap()
    .order;

    let check = check_service::open_check(&state, &waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();
    let err = check_service::attach_order(
        &state,
        &waiter,
        check.id,
        AttachOrderRequest { order_id: order.id },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

// Four concurrent attachments against one check must all land, with totals
// equal to the sum of the orders. The row lock serializes the updates.
#[tokio::test]
async fn concurrent_attachments_never_lose_updates() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let fixture = seed_fixture(&state).await?;
    let waiter = &fixture.waiter;

    let check = check_service::open_check(&state, waiter, open_request(&fixture))
        .await?
        .data
        .unwrap();

    let mut order_ids = Vec::new();
    for _ in 0..4 {
        order_ids.push(create_steak_order(&state, &fixture).await?);
    }

    let (a, b, c, d) = tokio::join!(
        check_service::attach_order(
            &state,
            waiter,
            check.id,
            AttachOrderRequest {
                order_id: order_ids[0]
            }
        ),
        check_service::attach_order(
            &state,
            waiter,
            check.id,
            AttachOrderRequest {
                order_id: order_ids[1]
            }
        ),
        check_service::attach_order(
            &state,
            waiter,
            check.id,
            AttachOrderRequest {
                order_id: order_ids[2]
            }
        ),
        check_service::attach_order(
            &state,
            waiter,
            check.id,
            AttachOrderRequest {
                order_id: order_ids[3]
            }
        ),
    );
    a?;
    b?;
    c?;
    d?;

    let open = check_service::find_open(&state, waiter, fixture.store_id)
        .await?
        .data
        .unwrap();
    let found = open
        .items
        .iter()
        .find(|c| c.check.id == check.id)
        .expect("check should still be open");
    assert_eq!(found.orders.len(), 4);
    assert_eq!(found.check.subtotal, Decimal::new(8000, 2));
    assert_eq!(found.check.tax, Decimal::new(800, 2));
    assert_eq!(found.check.total, Decimal::new(8800, 2));

    Ok(())
}
