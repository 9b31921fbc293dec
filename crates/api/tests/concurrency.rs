//! Concurrency tests for stock claims and cart merging.
//!
//! The single-writer pool serializes transactions, and the conditional
//! stock decrement makes each claim all-or-nothing. These tests race real
//! tasks against each other to show no unit is ever sold twice.

mod common;

use rust_decimal::Decimal;

use curio_api::db::ProductRepository;
use curio_api::services::cart::CartService;
use curio_api::services::orders::{Checkout, CheckoutItem, OrderError, OrderService};
use curio_core::{ProductId, UserId};

async fn stock_of(pool: &sqlx::SqlitePool, product_id: ProductId) -> i64 {
    ProductRepository::new(pool)
        .get_by_id(product_id)
        .await
        .expect("query should succeed")
        .expect("product should exist")
        .stock_quantity
}

async fn run_checkout(
    pool: sqlx::SqlitePool,
    user_id: UserId,
    product_id: ProductId,
    quantity: i64,
) -> Result<(), OrderError> {
    let items = [CheckoutItem {
        product_id,
        quantity,
    }];
    OrderService::new(&pool)
        .checkout(Checkout {
            user_id,
            items: &items,
            shipping_address: "12 Tran Phu, Ward 4",
            province: "Hà Nội",
            phone_number: "0901234567",
        })
        .await
        .map(|_| ())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_two_buyers_one_unit_exactly_one_wins() {
    let pool = common::test_pool().await;
    let alice = common::seed_customer(&pool, "alice").await;
    let bertha = common::seed_customer(&pool, "bertha").await;
    let product = common::seed_product(&pool, "Sentinel Unit 04", "45.00", 1).await;

    let first = tokio::spawn(run_checkout(pool.clone(), alice.id, product.id, 1));
    let second = tokio::spawn(run_checkout(pool.clone(), bertha.id, product.id, 1));

    let results = [
        first.await.expect("task should join"),
        second.await.expect("task should join"),
    ];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one checkout may claim the last unit");

    let loss = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one checkout should lose");
    match loss {
        OrderError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(*requested, 1);
            assert_eq!(*available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(stock_of(&pool, product.id).await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_burst_of_checkouts_never_oversells() {
    let pool = common::test_pool().await;
    let product = common::seed_product(&pool, "Sentinel Unit 04", "45.00", 10).await;

    let mut users = Vec::new();
    for name in ["alice", "bertha", "carol", "dana"] {
        users.push(common::seed_customer(&pool, name).await);
    }

    let mut handles = Vec::new();
    for user in &users {
        handles.push(tokio::spawn(run_checkout(
            pool.clone(),
            user.id,
            product.id,
            3,
        )));
    }

    let mut wins = 0;
    let mut losses = 0;
    for handle in handles {
        match handle.await.expect("task should join") {
            Ok(()) => wins += 1,
            Err(OrderError::InsufficientStock { .. }) => losses += 1,
            Err(other) => panic!("unexpected checkout error: {other:?}"),
        }
    }

    // 10 units cover exactly three requests of 3; the fourth finds 1 left.
    assert_eq!(wins, 3);
    assert_eq!(losses, 1);

    assert_eq!(stock_of(&pool, product.id).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_adds_merge_into_one_line() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 10).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let pool = pool.clone();
        let user_id = user.id;
        let product_id = product.id;
        handles.push(tokio::spawn(async move {
            CartService::new(&pool).add_item(user_id, product_id, 2).await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("task should join")
            .expect("add should succeed");
    }

    let cart = CartService::new(&pool)
        .get_cart(user.id)
        .await
        .expect("cart should load");

    assert_eq!(cart.items.len(), 1, "both adds must land on the same line");
    assert_eq!(cart.items[0].quantity, 4);
    assert_eq!(cart.total_amount, Decimal::new(4000, 2));
}
