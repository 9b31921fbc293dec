//! Integration tests for checkout and order history.
//!
//! Checkout is the one place stock actually moves: these tests pin down the
//! claim semantics, the all-or-nothing transaction, shipping fee tiers, and
//! what order history shows after products disappear.

mod common;

use rust_decimal::Decimal;

use curio_api::db::ProductRepository;
use curio_api::services::cart::CartService;
use curio_api::services::orders::{Checkout, CheckoutItem, OrderError, OrderService};
use curio_core::{OrderStatus, ProductId, UserId};

fn checkout_params<'a>(
    user_id: UserId,
    items: &'a [CheckoutItem],
    province: &'a str,
) -> Checkout<'a> {
    Checkout {
        user_id,
        items,
        shipping_address: "12 Tran Phu, Ward 4",
        province,
        phone_number: "0901234567",
    }
}

async fn stock_of(pool: &sqlx::SqlitePool, product_id: ProductId) -> i64 {
    ProductRepository::new(pool)
        .get_by_id(product_id)
        .await
        .expect("query should succeed")
        .expect("product should exist")
        .stock_quantity
}

// ============================================================================
// Placing Orders
// ============================================================================

#[tokio::test]
async fn test_checkout_places_order_and_claims_stock() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    // Fill the cart the way a client would before checking out.
    CartService::new(&pool)
        .add_item(user.id, product.id, 2)
        .await
        .expect("add should succeed");

    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 2,
    }];
    let order = OrderService::new(&pool)
        .checkout(checkout_params(user.id, &items, "TP. Hồ Chí Minh"))
        .await
        .expect("checkout should succeed");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, Decimal::new(2000, 2));
    assert_eq!(order.shipping_fee, Decimal::new(500, 2));
    assert_eq!(order.grand_total, Decimal::new(2500, 2));

    let code = order.order_code.expect("order should carry a code");
    assert!(code.starts_with("ORD-"));

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_name, "Bramble Fox");
    assert_eq!(order.items[0].unit_price, Decimal::new(1000, 2));
    assert_eq!(order.items[0].subtotal, Decimal::new(2000, 2));

    // Stock moved and the cart is gone.
    assert_eq!(stock_of(&pool, product.id).await, 3);
    let cart = CartService::new(&pool)
        .get_cart(user.id)
        .await
        .expect("cart should load");
    assert!(cart.order_id.is_none());
}

#[tokio::test]
async fn test_checkout_works_without_a_stored_cart() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    // The item list in the request is authoritative; no cart rows needed.
    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 1,
    }];
    let order = OrderService::new(&pool)
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect("checkout should succeed");

    assert_eq!(order.subtotal, Decimal::new(1000, 2));
    assert_eq!(stock_of(&pool, product.id).await, 4);
}

#[tokio::test]
async fn test_shipping_fee_tiers() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 50).await;

    let service = OrderService::new(&pool);
    let cases = [
        ("TP. Hồ Chí Minh", Decimal::new(500, 2)),
        ("Đồng Nai", Decimal::new(700, 2)),
        ("Hà Nội", Decimal::new(1000, 2)),
        ("Atlantis", Decimal::new(1000, 2)),
    ];

    for (province, expected_fee) in cases {
        let items = [CheckoutItem {
            product_id: product.id,
            quantity: 1,
        }];
        let order = service
            .checkout(checkout_params(user.id, &items, province))
            .await
            .expect("checkout should succeed");

        assert_eq!(order.shipping_fee, expected_fee, "province: {province}");
        assert_eq!(order.grand_total, order.subtotal + expected_fee);
    }
}

#[tokio::test]
async fn test_checkout_totals_over_multiple_lines() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let fox = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;
    let keeper = common::seed_product(&pool, "Elder Oak Keeper", "19.75", 3).await;

    let items = [
        CheckoutItem {
            product_id: fox.id,
            quantity: 2,
        },
        CheckoutItem {
            product_id: keeper.id,
            quantity: 1,
        },
    ];
    let order = OrderService::new(&pool)
        .checkout(checkout_params(user.id, &items, "Đồng Nai"))
        .await
        .expect("checkout should succeed");

    // 2 x 10.00 + 1 x 19.75 = 39.75, plus the 7.00 nearby fee.
    assert_eq!(order.subtotal, Decimal::new(3975, 2));
    assert_eq!(order.grand_total, Decimal::new(4675, 2));
    assert_eq!(order.items.len(), 2);
}

// ============================================================================
// Failure and Rollback
// ============================================================================

#[tokio::test]
async fn test_insufficient_stock_rolls_back_everything() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let fox = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;
    let keeper = common::seed_product(&pool, "Elder Oak Keeper", "19.75", 3).await;

    // The first line is claimable, the second is not.
    let items = [
        CheckoutItem {
            product_id: fox.id,
            quantity: 2,
        },
        CheckoutItem {
            product_id: keeper.id,
            quantity: 4,
        },
    ];
    let err = OrderService::new(&pool)
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect_err("second line should exceed stock");

    match err {
        OrderError::InsufficientStock {
            product_name,
            requested,
            available,
        } => {
            assert_eq!(product_name, "Elder Oak Keeper");
            assert_eq!(requested, 4);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // The claim on the first line must have been rolled back too.
    assert_eq!(stock_of(&pool, fox.id).await, 5);
    assert_eq!(stock_of(&pool, keeper.id).await, 3);

    let history = OrderService::new(&pool)
        .list_orders(user.id)
        .await
        .expect("history should load");
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_checkout_rejects_bad_inputs() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    let service = OrderService::new(&pool);

    let err = service
        .checkout(checkout_params(user.id, &[], "Hà Nội"))
        .await
        .expect_err("empty order should be rejected");
    assert!(matches!(err, OrderError::EmptyOrder));

    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 0,
    }];
    let err = service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect_err("zero quantity should be rejected");
    assert!(matches!(err, OrderError::InvalidQuantity));

    let items = [CheckoutItem {
        product_id: ProductId::new(9999),
        quantity: 1,
    }];
    let err = service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect_err("unknown product should be rejected");
    assert!(matches!(err, OrderError::ProductNotFound));

    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 1,
    }];
    let err = service
        .checkout(checkout_params(UserId::new(9999), &items, "Hà Nội"))
        .await
        .expect_err("unknown user should be rejected");
    assert!(matches!(err, OrderError::UserNotFound));

    // None of the failures may have touched stock.
    assert_eq!(stock_of(&pool, product.id).await, 5);
}

#[tokio::test]
async fn test_sequential_checkouts_drain_stock_exactly() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    let service = OrderService::new(&pool);
    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 2,
    }];
    service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect("first checkout should succeed");

    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 4,
    }];
    let err = service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect_err("only 3 units remain");
    match err {
        OrderError::InsufficientStock { available, .. } => assert_eq!(available, 3),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 3,
    }];
    service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect("draining checkout should succeed");

    assert_eq!(stock_of(&pool, product.id).await, 0);
}

// ============================================================================
// Order History
// ============================================================================

#[tokio::test]
async fn test_history_is_newest_first_with_unique_codes() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let fox = common::seed_product(&pool, "Bramble Fox", "10.00", 10).await;
    let keeper = common::seed_product(&pool, "Elder Oak Keeper", "19.75", 10).await;

    let service = OrderService::new(&pool);
    let items = [CheckoutItem {
        product_id: fox.id,
        quantity: 1,
    }];
    let first = service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect("checkout should succeed");

    let items = [CheckoutItem {
        product_id: keeper.id,
        quantity: 2,
    }];
    let second = service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect("checkout should succeed");

    assert_ne!(first.order_code, second.order_code);

    let history = service
        .list_orders(user.id)
        .await
        .expect("history should load");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);
    assert_eq!(history[0].items[0].product_name, "Elder Oak Keeper");
}

#[tokio::test]
async fn test_history_survives_product_deletion() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    let service = OrderService::new(&pool);
    let items = [CheckoutItem {
        product_id: product.id,
        quantity: 2,
    }];
    service
        .checkout(checkout_params(user.id, &items, "Hà Nội"))
        .await
        .expect("checkout should succeed");

    ProductRepository::new(&pool)
        .delete(product.id)
        .await
        .expect("delete should succeed");

    let history = service
        .list_orders(user.id)
        .await
        .expect("history should load");
    let line = &history[0].items[0];

    assert_eq!(line.product_id, None);
    assert_eq!(line.product_name, "N/A");
    assert_eq!(line.unit_price, Decimal::new(1000, 2));
    assert_eq!(line.subtotal, Decimal::new(2000, 2));
}

#[tokio::test]
async fn test_history_excludes_the_open_cart() {
    let pool = common::test_pool().await;
    let user = common::seed_customer(&pool, "mai").await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    CartService::new(&pool)
        .add_item(user.id, product.id, 1)
        .await
        .expect("add should succeed");

    let history = OrderService::new(&pool)
        .list_orders(user.id)
        .await
        .expect("history should load");
    assert!(history.is_empty());
}
