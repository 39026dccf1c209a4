//! A visitor browsing a collection, filling a bag, and checking out.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use thread_hanger_core::{Category, NewOrder, Order, OrderId, OrderStatus, Size};
use thread_hanger_integration_tests::{TestApp, field_values, location};
use thread_hanger_storefront::store::{Backends, InMemoryBackend, OrderStore, StoreError};

const CHECKOUT_FORM: [(&str, &str); 4] = [
    ("category", "Men"),
    ("name", "Ayesha Khan"),
    ("phone", "03001234567"),
    ("address", "12 Main Boulevard, Gulberg"),
];

/// Order store whose batch insert takes a while, like a slow network.
struct SlowOrders(InMemoryBackend);

#[async_trait]
impl OrderStore for SlowOrders {
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.0.list_orders().await
    }

    async fn insert_orders(&self, orders: Vec<NewOrder>) -> Result<Vec<Order>, StoreError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.0.insert_orders(orders).await
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        self.0.set_status(id, status).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        self.0.delete_order(id).await
    }
}

#[tokio::test]
async fn test_empty_collection_is_coming_soon() {
    let app = TestApp::spawn().await;

    let html = app.get_html("/women").await;

    assert!(html.contains("Collection Coming Soon"));
    assert!(html.contains("We are currently updating our seasonal inventory."));
    assert!(!html.contains("product-card"));
}

#[tokio::test]
async fn test_collection_only_lists_its_category() {
    let app = TestApp::spawn().await;
    app.seed_product("Silk Kurta", 4500, Category::Men, &[Size::M, Size::L])
        .await;
    app.seed_product("Lawn Suit", 3200, Category::Women, &[Size::S])
        .await;

    let men = app.get_html("/men").await;
    assert!(men.contains("Silk Kurta"));
    assert!(men.contains("PKR 4,500"));
    assert!(!men.contains("Lawn Suit"));

    let women = app.get_html("/women").await;
    assert!(women.contains("Lawn Suit"));
    assert!(!women.contains("Silk Kurta"));
}

#[tokio::test]
async fn test_size_selector_offers_only_product_sizes() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 4500, Category::Men, &[Size::M, Size::L])
        .await;

    let html = app
        .get_html(&format!("/men?select={}", kurta.product_id))
        .await;

    assert!(html.contains("Select Size"));
    assert_eq!(field_values(&html, "size"), vec!["M", "L"]);
}

#[tokio::test]
async fn test_bag_to_checkout() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M, Size::L])
        .await;

    let response = app.add_to_bag(&kurta, Size::M).await;
    assert_eq!(location(&response), "/men");
    let response = app.add_to_bag(&kurta, Size::L).await;
    assert_eq!(location(&response), "/men");

    let html = app.get_html("/men?bag=open").await;
    assert!(html.contains("Your Bag"));
    assert!(html.contains(r#"<span class="bag-count">2</span>"#));
    assert!(html.contains("PKR 5,000"));

    let response = app
        .post_form(
            "/checkout",
            &[
                ("category", "Men"),
                ("name", "Ayesha Khan"),
                ("phone", "03001234567"),
                ("address", "12 Main Boulevard, Gulberg"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/men");

    let orders = app.store.orders().await;
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.status == OrderStatus::Pending));
    assert!(orders.iter().all(|o| o.customer_name == "Ayesha Khan"));
    assert!(orders.iter().all(|o| o.product_id == kurta.product_id));
    let sizes: Vec<&str> = orders.iter().map(|o| o.size.as_str()).collect();
    assert_eq!(sizes, vec!["M", "L"]);

    let html = app.get_html("/men?bag=open").await;
    assert!(html.contains("Order Placed Successfully!"));
    assert!(!html.contains("Your Bag"));
    assert!(!html.contains("bag-count"));
}

#[tokio::test]
async fn test_invalid_checkout_keeps_bag_and_form() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    app.add_to_bag(&kurta, Size::M).await;

    let response = app
        .post_form(
            "/checkout",
            &[
                ("category", "Men"),
                ("name", "  "),
                ("phone", "03001234567"),
                ("address", "Gulberg"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Error: "));
    assert!(html.contains("Your Bag"));
    assert!(html.contains(r#"value="03001234567""#));
    assert!(app.store.orders().await.is_empty());
}

#[tokio::test]
async fn test_checkout_with_empty_bag_places_nothing() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/checkout",
            &[
                ("category", "Women"),
                ("name", "Ayesha"),
                ("phone", "0300"),
                ("address", "Lahore"),
            ],
        )
        .await;

    assert_eq!(location(&response), "/women");
    assert!(app.store.orders().await.is_empty());
}

#[tokio::test]
async fn test_unavailable_size_is_refused() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;

    let response = app.add_to_bag(&kurta, Size::XS).await;
    assert_eq!(location(&response), "/men");

    let html = app.get_html("/men").await;
    assert!(html.contains("flash-error"));
    assert!(!html.contains("bag-count"));
}

#[tokio::test]
async fn test_remove_from_bag() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M, Size::L])
        .await;
    app.add_to_bag(&kurta, Size::M).await;
    app.add_to_bag(&kurta, Size::L).await;

    let html = app.get_html("/men?bag=open").await;
    let temp_ids = field_values(&html, "temp_id");
    assert_eq!(temp_ids.len(), 2);

    let response = app
        .post_form(
            "/bag/remove",
            &[("temp_id", temp_ids[0].as_str()), ("category", "Men")],
        )
        .await;
    assert_eq!(location(&response), "/men?bag=open");

    let html = app.get_html("/men?bag=open").await;
    assert_eq!(field_values(&html, "temp_id"), vec![temp_ids[1].clone()]);

    let response = app
        .post_form(
            "/bag/remove",
            &[("temp_id", temp_ids[1].as_str()), ("category", "Men")],
        )
        .await;
    assert_eq!(location(&response), "/men");
}

#[tokio::test]
async fn test_bags_are_per_visitor() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    app.add_to_bag(&kurta, Size::M).await;

    let other = app.new_visitor();
    let html = other
        .get(app.url("/men?bag=open"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!html.contains("bag-count"));
    assert!(!html.contains("Your Bag"));
}

#[tokio::test]
async fn test_store_outage_serves_last_listing() {
    let app = TestApp::spawn().await;
    app.seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    assert!(app.get_html("/men").await.contains("Silk Kurta"));

    app.store.set_unavailable(true);

    let men = app.get_html("/men").await;
    assert!(men.contains("Silk Kurta"));
    let women = app.get_html("/women").await;
    assert!(women.contains("Collection Coming Soon"));
}

#[tokio::test]
async fn test_checkout_reports_store_failure() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    app.add_to_bag(&kurta, Size::M).await;
    app.store.set_unavailable(true);

    let response = app
        .post_form(
            "/checkout",
            &[
                ("category", "Men"),
                ("name", "Ayesha"),
                ("phone", "0300"),
                ("address", "Lahore"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Error: "));
    assert!(html.contains("bag-count"));
}

#[tokio::test]
async fn test_double_submitted_first_checkout_places_one_order() {
    let store = InMemoryBackend::new("http://127.0.0.1/uploads");
    let backends = Backends {
        orders: Arc::new(SlowOrders(store.clone())),
        ..Backends::in_memory(store.clone())
    };
    let app = TestApp::spawn_with(store, backends).await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    app.add_to_bag(&kurta, Size::M).await;

    let (first, second) = tokio::join!(
        app.post_form("/checkout", &CHECKOUT_FORM),
        app.post_form("/checkout", &CHECKOUT_FORM),
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 303]);

    let rejected = if first.status() == StatusCode::OK { first } else { second };
    let html = rejected.text().await.unwrap();
    assert!(html.contains("Error: an order is already being placed"));

    assert_eq!(app.store.orders().await.len(), 1);
}

#[tokio::test]
async fn test_bag_survives_restart() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M, Size::L])
        .await;
    app.add_to_bag(&kurta, Size::L).await;

    let restarted = app.restart().await;

    let html = restarted.get_html("/men?bag=open").await;
    assert!(html.contains("Your Bag"));
    assert!(html.contains(r#"<span class="bag-count">1</span>"#));
    assert!(html.contains("PKR 2,500"));

    let response = restarted.post_form("/checkout", &CHECKOUT_FORM).await;
    assert_eq!(location(&response), "/men");
    let orders = restarted.store.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].size, "L");
}
