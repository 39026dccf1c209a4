//! Admin sign-in, inventory entry, and order management.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use thread_hanger_core::{Category, OrderStatus, Size};
use thread_hanger_integration_tests::{ADMIN_EMAIL, TestApp, location};

fn product_form(name: &str, price: &str, sizes: &[&str], image: bool) -> Form {
    let mut form = Form::new()
        .text("name", name.to_owned())
        .text("price", price.to_owned())
        .text("category", "Women");
    for size in sizes {
        form = form.text("sizes", (*size).to_owned());
    }
    if image {
        let part = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
            .file_name("lawn suit.jpg")
            .mime_str("image/jpeg")
            .unwrap();
        form = form.part("image", part);
    }
    form
}

async fn place_order(app: &TestApp) {
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    app.add_to_bag(&kurta, Size::M).await;
    let response = app
        .post_form(
            "/checkout",
            &[
                ("category", "Men"),
                ("name", "Bilal Ahmed"),
                ("phone", "03111234567"),
                ("address", "DHA Phase 5"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/men");
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let app = TestApp::spawn().await;

    for path in ["/admin", "/admin?panel=pending", "/admin/products/1/delete"] {
        let response = app.get(path).await;
        assert_eq!(location(&response), "/", "GET {path}");
    }

    let response = app
        .post_form("/admin/orders/1/complete", &[])
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_failed_login_shows_one_message() {
    let app = TestApp::spawn().await;

    let response = app.login(ADMIN_EMAIL, "wrong password").await;
    assert_eq!(location(&response), "/?login=open");
    let html = app.get_html("/?login=open").await;
    assert!(html.contains("Invalid Admin Credentials"));

    let response = app.login("someone@else.pk", "whatever").await;
    assert_eq!(location(&response), "/?login=open");
    let html = app.get_html("/").await;
    assert!(html.contains("Invalid Admin Credentials"));

    // Shown once.
    let html = app.get_html("/").await;
    assert!(!html.contains("Invalid Admin Credentials"));

    assert_eq!(location(&app.get("/admin").await), "/");
}

#[tokio::test]
async fn test_login_then_logout() {
    let app = TestApp::spawn().await;
    app.login_as_admin().await;

    let html = app.get_html("/admin").await;
    assert!(html.contains("Inventory Items"));
    assert!(html.contains(ADMIN_EMAIL));

    let response = app.post_form("/admin/logout", &[]).await;
    assert_eq!(location(&response), "/");
    assert_eq!(location(&app.get("/admin").await), "/");
}

#[tokio::test]
async fn test_inventory_entry_creates_product() {
    let app = TestApp::spawn().await;
    app.login_as_admin().await;
    assert!(app.get_html("/women").await.contains("Collection Coming Soon"));

    let response = app
        .client
        .post(app.url("/admin/products"))
        .multipart(product_form("Lawn Suit", "3200", &["S", "M"], true))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin");

    let html = app.get_html("/admin").await;
    assert!(html.contains("Synced to Boutique!"));

    let products = app.store.products().await;
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.name, "Lawn Suit");
    assert_eq!(product.category, Category::Women);
    assert_eq!(product.sizes.as_slice(), &[Size::S, Size::M]);
    assert!(product.image_url.starts_with("http://127.0.0.1/uploads/"));

    // The storefront sees it right away.
    let women = app.get_html("/women").await;
    assert!(women.contains("Lawn Suit"));
    assert!(women.contains("PKR 3,200"));
}

#[tokio::test]
async fn test_inventory_entry_validation() {
    let app = TestApp::spawn().await;
    app.login_as_admin().await;

    let cases = [
        (product_form("Lawn Suit", "3200", &["S"], false), "Select an image!"),
        (product_form("Lawn Suit", "3200", &[], true), "Select at least one size!"),
        (product_form("Lawn Suit", "12.5", &["S"], true), "Price must be a whole number"),
    ];

    for (form, message) in cases {
        let response = app
            .client
            .post(app.url("/admin/products"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(location(&response), "/admin");
        assert!(app.get_html("/admin").await.contains(message), "{message}");
    }

    assert!(app.store.products().await.is_empty());
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = TestApp::spawn().await;
    place_order(&app).await;
    app.login_as_admin().await;

    let html = app.get_html("/admin?panel=pending").await;
    assert!(html.contains("PENDING"));
    assert!(html.contains("Bilal Ahmed"));
    assert!(html.contains("Silk Kurta"));

    let order = app.store.orders().await.remove(0);
    let response = app
        .post_form(&format!("/admin/orders/{}/complete", order.id), &[])
        .await;
    assert_eq!(location(&response), "/admin?panel=pending");
    assert_eq!(
        app.store.orders().await[0].status,
        OrderStatus::Verified
    );

    let html = app.get_html("/admin?panel=completed").await;
    assert!(html.contains("Bilal Ahmed"));

    let confirm = app
        .get_html(&format!("/admin/orders/{}/delete", order.id))
        .await;
    assert!(confirm.contains("Delete this order record permanently?"));

    let path = format!("/admin/orders/{}/delete", order.id);
    app.post_form(&path, &[("confirm", "no")]).await;
    assert_eq!(app.store.orders().await.len(), 1);

    app.post_form(&path, &[("confirm", "yes")]).await;
    assert!(app.store.orders().await.is_empty());
}

#[tokio::test]
async fn test_product_with_orders_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    place_order(&app).await;
    app.login_as_admin().await;
    let product = app.store.products().await.remove(0);

    let response = app
        .post_form(
            &format!("/admin/products/{}/delete", product.product_id),
            &[("confirm", "yes")],
        )
        .await;
    assert_eq!(location(&response), "/admin?panel=inventory");

    let html = app.get_html("/admin?panel=inventory").await;
    assert!(html.contains("Delete failed: "));
    assert_eq!(app.store.products().await.len(), 1);
}

#[tokio::test]
async fn test_delete_product() {
    let app = TestApp::spawn().await;
    let kurta = app
        .seed_product("Silk Kurta", 2500, Category::Men, &[Size::M])
        .await;
    assert!(app.get_html("/men").await.contains("Silk Kurta"));
    app.login_as_admin().await;

    let confirm = app
        .get_html(&format!("/admin/products/{}/delete", kurta.product_id))
        .await;
    assert!(confirm.contains("Delete this product permanently?"));

    app.post_form(
        &format!("/admin/products/{}/delete", kurta.product_id),
        &[("confirm", "yes")],
    )
    .await;

    assert!(app.store.products().await.is_empty());
    assert!(app.get_html("/men").await.contains("Collection Coming Soon"));
}

#[tokio::test]
async fn test_dashboard_survives_store_outage() {
    let app = TestApp::spawn().await;
    app.login_as_admin().await;
    app.store.set_unavailable(true);

    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Error: "));
    assert!(html.contains("Sync to Boutique"));
}
