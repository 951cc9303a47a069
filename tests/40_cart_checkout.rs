mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{box_body, TestApp};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn quote_prices_arbitrary_lines() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/pricing/quote", None, json!({ "items": [{ "unit_price": 299, "quantity": 1 }] }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subtotal"].as_f64(), Some(299.0));
    assert_eq!(body["data"]["shipping"].as_f64(), Some(50.0));
    assert_eq!(body["data"]["tax"].as_f64(), Some(14.95));
    assert_eq!(body["data"]["total"].as_f64(), Some(363.95));

    let (_, body) = app
        .post(
            "/api/pricing/quote",
            None,
            json!({ "items": [{ "unit_price": 299, "quantity": 1 }], "coupon_code": "FLAT100", "delivery": "express" }),
        )
        .await?;
    assert_eq!(body["data"]["shipping"].as_f64(), Some(150.0));
    assert_eq!(body["data"]["discount"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["total"].as_f64(), Some(363.95));

    let (status, body) = app
        .post("/api/pricing/quote", None, json!({ "items": [], "coupon_code": "NOPE" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (_, body) = app.post("/api/pricing/quote", None, json!({})).await?;
    assert_eq!(body["data"]["total"].as_f64(), Some(0.0));

    let (status, body) = app
        .post("/api/pricing/quote", None, json!({ "items": [{ "unit_price": 7e28, "quantity": 4000000000u64 }] }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .post(
            "/api/pricing/quote",
            None,
            json!({ "items": [{ "unit_price": -50, "quantity": 1 }, { "unit_price": 299, "quantity": 1 }], "coupon_code": "FLAT100" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn cart_tracks_lines_and_coupon() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    let classic = app.create_box(&admin, box_body("Classic Birthday", 599.0, 5)).await?;
    let token = app.customer("cart@example.com").await?;

    let (status, body) = app.get("/api/user/cart", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["data"]["summary"]["shipping"].as_f64(), Some(0.0));

    let (status, _) = app.post("/api/user/cart/items", Some(&token), json!({ "box_id": id_of(&classic) })).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .post("/api/user/cart/items", Some(&token), json!({ "box_id": id_of(&classic), "quantity": 1 }))
        .await?;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["items"][0]["quantity"], 2);
    assert_eq!(body["data"]["summary"]["subtotal"].as_f64(), Some(1198.0));
    assert_eq!(body["data"]["summary"]["shipping"].as_f64(), Some(0.0));

    let (status, body) = app.post("/api/user/cart/coupon", Some(&token), json!({ "code": "WELCOME10" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["coupon_code"], "WELCOME10");
    assert_eq!(body["data"]["summary"]["discount"].as_f64(), Some(119.8));
    assert_eq!(body["data"]["summary"]["tax"].as_f64(), Some(59.9));
    assert_eq!(body["data"]["summary"]["total"].as_f64(), Some(1138.1));

    let (_, body) = app.get("/api/user/cart?delivery=express", Some(&token)).await?;
    assert_eq!(body["data"]["summary"]["shipping"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["summary"]["total"].as_f64(), Some(1238.1));

    let (status, _) = app.post("/api/user/cart/coupon", Some(&token), json!({ "code": "welcome10" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.delete("/api/user/cart/coupon", Some(&token)).await?;
    assert!(body["data"]["coupon_code"].is_null());
    assert_eq!(body["data"]["summary"]["discount"].as_f64(), Some(0.0));

    let item_id = body["data"]["items"][0]["item_id"].as_str().unwrap_or_default().to_string();
    let (status, _) = app
        .put(&format!("/api/user/cart/items/{}", item_id), Some(&token), json!({ "quantity": 0 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .put(&format!("/api/user/cart/items/{}", item_id), Some(&token), json!({ "quantity": 6 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = app
        .put(&format!("/api/user/cart/items/{}", item_id), Some(&token), json!({ "quantity": 5 }))
        .await?;
    assert_eq!(body["data"]["summary"]["totalQuantity"], 5);

    let (status, _) = app
        .delete(&format!("/api/user/cart/items/{}", uuid::Uuid::now_v7()), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.delete(&format!("/api/user/cart/items/{}", item_id), Some(&token)).await?;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn adding_more_than_stock_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    let scarce = app.create_box(&admin, box_body("Pamper Me Box", 899.0, 2)).await?;
    let token = app.customer("scarce@example.com").await?;

    let (status, body) = app
        .post("/api/user/cart/items", Some(&token), json!({ "box_id": id_of(&scarce), "quantity": 3 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("Pamper Me Box")));

    let (status, _) = app
        .post("/api/user/cart/items", Some(&token), json!({ "box_id": uuid::Uuid::now_v7() }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn checkout_places_order_and_empties_cart() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    let classic = app.create_box(&admin, box_body("Classic Birthday", 599.0, 5)).await?;
    let token = app.customer("buyer@example.com").await?;
    let address = app.create_address(&token).await?;

    app.post("/api/user/cart/items", Some(&token), json!({ "box_id": id_of(&classic), "quantity": 2 }))
        .await?;
    app.post("/api/user/cart/coupon", Some(&token), json!({ "code": "WELCOME10" })).await?;

    let (status, body) = app
        .post(
            "/api/user/checkout",
            Some(&token),
            json!({ "shipping_address_id": id_of(&address), "payment_method": "upi" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "checkout failed: {}", body);
    let order = &body["data"];
    assert!(order["order_number"].as_str().is_some_and(|n| n.starts_with("ST-")));
    assert!(order["tracking_number"].as_str().is_some_and(|n| n.starts_with("TRK")));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["timeline"].as_array().map(Vec::len), Some(1));
    assert_eq!(order["coupon_code"], "WELCOME10");
    assert_eq!(order["summary"]["total"].as_f64(), Some(1138.1));
    assert_eq!(order["items"][0]["unit_price"].as_f64(), Some(599.0));
    assert_eq!(order["shipping_address"]["city"], "Pune");
    assert_eq!(order["billing_address"]["pincode"], "411001");

    let (_, body) = app.get("/api/user/cart", Some(&token)).await?;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert!(body["data"]["coupon_code"].is_null());

    let (_, body) = app.get(&format!("/api/admin/boxes/{}", id_of(&classic)), Some(&admin)).await?;
    assert_eq!(body["data"]["stock"], 3);

    let (_, body) = app.get("/api/user/orders", Some(&token)).await?;
    assert_eq!(body["data"]["total"], 1);

    // Later price changes leave the placed order alone
    app.put(&format!("/api/admin/boxes/{}", id_of(&classic)), Some(&admin), json!({ "price": 999 }))
        .await?;
    let order_id = id_of(order);
    let (_, body) = app.get(&format!("/api/user/orders/{}", order_id), Some(&token)).await?;
    assert_eq!(body["data"]["items"][0]["unit_price"].as_f64(), Some(599.0));
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_bad_carts_and_addresses() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    let classic = app.create_box(&admin, box_body("Classic Birthday", 599.0, 5)).await?;
    let token = app.customer("careful@example.com").await?;
    let other = app.customer("other@example.com").await?;
    let foreign = app.create_address(&other).await?;

    let checkout = json!({ "shipping_address_id": id_of(&foreign), "payment_method": "cod" });

    let (status, body) = app.post("/api/user/checkout", Some(&token), checkout.clone()).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    app.post("/api/user/cart/items", Some(&token), json!({ "box_id": id_of(&classic), "quantity": 2 }))
        .await?;
    let (status, _) = app.post("/api/user/checkout", Some(&token), checkout).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Stock drops under the cart quantity before checkout
    app.put(&format!("/api/admin/boxes/{}", id_of(&classic)), Some(&admin), json!({ "stock": 1 }))
        .await?;
    let own = app.create_address(&token).await?;
    let (status, _) = app
        .post(
            "/api/user/checkout",
            Some(&token),
            json!({ "shipping_address_id": id_of(&own), "payment_method": "cod" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/admin/boxes/{}", id_of(&classic)), Some(&admin)).await?;
    assert_eq!(body["data"]["stock"], 1);
    let (_, body) = app.get("/api/user/cart", Some(&token)).await?;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    Ok(())
}
