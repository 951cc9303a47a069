mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{box_body, TestApp};

fn application(handle: &str, email: &str, followers: u64) -> Value {
    json!({
        "name": format!("Creator {}", handle),
        "handle": handle,
        "email": email,
        "platform": "instagram",
        "followers_number": followers,
        "engagement_rate": 4.2,
        "category": "lifestyle"
    })
}

#[tokio::test]
async fn public_applications_start_pending() -> Result<()> {
    let app = TestApp::new();

    let mut body = application("@gifting.guru", "Guru@Example.com", 12000);
    body["status"] = json!("active");
    let (status, created) = app.post("/api/influencers", None, body).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "pending");
    assert_eq!(created["data"]["email"], "guru@example.com");
    assert_eq!(created["data"]["engagement_rate"].as_f64(), Some(4.2));

    let (status, _) = app
        .post("/api/influencers", None, application("@copycat", "guru@example.com", 10))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut bad = application("@overrated", "over@example.com", 10);
    bad["engagement_rate"] = json!(140);
    let (status, _) = app.post("/api/influencers", None, bad).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/influencers", None, json!({ "name": "No Handle", "email": "nh@example.com", "platform": "youtube" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["handle"], "This field is required");
    Ok(())
}

#[tokio::test]
async fn admin_lists_with_status_counts() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    app.post("/api/influencers", None, application("@small", "small@example.com", 800)).await?;
    let (status, created) = app
        .post("/api/admin/influencers", Some(&admin), application("@big", "big@example.com", 250000))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "active");

    let (status, body) = app.get("/api/admin/influencers?sort=followers", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["handle"], "@big");
    assert_eq!(body["data"]["counts"]["pending"], 1);
    assert_eq!(body["data"]["counts"]["active"], 1);
    assert_eq!(body["data"]["counts"]["rejected"], 0);

    let (_, body) = app.get("/api/admin/influencers?status=pending", Some(&admin)).await?;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["handle"], "@small");

    let (_, body) = app.get("/api/admin/influencers?search=big", Some(&admin)).await?;
    assert_eq!(body["data"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn admin_updates_and_removes_influencers() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    let (_, created) = app
        .post("/api/influencers", None, application("@reviewme", "review@example.com", 5000))
        .await?;
    let id = created["data"]["id"].as_str().unwrap_or_default().to_string();
    let path = format!("/api/admin/influencers/{}", id);

    let (status, body) = app
        .put(&path, Some(&admin), json!({ "status": "active", "commission_rate": 12.5, "total_sales": 15999 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["commission_rate"].as_f64(), Some(12.5));
    assert_eq!(body["data"]["total_sales"].as_f64(), Some(15999.0));
    assert_eq!(body["data"]["handle"], "@reviewme");

    let (status, _) = app.put(&path, Some(&admin), json!({ "commission_rate": -3 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&path, Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&path, Some(&admin)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn dashboard_aggregates_store_activity() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin().await?;
    let hot = app.create_box(&admin, box_body("Classic Birthday", 599.0, 10)).await?;
    app.create_box(&admin, box_body("Pamper Me Box", 899.0, 4)).await?;
    let token = app.customer("shopper@example.com").await?;
    let address = app.create_address(&token).await?;

    app.post("/api/user/cart/items", Some(&token), json!({ "box_id": hot["id"], "quantity": 2 }))
        .await?;
    let (status, placed) = app
        .post(
            "/api/user/checkout",
            Some(&token),
            json!({ "shipping_address_id": address["id"], "payment_method": "cod" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    app.post("/api/user/support", Some(&token), json!({ "subject": "Gift note", "description": "Add a note", "category": "order" }))
        .await?;
    app.post("/api/influencers", None, application("@fan", "fan@example.com", 100)).await?;

    let (status, body) = app.get("/api/admin/analytics", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["total_orders"], 1);
    assert_eq!(stats["total_revenue"], placed["data"]["summary"]["total"]);
    assert_eq!(stats["orders_by_status"]["pending"], 1);
    assert_eq!(stats["total_customers"], 1);
    assert_eq!(stats["active_boxes"], 2);
    assert_eq!(stats["low_stock_boxes"][0]["name"], "Pamper Me Box");
    assert_eq!(stats["open_tickets"], 1);
    assert_eq!(stats["influencers_by_status"]["pending"], 1);
    assert_eq!(stats["top_boxes"][0]["units_sold"], 2);
    Ok(())
}
