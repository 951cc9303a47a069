mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;

fn address(name: &str, pincode: &str) -> Value {
    json!({
        "type": "work",
        "name": name,
        "phone": "9876543210",
        "line1": "4th Floor, Tech Park",
        "city": "Bengaluru",
        "state": "Karnataka",
        "pincode": pincode
    })
}

fn defaults(list: &Value) -> Vec<String> {
    list["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|a| a["is_default"] == true)
                .filter_map(|a| a["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn first_address_becomes_default() -> Result<()> {
    let app = TestApp::new();
    let token = app.customer("home@example.com").await?;

    let (status, body) = app.post("/api/user/addresses", Some(&token), address("Office", "560001")).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_default"], true);
    assert_eq!(body["data"]["type"], "work");

    let (_, body) = app.post("/api/user/addresses", Some(&token), address("Parents", "560002")).await?;
    assert_eq!(body["data"]["is_default"], false);

    let mut flagged = address("Flat", "560003");
    flagged["is_default"] = json!(true);
    app.post("/api/user/addresses", Some(&token), flagged).await?;

    let (_, list) = app.get("/api/user/addresses", Some(&token)).await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(3));
    assert_eq!(defaults(&list), vec!["Flat"]);
    Ok(())
}

#[tokio::test]
async fn validation_reports_every_bad_field() -> Result<()> {
    let app = TestApp::new();
    let token = app.customer("typo@example.com").await?;

    let (status, body) = app
        .post(
            "/api/user/addresses",
            Some(&token),
            json!({ "name": "Asha", "line1": "12 MG Road", "city": "Pune", "pincode": "4110" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["phone"].is_string());
    assert!(body["field_errors"]["state"].is_string());
    assert_eq!(body["field_errors"]["pincode"], "Pincode must be 6 digits");
    assert!(body["field_errors"].get("name").is_none());
    Ok(())
}

#[tokio::test]
async fn default_moves_and_survives_deletion() -> Result<()> {
    let app = TestApp::new();
    let token = app.customer("mover@example.com").await?;

    let (_, first) = app.post("/api/user/addresses", Some(&token), address("First", "560001")).await?;
    let (_, second) = app.post("/api/user/addresses", Some(&token), address("Second", "560002")).await?;
    app.post("/api/user/addresses", Some(&token), address("Third", "560003")).await?;
    let second_id = second["data"]["id"].as_str().unwrap_or_default().to_string();
    let first_id = first["data"]["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = app
        .request(Method::PUT, &format!("/api/user/addresses/{}/default", second_id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_default"], true);
    let (_, list) = app.get("/api/user/addresses", Some(&token)).await?;
    assert_eq!(defaults(&list), vec!["Second"]);

    // Clearing the flag on the default is ignored
    let mut edited = address("Second (new)", "560009");
    edited["is_default"] = json!(false);
    let (status, body) = app
        .put(&format!("/api/user/addresses/{}", second_id), Some(&token), edited)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pincode"], "560009");
    assert_eq!(body["data"]["is_default"], true);

    let (status, _) = app.delete(&format!("/api/user/addresses/{}", second_id), Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = app.get("/api/user/addresses", Some(&token)).await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(defaults(&list), vec!["First"]);

    app.delete(&format!("/api/user/addresses/{}", first_id), Some(&token)).await?;
    let (_, list) = app.get("/api/user/addresses", Some(&token)).await?;
    assert_eq!(defaults(&list), vec!["Third"]);
    Ok(())
}

#[tokio::test]
async fn other_users_addresses_are_not_found() -> Result<()> {
    let app = TestApp::new();
    let owner = app.customer("owner@example.com").await?;
    let intruder = app.customer("intruder@example.com").await?;
    let (_, created) = app.post("/api/user/addresses", Some(&owner), address("Mine", "560001")).await?;
    let id = created["data"]["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = app
        .put(&format!("/api/user/addresses/{}", id), Some(&intruder), address("Stolen", "560001"))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/user/addresses/{}", id), Some(&intruder)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get("/api/user/addresses", Some(&intruder)).await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}
