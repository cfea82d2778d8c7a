mod common;

use anyhow::Result;
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde_json::{json, Value};

use common::TestServer;

async fn create_category(server: &TestServer, bearer: &str, name: &str) -> Result<String> {
    let res = server
        .post("/api/categories")
        .header(AUTHORIZATION, bearer)
        .json(&json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "category {} failed: {}", name, res.status());
    let body = res.json::<Value>().await?;
    Ok(body["data"]["id"].as_str().unwrap_or_default().to_string())
}

async fn create_product(server: &TestServer, bearer: &str, body: Value) -> Result<Value> {
    let res = server
        .post("/api/products")
        .header(AUTHORIZATION, bearer)
        .json(&body)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "product failed: {}", res.status());
    Ok(res.json::<Value>().await?["data"].clone())
}

#[tokio::test]
async fn only_admins_manage_categories() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user("olga@example.com").await?;
    let admin = server.admin("root@example.com").await?;

    let res = server
        .post("/api/categories")
        .header(AUTHORIZATION, &user)
        .json(&json!({ "name": "Bikes" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let id = create_category(&server, &admin, "Bikes").await?;

    let res = server.get("/api/categories").header(AUTHORIZATION, &user).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"][0]["name"], "Bikes");

    let path = format!("/api/categories/{}", id);
    let res = server.delete(&path).header(AUTHORIZATION, &user).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = server.delete(&path).header(AUTHORIZATION, &admin).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn seller_lists_and_filters_products() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin("root@example.com").await?;
    let seller = server.user("pablo@example.com").await?;
    let bikes = create_category(&server, &admin, "Bikes").await?;

    let bike = create_product(
        &server,
        &seller,
        json!({ "name": "Road bike", "price": "250.00", "category_id": bikes }),
    )
    .await?;
    create_product(&server, &seller, json!({ "name": "Lamp", "price": 12 })).await?;

    let me = server.get("/api/accounts/me").header(AUTHORIZATION, &seller).send().await?;
    let me = me.json::<Value>().await?;
    assert_eq!(bike["seller_id"], me["data"]["id"]);

    let res = server.get("/api/products").header(AUTHORIZATION, &seller).send().await?;
    assert_eq!(res.json::<Value>().await?["data"].as_array().map(Vec::len), Some(2));

    let res = server
        .get(&format!("/api/products?category={}", bikes))
        .header(AUTHORIZATION, &seller)
        .send()
        .await?;
    let listed = res.json::<Value>().await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed["data"][0]["name"], "Road bike");

    Ok(())
}

#[tokio::test]
async fn product_validation_and_references() -> Result<()> {
    let server = TestServer::spawn().await?;
    let seller = server.user("quinn@example.com").await?;

    let res = server
        .post("/api/products")
        .header(AUTHORIZATION, &seller)
        .json(&json!({ "name": "", "price": "-1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["price"].is_string());

    let res = server
        .post("/api/products")
        .header(AUTHORIZATION, &seller)
        .json(&json!({ "name": "Kettle", "price": "5.00", "category_id": uuid::Uuid::new_v4() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .get(&format!("/api/products/{}", uuid::Uuid::new_v4()))
        .header(AUTHORIZATION, &seller)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn only_the_seller_edits_and_admin_may_delete() -> Result<()> {
    let server = TestServer::spawn().await?;
    let seller = server.user("rosa@example.com").await?;
    let other = server.user("sam@example.com").await?;
    let admin = server.admin("root@example.com").await?;

    let product = create_product(&server, &seller, json!({ "name": "Sofa", "price": "80.00" })).await?;
    let path = format!("/api/products/{}", product["id"].as_str().unwrap_or_default());
    let update = json!({ "name": "Sofa (blue)", "price": "75.50" });

    let res = server.put(&path).header(AUTHORIZATION, &other).json(&update).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.put(&path).header(AUTHORIZATION, &seller).json(&update).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["name"], "Sofa (blue)");
    assert_eq!(body["data"]["price"], "75.50");

    let res = server.delete(&path).header(AUTHORIZATION, &other).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.delete(&path).header(AUTHORIZATION, &admin).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get(&path).header(AUTHORIZATION, &seller).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn deleting_category_keeps_its_products() -> Result<()> {
    let server = TestServer::spawn().await?;
    let admin = server.admin("root@example.com").await?;
    let seller = server.user("tara@example.com").await?;
    let books = create_category(&server, &admin, "Books").await?;

    let product = create_product(
        &server,
        &seller,
        json!({ "name": "Atlas", "price": "9.99", "category_id": books }),
    )
    .await?;

    let res = server
        .delete(&format!("/api/categories/{}", books))
        .header(AUTHORIZATION, &admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let path = format!("/api/products/{}", product["id"].as_str().unwrap_or_default());
    let res = server.get(&path).header(AUTHORIZATION, &seller).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await?["data"]["category_id"].is_null());

    Ok(())
}

#[tokio::test]
async fn bad_ids_and_filters_get_json_errors() -> Result<()> {
    let server = TestServer::spawn().await?;
    let seller = server.user("uma@example.com").await?;
    let admin = server.admin("root@example.com").await?;

    let requests = vec![
        ("product id", server.get("/api/products/not-a-uuid").header(AUTHORIZATION, &seller)),
        ("category filter", server.get("/api/products?category=nope").header(AUTHORIZATION, &seller)),
        ("category id", server.delete("/api/categories/123").header(AUTHORIZATION, &admin)),
    ];

    for (name, request) in requests {
        let res = request.send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{name}");
        let content_type = res
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"), "{name}: {content_type}");

        let body = res.json::<Value>().await?;
        assert_eq!(body["error"], true, "{name}");
        assert_eq!(body["code"], "BAD_REQUEST", "{name}");
        assert!(body["message"].is_string(), "{name}");
    }

    Ok(())
}
