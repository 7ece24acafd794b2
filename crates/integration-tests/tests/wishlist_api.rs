//! HTTP-level tests for the store wishlist routes.
//!
//! Run with: cargo test -p wishlist-integration-tests

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use wishlist_integration_tests::{
    EMPTY_PUBLISHABLE_KEY, TestContext, channel, customer, json_body, store_request, variant,
};
use wishlist_server::middleware::PUBLISHABLE_KEY_HEADER;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let live = ctx
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(live.status, StatusCode::OK);

    let ready = ctx
        .send(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let ctx = TestContext::new();

    let response = ctx
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["cache-control"], "no-store, max-age=0");
}

// ============================================================================
// Authentication and sales channel
// ============================================================================

#[tokio::test]
async fn test_add_item_requires_session() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", None)
                .header("content-type", "application/json")
                .body(json_body(&json!({ "variant_id": "variant_red" })))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["type"], "unauthorized");
    assert_eq!(response.body["message"], "Authentication required");
}

#[tokio::test]
async fn test_read_and_remove_require_session() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;
    let item_id = add_and_get_item_id(&ctx, &cookie, "variant_red").await;

    let read = ctx
        .send(store_request("GET", "/store/wishlist", None).body(Body::empty()).unwrap())
        .await;
    assert_eq!(read.status, StatusCode::UNAUTHORIZED);
    assert_eq!(read.body["type"], "unauthorized");

    let remove = ctx
        .send(
            store_request("DELETE", &format!("/store/wishlist/{item_id}"), None)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(remove.status, StatusCode::UNAUTHORIZED);
    assert_eq!(remove.body["type"], "unauthorized");

    let contents = ctx.service.get_wishlist(&customer("cus_alice"), &channel()).await.unwrap();
    assert_eq!(contents.items.len(), 1);
}

#[tokio::test]
async fn test_missing_publishable_key_is_rejected() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            Request::get("/store/wishlist")
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "invalid_data");
}

#[tokio::test]
async fn test_publishable_key_without_channel_is_rejected() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            Request::get("/store/wishlist")
                .header("cookie", cookie)
                .header(PUBLISHABLE_KEY_HEADER, EMPTY_PUBLISHABLE_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .starts_with("At least one sales channel ID is required")
    );
}

// ============================================================================
// Add item
// ============================================================================

#[tokio::test]
async fn test_add_item_returns_wishlist() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", Some(&cookie))
                .header("content-type", "application/json")
                .body(json_body(&json!({ "variant_id": "variant_red" })))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let wishlist = &response.body["wishlist"];
    assert_eq!(wishlist["customer_id"], "cus_alice");
    assert_eq!(wishlist["sales_channel_id"], "sc_default");
    assert_eq!(wishlist["title"], "My Wishlist");
}

#[tokio::test]
async fn test_add_item_without_variant_id() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", Some(&cookie))
                .header("content-type", "application/json")
                .body(json_body(&json!({})))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "invalid_data");
    assert_eq!(response.body["message"], "variant_id is required");
}

#[tokio::test]
async fn test_add_item_malformed_body() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", Some(&cookie))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "invalid_data");
}

#[tokio::test]
async fn test_add_unknown_variant() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", Some(&cookie))
                .header("content-type", "application/json")
                .body(json_body(&json!({ "variant_id": "variant_missing" })))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["type"], "not_found");
    assert_eq!(
        response.body["message"],
        "Product variant with id variant_missing not found"
    );
}

#[tokio::test]
async fn test_add_item_store_failure_is_500_and_rolled_back() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;
    ctx.store.fail_item_writes(true);

    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", Some(&cookie))
                .header("content-type", "application/json")
                .body(json_body(&json!({ "variant_id": "variant_red" })))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["type"], "unexpected_state");
    assert!(ctx.store.inner.all_wishlists().iter().all(|w| w.is_deleted()));
}

// ============================================================================
// Read
// ============================================================================

#[tokio::test]
async fn test_get_wishlist_before_first_add() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            store_request("GET", "/store/wishlist", Some(&cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "wishlist": null, "items": [] }));
}

#[tokio::test]
async fn test_get_wishlist_enriches_items() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    for id in ["variant_red", "variant_blue"] {
        let response = ctx
            .send(
                store_request("POST", "/store/wishlist", Some(&cookie))
                    .header("content-type", "application/json")
                    .body(json_body(&json!({ "variant_id": id })))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
    ctx.catalog.remove_variant(&variant("variant_blue"));

    let response = ctx
        .send(
            store_request("GET", "/store/wishlist", Some(&cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let items = response.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let red = items
        .iter()
        .find(|item| item["product_variant_id"] == "variant_red")
        .unwrap();
    assert_eq!(red["product_variant"]["sku"], "TEE-0");
    assert_eq!(red["product_variant"]["product"]["handle"], "organic-tee");

    let blue = items
        .iter()
        .find(|item| item["product_variant_id"] == "variant_blue")
        .unwrap();
    assert!(blue["product_variant"].is_null());
}

// ============================================================================
// Remove item
// ============================================================================

async fn add_and_get_item_id(ctx: &TestContext, cookie: &str, variant_id: &str) -> String {
    let response = ctx
        .send(
            store_request("POST", "/store/wishlist", Some(cookie))
                .header("content-type", "application/json")
                .body(json_body(&json!({ "variant_id": variant_id })))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let contents = ctx
        .send(
            store_request("GET", "/store/wishlist", Some(cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    contents.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["product_variant_id"] == variant_id)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_owned()
}

#[tokio::test]
async fn test_remove_item() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;
    let item_id = add_and_get_item_id(&ctx, &cookie, "variant_red").await;

    let response = ctx
        .send(
            store_request("DELETE", &format!("/store/wishlist/{item_id}"), Some(&cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["wishlist"]["customer_id"], "cus_alice");

    let again = ctx
        .send(
            store_request("DELETE", &format!("/store/wishlist/{item_id}"), Some(&cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["message"], "Wishlist item not found");
}

#[tokio::test]
async fn test_remove_item_alias_route() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;
    let item_id = add_and_get_item_id(&ctx, &cookie, "variant_green").await;

    let response = ctx
        .send(
            store_request(
                "DELETE",
                &format!("/store/customers/me/wishlists/items/{item_id}"),
                Some(&cookie),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_remove_other_customers_item() {
    let ctx = TestContext::new();
    let alice = ctx.login("cus_alice").await;
    let mallory = ctx.login("cus_mallory").await;
    let item_id = add_and_get_item_id(&ctx, &alice, "variant_red").await;

    let response = ctx
        .send(
            store_request("DELETE", &format!("/store/wishlist/{item_id}"), Some(&mallory))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let unknown = ctx
        .send(
            store_request("DELETE", "/store/wishlist/wli_nope", Some(&mallory))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, unknown.body);
    assert_eq!(response.body["message"], "Wishlist item not found");

    let still_there = ctx.store.inner.all_items();
    assert!(still_there.iter().all(|item| !item.is_deleted()));
}

#[tokio::test]
async fn test_remove_unknown_item() {
    let ctx = TestContext::new();
    let cookie = ctx.login("cus_alice").await;

    let response = ctx
        .send(
            store_request("DELETE", "/store/wishlist/wli_nope", Some(&cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["type"], "not_found");
}

// ============================================================================
// Variant counts
// ============================================================================

#[tokio::test]
async fn test_variant_counts_is_public() {
    let ctx = TestContext::new();
    let alice = ctx.login("cus_alice").await;
    let bob = ctx.login("cus_bob").await;
    add_and_get_item_id(&ctx, &alice, "variant_red").await;
    add_and_get_item_id(&ctx, &bob, "variant_red").await;
    add_and_get_item_id(&ctx, &bob, "variant_blue").await;

    let response = ctx
        .send(
            Request::get("/store/wishlist/variant-counts?variant_ids=variant_red,variant_blue,variant_green")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({ "counts": { "variant_blue": 1, "variant_green": 0, "variant_red": 2 } })
    );
}

#[tokio::test]
async fn test_variant_counts_empty_query() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Request::get("/store/wishlist/variant-counts")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "counts": {} }));
}

#[tokio::test]
async fn test_variant_counts_empty_query_skips_store() {
    let ctx = TestContext::new();
    ctx.store.fail_counts(true);

    let empty = ctx
        .send(
            Request::get("/store/wishlist/variant-counts")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body, json!({ "counts": {} }));

    let queried = ctx
        .send(
            Request::get("/store/wishlist/variant-counts?variant_ids=variant_red")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(queried.status, StatusCode::INTERNAL_SERVER_ERROR);
}
