//! Integration tests for the typed storefront endpoints

use std::sync::Arc;

use gymshop_core::auth::MemoryTokenStore;
use gymshop_core::models::{CheckoutRequest, NewReview, OrderStatus, PerformanceEntry};
use gymshop_core::{ApiClient, ApiError, ClientConfig, Credentials};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in(server: &MockServer) -> ApiClient {
    let store = Arc::new(MemoryTokenStore::with_credentials(Credentials::new(
        "T1", "R1",
    )));
    ApiClient::new(ClientConfig::new(server.uri()), store).unwrap()
}

async fn mount_authed(server: &MockServer, verb: &str, route: &str, response: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(route))
        .and(header("authorization", "Bearer T1"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_authed_with_body(
    server: &MockServer,
    verb: &str,
    route: &str,
    body: Value,
    response: ResponseTemplate,
) {
    Mock::given(method(verb))
        .and(path(route))
        .and(header("authorization", "Bearer T1"))
        .and(body_json(body))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn cart_body(quantity: u32) -> Value {
    json!({
        "id": 1,
        "items": [{"id": 4, "quantity": quantity, "product": {"id": 10, "name": "Chalk", "price": "4.50"}}]
    })
}

#[tokio::test]
async fn test_current_user() {
    let server = MockServer::start().await;
    mount_authed(
        &server,
        "GET",
        "/api/auth/user/",
        ResponseTemplate::new(200).set_body_json(json!({"id": 5, "username": "lifter"})),
    )
    .await;

    let user = signed_in(&server).current_user().await.unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.username, "lifter");
}

#[tokio::test]
async fn test_checkout_posts_shipping_details() {
    let server = MockServer::start().await;
    mount_authed_with_body(
        &server,
        "POST",
        "/api/orders/checkout/",
        json!({"shipping_address": "1 Main St", "payment_method": "card"}),
        ResponseTemplate::new(201).set_body_json(json!({
            "id": 12, "status": "pending", "total": "59.80",
            "created_at": "2024-03-01T12:00:00Z"
        })),
    )
    .await;

    let order = signed_in(&server)
        .checkout(&CheckoutRequest {
            shipping_address: "1 Main St".to_string(),
            payment_method: "card".to_string(),
            coupon: None,
        })
        .await
        .unwrap();
    assert_eq!(order.id, 12);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total.to_string(), "59.80");
}

#[tokio::test]
async fn test_create_review_posts_product_rating_and_comment() {
    let server = MockServer::start().await;
    mount_authed_with_body(
        &server,
        "POST",
        "/api/reviews/",
        json!({"product": 10, "rating": 5, "comment": "Solid grip"}),
        ResponseTemplate::new(201).set_body_json(json!({
            "id": 1, "product": 10, "user": "lifter", "rating": 5,
            "comment": "Solid grip", "created_at": "2024-03-01T12:00:00Z"
        })),
    )
    .await;

    let review = signed_in(&server)
        .create_review(
            10,
            &NewReview {
                rating: 5,
                comment: "Solid grip".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(review.rating, 5);
    assert_eq!(review.product, 10);
}

#[tokio::test]
async fn test_create_review_rejects_out_of_range_rating() {
    let server = MockServer::start().await;
    let err = signed_in(&server)
        .create_review(
            10,
            &NewReview {
                rating: 6,
                comment: "Too good".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_cart_item_patches_quantity() {
    let server = MockServer::start().await;
    mount_authed_with_body(
        &server,
        "PATCH",
        "/api/cart/items/4/",
        json!({"quantity": 3}),
        ResponseTemplate::new(200).set_body_json(cart_body(3)),
    )
    .await;

    let cart = signed_in(&server).update_cart_item(4, 3).await.unwrap();
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_update_cart_item_to_zero_removes_then_refetches() {
    let server = MockServer::start().await;
    mount_authed(
        &server,
        "DELETE",
        "/api/cart/items/4/",
        ResponseTemplate::new(204),
    )
    .await;
    mount_authed(
        &server,
        "GET",
        "/api/cart/",
        ResponseTemplate::new(200).set_body_json(json!({"id": 1, "items": []})),
    )
    .await;

    let cart = signed_in(&server).update_cart_item(4, 0).await.unwrap();
    assert!(cart.is_empty());

    let received = server.received_requests().await.unwrap();
    let sequence: Vec<(&str, &str)> = received
        .iter()
        .map(|r| (r.method.as_str(), r.url.path()))
        .collect();
    assert_eq!(
        sequence,
        vec![("DELETE", "/api/cart/items/4/"), ("GET", "/api/cart/")]
    );
}

#[tokio::test]
async fn test_wishlist_add_and_remove() {
    let server = MockServer::start().await;
    mount_authed_with_body(
        &server,
        "POST",
        "/api/wishlist/",
        json!({"product": 10}),
        ResponseTemplate::new(201).set_body_json(json!({
            "id": 2, "product": {"id": 10, "name": "Chalk", "price": "4.50"}
        })),
    )
    .await;
    mount_authed(
        &server,
        "DELETE",
        "/api/wishlist/10/",
        ResponseTemplate::new(204),
    )
    .await;

    let client = signed_in(&server);
    let item = client.add_to_wishlist(10).await.unwrap();
    assert_eq!(item.product.id, 10);
    client.remove_from_wishlist(10).await.unwrap();
}

#[tokio::test]
async fn test_article_and_workout_details_are_public() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles/deadlift-basics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "slug": "deadlift-basics", "title": "Deadlift basics",
            "body": "Hinge at the hips."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workouts/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "title": "Push day", "difficulty": "beginner",
            "exercises": [{"name": "Bench press", "sets": 3, "reps": 8}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let article = client.article("deadlift-basics").await.unwrap();
    assert_eq!(article.title, "Deadlift basics");
    let workout = client.workout(3).await.unwrap();
    assert_eq!(workout.exercises.len(), 1);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(received
        .iter()
        .all(|r| !r.headers.contains_key("authorization")));
}

#[tokio::test]
async fn test_log_performance_posts_entry() {
    let server = MockServer::start().await;
    let entry_json = json!({
        "exercise": "Squat",
        "sets": 5,
        "reps": 5,
        "weight_kg": 100.0,
        "performed_at": "2024-03-01T12:00:00Z"
    });
    mount_authed_with_body(
        &server,
        "POST",
        "/api/performance/logs/",
        entry_json.clone(),
        ResponseTemplate::new(201).set_body_json(entry_json.clone()),
    )
    .await;

    let entry: PerformanceEntry = serde_json::from_value(entry_json).unwrap();
    let saved = signed_in(&server).log_performance(&entry).await.unwrap();
    assert_eq!(saved.exercise, "Squat");
    assert_eq!(saved.sets, 5);
}

#[tokio::test]
async fn test_performance_summary() {
    let server = MockServer::start().await;
    mount_authed(
        &server,
        "GET",
        "/api/performance/summary/",
        ResponseTemplate::new(200).set_body_json(json!({
            "total_sessions": 4,
            "total_volume_kg": 1200.0,
            "personal_records": [{"exercise": "Squat", "weight_kg": 140.0, "reps": 1}]
        })),
    )
    .await;

    let summary = signed_in(&server).performance_summary().await.unwrap();
    assert_eq!(summary.total_sessions, 4);
    assert_eq!(summary.personal_records.len(), 1);
}
