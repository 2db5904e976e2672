//! Typed storefront endpoints.
//!
//! Catalog and content listings are on the public allow-list and go out
//! without credentials; everything else is authenticated through
//! `ApiClient::send`.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiClient, ApiError, ApiRequest, ApiResult};
use crate::auth::{Credentials, SessionEvent};
use crate::models::{
    Article, Cart, Category, CheckoutRequest, NewReview, Order, Page, PerformanceEntry,
    PerformanceSummary, Product, ProductQuery, Review, User, WishlistItem, Workout,
};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Serialize)]
struct CartItemRequest {
    product: i64,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityUpdate {
    quantity: u32,
}

#[derive(Serialize)]
struct ReviewRequest<'a> {
    product: i64,
    rating: u8,
    comment: &'a str,
}

#[derive(Serialize)]
struct WishlistRequest {
    product: i64,
}

impl ApiClient {
    // ===== Auth =====

    /// Exchange username/password for a credential pair and store it.
    ///
    /// Sent without any stored token so a stale session can never trigger a
    /// refresh in the middle of a login.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        let url = self.config().url_for(&self.config().login_path);
        let response = self
            .raw()
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let tokens: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;

        self.token_store()
            .store(&Credentials {
                access: tokens.access,
                refresh: tokens.refresh,
            })
            .map_err(ApiError::TokenStore)?;
        info!(username = username, "Logged in");
        self.events().emit(SessionEvent::LoggedIn);
        Ok(())
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.get("/api/auth/user/").await
    }

    // ===== Catalog =====

    pub async fn list_products(&self, query: &ProductQuery) -> ApiResult<Page<Product>> {
        let request = query
            .pairs()
            .into_iter()
            .fold(ApiRequest::get("/api/products/"), |req, (key, value)| {
                req.query(key, value)
            });
        self.request_json(&request).await
    }

    pub async fn product(&self, id: i64) -> ApiResult<Product> {
        self.get(&format!("/api/products/{}/", id)).await
    }

    pub async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.get("/api/products/categories/").await
    }

    /// Fetch a product and its reviews concurrently.
    pub async fn product_with_reviews(&self, id: i64) -> ApiResult<(Product, Vec<Review>)> {
        futures::try_join!(self.product(id), self.product_reviews(id))
    }

    // ===== Reviews =====

    pub async fn product_reviews(&self, product_id: i64) -> ApiResult<Vec<Review>> {
        self.get(&format!("/api/products/{}/reviews/", product_id))
            .await
    }

    pub async fn create_review(&self, product_id: i64, review: &NewReview) -> ApiResult<Review> {
        if !review.is_valid() {
            return Err(ApiError::InvalidRequest(format!(
                "Rating must be between {} and {}",
                NewReview::MIN_RATING,
                NewReview::MAX_RATING
            )));
        }
        let body = ReviewRequest {
            product: product_id,
            rating: review.rating,
            comment: &review.comment,
        };
        self.post("/api/reviews/", &body).await
    }

    // ===== Cart =====

    pub async fn cart(&self) -> ApiResult<Cart> {
        self.get("/api/cart/").await
    }

    pub async fn add_to_cart(&self, product_id: i64, quantity: u32) -> ApiResult<Cart> {
        if quantity == 0 {
            return Err(ApiError::InvalidRequest(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let body = CartItemRequest {
            product: product_id,
            quantity,
        };
        self.post("/api/cart/items/", &body).await
    }

    /// Set an item's quantity; zero removes it.
    pub async fn update_cart_item(&self, item_id: i64, quantity: u32) -> ApiResult<Cart> {
        if quantity == 0 {
            self.remove_cart_item(item_id).await?;
            return self.cart().await;
        }
        self.patch(
            &format!("/api/cart/items/{}/", item_id),
            &QuantityUpdate { quantity },
        )
        .await
    }

    pub async fn remove_cart_item(&self, item_id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/cart/items/{}/", item_id)).await
    }

    // ===== Orders =====

    pub async fn orders(&self) -> ApiResult<Vec<Order>> {
        self.get("/api/orders/").await
    }

    pub async fn order(&self, id: i64) -> ApiResult<Order> {
        self.get(&format!("/api/orders/{}/", id)).await
    }

    pub async fn checkout(&self, request: &CheckoutRequest) -> ApiResult<Order> {
        self.post("/api/orders/checkout/", request).await
    }

    // ===== Wishlist =====

    pub async fn wishlist(&self) -> ApiResult<Vec<WishlistItem>> {
        self.get("/api/wishlist/").await
    }

    pub async fn add_to_wishlist(&self, product_id: i64) -> ApiResult<WishlistItem> {
        self.post("/api/wishlist/", &WishlistRequest { product: product_id })
            .await
    }

    pub async fn remove_from_wishlist(&self, product_id: i64) -> ApiResult<()> {
        self.delete(&format!("/api/wishlist/{}/", product_id)).await
    }

    // ===== Content =====

    pub async fn articles(&self) -> ApiResult<Page<Article>> {
        self.get("/api/articles/").await
    }

    pub async fn article(&self, slug: &str) -> ApiResult<Article> {
        self.get(&format!("/api/articles/{}/", slug)).await
    }

    pub async fn workouts(&self) -> ApiResult<Page<Workout>> {
        self.get("/api/workouts/").await
    }

    pub async fn workout(&self, id: i64) -> ApiResult<Workout> {
        self.get(&format!("/api/workouts/{}/", id)).await
    }

    // ===== Performance log =====

    pub async fn log_performance(&self, entry: &PerformanceEntry) -> ApiResult<PerformanceEntry> {
        self.post("/api/performance/logs/", entry).await
    }

    pub async fn performance_summary(&self) -> ApiResult<PerformanceSummary> {
        self.get("/api/performance/summary/").await
    }
}
