//! Data models for storefront and gym-content entities.
//!
//! This module contains the data structures returned by the backend:
//!
//! - `Product`, `Category`, `ProductQuery`: the catalog
//! - `Cart`, `CartItem`, `Order`, `WishlistItem`: shopping
//! - `Review`, `NewReview`: product reviews
//! - `Article`, `Workout`, `Exercise`: gym content
//! - `PerformanceEntry`, `PerformanceSummary`: the training log dashboard
//! - `Money`, `Page`: shared value types

pub mod analytics;
pub mod content;
pub mod money;
pub mod product;
pub mod shop;
pub mod user;

pub use analytics::{PerformanceEntry, PerformanceSummary, PersonalRecord};
pub use content::{Article, Difficulty, Exercise, Workout};
pub use money::Money;
pub use product::{Category, NewReview, Page, Product, ProductQuery, Review};
pub use shop::{Cart, CartItem, CheckoutRequest, Order, OrderItem, OrderStatus, WishlistItem};
pub use user::User;
