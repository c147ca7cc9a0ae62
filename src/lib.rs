//! Storefront API Library
//!
//! Checkout, UPI payment-session, and order management backend for an
//! e-commerce storefront.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod checkout;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Assembles the versioned API surface
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/recovery", handlers::recovery::recovery_routes())
        .nest("/orders", handlers::orders::order_routes())
}
