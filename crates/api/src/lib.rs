//! HTTP API server for the hotel booking platform.
//!
//! Exposes the booking lifecycle over REST with structured logging
//! (tracing) and Prometheus metrics: saga-backed creation, payment
//! verification, reads that run the lifecycle sweeps, cancellation, and
//! the signed payment-gateway webhook.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use booking::{BookingCoordinator, InMemoryPaymentGateway, PaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::BookingStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::bookings::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P>(state: Arc<AppState<S, P>>, metrics_handle: PrometheusHandle) -> Router
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/bookings/create/{hotel_id}",
            post(routes::bookings::create::<S, P>),
        )
        .route(
            "/bookings/user/{user_id}",
            get(routes::bookings::for_user::<S, P>),
        )
        .route(
            "/bookings/{booking_id}/verify-payment",
            get(routes::bookings::verify_payment::<S, P>),
        )
        .route(
            "/bookings/{booking_id}",
            get(routes::bookings::get::<S, P>).patch(routes::bookings::update::<S, P>),
        )
        .route(
            "/bookings/cancel/{booking_id}",
            patch(routes::bookings::cancel::<S, P>),
        )
        .route("/webhooks/payment", post(routes::webhook::receive::<S, P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given store and payment gateway.
pub fn create_state<S, P>(
    store: S,
    payment: P,
    webhook_secret: impl Into<String>,
) -> Arc<AppState<S, P>>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + Clone + 'static,
{
    Arc::new(AppState {
        coordinator: BookingCoordinator::new(store.clone(), payment),
        store,
        webhook_secret: webhook_secret.into(),
    })
}

/// Creates state with the in-memory payment gateway, returning the gateway
/// handle so callers (and tests) can steer it.
pub fn create_default_state<S>(
    store: S,
    webhook_secret: impl Into<String>,
) -> (Arc<AppState<S, InMemoryPaymentGateway>>, InMemoryPaymentGateway)
where
    S: BookingStore + Clone + Send + Sync + 'static,
{
    let gateway = InMemoryPaymentGateway::new();
    let state = create_state(store, gateway.clone(), webhook_secret);
    (state, gateway)
}
