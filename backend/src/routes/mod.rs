//! Route definitions for the pharmacy inventory server
//!
//! Every protected path is routed both with and without a trailing slash.

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .merge(protected_routes(state))
}

/// Routes behind bearer authentication
fn protected_routes(state: AppState) -> Router<AppState> {
    let router = Router::new();

    // Notifications (managers and admins only)
    let router = with_slash(router, "/notifications", get(handlers::list_notifications));
    let router = with_slash(router, "/notifications/unread-count", get(handlers::get_unread_count));
    let router = with_slash(router, "/notifications/mark-all-read", post(handlers::mark_all_as_read));
    let router = with_slash(
        router,
        "/notifications/:notification_id/mark-read",
        post(handlers::mark_as_read),
    );
    let router = with_slash(
        router,
        "/notifications/:notification_id/delete",
        post(handlers::delete_notification),
    );

    // Dashboard
    let router = with_slash(router, "/dashboard", get(handlers::get_dashboard));

    // Inventory
    let router = with_slash(
        router,
        "/inventory/batches",
        get(handlers::list_batches).post(handlers::receive_batch),
    );
    let router = with_slash(router, "/inventory/batches/:batch_id", get(handlers::get_batch));
    let router = with_slash(router, "/inventory/expiration", get(handlers::expiration_monitor));
    let router = with_slash(router, "/inventory/medicines", get(handlers::list_medicines));

    // Sales
    let router = with_slash(router, "/sales", post(handlers::record_sale));

    router.route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Register `route` at `path` and at `path/`
fn with_slash(
    router: Router<AppState>,
    path: &str,
    route: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, route.clone())
        .route(&format!("{}/", path), route)
}
