mod reports;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User management
        .route("/users", get(users::list_users))
        .route("/users/{id}/make-admin", post(users::make_admin))
        .route("/users/{id}", delete(users::delete_user))
        // Cross-tenant reporting
        .route("/expenses", get(reports::list_expenses))
        .route("/expenses/by-category", get(reports::category_breakdown))
        .route("/summary", get(reports::business_summary))
}
