use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::AdminExpensesParams;
use crate::server::response::{ApiError, StoreResultExt};
use crate::types::ExpenseFilter;

pub async fn list_expenses(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminExpensesParams>,
) -> impl IntoResponse {
    // An empty business_name parameter means no filter; left in place it
    // would also exclude every owner without a business name.
    let filter = ExpenseFilter {
        user_id: params.user_id,
        business_name: params.business_name.filter(|b| !b.is_empty()),
    };

    let expenses = state
        .store
        .list_all_expenses(&filter)
        .api_err("Failed to list expenses")?;

    Ok::<_, ApiError>(Json(expenses))
}

pub async fn business_summary(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let summary = state
        .store
        .business_summary()
        .api_err("Failed to fetch summary")?;

    Ok::<_, ApiError>(Json(summary))
}

pub async fn category_breakdown(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let breakdown = state
        .store
        .category_breakdown()
        .api_err("Failed to fetch category breakdown")?;

    Ok::<_, ApiError>(Json(breakdown))
}
