use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{ExpenseRequest, ListExpensesParams, MessageResponse};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_expense;

pub fn expense_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_expenses))
        .route("/", post(create_expense))
        // Registered before "/{id}" so the literal segment wins.
        .route("/summary/categories", get(category_summary))
        .route("/{id}", get(get_expense))
        .route("/{id}", put(update_expense))
        .route("/{id}", delete(delete_expense))
}

async fn list_expenses(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListExpensesParams>,
) -> impl IntoResponse {
    // "?category=" means no filter, same as omitting the parameter.
    let category = params.category.as_deref().filter(|c| !c.is_empty());

    let expenses = state
        .store
        .list_expenses(user.id, category)
        .api_err("Failed to list expenses")?;

    Ok::<_, ApiError>(Json(expenses))
}

async fn get_expense(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let expense = state
        .store
        .get_expense(id, user.id)
        .api_err("Failed to get expense")?
        .or_not_found("Expense not found")?;

    Ok::<_, ApiError>(Json(expense))
}

async fn create_expense(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExpenseRequest>,
) -> impl IntoResponse {
    let draft = validate_expense(req)?;

    let expense = state
        .store
        .create_expense(user.id, &draft)
        .api_err("Failed to create expense")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(expense)))
}

async fn update_expense(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ExpenseRequest>,
) -> impl IntoResponse {
    let draft = validate_expense(req)?;

    // Owner scoping happens in the store: a row owned by someone else is
    // indistinguishable from a missing one.
    let expense = state
        .store
        .update_expense(id, user.id, &draft)
        .api_err("Failed to update expense")?
        .or_not_found("Expense not found")?;

    Ok::<_, ApiError>(Json(expense))
}

async fn delete_expense(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_expense(id, user.id)
        .api_err("Failed to delete expense")?;

    if !deleted {
        return Err(ApiError::not_found("Expense not found"));
    }

    Ok::<_, ApiError>(Json(MessageResponse {
        message: "Expense deleted successfully",
    }))
}

async fn category_summary(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let totals = state
        .store
        .category_totals(user.id)
        .api_err("Failed to fetch summary")?;

    Ok::<_, ApiError>(Json(totals))
}
