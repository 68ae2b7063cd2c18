mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface. One method per entity/operation;
/// there is no query language at this seam.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &NewUser) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn set_user_admin(&self, id: i64, is_admin: bool) -> Result<Option<User>>;
    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()>;
    fn delete_user(&self, id: i64) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn update_session_last_used(&self, id: &str) -> Result<()>;
    fn purge_expired_sessions(&self) -> Result<usize>;

    // Expense operations (all scoped to the owning user)
    fn create_expense(&self, user_id: i64, expense: &NewExpense) -> Result<Expense>;
    fn get_expense(&self, id: i64, user_id: i64) -> Result<Option<Expense>>;
    fn list_expenses(&self, user_id: i64, category: Option<&str>) -> Result<Vec<Expense>>;
    fn update_expense(&self, id: i64, user_id: i64, expense: &NewExpense)
    -> Result<Option<Expense>>;
    fn delete_expense(&self, id: i64, user_id: i64) -> Result<bool>;
    fn category_totals(&self, user_id: i64) -> Result<Vec<CategoryTotal>>;

    // Admin reporting (cross-tenant)
    fn list_all_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<ExpenseWithOwner>>;
    fn business_summary(&self) -> Result<Vec<BusinessSummary>>;
    fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>>;

    fn close(&self) -> Result<()>;
}
