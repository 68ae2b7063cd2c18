use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Each user is a tenant: their expenses are invisible
/// to every other non-admin user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a transaction is a business or personal expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpenseType {
    #[default]
    Business,
    Personal,
}

impl ExpenseType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseType::Business => "Business",
            ExpenseType::Personal => "Personal",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Business" => Some(ExpenseType::Business),
            "Personal" => Some(ExpenseType::Personal),
            _ => None,
        }
    }
}

/// Whether a transaction is money out or money in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

impl TransactionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Expense => "Expense",
            TransactionType::Income => "Income",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Expense" => Some(TransactionType::Expense),
            "Income" => Some(TransactionType::Income),
            _ => None,
        }
    }
}

/// A dated financial transaction (expense or income) owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub expense_type: ExpenseType,
    pub transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated payload for creating or replacing an expense row.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub vendor: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub expense_type: ExpenseType,
    pub transaction_type: TransactionType,
    pub project_name: Option<String>,
}

/// Payload for creating a user. The password is hashed before it gets here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub business_name: Option<String>,
}

/// A bearer session credential. Only the argon2 hash and the lookup prefix
/// are stored; the raw token is shown to the client once.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// An expense joined with its owner, for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseWithOwner {
    #[serde(flatten)]
    pub expense: Expense,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
}

/// One row of the caller's per-category summary.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Cross-tenant rollup for one business, admin summary endpoint.
/// Users with no expenses appear with a count of zero and null totals.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessSummary {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub expense_count: i64,
    pub total_amount: Option<f64>,
    pub first_expense_date: Option<NaiveDate>,
    pub last_expense_date: Option<NaiveDate>,
}

/// Cross-tenant per-category statistics, admin by-category endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub expense_count: i64,
    pub total_amount: f64,
    pub avg_amount: f64,
}

/// Filter for the admin cross-tenant expense listing. `user_id` wins when
/// both are present, matching the route's query-parameter precedence.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub user_id: Option<i64>,
    pub business_name: Option<String>,
}
