use chrono::NaiveDate;

use super::dto::ExpenseRequest;
use super::response::ApiError;
use crate::types::{ExpenseType, NewExpense, TransactionType};

const MAX_USERNAME_LEN: usize = 64;
const MAX_CATEGORY_LEN: usize = 100;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Validates and normalizes a username. Returns the trimmed value.
pub fn validate_username(username: &str) -> Result<String, ApiError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }
    if trimmed.len() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(ApiError::bad_request("Username cannot contain whitespace"));
    }
    Ok(trimmed.to_string())
}

/// Validates an expense payload into a typed row draft. Missing required
/// fields and malformed values are rejected here, before the store.
pub fn validate_expense(req: ExpenseRequest) -> Result<NewExpense, ApiError> {
    let (Some(date), Some(category), Some(description), Some(amount)) =
        (req.date, req.category, req.description, req.amount)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    if category.trim().is_empty() || description.trim().is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    if category.len() > MAX_CATEGORY_LEN {
        return Err(ApiError::bad_request(format!(
            "Category cannot exceed {MAX_CATEGORY_LEN} characters"
        )));
    }

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Date must be an ISO date (YYYY-MM-DD)"))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::bad_request(
            "Amount must be a non-negative number",
        ));
    }

    let expense_type = match req.expense_type.as_deref() {
        None => ExpenseType::default(),
        Some(s) => ExpenseType::parse(s)
            .ok_or_else(|| ApiError::bad_request("expense_type must be Business or Personal"))?,
    };

    let transaction_type = match req.transaction_type.as_deref() {
        None => TransactionType::default(),
        Some(s) => TransactionType::parse(s)
            .ok_or_else(|| ApiError::bad_request("transaction_type must be Expense or Income"))?,
    };

    Ok(NewExpense {
        date,
        category,
        description,
        vendor: req.vendor.filter(|v| !v.is_empty()),
        amount,
        currency: req
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        expense_type,
        transaction_type,
        project_name: req.project_name.filter(|p| !p.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> ExpenseRequest {
        ExpenseRequest {
            date: Some("2024-01-01".to_string()),
            category: Some("Fuel".to_string()),
            description: Some("Gas".to_string()),
            vendor: None,
            amount: Some(42.5),
            currency: None,
            expense_type: None,
            transaction_type: None,
            project_name: None,
        }
    }

    #[test]
    fn test_valid_expense_gets_defaults() {
        let expense = validate_expense(full_request()).unwrap();
        assert_eq!(expense.currency, "USD");
        assert_eq!(expense.expense_type, ExpenseType::Business);
        assert_eq!(expense.transaction_type, TransactionType::Expense);
    }

    #[test]
    fn test_missing_required_field() {
        let mut req = full_request();
        req.amount = None;
        assert!(validate_expense(req).is_err());

        let mut req = full_request();
        req.description = Some("  ".to_string());
        assert!(validate_expense(req).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut req = full_request();
        req.date = Some("01/02/2024".to_string());
        assert!(validate_expense(req).is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut req = full_request();
        req.amount = Some(-1.0);
        assert!(validate_expense(req).is_err());

        let mut req = full_request();
        req.amount = Some(f64::NAN);
        assert!(validate_expense(req).is_err());
    }

    #[test]
    fn test_zero_amount_allowed() {
        let mut req = full_request();
        req.amount = Some(0.0);
        assert!(validate_expense(req).is_ok());
    }

    #[test]
    fn test_bad_tag_rejected() {
        let mut req = full_request();
        req.expense_type = Some("Corporate".to_string());
        assert!(validate_expense(req).is_err());

        let mut req = full_request();
        req.transaction_type = Some("Income".to_string());
        let expense = validate_expense(req).unwrap();
        assert_eq!(expense.transaction_type, TransactionType::Income);
    }

    #[test]
    fn test_username_normalization() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username("   ").is_err());
        assert!(validate_username("two words").is_err());
    }
}
