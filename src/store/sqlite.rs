use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| {
        tracing::error!("Invalid date in database: '{}' - {}", s, e);
        Utc::now().date_naive()
    })
}

fn parse_expense_type(s: &str) -> ExpenseType {
    ExpenseType::parse(s).unwrap_or_else(|| {
        tracing::error!("Invalid expense_type in database: '{}'", s);
        ExpenseType::default()
    })
}

fn parse_transaction_type(s: &str) -> TransactionType {
    TransactionType::parse(s).unwrap_or_else(|| {
        tracing::error!("Invalid transaction_type in database: '{}'", s);
        TransactionType::default()
    })
}

const USER_COLUMNS: &str =
    "id, username, password_hash, business_name, address, is_admin, created_at, updated_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        business_name: row.get(3)?,
        address: row.get(4)?,
        is_admin: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const EXPENSE_COLUMNS: &str = "id, user_id, date, category, description, vendor, amount, \
                               currency, expense_type, transaction_type, project_name, \
                               created_at, updated_at";

fn expense_from_row(row: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(&row.get::<_, String>(2)?),
        category: row.get(3)?,
        description: row.get(4)?,
        vendor: row.get(5)?,
        amount: row.get(6)?,
        currency: row.get(7)?,
        expense_type: parse_expense_type(&row.get::<_, String>(8)?),
        transaction_type: parse_transaction_type(&row.get::<_, String>(9)?),
        project_name: row.get(10)?,
        created_at: parse_datetime(&row.get::<_, String>(11)?),
        updated_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn();
        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO users (username, password_hash, business_name, is_admin, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![
                user.username,
                user.password_hash,
                user.business_name,
                format_datetime(&now),
            ],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::AlreadyExists);
            }
            Err(e) => return Err(Error::from(e)),
        }

        Ok(User {
            id: conn.last_insert_rowid(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            business_name: user.business_name.clone(),
            address: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 COLLATE NOCASE"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map([], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_user_admin(&self, id: i64, is_admin: bool) -> Result<Option<User>> {
        let rows = self.conn().execute(
            "UPDATE users SET is_admin = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_admin, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_user(id)
    }

    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        // Expenses and sessions cascade via foreign keys.
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::SessionLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    user_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: parse_datetime(&row.get::<_, String>(5)?),
                    last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_session_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn purge_expired_sessions(&self) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![format_datetime(&Utc::now())],
        )?;
        Ok(rows)
    }

    // Expense operations

    fn create_expense(&self, user_id: i64, expense: &NewExpense) -> Result<Expense> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO expenses (user_id, date, category, description, vendor, amount, currency, expense_type, transaction_type, project_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                user_id,
                expense.date.to_string(),
                expense.category,
                expense.description,
                expense.vendor,
                expense.amount,
                expense.currency,
                expense.expense_type.as_str(),
                expense.transaction_type.as_str(),
                expense.project_name,
                format_datetime(&now),
            ],
        )?;

        Ok(Expense {
            id: conn.last_insert_rowid(),
            user_id,
            date: expense.date,
            category: expense.category.clone(),
            description: expense.description.clone(),
            vendor: expense.vendor.clone(),
            amount: expense.amount,
            currency: expense.currency.clone(),
            expense_type: expense.expense_type,
            transaction_type: expense.transaction_type,
            project_name: expense.project_name.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_expense(&self, id: i64, user_id: i64) -> Result<Option<Expense>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            expense_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_expenses(&self, user_id: i64, category: Option<&str>) -> Result<Vec<Expense>> {
        let conn = self.conn();

        if let Some(category) = category {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses
                 WHERE user_id = ?1 AND category = ?2
                 ORDER BY date DESC, created_at DESC"
            ))?;

            let rows = stmt.query_map(params![user_id, category], expense_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses
                 WHERE user_id = ?1
                 ORDER BY date DESC, created_at DESC"
            ))?;

            let rows = stmt.query_map(params![user_id], expense_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        }
    }

    fn update_expense(
        &self,
        id: i64,
        user_id: i64,
        expense: &NewExpense,
    ) -> Result<Option<Expense>> {
        let rows = self.conn().execute(
            "UPDATE expenses SET date = ?1, category = ?2, description = ?3, vendor = ?4,
                    amount = ?5, currency = ?6, expense_type = ?7, transaction_type = ?8,
                    project_name = ?9, updated_at = ?10
             WHERE id = ?11 AND user_id = ?12",
            params![
                expense.date.to_string(),
                expense.category,
                expense.description,
                expense.vendor,
                expense.amount,
                expense.currency,
                expense.expense_type.as_str(),
                expense.transaction_type.as_str(),
                expense.project_name,
                format_datetime(&Utc::now()),
                id,
                user_id,
            ],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_expense(id, user_id)
    }

    fn delete_expense(&self, id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn category_totals(&self, user_id: i64) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT category, SUM(amount) AS total
             FROM expenses WHERE user_id = ?1
             GROUP BY category ORDER BY total DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Admin reporting

    fn list_all_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<ExpenseWithOwner>> {
        let conn = self.conn();

        let base = format!(
            "SELECT {}, u.username, u.business_name
             FROM expenses e JOIN users u ON e.user_id = u.id",
            EXPENSE_COLUMNS
                .split(", ")
                .map(|c| format!("e.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let map_row = |row: &Row| -> rusqlite::Result<ExpenseWithOwner> {
            Ok(ExpenseWithOwner {
                expense: expense_from_row(row)?,
                username: row.get(13)?,
                business_name: row.get(14)?,
            })
        };

        let order = " ORDER BY e.date DESC, e.created_at DESC";

        if let Some(user_id) = filter.user_id {
            let mut stmt = conn.prepare(&format!("{base} WHERE e.user_id = ?1{order}"))?;
            let rows = stmt.query_map(params![user_id], map_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        } else if let Some(ref name) = filter.business_name {
            let mut stmt = conn.prepare(&format!(
                "{base} WHERE u.business_name LIKE '%' || ?1 || '%'{order}"
            ))?;
            let rows = stmt.query_map(params![name], map_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        } else {
            let mut stmt = conn.prepare(&format!("{base}{order}"))?;
            let rows = stmt.query_map([], map_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        }
    }

    fn business_summary(&self) -> Result<Vec<BusinessSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.business_name,
                    COUNT(e.id) AS expense_count,
                    SUM(e.amount) AS total_amount,
                    MIN(e.date) AS first_expense_date,
                    MAX(e.date) AS last_expense_date
             FROM users u
             LEFT JOIN expenses e ON u.id = e.user_id
             GROUP BY u.id, u.username, u.business_name
             ORDER BY total_amount DESC NULLS LAST",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(BusinessSummary {
                user_id: row.get(0)?,
                username: row.get(1)?,
                business_name: row.get(2)?,
                expense_count: row.get(3)?,
                total_amount: row.get(4)?,
                first_expense_date: row.get::<_, Option<String>>(5)?.map(|s| parse_date(&s)),
                last_expense_date: row.get::<_, Option<String>>(6)?.map(|s| parse_date(&s)),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn category_breakdown(&self) -> Result<Vec<CategoryBreakdown>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT category,
                    COUNT(id) AS expense_count,
                    SUM(amount) AS total_amount,
                    AVG(amount) AS avg_amount
             FROM expenses
             GROUP BY category
             ORDER BY total_amount DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CategoryBreakdown {
                category: row.get(0)?,
                expense_count: row.get(1)?,
                total_amount: row.get(2)?,
                avg_amount: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            business_name: Some("Test Garage LLC".to_string()),
        }
    }

    fn new_expense(date: &str, category: &str, amount: f64) -> NewExpense {
        NewExpense {
            date: date.parse().unwrap(),
            category: category.to_string(),
            description: format!("{category} purchase"),
            vendor: None,
            amount,
            currency: "USD".to_string(),
            expense_type: ExpenseType::Business,
            transaction_type: TransactionType::Expense,
            project_name: None,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"expenses".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
    }

    #[test]
    fn test_user_crud() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let user = store.create_user(&new_user("alice")).unwrap();
        assert!(user.id > 0);
        assert!(!user.is_admin);

        let fetched = store.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.username, "alice");
        assert_eq!(fetched.business_name.as_deref(), Some("Test Garage LLC"));

        let by_name = store.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        let deleted = store.delete_user(user.id).unwrap();
        assert!(deleted);
        assert!(store.get_user(user.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        store.create_user(&new_user("alice")).unwrap();
        let result = store.create_user(&new_user("ALICE"));
        assert!(matches!(result, Err(Error::AlreadyExists)));

        let found = store.get_user_by_username("Alice").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_set_user_admin() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let user = store.create_user(&new_user("alice")).unwrap();
        let updated = store.set_user_admin(user.id, true).unwrap().unwrap();
        assert!(updated.is_admin);

        assert!(store.set_user_admin(9999, true).unwrap().is_none());
    }

    #[test]
    fn test_expense_ownership_scoping() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let bob = store.create_user(&new_user("bob")).unwrap();

        let expense = store
            .create_expense(alice.id, &new_expense("2024-01-01", "Fuel", 42.5))
            .unwrap();

        // Bob cannot see, update, or delete Alice's row.
        assert!(store.get_expense(expense.id, bob.id).unwrap().is_none());
        assert!(
            store
                .update_expense(expense.id, bob.id, &new_expense("2024-01-02", "Fuel", 1.0))
                .unwrap()
                .is_none()
        );
        assert!(!store.delete_expense(expense.id, bob.id).unwrap());
        assert!(store.list_expenses(bob.id, None).unwrap().is_empty());

        // The row is intact for Alice.
        let intact = store.get_expense(expense.id, alice.id).unwrap().unwrap();
        assert_eq!(intact.amount, 42.5);
    }

    #[test]
    fn test_update_expense_persists() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let expense = store
            .create_expense(alice.id, &new_expense("2024-01-01", "Fuel", 42.5))
            .unwrap();

        let mut replacement = new_expense("2024-02-15", "Insurance", 100.0);
        replacement.vendor = Some("Acme Mutual".to_string());
        let updated = store
            .update_expense(expense.id, alice.id, &replacement)
            .unwrap()
            .unwrap();
        assert_eq!(updated.category, "Insurance");

        // Re-read to make sure the mutation actually hit the database.
        let reread = store.get_expense(expense.id, alice.id).unwrap().unwrap();
        assert_eq!(reread.category, "Insurance");
        assert_eq!(reread.amount, 100.0);
        assert_eq!(reread.vendor.as_deref(), Some("Acme Mutual"));
        assert_eq!(reread.date, "2024-02-15".parse().unwrap());
    }

    #[test]
    fn test_list_expenses_filter_and_order() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        store
            .create_expense(alice.id, &new_expense("2024-01-05", "Fuel", 10.0))
            .unwrap();
        store
            .create_expense(alice.id, &new_expense("2024-03-01", "Rent", 900.0))
            .unwrap();
        store
            .create_expense(alice.id, &new_expense("2024-02-10", "Fuel", 20.0))
            .unwrap();

        let all = store.list_expenses(alice.id, None).unwrap();
        assert_eq!(all.len(), 3);
        // Newest date first.
        assert_eq!(all[0].category, "Rent");
        assert_eq!(all[1].amount, 20.0);

        let fuel = store.list_expenses(alice.id, Some("Fuel")).unwrap();
        assert_eq!(fuel.len(), 2);
        assert!(fuel.iter().all(|e| e.category == "Fuel"));
    }

    #[test]
    fn test_expense_ids_strictly_increase() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let first = store
            .create_expense(alice.id, &new_expense("2024-01-01", "Fuel", 1.0))
            .unwrap();
        let second = store
            .create_expense(alice.id, &new_expense("2024-01-02", "Fuel", 2.0))
            .unwrap();
        assert!(second.id > first.id);

        // Ids are not reused even after the newest row is deleted.
        store.delete_expense(second.id, alice.id).unwrap();
        let third = store
            .create_expense(alice.id, &new_expense("2024-01-03", "Fuel", 3.0))
            .unwrap();
        assert!(third.id > second.id);
    }

    #[test]
    fn test_category_totals() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        assert!(store.category_totals(alice.id).unwrap().is_empty());

        store
            .create_expense(alice.id, &new_expense("2024-01-01", "Fuel", 42.5))
            .unwrap();
        store
            .create_expense(alice.id, &new_expense("2024-01-02", "Fuel", 7.5))
            .unwrap();
        store
            .create_expense(alice.id, &new_expense("2024-01-03", "Rent", 900.0))
            .unwrap();

        let totals = store.category_totals(alice.id).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "Rent");
        assert_eq!(totals[0].total, 900.0);
        assert_eq!(totals[1].category, "Fuel");
        assert_eq!(totals[1].total, 50.0);
    }

    #[test]
    fn test_delete_user_cascades() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let expense = store
            .create_expense(alice.id, &new_expense("2024-01-01", "Fuel", 42.5))
            .unwrap();
        store
            .create_session(&Session {
                id: "session-1".to_string(),
                token_hash: "hash".to_string(),
                token_lookup: "lookup01".to_string(),
                user_id: alice.id,
                created_at: Utc::now(),
                expires_at: Utc::now(),
                last_used_at: None,
            })
            .unwrap();

        store.delete_user(alice.id).unwrap();

        assert!(store.get_expense(expense.id, alice.id).unwrap().is_none());
        assert!(store.get_session_by_lookup("lookup01").unwrap().is_none());
    }

    #[test]
    fn test_session_lookup_collision() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let session = Session {
            id: "session-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup01".to_string(),
            user_id: alice.id,
            created_at: Utc::now(),
            expires_at: Utc::now(),
            last_used_at: None,
        };
        store.create_session(&session).unwrap();

        let colliding = Session {
            id: "session-2".to_string(),
            token_hash: "hash2".to_string(),
            ..session
        };
        let result = store.create_session(&colliding);
        assert!(matches!(result, Err(Error::SessionLookupCollision)));
    }

    #[test]
    fn test_purge_expired_sessions() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let now = Utc::now();
        store
            .create_session(&Session {
                id: "stale".to_string(),
                token_hash: "hash1".to_string(),
                token_lookup: "lookup01".to_string(),
                user_id: alice.id,
                created_at: now - chrono::Duration::days(8),
                expires_at: now - chrono::Duration::days(1),
                last_used_at: None,
            })
            .unwrap();
        store
            .create_session(&Session {
                id: "live".to_string(),
                token_hash: "hash2".to_string(),
                token_lookup: "lookup02".to_string(),
                user_id: alice.id,
                created_at: now,
                expires_at: now + chrono::Duration::days(7),
                last_used_at: None,
            })
            .unwrap();

        let purged = store.purge_expired_sessions().unwrap();
        assert_eq!(purged, 1);

        assert!(store.get_session_by_lookup("lookup01").unwrap().is_none());
        assert!(store.get_session_by_lookup("lookup02").unwrap().is_some());

        // Nothing left to purge.
        assert_eq!(store.purge_expired_sessions().unwrap(), 0);
    }

    #[test]
    fn test_admin_reports() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let alice = store.create_user(&new_user("alice")).unwrap();
        let bob = store
            .create_user(&NewUser {
                username: "bob".to_string(),
                password_hash: "$argon2id$fake".to_string(),
                business_name: Some("Bob Towing".to_string()),
            })
            .unwrap();
        let idle = store
            .create_user(&NewUser {
                username: "carol".to_string(),
                password_hash: "$argon2id$fake".to_string(),
                business_name: None,
            })
            .unwrap();

        store
            .create_expense(alice.id, &new_expense("2024-01-01", "Fuel", 10.0))
            .unwrap();
        store
            .create_expense(alice.id, &new_expense("2024-02-01", "Fuel", 30.0))
            .unwrap();
        store
            .create_expense(bob.id, &new_expense("2024-01-15", "Rent", 500.0))
            .unwrap();

        let all = store.list_all_expenses(&ExpenseFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.username == "bob"));

        let only_alice = store
            .list_all_expenses(&ExpenseFilter {
                user_id: Some(alice.id),
                business_name: None,
            })
            .unwrap();
        assert_eq!(only_alice.len(), 2);

        let by_business = store
            .list_all_expenses(&ExpenseFilter {
                user_id: None,
                business_name: Some("towing".to_string()),
            })
            .unwrap();
        assert_eq!(by_business.len(), 1);
        assert_eq!(by_business[0].username, "bob");

        let summary = store.business_summary().unwrap();
        assert_eq!(summary.len(), 3);
        // Largest total first, users without expenses last.
        assert_eq!(summary[0].username, "bob");
        assert_eq!(summary[0].total_amount, Some(500.0));
        let carol = summary.iter().find(|s| s.user_id == idle.id).unwrap();
        assert_eq!(carol.expense_count, 0);
        assert_eq!(carol.total_amount, None);
        let alice_row = summary.iter().find(|s| s.user_id == alice.id).unwrap();
        assert_eq!(alice_row.first_expense_date, "2024-01-01".parse().ok());
        assert_eq!(alice_row.last_expense_date, "2024-02-01".parse().ok());

        let breakdown = store.category_breakdown().unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Rent");
        let fuel = breakdown.iter().find(|b| b.category == "Fuel").unwrap();
        assert_eq!(fuel.expense_count, 2);
        assert_eq!(fuel.total_amount, 40.0);
        assert_eq!(fuel.avg_amount, 20.0);
    }

    #[test]
    fn test_rows_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("test.db");

        let user_id;
        let expense_id;
        {
            let store = SqliteStore::new(&db_path).unwrap();
            store.initialize().unwrap();
            let alice = store.create_user(&new_user("alice")).unwrap();
            user_id = alice.id;
            let mut draft = new_expense("2024-01-01", "Fuel", 42.5);
            draft.project_name = Some("Van rebuild".to_string());
            expense_id = store.create_expense(alice.id, &draft).unwrap().id;
            store.close().unwrap();
        }

        let store = SqliteStore::new(&db_path).unwrap();
        store.initialize().unwrap();

        let expense = store.get_expense(expense_id, user_id).unwrap().unwrap();
        assert_eq!(expense.category, "Fuel");
        assert_eq!(expense.amount, 42.5);
        assert_eq!(expense.project_name.as_deref(), Some("Van rebuild"));
        assert_eq!(expense.date, "2024-01-01".parse().unwrap());
    }
}
