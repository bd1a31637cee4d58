// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Plain accessors over the ledger tables.
//!
//! The ledger is shared: every operator sees and edits the same categories,
//! transactions, recurring definitions and investments. `user_id` columns
//! exist in the schema but nothing here filters on them.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{
    Category, CategoryType, Frequency, Investment, LedgerSettings, RecurringDefinition,
    Transaction, User, check_month, date_column, decimal_column,
};

const STARTING_BALANCE_KEY: &str = "starting_balance";
const DEFAULTS_SEEDED_KEY: &str = "defaults_seeded";

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings

/// Starting balance of the shared ledger.
///
/// Reads the settings singleton. Ledgers that never wrote it fall back to the
/// earliest-created user's balance, then to zero.
pub fn get_settings(conn: &Connection) -> Result<LedgerSettings> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![STARTING_BALANCE_KEY],
            |r| r.get(0),
        )
        .optional()?;
    let raw = match stored {
        Some(v) => Some(v),
        None => conn
            .query_row(
                "SELECT starting_balance FROM users ORDER BY created_at ASC, id ASC LIMIT 1",
                [],
                |r| r.get::<_, String>(0),
            )
            .optional()?,
    };
    let starting_balance = match raw {
        Some(s) => decimal_column("starting balance", &s)?,
        None => Decimal::ZERO,
    };
    Ok(LedgerSettings { starting_balance })
}

pub fn set_starting_balance(conn: &Connection, balance: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![STARTING_BALANCE_KEY, balance.to_string()],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Users

pub fn register_user(
    conn: &Connection,
    username: &str,
    password: &str,
    starting_balance: Option<Decimal>,
) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LedgerError::invalid("username", username));
    }
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let balance = starting_balance.unwrap_or(Decimal::ZERO);
    if let Err(e) = conn.execute(
        "INSERT INTO users(username, password_hash, starting_balance) VALUES (?1, ?2, ?3)",
        params![username, hash, balance.to_string()],
    ) {
        let err = LedgerError::from(e);
        if err.is_unique_violation() {
            return Err(LedgerError::DuplicateUser(username.to_string()));
        }
        return Err(err);
    }
    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, username, "registered user");
    get_user(conn, id)
}

fn user_from_row(row: (i64, String, String, String, String)) -> Result<User> {
    let (id, username, password_hash, balance, created_at) = row;
    Ok(User {
        id,
        username,
        password_hash,
        starting_balance: decimal_column("starting balance", &balance)?,
        created_at,
    })
}

const USER_COLUMNS: &str = "id, username, password_hash, starting_balance, created_at";

pub fn get_user(conn: &Connection, id: i64) -> Result<User> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1"),
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?
        .ok_or(LedgerError::NotFound { entity: "user", id })?;
    user_from_row(row)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC"
    ))?;
    let rows = stmt.query_map([], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(user_from_row(row?)?);
    }
    Ok(out)
}

/// Returns the user when `password` matches the stored hash.
pub fn verify_credentials(conn: &Connection, username: &str, password: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username=?1"),
            params![username.trim()],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    let user = user_from_row(row)?;
    if bcrypt::verify(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Categories

const DEFAULT_CATEGORIES: &[(&str, CategoryType, &str, &str)] = &[
    ("Salary", CategoryType::Income, "#28a745", "briefcase"),
    ("Other Income", CategoryType::Income, "#20c997", "plus-circle"),
    ("Groceries", CategoryType::Expense, "#fd7e14", "cart"),
    ("Rent", CategoryType::Expense, "#dc3545", "house"),
    ("Utilities", CategoryType::Expense, "#ffc107", "lightning"),
    ("Transport", CategoryType::Expense, "#17a2b8", "car"),
    ("Entertainment", CategoryType::Expense, "#e83e8c", "film"),
    ("Borrowed", CategoryType::DebtIn, "#6f42c1", "arrow-down"),
    ("Lent", CategoryType::DebtOut, "#6610f2", "arrow-up"),
];

/// Inserts the default categories the first time a ledger is opened.
///
/// Later calls are no-ops, so defaults the users deleted stay deleted.
pub fn seed_default_categories(conn: &Connection) -> Result<usize> {
    let seeded: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![DEFAULTS_SEEDED_KEY],
            |r| r.get(0),
        )
        .optional()?;
    if seeded.is_some() {
        return Ok(0);
    }

    let mut inserted = 0;
    for (name, kind, color, icon) in DEFAULT_CATEGORIES {
        if find_category(conn, name, *kind)?.is_none() {
            add_category(conn, name, *kind, Some(*color), Some(*icon))?;
            inserted += 1;
        }
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, '1')
         ON CONFLICT(key) DO NOTHING",
        params![DEFAULTS_SEEDED_KEY],
    )?;
    if inserted > 0 {
        tracing::info!(inserted, "seeded default categories");
    }
    Ok(inserted)
}

fn category_from_row(row: (i64, String, String, String, String)) -> Result<Category> {
    let (id, name, kind, color, icon) = row;
    Ok(Category {
        id,
        name,
        r#type: kind.parse()?,
        color,
        icon,
    })
}

pub fn find_category(conn: &Connection, name: &str, kind: CategoryType) -> Result<Option<Category>> {
    let row = conn
        .query_row(
            "SELECT id, name, type, color, icon FROM categories
             WHERE name=?1 COLLATE NOCASE AND type=?2",
            params![name.trim(), kind.as_str()],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    row.map(category_from_row).transpose()
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Category> {
    let row = conn
        .query_row(
            "SELECT id, name, type, color, icon FROM categories WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?
        .ok_or(LedgerError::NotFound {
            entity: "category",
            id,
        })?;
    category_from_row(row)
}

/// Names are unique per type; the same name may exist once per type.
pub fn add_category(
    conn: &Connection,
    name: &str,
    kind: CategoryType,
    color: Option<&str>,
    icon: Option<&str>,
) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("category name", name));
    }
    if find_category(conn, name, kind)?.is_some() {
        return Err(LedgerError::DuplicateCategory {
            name: name.to_string(),
            kind: kind.to_string(),
        });
    }
    conn.execute(
        "INSERT INTO categories(name, type, color, icon)
         VALUES (?1, ?2, COALESCE(?3, '#6c757d'), COALESCE(?4, 'tag'))",
        params![name, kind.as_str(), color, icon],
    )?;
    get_category(conn, conn.last_insert_rowid())
}

pub fn list_categories(conn: &Connection, kind: Option<CategoryType>) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, color, icon FROM categories
         WHERE ?1 IS NULL OR type=?1
         ORDER BY type, name",
    )?;
    let rows = stmt.query_map(params![kind.map(|k| k.as_str())], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(category_from_row(row?)?);
    }
    Ok(out)
}

/// Deletes a category nothing refers to.
pub fn delete_category(conn: &Connection, id: i64) -> Result<()> {
    get_category(conn, id)?;
    let refs: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM transactions WHERE category_id=?1)
              + (SELECT COUNT(*) FROM recurring_transactions WHERE category_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if refs > 0 {
        return Err(LedgerError::CategoryInUse(id));
    }
    conn.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Transactions

#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub category_id: i64,
    pub amount: Decimal,
    pub note: &'a str,
    pub date: NaiveDate,
}

pub fn add_transaction(conn: &Connection, tx: &NewTransaction<'_>) -> Result<i64> {
    ensure_positive(tx.amount)?;
    get_category(conn, tx.category_id)?;
    conn.execute(
        "INSERT INTO transactions(category_id, amount, note, date) VALUES (?1, ?2, ?3, ?4)",
        params![
            tx.category_id,
            tx.amount.to_string(),
            tx.note,
            tx.date.to_string()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

type TransactionRow = (i64, Option<i64>, String, String, String, String, Option<i64>);

fn transaction_from_row(row: TransactionRow) -> Result<Transaction> {
    let (id, category_id, amount, note, date, created_at, recurring_transaction_id) = row;
    Ok(Transaction {
        id,
        category_id,
        amount: decimal_column("transaction amount", &amount)?,
        note,
        date: date_column("transaction date", &date)?,
        created_at,
        recurring_transaction_id,
    })
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let row = conn
        .query_row(
            "SELECT id, category_id, amount, note, date, created_at, recurring_transaction_id
             FROM transactions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .optional()?
        .ok_or(LedgerError::NotFound {
            entity: "transaction",
            id,
        })?;
    transaction_from_row(row)
}

/// A transaction joined with its category, as shown in listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransactionView {
    pub id: i64,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub r#type: Option<CategoryType>,
    pub amount: Decimal,
    /// Amount with the direction implied by the category type applied.
    pub signed_amount: Decimal,
    pub note: String,
    pub recurring_transaction_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter<'a> {
    /// `YYYY-MM`
    pub month: Option<&'a str>,
    pub kind: Option<CategoryType>,
    pub limit: Option<usize>,
}

pub fn list_transactions(
    conn: &Connection,
    filter: &TransactionFilter<'_>,
) -> Result<Vec<TransactionView>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, c.name, c.type, t.amount, t.note, t.recurring_transaction_id
         FROM transactions t LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(month) = filter.month {
        check_month(month)?;
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.to_string());
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND c.type=?");
        params_vec.push(kind.as_str().to_string());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let category: Option<String> = r.get(2)?;
        let kind: Option<String> = r.get(3)?;
        let amount: String = r.get(4)?;
        let note: String = r.get(5)?;
        let recurring_transaction_id: Option<i64> = r.get(6)?;

        let kind = kind.map(|k| k.parse::<CategoryType>()).transpose()?;
        let amount = decimal_column("transaction amount", &amount)?;
        out.push(TransactionView {
            id,
            date: date_column("transaction date", &date)?,
            category,
            r#type: kind,
            amount,
            signed_amount: kind.map(|k| k.signed(amount)).unwrap_or(amount),
            note,
            recurring_transaction_id,
        });
    }
    Ok(out)
}

/// Removes one transaction. The recurring definition that produced it, if
/// any, is left untouched.
pub fn delete_transaction(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            entity: "transaction",
            id,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Recurring definitions

#[derive(Debug, Clone)]
pub struct NewRecurring<'a> {
    pub category_id: i64,
    pub amount: Decimal,
    pub note: &'a str,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

pub fn add_recurring(conn: &Connection, def: &NewRecurring<'_>) -> Result<i64> {
    ensure_positive(def.amount)?;
    if let Some(end) = def.end_date {
        if end < def.start_date {
            return Err(LedgerError::EndBeforeStart {
                start: def.start_date,
                end,
            });
        }
    }
    get_category(conn, def.category_id)?;
    conn.execute(
        "INSERT INTO recurring_transactions(
             category_id, amount, note, frequency, start_date, end_date, next_due_date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, 1)",
        params![
            def.category_id,
            def.amount.to_string(),
            def.note,
            def.frequency.as_str(),
            def.start_date.to_string(),
            def.end_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) const RECURRING_COLUMNS: &str = "id, category_id, amount, note, frequency, start_date, end_date, next_due_date, is_active";

pub(crate) type RecurringRow = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    bool,
);

pub(crate) fn recurring_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RecurringRow> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
    ))
}

pub(crate) fn recurring_from_row(row: RecurringRow) -> Result<RecurringDefinition> {
    let (id, category_id, amount, note, frequency, start, end, next_due, is_active) = row;
    Ok(RecurringDefinition {
        id,
        category_id,
        amount: decimal_column("recurring amount", &amount)?,
        note,
        frequency: frequency.parse()?,
        start_date: date_column("start date", &start)?,
        end_date: end.as_deref().map(|e| date_column("end date", e)).transpose()?,
        next_due_date: date_column("next due date", &next_due)?,
        is_active,
    })
}

pub fn get_recurring(conn: &Connection, id: i64) -> Result<RecurringDefinition> {
    let row = conn
        .query_row(
            &format!("SELECT {RECURRING_COLUMNS} FROM recurring_transactions WHERE id=?1"),
            params![id],
            recurring_row,
        )
        .optional()?
        .ok_or(LedgerError::NotFound {
            entity: "recurring definition",
            id,
        })?;
    recurring_from_row(row)
}

pub fn list_recurring(conn: &Connection) -> Result<Vec<RecurringDefinition>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECURRING_COLUMNS} FROM recurring_transactions ORDER BY next_due_date, id"
    ))?;
    let rows = stmt.query_map([], recurring_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(recurring_from_row(row?)?);
    }
    Ok(out)
}

/// Pause (`false`) or resume (`true`) a definition.
pub fn set_recurring_active(conn: &Connection, id: i64, active: bool) -> Result<()> {
    let n = conn.execute(
        "UPDATE recurring_transactions SET is_active=?1 WHERE id=?2",
        params![active, id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            entity: "recurring definition",
            id,
        });
    }
    Ok(())
}

/// Deletes a definition. Transactions it already produced stay in the
/// ledger with their link cleared.
pub fn delete_recurring(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM recurring_transactions WHERE id=?1",
        params![id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            entity: "recurring definition",
            id,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Investments

#[derive(Debug, Clone)]
pub struct NewInvestment<'a> {
    pub symbol: &'a str,
    pub name: &'a str,
    pub amount: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
}

fn validate_investment(inv: &NewInvestment<'_>) -> Result<()> {
    if inv.symbol.trim().is_empty() {
        return Err(LedgerError::invalid("symbol", inv.symbol));
    }
    ensure_positive(inv.amount)?;
    if inv.purchase_price < Decimal::ZERO {
        return Err(LedgerError::invalid(
            "purchase price",
            inv.purchase_price.to_string(),
        ));
    }
    if inv.amount.checked_mul(inv.purchase_price).is_none() {
        return Err(LedgerError::invalid(
            "purchase value",
            format!("{} x {}", inv.amount, inv.purchase_price),
        ));
    }
    Ok(())
}

pub fn add_investment(conn: &Connection, inv: &NewInvestment<'_>) -> Result<i64> {
    validate_investment(inv)?;
    conn.execute(
        "INSERT INTO investments(symbol, name, amount, purchase_price, purchase_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            inv.symbol.trim().to_uppercase(),
            inv.name.trim(),
            inv.amount.to_string(),
            inv.purchase_price.to_string(),
            inv.purchase_date.to_string()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_investment(conn: &Connection, id: i64, inv: &NewInvestment<'_>) -> Result<()> {
    validate_investment(inv)?;
    let n = conn.execute(
        "UPDATE investments SET symbol=?1, name=?2, amount=?3, purchase_price=?4, purchase_date=?5
         WHERE id=?6",
        params![
            inv.symbol.trim().to_uppercase(),
            inv.name.trim(),
            inv.amount.to_string(),
            inv.purchase_price.to_string(),
            inv.purchase_date.to_string(),
            id
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            entity: "investment",
            id,
        });
    }
    Ok(())
}

pub fn delete_investment(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM investments WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            entity: "investment",
            id,
        });
    }
    Ok(())
}

/// Every operator may edit every lot, so ownership reduces to existence.
pub fn investment_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM investments WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn list_investments(conn: &Connection) -> Result<Vec<Investment>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, name, amount, purchase_price, purchase_date
         FROM investments ORDER BY symbol, purchase_date, id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, symbol, name, amount, price, date) = row?;
        out.push(Investment {
            id,
            symbol,
            name,
            amount: decimal_column("investment amount", &amount)?,
            purchase_price: decimal_column("purchase price", &price)?,
            purchase_date: date_column("purchase date", &date)?,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn category_names_are_unique_per_type() {
        let conn = open_in_memory().unwrap();
        add_category(&conn, "Loans", CategoryType::DebtIn, None, None).unwrap();
        add_category(&conn, "Loans", CategoryType::DebtOut, None, None).unwrap();
        let err = add_category(&conn, "loans", CategoryType::DebtIn, None, None).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateCategory { .. }));
    }

    #[test]
    fn seeding_twice_inserts_nothing_new() {
        let conn = open_in_memory().unwrap();
        let first = seed_default_categories(&conn).unwrap();
        assert!(first > 0);
        assert_eq!(seed_default_categories(&conn).unwrap(), 0);
    }

    #[test]
    fn deleted_default_category_is_not_reseeded() {
        let conn = open_in_memory().unwrap();
        seed_default_categories(&conn).unwrap();
        let rent = find_category(&conn, "Rent", CategoryType::Expense)
            .unwrap()
            .unwrap();
        delete_category(&conn, rent.id).unwrap();

        assert_eq!(seed_default_categories(&conn).unwrap(), 0);
        assert!(find_category(&conn, "Rent", CategoryType::Expense)
            .unwrap()
            .is_none());
    }

    #[test]
    fn referenced_category_cannot_be_deleted() {
        let conn = open_in_memory().unwrap();
        let cat = add_category(&conn, "Food", CategoryType::Expense, None, None).unwrap();
        let tx = add_transaction(
            &conn,
            &NewTransaction {
                category_id: cat.id,
                amount: Decimal::new(500, 2),
                note: "",
                date: d("2025-01-01"),
            },
        )
        .unwrap();
        assert!(matches!(
            delete_category(&conn, cat.id),
            Err(LedgerError::CategoryInUse(_))
        ));
        delete_transaction(&conn, tx).unwrap();
        delete_category(&conn, cat.id).unwrap();
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let conn = open_in_memory().unwrap();
        let cat = add_category(&conn, "Food", CategoryType::Expense, None, None).unwrap();
        let err = add_transaction(
            &conn,
            &NewTransaction {
                category_id: cat.id,
                amount: Decimal::ZERO,
                note: "",
                date: d("2025-01-01"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveAmount(_)));
    }

    #[test]
    fn settings_singleton_overrides_first_user() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_settings(&conn).unwrap().starting_balance, Decimal::ZERO);

        register_user(&conn, "first", "pw-one", Some(Decimal::new(75000, 2))).unwrap();
        register_user(&conn, "second", "pw-two", Some(Decimal::new(1, 0))).unwrap();
        assert_eq!(
            get_settings(&conn).unwrap().starting_balance,
            Decimal::new(75000, 2)
        );

        set_starting_balance(&conn, Decimal::new(100000, 2)).unwrap();
        assert_eq!(
            get_settings(&conn).unwrap().starting_balance,
            Decimal::new(100000, 2)
        );
    }

    #[test]
    fn credentials_round_trip_and_duplicates_rejected() {
        let conn = open_in_memory().unwrap();
        register_user(&conn, "alex", "correct horse", None).unwrap();
        assert!(verify_credentials(&conn, "alex", "correct horse").unwrap().is_some());
        assert!(verify_credentials(&conn, "alex", "wrong").unwrap().is_none());
        assert!(verify_credentials(&conn, "nobody", "x").unwrap().is_none());
        assert!(matches!(
            register_user(&conn, "alex", "again", None),
            Err(LedgerError::DuplicateUser(_))
        ));
    }

    #[test]
    fn deleting_definition_detaches_materialized_rows() {
        let conn = open_in_memory().unwrap();
        let cat = add_category(&conn, "Rent", CategoryType::Expense, None, None).unwrap();
        let def = add_recurring(
            &conn,
            &NewRecurring {
                category_id: cat.id,
                amount: Decimal::new(120000, 2),
                note: "rent",
                frequency: Frequency::Monthly,
                start_date: d("2025-01-01"),
                end_date: None,
            },
        )
        .unwrap();
        conn.execute(
            "INSERT INTO transactions(category_id, amount, note, date, recurring_transaction_id)
             VALUES (?1, '1200.00', 'rent', '2025-01-01', ?2)",
            params![cat.id, def],
        )
        .unwrap();
        let tx_id = conn.last_insert_rowid();

        delete_recurring(&conn, def).unwrap();
        let tx = get_transaction(&conn, tx_id).unwrap();
        assert_eq!(tx.recurring_transaction_id, None);
    }

    #[test]
    fn recurring_end_must_not_precede_start() {
        let conn = open_in_memory().unwrap();
        let cat = add_category(&conn, "Gym", CategoryType::Expense, None, None).unwrap();
        let err = add_recurring(
            &conn,
            &NewRecurring {
                category_id: cat.id,
                amount: Decimal::ONE,
                note: "",
                frequency: Frequency::Weekly,
                start_date: d("2025-02-01"),
                end_date: Some(d("2025-01-01")),
            },
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::EndBeforeStart { .. }));
    }

    #[test]
    fn investments_are_normalised_and_editable() {
        let conn = open_in_memory().unwrap();
        let id = add_investment(
            &conn,
            &NewInvestment {
                symbol: " btc ",
                name: "Bitcoin",
                amount: Decimal::new(5, 1),
                purchase_price: Decimal::new(30000, 0),
                purchase_date: d("2024-05-01"),
            },
        )
        .unwrap();
        assert!(investment_exists(&conn, id).unwrap());
        let lots = list_investments(&conn).unwrap();
        assert_eq!(lots[0].symbol, "BTC");
        assert_eq!(lots[0].purchase_value(), Decimal::new(15000, 0));

        update_investment(
            &conn,
            id,
            &NewInvestment {
                symbol: "eth",
                name: "Ether",
                amount: Decimal::new(2, 0),
                purchase_price: Decimal::new(1500, 0),
                purchase_date: d("2024-05-02"),
            },
        )
        .unwrap();
        assert_eq!(list_investments(&conn).unwrap()[0].symbol, "ETH");

        delete_investment(&conn, id).unwrap();
        assert!(!investment_exists(&conn, id).unwrap());
    }

    #[test]
    fn lot_whose_purchase_value_overflows_is_rejected() {
        let conn = open_in_memory().unwrap();
        let err = add_investment(
            &conn,
            &NewInvestment {
                symbol: "BTC",
                name: "",
                amount: Decimal::MAX,
                purchase_price: Decimal::new(2, 0),
                purchase_date: d("2024-05-01"),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidValue {
                field: "purchase value",
                ..
            }
        ));
        assert!(list_investments(&conn).unwrap().is_empty());
    }
}
