// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub starting_balance: Decimal,
    pub created_at: String,
}

/// Singleton holding ledger-wide settings; independent of any user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    pub starting_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Income,
    Expense,
    DebtIn,
    DebtOut,
}

impl CategoryType {
    pub const ALL: [CategoryType; 4] = [
        CategoryType::Income,
        CategoryType::Expense,
        CategoryType::DebtIn,
        CategoryType::DebtOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
            CategoryType::DebtIn => "debt_in",
            CategoryType::DebtOut => "debt_out",
        }
    }

    /// Direction of money for a category type. Stored amounts are always
    /// positive; this is the only place their sign is decided.
    pub fn sign(self) -> Decimal {
        match self {
            CategoryType::Income | CategoryType::DebtIn => Decimal::ONE,
            CategoryType::Expense | CategoryType::DebtOut => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn signed(self, amount: Decimal) -> Decimal {
        amount * self.sign()
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            "debt_in" => Ok(CategoryType::DebtIn),
            "debt_out" => Ok(CategoryType::DebtOut),
            _ => Err(LedgerError::invalid("category type", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub r#type: CategoryType,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub note: String,
    pub date: NaiveDate,
    pub created_at: String,
    pub recurring_transaction_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    /// A calendar month of variable length.
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The occurrence after `date`.
    ///
    /// Month and year steps keep the day of month, clamped to the last day of
    /// shorter months (Jan 31 -> Feb 28/29, Feb 29 -> Feb 28 next year).
    /// Returns `None` only past chrono's representable range.
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => date.checked_add_days(chrono::Days::new(1)),
            Frequency::Weekly => date.checked_add_days(chrono::Days::new(7)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(LedgerError::invalid("frequency", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub note: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub is_active: bool,
}

impl RecurringDefinition {
    /// Whether `date` is still inside the definition's window.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    /// Quantity held.
    pub amount: Decimal,
    /// Unit price paid.
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
}

impl Investment {
    /// `amount × purchase_price`. Saturates instead of panicking on rows
    /// that were written around [`crate::ledger::add_investment`].
    pub fn purchase_value(&self) -> Decimal {
        self.amount.saturating_mul(self.purchase_price)
    }
}

/// Checks a `YYYY-MM` month filter, returning it unchanged.
pub fn check_month(raw: &str) -> Result<&str, LedgerError> {
    let well_formed = raw.len() == 7
        && raw.as_bytes()[4] == b'-'
        && raw
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit())
        && NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(raw)
    } else {
        Err(LedgerError::invalid("month", raw))
    }
}

pub(crate) fn decimal_column(field: &'static str, raw: &str) -> Result<Decimal, LedgerError> {
    Decimal::from_str_exact(raw.trim()).map_err(|_| LedgerError::invalid(field, raw))
}

pub(crate) fn date_column(field: &'static str, raw: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| LedgerError::invalid(field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_filter_must_be_year_dash_month() {
        assert_eq!(check_month("2025-02").unwrap(), "2025-02");
        for bad in ["2025-2", "2025-00", "2025-13", "202502", "2025-02-01", "abcd-ef"] {
            assert!(check_month(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn advance_steps_by_frequency() {
        let start = d(2025, 3, 15);
        assert_eq!(Frequency::Daily.advance(start), Some(d(2025, 3, 16)));
        assert_eq!(Frequency::Weekly.advance(start), Some(d(2025, 3, 22)));
        assert_eq!(Frequency::Monthly.advance(start), Some(d(2025, 4, 15)));
        assert_eq!(Frequency::Yearly.advance(start), Some(d(2026, 3, 15)));
    }

    #[test]
    fn monthly_advance_clamps_to_month_end() {
        assert_eq!(Frequency::Monthly.advance(d(2025, 1, 31)), Some(d(2025, 2, 28)));
        assert_eq!(Frequency::Monthly.advance(d(2024, 1, 31)), Some(d(2024, 2, 29)));
        assert_eq!(Frequency::Monthly.advance(d(2025, 3, 31)), Some(d(2025, 4, 30)));
        assert_eq!(Frequency::Monthly.advance(d(2025, 12, 31)), Some(d(2026, 1, 31)));
    }

    #[test]
    fn yearly_advance_from_leap_day() {
        assert_eq!(Frequency::Yearly.advance(d(2024, 2, 29)), Some(d(2025, 2, 28)));
    }

    #[test]
    fn sign_follows_category_type() {
        let amt = Decimal::new(1250, 2);
        assert_eq!(CategoryType::Income.signed(amt), amt);
        assert_eq!(CategoryType::DebtIn.signed(amt), amt);
        assert_eq!(CategoryType::Expense.signed(amt), -amt);
        assert_eq!(CategoryType::DebtOut.signed(amt), -amt);
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("Debt_Out".parse::<CategoryType>().unwrap(), CategoryType::DebtOut);
        assert_eq!(" WEEKLY ".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn covers_respects_end_date() {
        let def = RecurringDefinition {
            id: 1,
            category_id: 1,
            amount: Decimal::ONE,
            note: String::new(),
            frequency: Frequency::Monthly,
            start_date: d(2025, 1, 1),
            end_date: Some(d(2025, 3, 1)),
            next_due_date: d(2025, 1, 1),
            is_active: true,
        };
        assert!(def.covers(d(2025, 3, 1)));
        assert!(!def.covers(d(2025, 3, 2)));
        assert!(!def.covers(d(2024, 12, 31)));
    }
}
