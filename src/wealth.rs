// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Net worth of the shared ledger.
//!
//! Flows are summed per category type in `Decimal`; investments enter at
//! their current value only when every lot could be priced.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::ledger::{get_settings, list_investments};
use crate::models::{CategoryType, check_month, decimal_column};
use crate::oracle::QuoteProvider;
use crate::valuation::{PortfolioStats, PortfolioStatus, aggregate, valuate};

/// Per-type sums of transaction amounts, either lifetime or for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowTotals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub debt_in: Decimal,
    pub debt_out: Decimal,
}

impl FlowTotals {
    fn add(&mut self, kind: CategoryType, amount: Decimal) {
        match kind {
            CategoryType::Income => self.income += amount,
            CategoryType::Expense => self.expenses += amount,
            CategoryType::DebtIn => self.debt_in += amount,
            CategoryType::DebtOut => self.debt_out += amount,
        }
    }

    /// Sum of every amount with its category's sign applied.
    pub fn net(&self) -> Decimal {
        CategoryType::Income.signed(self.income)
            + CategoryType::Expense.signed(self.expenses)
            + CategoryType::DebtIn.signed(self.debt_in)
            + CategoryType::DebtOut.signed(self.debt_out)
    }
}

/// Totals across the shared ledger. `month` is `YYYY-MM`; `None` means all time.
pub fn flow_totals(conn: &Connection, month: Option<&str>) -> Result<FlowTotals> {
    let month = month.map(check_month).transpose()?;
    let mut stmt = conn.prepare_cached(
        "SELECT c.type, t.amount
         FROM transactions t JOIN categories c ON t.category_id=c.id
         WHERE ?1 IS NULL OR substr(t.date,1,7)=?1",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut totals = FlowTotals::default();
    for row in rows {
        let (kind, amount) = row?;
        totals.add(kind.parse()?, decimal_column("transaction amount", &amount)?);
    }
    Ok(totals)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WealthBreakdown {
    pub starting_balance: Decimal,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_debt_in: Decimal,
    pub total_debt_out: Decimal,
    pub net_debt_position: Decimal,
    pub base_wealth: Decimal,
    pub wealth_with_debts: Decimal,
    /// Zero whenever the portfolio has no complete current value.
    pub total_investments: Decimal,
    pub investments_status: PortfolioStatus,
    pub total_wealth: Decimal,
}

impl WealthBreakdown {
    pub fn new(starting_balance: Decimal, flows: &FlowTotals, portfolio: &PortfolioStats) -> Self {
        let net_debt_position = flows.debt_in - flows.debt_out;
        let base_wealth = starting_balance + flows.income - flows.expenses;
        let wealth_with_debts = base_wealth + net_debt_position;
        let total_investments = portfolio.total_current_value.unwrap_or(Decimal::ZERO);
        WealthBreakdown {
            starting_balance,
            total_income: flows.income,
            total_expenses: flows.expenses,
            total_debt_in: flows.debt_in,
            total_debt_out: flows.debt_out,
            net_debt_position,
            base_wealth,
            wealth_with_debts,
            total_investments,
            investments_status: portfolio.data_status,
            total_wealth: wealth_with_debts + total_investments,
        }
    }
}

/// Net worth of the shared ledger. Read-only.
///
/// Only store failures are errors; an unreachable price feed shows up as
/// `investments_status` with investments counted at zero.
pub fn compute_wealth(
    conn: &Connection,
    month: Option<&str>,
    quotes: &dyn QuoteProvider,
) -> Result<WealthBreakdown> {
    let settings = get_settings(conn)?;
    let flows = flow_totals(conn, month)?;
    let lots = list_investments(conn)?;
    let portfolio = aggregate(&valuate(&lots, quotes));
    Ok(WealthBreakdown::new(settings.starting_balance, &flows, &portfolio))
}
