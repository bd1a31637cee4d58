// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::oracle::{CachedQuotes, provider_from_config};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};
use crate::valuation::PortfolioStatus;
use crate::wealth::{FlowTotals, WealthBreakdown, compute_wealth, flow_totals};
use anyhow::Result;
use chrono::{Duration, Local};
use rusqlite::Connection;
use serde::Serialize;

#[derive(Serialize)]
struct WealthReport {
    wealth: WealthBreakdown,
    /// Flows of the current calendar month.
    this_month: FlowTotals,
}

pub fn handle(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let provider = provider_from_config(cfg)?;
    let quotes = CachedQuotes::new(conn, provider, Duration::seconds(cfg.quote_ttl_secs));
    let wealth = compute_wealth(conn, month.as_deref(), &quotes)?;
    let current_month = Local::now().format("%Y-%m").to_string();
    let this_month = flow_totals(conn, Some(&current_month))?;

    let report = WealthReport { wealth, this_month };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let w = &report.wealth;
    let investments = match w.investments_status {
        PortfolioStatus::Current | PortfolioStatus::NoInvestments => fmt_money(&w.total_investments),
        PortfolioStatus::PartialData => "unavailable (some prices missing)".to_string(),
        PortfolioStatus::ApiUnavailable => "unavailable (price feed down)".to_string(),
    };
    let rows = vec![
        vec!["Starting balance".to_string(), fmt_money(&w.starting_balance)],
        vec!["Income".to_string(), fmt_money(&w.total_income)],
        vec!["Expenses".to_string(), fmt_money(&w.total_expenses)],
        vec!["Base wealth".to_string(), fmt_money(&w.base_wealth)],
        vec!["Debt in".to_string(), fmt_money(&w.total_debt_in)],
        vec!["Debt out".to_string(), fmt_money(&w.total_debt_out)],
        vec!["Net debt position".to_string(), fmt_money(&w.net_debt_position)],
        vec!["Wealth with debts".to_string(), fmt_money(&w.wealth_with_debts)],
        vec!["Investments".to_string(), investments],
        vec!["Total wealth".to_string(), fmt_money(&w.total_wealth)],
    ];
    let title = match &month {
        Some(m) => format!("Wealth ({} flows)", m),
        None => "Wealth".to_string(),
    };
    println!("{}", pretty_table(&[title.as_str(), "Amount"], rows));

    let m = &report.this_month;
    println!(
        "{}",
        pretty_table(
            &[current_month.as_str(), "Income", "Expenses", "Debt in", "Debt out", "Net"],
            vec![vec![
                String::new(),
                fmt_money(&m.income),
                fmt_money(&m.expenses),
                fmt_money(&m.debt_in),
                fmt_money(&m.debt_out),
                fmt_money(&m.net()),
            ]]
        )
    );
    Ok(())
}
