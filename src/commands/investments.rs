// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::ledger::{
    NewInvestment, add_investment, delete_investment, investment_exists, list_investments,
    update_investment,
};
use crate::oracle::{CachedQuotes, provider_from_config};
use crate::utils::{fmt_money, fmt_opt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use crate::valuation::{PortfolioStats, ValuedInvestment, Valuation, aggregate, valuate};
use anyhow::{Result, bail};
use chrono::Duration;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let lot = lot_from_args(sub)?;
            let id = add_investment(conn, &lot.as_new())?;
            println!(
                "Added {} {} @ {} (id {})",
                lot.amount,
                lot.symbol.to_uppercase(),
                fmt_money(&lot.price),
                id
            );
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            if !investment_exists(conn, id)? {
                bail!("Investment {} not found", id);
            }
            let lot = lot_from_args(sub)?;
            update_investment(conn, id, &lot.as_new())?;
            println!("Updated investment {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_investment(conn, id)?;
            println!("Removed investment {}", id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("value", sub)) => value(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

struct LotArgs {
    symbol: String,
    name: String,
    amount: rust_decimal::Decimal,
    price: rust_decimal::Decimal,
    date: chrono::NaiveDate,
}

impl LotArgs {
    fn as_new(&self) -> NewInvestment<'_> {
        NewInvestment {
            symbol: &self.symbol,
            name: &self.name,
            amount: self.amount,
            purchase_price: self.price,
            purchase_date: self.date,
        }
    }
}

fn lot_from_args(sub: &clap::ArgMatches) -> Result<LotArgs> {
    let symbol = sub.get_one::<String>("symbol").unwrap().trim().to_string();
    let name = sub
        .get_one::<String>("name")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| symbol.to_uppercase());
    Ok(LotArgs {
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        price: parse_decimal(sub.get_one::<String>("price").unwrap())?,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        symbol,
        name,
    })
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let lots = list_investments(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &lots)? {
        let rows = lots
            .iter()
            .map(|l| {
                vec![
                    l.id.to_string(),
                    l.symbol.clone(),
                    l.name.clone(),
                    l.amount.to_string(),
                    fmt_money(&l.purchase_price),
                    fmt_money(&l.purchase_value()),
                    l.purchase_date.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Symbol", "Name", "Qty", "Buy Price", "Cost", "Bought"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct PortfolioReport {
    investments: Vec<ValuedInvestment>,
    stats: PortfolioStats,
}

/// Values the portfolio through the cached price feed.
pub fn portfolio_report(conn: &Connection, cfg: &Config) -> Result<(Vec<ValuedInvestment>, PortfolioStats)> {
    let provider = provider_from_config(cfg)?;
    let quotes = CachedQuotes::new(conn, provider, Duration::seconds(cfg.quote_ttl_secs));
    let lots = list_investments(conn)?;
    let valued = valuate(&lots, &quotes);
    let stats = aggregate(&valued);
    Ok((valued, stats))
}

fn value(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let (investments, stats) = portfolio_report(conn, cfg)?;
    let report = PortfolioReport { investments, stats };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let rows = report
        .investments
        .iter()
        .map(|v| {
            let (price, change) = match &v.valuation {
                Valuation::Current {
                    price, change_24h, ..
                } => (
                    fmt_money(price),
                    change_24h
                        .map(|c| format!("{:.2}%", c))
                        .unwrap_or_default(),
                ),
                other => (other.message().unwrap_or_default().to_string(), String::new()),
            };
            vec![
                v.investment.symbol.clone(),
                v.investment.amount.to_string(),
                fmt_money(&v.purchase_value),
                price,
                change,
                fmt_opt_money(v.valuation.current_value().as_ref()),
                fmt_opt_money(v.valuation.profit_loss().as_ref()),
                v.valuation.status().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Symbol", "Qty", "Cost", "Price", "24h", "Value", "P/L", "Status"],
            rows
        )
    );

    let s = &report.stats;
    println!(
        "{}",
        pretty_table(
            &["Cost", "Value", "P/L", "P/L %", "Status", "Priced", "Failed"],
            vec![vec![
                fmt_money(&s.total_purchase_value),
                fmt_opt_money(s.total_current_value.as_ref()),
                fmt_opt_money(s.total_profit_loss.as_ref()),
                s.total_profit_loss_percent
                    .map(|p| format!("{:.2}%", p))
                    .unwrap_or_else(|| "unavailable".to_string()),
                s.data_status.as_str().to_string(),
                s.working_count.to_string(),
                s.error_count.to_string(),
            ]]
        )
    );
    Ok(())
}
