// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::ledger::{get_settings, set_starting_balance};
use crate::utils::{fmt_money, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-balance", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            set_starting_balance(conn, amount)?;
            println!("Starting balance set to {}", fmt_money(&amount));
        }
        Some(("show", _)) | None => {
            let settings = get_settings(conn)?;
            let rows = vec![
                vec!["starting_balance".to_string(), fmt_money(&settings.starting_balance)],
                vec!["database".to_string(), cfg.db_path.display().to_string()],
                vec!["quotes_url".to_string(), cfg.quotes_url.clone()],
                vec!["vs_currency".to_string(), cfg.vs_currency.clone()],
                vec!["offline".to_string(), cfg.offline.to_string()],
                vec!["quote_ttl_secs".to_string(), cfg.quote_ttl_secs.to_string()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
