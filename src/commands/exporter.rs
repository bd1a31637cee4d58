// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{TransactionFilter, list_transactions};
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
            let out = sub.get_one::<String>("out").unwrap().trim();
            let n = export_transactions(conn, &fmt, Path::new(out))?;
            println!("Exported {} transactions to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes every transaction, oldest first, with amounts signed by category type.
pub fn export_transactions(conn: &Connection, fmt: &str, out: &Path) -> Result<usize> {
    let mut rows = list_transactions(conn, &TransactionFilter::default())?;
    rows.reverse();

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "date",
                "category",
                "type",
                "amount",
                "signed_amount",
                "note",
                "recurring_id",
            ])?;
            for r in &rows {
                wtr.write_record([
                    r.id.to_string(),
                    r.date.to_string(),
                    r.category.clone().unwrap_or_default(),
                    r.r#type.map(|k| k.to_string()).unwrap_or_default(),
                    r.amount.to_string(),
                    r.signed_amount.to_string(),
                    r.note.clone(),
                    r.recurring_transaction_id
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        other => anyhow::bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(rows.len())
}
