// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{
    NewTransaction, TransactionFilter, TransactionView, add_transaction, delete_transaction,
    list_transactions,
};
use crate::models::CategoryType;
use crate::utils::{
    category_id, fmt_money, maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_transaction(conn, id)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let kind: CategoryType = sub.get_one::<String>("type").unwrap().parse()?;
    let category = sub.get_one::<String>("category").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.trim()).unwrap_or("");

    let category_id = category_id(conn, category, kind)?;
    let id = add_transaction(
        conn,
        &NewTransaction {
            category_id,
            amount,
            note,
            date,
        },
    )?;
    println!(
        "Recorded {} {} on {} in '{}' (id {})",
        kind,
        fmt_money(&amount),
        date,
        category.trim(),
        id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.to_string(),
                    r.category.clone().unwrap_or_default(),
                    r.r#type.map(|k| k.to_string()).unwrap_or_default(),
                    fmt_money(&r.signed_amount),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Category", "Type", "Amount", "Note"], rows)
        );
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionView>> {
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let kind = sub
        .get_one::<String>("type")
        .map(|s| s.parse::<CategoryType>())
        .transpose()?;
    let filter = TransactionFilter {
        month: month.as_deref(),
        kind,
        limit: sub.get_one::<usize>("limit").copied(),
    };
    Ok(list_transactions(conn, &filter)?)
}
