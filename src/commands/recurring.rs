// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{
    NewRecurring, add_recurring, delete_recurring, get_category, list_recurring,
    set_recurring_active,
};
use crate::models::{CategoryType, Frequency};
use crate::recurring::try_process_due;
use crate::utils::{category_id, fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("pause", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            set_recurring_active(conn, id, false)?;
            println!("Paused recurring definition {}", id);
        }
        Some(("resume", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            set_recurring_active(conn, id, true)?;
            println!("Resumed recurring definition {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_recurring(conn, id)?;
            println!("Removed recurring definition {}; its transactions were kept", id);
        }
        Some(("run", sub)) => {
            let date = match sub.get_one::<String>("date") {
                Some(raw) => parse_date(raw)?,
                None => Local::now().date_naive(),
            };
            let n = try_process_due(conn, date)?;
            println!("Materialized {} recurring transaction(s) up to {}", n, date);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: CategoryType = sub.get_one::<String>("type").unwrap().parse()?;
    let category = sub.get_one::<String>("category").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let frequency: Frequency = sub.get_one::<String>("frequency").unwrap().parse()?;
    let start_date = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end_date = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s))
        .transpose()?;
    let note = sub.get_one::<String>("note").map(|s| s.trim()).unwrap_or("");

    let id = add_recurring(
        conn,
        &NewRecurring {
            category_id: category_id(conn, category, kind)?,
            amount,
            note,
            frequency,
            start_date,
            end_date,
        },
    )?;
    println!(
        "Added {} recurring {} of {} starting {} (id {})",
        frequency,
        kind,
        fmt_money(&amount),
        start_date,
        id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let defs = list_recurring(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &defs)? {
        return Ok(());
    }
    let mut rows = Vec::with_capacity(defs.len());
    for d in defs {
        let cat = get_category(conn, d.category_id)?;
        rows.push(vec![
            d.id.to_string(),
            cat.name,
            fmt_money(&cat.r#type.signed(d.amount)),
            d.frequency.to_string(),
            d.start_date.to_string(),
            d.end_date.map(|e| e.to_string()).unwrap_or_default(),
            d.next_due_date.to_string(),
            if d.is_active { "active" } else { "paused" }.to_string(),
            d.note,
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["ID", "Category", "Amount", "Every", "Start", "End", "Next Due", "State", "Note"],
            rows,
        )
    );
    Ok(())
}
