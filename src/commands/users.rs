// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{list_users, register_user, verify_credentials};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Result, bail};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("verify", sub)) => verify(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let username = sub.get_one::<String>("username").unwrap();
    let balance = match sub.get_one::<String>("starting-balance") {
        Some(raw) => Some(parse_decimal(raw)?),
        None => None,
    };
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }
    let user = register_user(conn, username, &password, balance)?;
    println!("Registered '{}' (id {})", user.username, user.id);
    Ok(())
}

fn verify(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let username = sub.get_one::<String>("username").unwrap();
    let password = rpassword::prompt_password("Password: ")?;
    match verify_credentials(conn, username, &password)? {
        Some(user) => println!("Credentials valid for '{}'", user.username),
        None => bail!("Invalid username or password"),
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let users = list_users(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
        let rows = users
            .into_iter()
            .map(|u| {
                vec![
                    u.id.to_string(),
                    u.username,
                    fmt_money(&u.starting_balance),
                    u.created_at,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Username", "Starting Balance", "Created"], rows)
        );
    }
    Ok(())
}
