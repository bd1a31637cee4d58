// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use coinpurse::ledger::{NewTransaction, add_category, add_transaction};
use coinpurse::models::CategoryType;
use coinpurse::{cli, commands::transactions, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let food = add_category(&conn, "Food", CategoryType::Expense, None, None).unwrap();
    let salary = add_category(&conn, "Salary", CategoryType::Income, None, None).unwrap();
    for (cat, day) in [(food.id, 1), (food.id, 2), (salary.id, 3)] {
        add_transaction(
            &conn,
            &NewTransaction {
                category_id: cat,
                amount: Decimal::new(10, 0),
                note: "",
                date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            },
        )
        .unwrap();
    }
    add_transaction(
        &conn,
        &NewTransaction {
            category_id: salary.id,
            amount: Decimal::new(2500, 0),
            note: "february",
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        },
    )
    .unwrap();
    conn
}

fn list_rows(conn: &Connection, args: &[&str]) -> Vec<coinpurse::ledger::TransactionView> {
    let mut argv = vec!["coinpurse", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            return transactions::query_rows(conn, list_m).unwrap();
        }
    }
    panic!("no tx list subcommand");
}

#[test]
fn list_limit_respected() {
    let conn = setup();
    let rows = list_rows(&conn, &["--limit", "2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
}

#[test]
fn list_filters_by_month_and_type() {
    let conn = setup();
    assert_eq!(list_rows(&conn, &["--month", "2025-01"]).len(), 3);

    let expenses = list_rows(&conn, &["--month", "2025-01", "--type", "expense"]);
    assert_eq!(expenses.len(), 2);
    assert!(expenses.iter().all(|r| r.signed_amount == Decimal::new(-10, 0)));
    assert!(expenses.iter().all(|r| r.category.as_deref() == Some("Food")));
}

#[test]
fn list_rejects_malformed_month() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from(["coinpurse", "tx", "list", "--month", "2025-13"]);
    let (_, tx_m) = matches.subcommand().unwrap();
    let (_, list_m) = tx_m.subcommand().unwrap();
    assert!(transactions::query_rows(&conn, list_m).is_err());
}
