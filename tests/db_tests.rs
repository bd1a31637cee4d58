// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use coinpurse::db;
use coinpurse::ledger::{delete_category, find_category, list_categories};
use coinpurse::models::CategoryType;
use tempfile::tempdir;

#[test]
fn deleted_default_category_stays_deleted_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");

    let conn = db::open_or_init(&path).unwrap();
    let seeded = list_categories(&conn, None).unwrap().len();
    assert!(seeded > 0);
    let rent = find_category(&conn, "Rent", CategoryType::Expense)
        .unwrap()
        .unwrap();
    delete_category(&conn, rent.id).unwrap();
    drop(conn);

    let conn = db::open_or_init(&path).unwrap();
    assert!(find_category(&conn, "Rent", CategoryType::Expense)
        .unwrap()
        .is_none());
    assert_eq!(list_categories(&conn, None).unwrap().len(), seeded - 1);
}
