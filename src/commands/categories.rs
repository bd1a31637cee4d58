// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{add_category, delete_category, list_categories};
use crate::models::CategoryType;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: CategoryType = sub.get_one::<String>("type").unwrap().parse()?;
            let color = sub.get_one::<String>("color").map(|s| s.as_str());
            let icon = sub.get_one::<String>("icon").map(|s| s.as_str());
            let cat = add_category(conn, name, kind, color, icon)?;
            println!("Added {} category '{}' (id {})", cat.r#type, cat.name, cat.id);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("type")
                .map(|s| s.parse::<CategoryType>())
                .transpose()?;
            let cats = list_categories(conn, kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let rows = cats
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.r#type.to_string(), c.color, c.icon])
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Type", "Color", "Icon"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_category(conn, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
