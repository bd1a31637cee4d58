// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Local;
use tracing_subscriber::EnvFilter;

use coinpurse::{cli, commands, config::Config, db, recurring};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = Config::from_env()?;
    let mut conn = db::open_or_init(&cfg.db_path)?;

    // Every invocation catches the ledger up on due recurring transactions.
    let today = Local::now().date_naive();
    let processed = recurring::process_due(&mut conn, today);
    if processed > 0 {
        eprintln!("Recorded {} due recurring transaction(s)", processed);
    }

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut conn, sub)?,
        Some(("invest", sub)) => commands::investments::handle(&conn, &cfg, sub)?,
        Some(("wealth", sub)) => commands::wealth::handle(&conn, &cfg, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&conn, &cfg, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
