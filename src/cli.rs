// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, value_parser};

const CATEGORY_TYPES: [&str; 4] = ["income", "expense", "debt_in", "debt_out"];
const FREQUENCIES: [&str; 4] = ["daily", "weekly", "monthly", "yearly"];

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print as pretty JSON").action(ArgAction::SetTrue))
        .arg(
            arg!(--jsonl "Print as JSON lines")
                .action(ArgAction::SetTrue)
                .conflicts_with("json"),
        )
}

fn type_arg(required: bool) -> Arg {
    Arg::new("type")
        .long("type")
        .value_name("TYPE")
        .value_parser(CATEGORY_TYPES)
        .required(required)
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    Command::new("coinpurse")
        .about("Shared household ledger with recurring transactions and crypto portfolio")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create the database and default categories"))
        .subcommand(
            Command::new("user")
                .about("Operators of the shared ledger")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--username <NAME>).required(true))
                        .arg(arg!(--"starting-balance" <AMOUNT>).required(false)),
                )
                .subcommand(Command::new("verify").arg(arg!(--username <NAME>).required(true)))
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("category")
                .about("Income, expense and debt categories")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(type_arg(true))
                        .arg(arg!(--color <HEX>).required(false))
                        .arg(arg!(--icon <ICON>).required(false)),
                )
                .subcommand(json_flags(Command::new("list").arg(type_arg(false))))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--category <NAME>).required(true))
                        .arg(type_arg(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--note <NOTE>).required(false)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(arg!(--month <MONTH> "YYYY-MM").required(false))
                        .arg(type_arg(false))
                        .arg(
                            arg!(--limit <N>)
                                .required(false)
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring transaction definitions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--category <NAME>).required(true))
                        .arg(type_arg(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(
                            arg!(--frequency <FREQ>)
                                .required(true)
                                .value_parser(FREQUENCIES),
                        )
                        .arg(arg!(--start <DATE>).required(true))
                        .arg(arg!(--end <DATE>).required(false))
                        .arg(arg!(--note <NOTE>).required(false)),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("pause").arg(id_arg()))
                .subcommand(Command::new("resume").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("run")
                        .about("Materialize due occurrences")
                        .arg(arg!(--date <DATE> "Reference date, defaults to today").required(false)),
                ),
        )
        .subcommand(
            Command::new("invest")
                .about("Crypto investment lots")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--name <NAME>).required(false))
                        .arg(arg!(--amount <QTY>).required(true))
                        .arg(arg!(--price <PRICE> "Unit purchase price").required(true))
                        .arg(arg!(--date <DATE>).required(true)),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--name <NAME>).required(false))
                        .arg(arg!(--amount <QTY>).required(true))
                        .arg(arg!(--price <PRICE>).required(true))
                        .arg(arg!(--date <DATE>).required(true)),
                )
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(json_flags(Command::new("value"))),
        )
        .subcommand(json_flags(
            Command::new("wealth")
                .about("Net worth of the shared ledger")
                .arg(arg!(--month <MONTH> "Limit flows to YYYY-MM").required(false)),
        ))
        .subcommand(
            Command::new("settings")
                .about("Ledger-wide settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set-balance").arg(arg!(--amount <AMOUNT>).required(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export ledger data")
                .subcommand(
                    Command::new("transactions")
                        .arg(
                            arg!(--format <FMT>)
                                .required(false)
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(arg!(--out <PATH>).required(true)),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn rejects_unknown_frequency() {
        let res = build_cli().try_get_matches_from([
            "coinpurse",
            "recurring",
            "add",
            "--category",
            "Rent",
            "--type",
            "expense",
            "--amount",
            "10",
            "--frequency",
            "fortnightly",
            "--start",
            "2025-01-01",
        ]);
        assert!(res.is_err());
    }
}
