// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::db::default_db_path;
use crate::oracle::DEFAULT_TTL_SECS;

pub const DEFAULT_QUOTES_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub quotes_url: String,
    pub vs_currency: String,
    /// No price feed at all; every lot reports the feed as unavailable.
    pub offline: bool,
    pub quote_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the configuration from any key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match get("COINPURSE_DB").filter(|v| !v.trim().is_empty()) {
            Some(p) => PathBuf::from(p.trim()),
            None => default_db_path()?,
        };
        let quotes_url = get("COINPURSE_QUOTES_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUOTES_URL.to_string());
        let vs_currency = get("COINPURSE_VS_CURRENCY")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "usd".to_string());
        let offline = matches!(
            get("COINPURSE_OFFLINE").as_deref().map(str::trim),
            Some("1") | Some("true") | Some("yes")
        );
        let quote_ttl_secs = match get("COINPURSE_QUOTE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid COINPURSE_QUOTE_TTL_SECS '{}'", raw))?,
            None => DEFAULT_TTL_SECS,
        };
        Ok(Config {
            db_path,
            quotes_url,
            vs_currency: vs_currency.trim().to_lowercase(),
            offline,
            quote_ttl_secs,
        })
    }
}
