// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Live crypto quotes.
//!
//! Providers never return `Err`: every outcome, including an unreachable
//! network, is a [`QuoteFetch`] variant so callers can degrade per lot.

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::config::Config;
use crate::utils::http_client;

/// Ticker -> provider id for assets the provider does not key by ticker.
static PROVIDER_IDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("BTC", "bitcoin"),
        ("ETH", "ethereum"),
        ("USDT", "tether"),
        ("BNB", "binancecoin"),
        ("SOL", "solana"),
        ("XRP", "ripple"),
        ("USDC", "usd-coin"),
        ("ADA", "cardano"),
        ("DOGE", "dogecoin"),
        ("TRX", "tron"),
        ("DOT", "polkadot"),
        ("MATIC", "matic-network"),
        ("LTC", "litecoin"),
        ("AVAX", "avalanche-2"),
        ("LINK", "chainlink"),
        ("ATOM", "cosmos"),
        ("XLM", "stellar"),
    ])
});

/// Provider identifier for a ticker; unknown tickers are tried lowercased.
pub fn provider_id(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    match PROVIDER_IDS.get(upper.as_str()) {
        Some(id) => (*id).to_string(),
        None => upper.to_lowercase(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    /// 24h change in percent.
    pub change_24h: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteFetch {
    /// Keyed by provider id. Ids the provider could not price are absent.
    Quotes(HashMap<String, Quote>),
    /// The provider was reached but the call failed.
    Failed(String),
    /// No provider could be reached.
    Unavailable(String),
}

pub trait QuoteProvider {
    /// One batched lookup for all `symbols`.
    fn current_prices(&self, symbols: &[String]) -> QuoteFetch;
}

impl<P: QuoteProvider + ?Sized> QuoteProvider for Box<P> {
    fn current_prices(&self, symbols: &[String]) -> QuoteFetch {
        (**self).current_prices(symbols)
    }
}

/// Used when the configuration disables network access.
pub struct OfflineQuotes;

impl QuoteProvider for OfflineQuotes {
    fn current_prices(&self, _symbols: &[String]) -> QuoteFetch {
        QuoteFetch::Unavailable("price feed disabled (offline mode)".to_string())
    }
}

pub struct CoinGecko {
    client: reqwest::blocking::Client,
    base_url: String,
    vs_currency: String,
}

impl CoinGecko {
    pub fn new(base_url: &str, vs_currency: &str) -> Result<Self> {
        Ok(CoinGecko {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            vs_currency: vs_currency.to_lowercase(),
        })
    }

    fn parse(&self, body: HashMap<String, HashMap<String, Option<f64>>>) -> HashMap<String, Quote> {
        let change_key = format!("{}_24h_change", self.vs_currency);
        let mut out = HashMap::with_capacity(body.len());
        for (id, fields) in body {
            let Some(Some(px)) = fields.get(&self.vs_currency) else {
                continue;
            };
            let Ok(price) = Decimal::try_from(*px) else {
                continue;
            };
            let change_24h = fields
                .get(&change_key)
                .copied()
                .flatten()
                .and_then(|c| Decimal::try_from(c).ok())
                .map(|c| c.round_dp(4));
            out.insert(id, Quote { price, change_24h });
        }
        out
    }
}

impl QuoteProvider for CoinGecko {
    fn current_prices(&self, symbols: &[String]) -> QuoteFetch {
        let ids: BTreeSet<String> = symbols.iter().map(|s| provider_id(s)).collect();
        if ids.is_empty() {
            return QuoteFetch::Quotes(HashMap::new());
        }
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}&include_24hr_change=true",
            self.base_url,
            ids.into_iter().collect::<Vec<_>>().join(","),
            self.vs_currency
        );

        let resp = match self.client.get(&url).send() {
            Ok(r) => r,
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!(error = %e, "price feed unreachable");
                return QuoteFetch::Unavailable(format!("price feed unreachable: {e}"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "price request failed");
                return QuoteFetch::Failed(format!("price request failed: {e}"));
            }
        };
        let resp = match resp.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "price feed returned an error status");
                return QuoteFetch::Failed(format!("price feed error: {e}"));
            }
        };
        match resp.json::<HashMap<String, HashMap<String, Option<f64>>>>() {
            Ok(body) => QuoteFetch::Quotes(self.parse(body)),
            Err(e) => {
                tracing::warn!(error = %e, "malformed price response");
                QuoteFetch::Failed(format!("malformed price response: {e}"))
            }
        }
    }
}

pub fn provider_from_config(cfg: &Config) -> Result<Box<dyn QuoteProvider>> {
    if cfg.offline {
        return Ok(Box::new(OfflineQuotes));
    }
    Ok(Box::new(CoinGecko::new(&cfg.quotes_url, &cfg.vs_currency)?))
}

pub const DEFAULT_TTL_SECS: i64 = 300;
const PURGE_AFTER_HOURS: i64 = 24;

/// Caches successful batched responses in the `quote_cache` table.
pub struct CachedQuotes<'c, P> {
    conn: &'c Connection,
    inner: P,
    ttl: Duration,
}

fn cache_key(symbols: &[String]) -> String {
    let set: BTreeSet<String> = symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    set.into_iter().collect::<Vec<_>>().join(",")
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl<'c, P: QuoteProvider> CachedQuotes<'c, P> {
    pub fn new(conn: &'c Connection, inner: P, ttl: Duration) -> Self {
        CachedQuotes { conn, inner, ttl }
    }

    pub fn current_prices_at(&self, symbols: &[String], now: DateTime<Utc>) -> QuoteFetch {
        let key = cache_key(symbols);
        match self.lookup(&key, now) {
            Ok(Some(quotes)) => {
                tracing::debug!(key = %key, "quote cache hit");
                return QuoteFetch::Quotes(quotes);
            }
            Ok(None) => tracing::debug!(key = %key, "quote cache miss"),
            Err(e) => tracing::warn!(error = %e, "quote cache unreadable"),
        }

        let fetched = self.inner.current_prices(symbols);
        if let QuoteFetch::Quotes(quotes) = &fetched {
            if let Err(e) = self.store(&key, quotes, now) {
                tracing::warn!(error = %e, "failed to write quote cache");
            }
        }
        fetched
    }

    fn lookup(&self, key: &str, now: DateTime<Utc>) -> Result<Option<HashMap<String, Quote>>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, fetched_at FROM quote_cache WHERE cache_key=?1",
                params![key],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((payload, fetched_at)) = row else {
            return Ok(None);
        };
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)?.with_timezone(&Utc);
        if now - fetched_at >= self.ttl || fetched_at > now {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&payload)?))
    }

    fn store(&self, key: &str, quotes: &HashMap<String, Quote>, now: DateTime<Utc>) -> Result<()> {
        let cutoff = now - Duration::hours(PURGE_AFTER_HOURS);
        self.conn.execute(
            "DELETE FROM quote_cache WHERE fetched_at < ?1",
            params![timestamp(cutoff)],
        )?;
        self.conn.execute(
            "INSERT INTO quote_cache(cache_key, payload, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET payload=excluded.payload, fetched_at=excluded.fetched_at",
            params![key, serde_json::to_string(quotes)?, timestamp(now)],
        )?;
        Ok(())
    }
}

impl<P: QuoteProvider> QuoteProvider for CachedQuotes<'_, P> {
    fn current_prices(&self, symbols: &[String]) -> QuoteFetch {
        self.current_prices_at(symbols, Utc::now())
    }
}
