// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Marks investment lots to market.
//!
//! A lot without a live quote carries no current value at all. Totals that
//! depend on such a lot are absent too, never a silent zero.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::Investment;
use crate::oracle::{QuoteFetch, QuoteProvider, provider_id};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "data_status", rename_all = "snake_case")]
pub enum Valuation {
    Current {
        price: Decimal,
        current_value: Decimal,
        profit_loss: Decimal,
        profit_loss_percent: Decimal,
        change_24h: Option<Decimal>,
    },
    ApiError {
        message: String,
    },
    SymbolNotFound {
        message: String,
    },
    ApiUnavailable {
        message: String,
    },
}

impl Valuation {
    fn priced(purchase_value: Decimal, amount: Decimal, price: Decimal, change_24h: Option<Decimal>) -> Self {
        let overflow = || Valuation::ApiError {
            message: format!("value of {amount} at {price} is out of range"),
        };
        let Some(current_value) = amount.checked_mul(price) else {
            return overflow();
        };
        let Some(profit_loss) = current_value.checked_sub(purchase_value) else {
            return overflow();
        };
        let profit_loss_percent = if purchase_value.is_zero() {
            Decimal::ZERO
        } else {
            match profit_loss
                .checked_div(purchase_value)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            {
                Some(pct) => pct.round_dp(2),
                None => return overflow(),
            }
        };
        Valuation::Current {
            price,
            current_value,
            profit_loss,
            profit_loss_percent,
            change_24h,
        }
    }

    pub fn current_value(&self) -> Option<Decimal> {
        match self {
            Valuation::Current { current_value, .. } => Some(*current_value),
            _ => None,
        }
    }

    pub fn profit_loss(&self) -> Option<Decimal> {
        match self {
            Valuation::Current { profit_loss, .. } => Some(*profit_loss),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Valuation::Current { .. } => "current",
            Valuation::ApiError { .. } => "api_error",
            Valuation::SymbolNotFound { .. } => "symbol_not_found",
            Valuation::ApiUnavailable { .. } => "api_unavailable",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Valuation::Current { .. } => None,
            Valuation::ApiError { message }
            | Valuation::SymbolNotFound { message }
            | Valuation::ApiUnavailable { message } => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedInvestment {
    #[serde(flatten)]
    pub investment: Investment,
    pub purchase_value: Decimal,
    #[serde(flatten)]
    pub valuation: Valuation,
}

/// Values every lot from a single batched quote request.
pub fn valuate(investments: &[Investment], quotes: &dyn QuoteProvider) -> Vec<ValuedInvestment> {
    if investments.is_empty() {
        return Vec::new();
    }
    let symbols: Vec<String> = investments
        .iter()
        .map(|i| i.symbol.trim().to_uppercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let fetched = quotes.current_prices(&symbols);

    investments
        .iter()
        .map(|inv| {
            let purchase_value = inv.purchase_value();
            let valuation = match &fetched {
                QuoteFetch::Quotes(map) => match map.get(&provider_id(&inv.symbol)) {
                    Some(q) => Valuation::priced(purchase_value, inv.amount, q.price, q.change_24h),
                    None => Valuation::SymbolNotFound {
                        message: format!("No price data for {}", inv.symbol),
                    },
                },
                QuoteFetch::Failed(msg) => Valuation::ApiError {
                    message: msg.clone(),
                },
                QuoteFetch::Unavailable(msg) => Valuation::ApiUnavailable {
                    message: msg.clone(),
                },
            };
            ValuedInvestment {
                investment: inv.clone(),
                purchase_value,
                valuation,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioStatus {
    NoInvestments,
    Current,
    PartialData,
    ApiUnavailable,
}

impl PortfolioStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PortfolioStatus::NoInvestments => "no_investments",
            PortfolioStatus::Current => "current",
            PortfolioStatus::PartialData => "partial_data",
            PortfolioStatus::ApiUnavailable => "api_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub total_purchase_value: Decimal,
    /// Present only when every lot has a live value.
    pub total_current_value: Option<Decimal>,
    pub total_profit_loss: Option<Decimal>,
    pub total_profit_loss_percent: Option<Decimal>,
    pub data_status: PortfolioStatus,
    pub error_count: usize,
    pub working_count: usize,
}

impl PortfolioStats {
    pub fn empty() -> Self {
        PortfolioStats {
            total_purchase_value: Decimal::ZERO,
            total_current_value: Some(Decimal::ZERO),
            total_profit_loss: Some(Decimal::ZERO),
            total_profit_loss_percent: Some(Decimal::ZERO),
            data_status: PortfolioStatus::NoInvestments,
            error_count: 0,
            working_count: 0,
        }
    }
}

pub fn aggregate(valued: &[ValuedInvestment]) -> PortfolioStats {
    if valued.is_empty() {
        return PortfolioStats::empty();
    }

    let mut total_purchase_value = Decimal::ZERO;
    let mut total_current_value = Some(Decimal::ZERO);
    let mut error_count = 0;
    let mut working_count = 0;
    // feed reachable, only some symbols unknown
    let mut only_unknown_symbols = true;

    for lot in valued {
        total_purchase_value = total_purchase_value.saturating_add(lot.purchase_value);
        match lot.valuation.current_value() {
            Some(v) => {
                working_count += 1;
                if let Some(total) = total_current_value.as_mut() {
                    *total = total.saturating_add(v);
                }
            }
            None => {
                error_count += 1;
                total_current_value = None;
                if !matches!(lot.valuation, Valuation::SymbolNotFound { .. }) {
                    only_unknown_symbols = false;
                }
            }
        }
    }

    let data_status = if error_count == 0 {
        PortfolioStatus::Current
    } else if working_count > 0 && only_unknown_symbols {
        PortfolioStatus::PartialData
    } else {
        PortfolioStatus::ApiUnavailable
    };

    let total_profit_loss = total_current_value.map(|cv| cv - total_purchase_value);
    let total_profit_loss_percent = total_profit_loss.and_then(|pl| {
        if total_purchase_value.is_zero() {
            Some(Decimal::ZERO)
        } else {
            pl.checked_div(total_purchase_value)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(2))
        }
    });

    PortfolioStats {
        total_purchase_value,
        total_current_value,
        total_profit_loss,
        total_profit_loss_percent,
        data_status,
        error_count,
        working_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Quote;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct Fixed {
        result: QuoteFetch,
        requests: RefCell<Vec<Vec<String>>>,
    }

    impl Fixed {
        fn new(result: QuoteFetch) -> Self {
            Fixed {
                result,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl QuoteProvider for Fixed {
        fn current_prices(&self, symbols: &[String]) -> QuoteFetch {
            self.requests.borrow_mut().push(symbols.to_vec());
            self.result.clone()
        }
    }

    fn lot(id: i64, symbol: &str, amount: &str, price: &str) -> Investment {
        Investment {
            id,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            amount: amount.parse().unwrap(),
            purchase_price: price.parse().unwrap(),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn quotes(pairs: &[(&str, &str)]) -> QuoteFetch {
        QuoteFetch::Quotes(
            pairs
                .iter()
                .map(|(id, px)| {
                    (
                        id.to_string(),
                        Quote {
                            price: px.parse().unwrap(),
                            change_24h: Some(Decimal::new(250, 2)),
                        },
                    )
                })
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn current_value_is_exact_product_of_amount_and_price() {
        let provider = Fixed::new(quotes(&[("bitcoin", "64123.45")]));
        let lots = [lot(1, "BTC", "0.125", "40000")];
        let valued = valuate(&lots, &provider);
        let expected: Decimal = "8015.43125".parse().unwrap();
        assert_eq!(valued[0].valuation.current_value(), Some(expected));
        assert_eq!(valued[0].purchase_value, Decimal::new(5000, 0));
        assert_eq!(valued[0].valuation.profit_loss(), Some(expected - Decimal::new(5000, 0)));
        match &valued[0].valuation {
            Valuation::Current {
                profit_loss_percent,
                change_24h,
                ..
            } => {
                assert_eq!(*profit_loss_percent, "60.31".parse::<Decimal>().unwrap());
                assert_eq!(*change_24h, Some(Decimal::new(250, 2)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn one_batched_request_for_all_lots() {
        let provider = Fixed::new(quotes(&[("bitcoin", "1"), ("ethereum", "1")]));
        let lots = [
            lot(1, "BTC", "1", "1"),
            lot(2, "eth", "1", "1"),
            lot(3, "BTC", "2", "1"),
        ];
        valuate(&lots, &provider);
        let requests = provider.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], vec!["BTC".to_string(), "ETH".to_string()]);
    }

    #[test]
    fn zero_purchase_value_yields_zero_percent() {
        let provider = Fixed::new(quotes(&[("solana", "150")]));
        let valued = valuate(&[lot(1, "SOL", "3", "0")], &provider);
        match &valued[0].valuation {
            Valuation::Current {
                profit_loss_percent,
                ..
            } => assert_eq!(*profit_loss_percent, Decimal::ZERO),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_is_reported_per_lot() {
        let provider = Fixed::new(quotes(&[("bitcoin", "100")]));
        let valued = valuate(&[lot(1, "BTC", "1", "50"), lot(2, "NOPE", "1", "5")], &provider);
        assert_eq!(valued[0].valuation.status(), "current");
        assert_eq!(valued[1].valuation.status(), "symbol_not_found");
        assert_eq!(valued[1].valuation.current_value(), None);
        assert!(valued[1].valuation.message().unwrap().contains("NOPE"));

        let stats = aggregate(&valued);
        assert_eq!(stats.data_status, PortfolioStatus::PartialData);
        assert_eq!(stats.total_current_value, None);
        assert_eq!(stats.total_purchase_value, Decimal::new(55, 0));
    }

    #[test]
    fn unreachable_feed_leaves_totals_absent() {
        let provider = Fixed::new(QuoteFetch::Unavailable("offline".into()));
        let valued = valuate(&[lot(1, "BTC", "1", "50"), lot(2, "ETH", "2", "10")], &provider);
        assert!(valued.iter().all(|v| v.valuation.status() == "api_unavailable"));

        let stats = aggregate(&valued);
        assert_eq!(stats.data_status, PortfolioStatus::ApiUnavailable);
        assert_eq!(stats.total_current_value, None);
        assert_eq!(stats.total_profit_loss, None);
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.working_count, 0);
    }

    #[test]
    fn one_failed_lot_voids_the_portfolio_total() {
        let priced = ValuedInvestment {
            investment: lot(1, "BTC", "1", "80"),
            purchase_value: Decimal::new(80, 0),
            valuation: Valuation::priced(Decimal::new(80, 0), Decimal::ONE, Decimal::new(100, 0), None),
        };
        let failed = ValuedInvestment {
            investment: lot(2, "ETH", "1", "10"),
            purchase_value: Decimal::new(10, 0),
            valuation: Valuation::ApiError {
                message: "HTTP 500".into(),
            },
        };
        let stats = aggregate(&[priced, failed]);
        assert_eq!(stats.total_current_value, None);
        assert_eq!(stats.data_status, PortfolioStatus::ApiUnavailable);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.working_count, 1);
        assert_eq!(stats.total_purchase_value, Decimal::new(90, 0));
    }

    #[test]
    fn all_current_sums_values() {
        let provider = Fixed::new(quotes(&[("bitcoin", "100"), ("ethereum", "10")]));
        let valued = valuate(&[lot(1, "BTC", "2", "50"), lot(2, "ETH", "5", "20")], &provider);
        let stats = aggregate(&valued);
        assert_eq!(stats.data_status, PortfolioStatus::Current);
        assert_eq!(stats.total_current_value, Some(Decimal::new(250, 0)));
        assert_eq!(stats.total_profit_loss, Some(Decimal::new(50, 0)));
        assert_eq!(stats.total_profit_loss_percent, Some(Decimal::new(25, 0)));
    }

    #[test]
    fn out_of_range_value_is_reported_as_an_error_not_a_panic() {
        let provider = Fixed::new(quotes(&[("bitcoin", "2")]));
        let lots = [lot(1, "BTC", "79228162514264337593543950335", "0")];
        let valued = valuate(&lots, &provider);
        assert_eq!(valued[0].valuation.status(), "api_error");
        assert_eq!(valued[0].valuation.current_value(), None);

        let stats = aggregate(&valued);
        assert_eq!(stats.total_current_value, None);
        assert_eq!(stats.data_status, PortfolioStatus::ApiUnavailable);
    }

    #[test]
    fn oversized_purchase_value_saturates() {
        let provider = Fixed::new(QuoteFetch::Unavailable("offline".into()));
        let lots = [
            lot(1, "BTC", "79228162514264337593543950335", "2"),
            lot(2, "ETH", "1", "10"),
        ];
        let stats = aggregate(&valuate(&lots, &provider));
        assert_eq!(stats.total_purchase_value, Decimal::MAX);
    }

    #[test]
    fn empty_portfolio_never_calls_the_feed() {
        let provider = Fixed::new(QuoteFetch::Unavailable("offline".into()));
        assert!(valuate(&[], &provider).is_empty());
        assert!(provider.requests.borrow().is_empty());
        assert_eq!(aggregate(&[]).data_status, PortfolioStatus::NoInvestments);
    }
}
