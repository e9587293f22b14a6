//! Exchange-rate resolution
//!
//! Declared rates form a graph of currencies. Every declared pair contributes
//! a forward edge with the declared rate and a reverse edge with its inverse.
//! Conversion between two currencies follows the first path a breadth-first
//! search finds and multiplies the rates along it.
//!
//! The first path is only as good as any other if the declared rates are free
//! of arbitrage; scenarios are assumed to satisfy that.

use crate::types::{BankError, Currency};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};

/// Currency graph built once per run
#[derive(Debug, Clone, Default)]
pub struct ExchangeRateResolver {
    /// currency → [(neighbour, rate)] in declaration order
    edges: HashMap<Currency, Vec<(Currency, Decimal)>>,
}

impl ExchangeRateResolver {
    /// Build the graph from declared `(from, to, rate)` pairs
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a rate is zero or negative.
    pub fn new<I>(pairs: I) -> Result<Self, BankError>
    where
        I: IntoIterator<Item = (Currency, Currency, Decimal)>,
    {
        let mut resolver = Self::default();
        for (from, to, rate) in pairs {
            resolver.declare(from, to, rate)?;
        }
        Ok(resolver)
    }

    fn declare(&mut self, from: Currency, to: Currency, rate: Decimal) -> Result<(), BankError> {
        if rate <= Decimal::ZERO {
            return Err(BankError::validation(format!(
                "Exchange rate from {} to {} must be positive, got {}",
                from, to, rate
            )));
        }

        let inverse = Decimal::ONE / rate;
        self.edges
            .entry(from.clone())
            .or_default()
            .push((to.clone(), rate));
        self.edges.entry(to).or_default().push((from, inverse));
        Ok(())
    }

    /// Multiplier converting an amount in `from` into `to`
    ///
    /// # Errors
    ///
    /// Returns `NoRatePath` if the two currencies are not connected.
    pub fn rate(&self, from: &str, to: &str) -> Result<Decimal, BankError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<(&str, Decimal)> = VecDeque::from([(from, Decimal::ONE)]);

        while let Some((currency, product)) = queue.pop_front() {
            let Some(neighbours) = self.edges.get(currency) else {
                continue;
            };
            for (next, rate) in neighbours {
                if !visited.insert(next.as_str()) {
                    continue;
                }
                let next_product = product
                    .checked_mul(*rate)
                    .ok_or_else(|| BankError::no_rate_path(from, to))?;
                if next == to {
                    return Ok(next_product);
                }
                queue.push_back((next.as_str(), next_product));
            }
        }

        Err(BankError::no_rate_path(from, to))
    }

    /// Convert `amount` from `from` into `to`
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, BankError> {
        let rate = self.rate(from, to)?;
        amount
            .checked_mul(rate)
            .ok_or_else(|| BankError::no_rate_path(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn resolver() -> ExchangeRateResolver {
        ExchangeRateResolver::new([
            ("RON".to_string(), "EUR".to_string(), dec!(0.2)),
            ("EUR".to_string(), "USD".to_string(), dec!(1.1)),
            ("GBP".to_string(), "USD".to_string(), dec!(1.3)),
            ("JPY".to_string(), "CNY".to_string(), dec!(0.05)),
        ])
        .unwrap()
    }

    #[rstest]
    #[case("RON")]
    #[case("EUR")]
    #[case("XYZ")]
    fn test_rate_to_self_is_one(#[case] currency: &str) {
        assert_eq!(resolver().rate(currency, currency).unwrap(), Decimal::ONE);
        assert_eq!(
            ExchangeRateResolver::default()
                .rate(currency, currency)
                .unwrap(),
            Decimal::ONE
        );
    }

    #[rstest]
    #[case("RON", "EUR")]
    #[case("EUR", "USD")]
    #[case("GBP", "USD")]
    #[case("JPY", "CNY")]
    fn test_declared_pair_and_inverse_multiply_to_one(#[case] a: &str, #[case] b: &str) {
        let resolver = resolver();
        let product = resolver.rate(a, b).unwrap() * resolver.rate(b, a).unwrap();
        assert!((product - Decimal::ONE).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_direct_and_inverse_rates() {
        let resolver = resolver();
        assert_eq!(resolver.rate("RON", "EUR").unwrap(), dec!(0.2));
        assert_eq!(resolver.rate("EUR", "RON").unwrap(), dec!(5));
    }

    #[test]
    fn test_multi_hop_path_multiplies_rates() {
        let resolver = resolver();
        // RON -> EUR -> USD
        assert_eq!(resolver.rate("RON", "USD").unwrap(), dec!(0.22));
        // RON -> EUR -> USD -> GBP
        let rate = resolver.rate("RON", "GBP").unwrap();
        assert!((rate - dec!(0.22) / dec!(1.3)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_disconnected_currencies_fail() {
        let err = resolver().rate("RON", "JPY").unwrap_err();
        assert_eq!(
            err,
            BankError::NoRatePath {
                from: "RON".to_string(),
                to: "JPY".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_currency_fails() {
        assert!(matches!(
            resolver().rate("RON", "CHF"),
            Err(BankError::NoRatePath { .. })
        ));
    }

    #[test]
    fn test_first_bfs_path_wins() {
        // A -> B -> D is two hops, A -> C -> E -> D is three.
        let resolver = ExchangeRateResolver::new([
            ("A".to_string(), "B".to_string(), dec!(2)),
            ("A".to_string(), "C".to_string(), dec!(3)),
            ("B".to_string(), "D".to_string(), dec!(5)),
            ("C".to_string(), "E".to_string(), dec!(7)),
            ("E".to_string(), "D".to_string(), dec!(11)),
        ])
        .unwrap();
        assert_eq!(resolver.rate("A", "D").unwrap(), dec!(10));
    }

    #[test]
    fn test_convert_scales_amount() {
        assert_eq!(
            resolver().convert(dec!(100), "RON", "EUR").unwrap(),
            dec!(20)
        );
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let result =
            ExchangeRateResolver::new([("RON".to_string(), "EUR".to_string(), Decimal::ZERO)]);
        assert!(matches!(result, Err(BankError::Validation { .. })));
    }
}
