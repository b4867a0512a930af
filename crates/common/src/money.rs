//! Fixed-point money.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Money amount represented in cents to avoid floating point issues.
///
/// On the wire it is always a decimal string with exactly two fractional
/// digits (`"12.50"`). Deserialization also accepts JSON numbers, which are
/// converted through their shortest decimal representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

/// Error returned when a decimal string is not a valid money amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid money amount '{input}': {reason}")]
pub struct MoneyParseError {
    input: String,
    reason: &'static str,
}

impl MoneyParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, or `None` if the result does not fit.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, or `None` if the result does not fit.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Returns true when both amounts are within one cent of each other,
    /// i.e. their absolute difference is strictly below 0.01.
    pub fn matches(&self, other: Money) -> bool {
        self.cents.abs_diff(other.cents) < 1
    }
}

/// Error returned when an amount computed from valid inputs does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount out of range")]
pub struct AmountOverflow;

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(MoneyParseError::new(input, "empty amount"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(MoneyParseError::new(input, "expected decimal digits"));
        }

        // "5.000" is fine, "5.001" would lose precision.
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > 2 {
            return Err(MoneyParseError::new(
                input,
                "more than two fractional digits",
            ));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| MoneyParseError::new(input, "amount out of range"))?
        };
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => i64::from(fraction.as_bytes()[0] - b'0') * 10,
            _ => fraction
                .parse()
                .map_err(|_| MoneyParseError::new(input, "expected decimal digits"))?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction_cents))
            .ok_or_else(|| MoneyParseError::new(input, "amount out of range"))?;

        Ok(Money {
            cents: if negative { -cents } else { cents },
        })
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount such as \"12.50\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money::from_cents)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom("amount out of range"))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        v.to_string().parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("10.00".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("0.07".parse::<Money>().unwrap().cents(), 7);
        assert_eq!(".25".parse::<Money>().unwrap().cents(), 25);
        assert_eq!("5.000".parse::<Money>().unwrap().cents(), 500);
        assert_eq!("-1.50".parse::<Money>().unwrap().cents(), -150);

        assert_eq!(Money::from_cents(1000).to_string(), "10.00");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!("1,50".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_serializes_as_two_digit_string() {
        let json = serde_json::to_string(&Money::from_cents(1299)).unwrap();
        assert_eq!(json, "\"12.99\"");
    }

    #[test]
    fn test_deserializes_strings_and_numbers() {
        let from_str: Money = serde_json::from_str("\"12.99\"").unwrap();
        let from_float: Money = serde_json::from_str("12.99").unwrap();
        let from_int: Money = serde_json::from_str("12").unwrap();
        assert_eq!(from_str.cents(), 1299);
        assert_eq!(from_float.cents(), 1299);
        assert_eq!(from_int.cents(), 1200);
    }

    #[test]
    fn test_checked_arithmetic() {
        let total = Money::from_cents(500)
            .checked_mul(2)
            .and_then(|subtotal| subtotal.checked_add(Money::from_cents(1)))
            .unwrap();
        assert_eq!(total.to_string(), "10.01");

        assert_eq!(Money::from_cents(i64::MAX / 2 + 1).checked_mul(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_matches_within_a_cent() {
        let price = Money::from_cents(1299);
        assert!(price.matches(Money::from_cents(1299)));
        assert!(!price.matches(Money::from_cents(1300)));
    }

    #[test]
    fn test_matches_extreme_amounts() {
        let price = Money::from_cents(500);
        assert!(!price.matches(Money::from_cents(-i64::MAX)));
        assert!(!Money::from_cents(i64::MIN).matches(Money::from_cents(i64::MAX)));
    }
}
