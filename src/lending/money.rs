// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-point money amounts.
//!
//! Every amount inside the loan engine is an integer number of minor units
//! (cents). Conversion from the wire happens once, at deserialization, so
//! comparisons between submitted and scheduled amounts are always integer
//! comparisons.
//!
//! On the wire an amount is a JSON number with at most two decimal places.
//! Numeric strings (`"33.33"`) are accepted on input as well.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest accepted amount in major units (one trillion).
const MAX_MAJOR_UNITS: f64 = 1_000_000_000_000.0;

/// Tolerance used to decide whether a float carries more than two decimals.
const CENT_EPSILON: f64 = 1e-6;

/// Errors produced when parsing an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must be a finite number")]
    NotFinite,
    #[error("amount must have at most two decimal places")]
    TooPrecise,
    #[error("amount is out of range")]
    OutOfRange,
    #[error("amount is not a valid number: {0}")]
    Invalid(String),
}

/// An amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Convert a decimal amount in major units, rejecting sub-cent precision.
    pub fn from_major(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        if value.abs() > MAX_MAJOR_UNITS {
            return Err(MoneyError::OutOfRange);
        }
        let scaled = value * 100.0;
        let cents = scaled.round();
        if (scaled - cents).abs() > CENT_EPSILON {
            return Err(MoneyError::TooPrecise);
        }
        Ok(Money(cents as i64))
    }

    /// Split into `parts` equal installments, each rounded half-up to the cent.
    ///
    /// Installments are rounded independently; their sum may differ from
    /// `self` by up to half a cent per part.
    pub fn installment(self, parts: u32) -> Money {
        debug_assert!(parts > 0);
        let parts = i64::from(parts.max(1));
        let doubled = self.0 * 2;
        let rounded = if doubled >= 0 {
            (doubled + parts) / (2 * parts)
        } else {
            (doubled - parts) / (2 * parts)
        };
        Money(rounded)
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(MoneyError::Invalid(s.to_string()));
        }
        if fraction.len() > 2 {
            return Err(MoneyError::TooPrecise);
        }

        let whole: i64 = whole.parse().map_err(|_| MoneyError::OutOfRange)?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| MoneyError::Invalid(s.to_string()))? * 10,
            _ => fraction.parse().map_err(|_| MoneyError::Invalid(s.to_string()))?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or(MoneyError::OutOfRange)?;
        if cents as f64 / 100.0 > MAX_MAJOR_UNITS {
            return Err(MoneyError::OutOfRange);
        }

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAmount::deserialize(deserializer)
            .map_err(|_| serde::de::Error::custom("amount must be a number"))?;
        match raw {
            RawAmount::Number(value) => Money::from_major(value),
            RawAmount::Text(text) => text.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installment_rounds_half_up() {
        assert_eq!(Money::from_cents(10_000).installment(3), Money::from_cents(3_333));
        assert_eq!(Money::from_cents(20_000).installment(3), Money::from_cents(6_667));
        assert_eq!(Money::from_cents(5).installment(2), Money::from_cents(3));
        assert_eq!(Money::from_cents(1).installment(3), Money::ZERO);
    }

    #[test]
    fn installments_are_not_reconciled() {
        let total = Money::from_cents(10_000);
        let sum: Money = (0..3).map(|_| total.installment(3)).sum();
        assert_eq!(sum, Money::from_cents(9_999));
    }

    #[test]
    fn from_major_rejects_sub_cent_values() {
        assert_eq!(Money::from_major(33.33), Ok(Money::from_cents(3_333)));
        assert_eq!(Money::from_major(0.1 + 0.2), Ok(Money::from_cents(30)));
        assert_eq!(Money::from_major(1.005), Err(MoneyError::TooPrecise));
        assert_eq!(Money::from_major(f64::NAN), Err(MoneyError::NotFinite));
        assert_eq!(Money::from_major(1e15), Err(MoneyError::OutOfRange));
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!("33.33".parse(), Ok(Money::from_cents(3_333)));
        assert_eq!("100".parse(), Ok(Money::from_cents(10_000)));
        assert_eq!("0.5".parse(), Ok(Money::from_cents(50)));
        assert_eq!("-2.10".parse(), Ok(Money::from_cents(-210)));
        assert_eq!("1.234".parse::<Money>(), Err(MoneyError::TooPrecise));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!(".5".parse::<Money>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn json_accepts_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("33.33").unwrap();
        let from_integer: Money = serde_json::from_str("100").unwrap();
        let from_string: Money = serde_json::from_str("\"33.33\"").unwrap();
        assert_eq!(from_number, Money::from_cents(3_333));
        assert_eq!(from_integer, Money::from_cents(10_000));
        assert_eq!(from_string, from_number);

        assert!(serde_json::from_str::<Money>("true").is_err());
        assert!(serde_json::from_str::<Money>("12.345").is_err());
    }

    #[test]
    fn serializes_as_decimal_number() {
        assert_eq!(serde_json::to_string(&Money::from_cents(3_333)).unwrap(), "33.33");
        assert_eq!(serde_json::to_string(&Money::from_cents(10_000)).unwrap(), "100.0");
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(3_305).to_string(), "33.05");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
    }
}
