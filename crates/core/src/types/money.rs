//! Decimal money amounts.
//!
//! All prices, totals and captured amounts are held as [`Money`], a
//! [`Decimal`] that is always rounded to two places. Amounts serialize as
//! strings (`"19.99"`) so no precision is lost in JSON.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};

/// Round to two decimal places, halves away from zero.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Errors that can occur when parsing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("Price must have exactly two decimal places")]
    TooPrecise,
    #[error("amount cannot be negative")]
    Negative,
}

/// A non-negative monetary amount with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// A whole-unit amount, usable in constants.
    #[must_use]
    pub const fn from_whole(units: u32) -> Self {
        Self(Decimal::from_parts(units, 0, 0, false, 0))
    }

    /// Build from a decimal, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(round2(amount)))
    }

    /// Parse a user-supplied amount such as `"12.50"`.
    ///
    /// Unlike [`Money::new`], extra precision is rejected instead of rounded.
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric input, negatives, or more than two
    /// fractional digits.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(input.trim())
            .map_err(|_| MoneyError::Invalid(input.to_owned()))?;
        Self::exact(amount)
    }

    fn exact(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > 2 {
            return Err(MoneyError::TooPrecise);
        }
        Self::new(amount)
    }

    /// Whole-cent constructor, as used by card processors.
    #[must_use]
    pub fn from_minor_units(cents: u64) -> Self {
        Self(Decimal::from(cents) / Decimal::ONE_HUNDRED).rounded()
    }

    /// Amount in cents, or `None` if it does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED).round().to_i64()
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Line total for `qty` units at this price.
    #[must_use]
    pub fn times(self, qty: u32) -> Self {
        Self(self.0 * Decimal::from(qty)).rounded()
    }

    /// Multiply by a rate (e.g. `0.15` for tax), rounding the result.
    #[must_use]
    pub fn scale(self, rate: Decimal) -> Self {
        Self(self.0 * rate).rounded()
    }

    fn rounded(self) -> Self {
        Self(round2(self.0))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0).rounded()
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::exact(value)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(round2(amount)))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// ISO 4217 currency codes accepted by the payment processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    USD,
    EUR,
    GBP,
    #[default]
    CAD,
    AUD,
    INR,
}

impl CurrencyCode {
    /// Upper-case code, as PayPal expects it.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::INR => "INR",
        }
    }

    /// Lower-case code, as Stripe expects it.
    #[must_use]
    pub fn lowercase(&self) -> String {
        self.code().to_ascii_lowercase()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            "INR" => Ok(Self::INR),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_rounds_half_away_from_zero() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
        assert_eq!(round2(dec("2.675")), dec("2.68"));
    }

    #[test]
    fn test_parse_rejects_three_decimals() {
        assert_eq!(Money::parse("9.999"), Err(MoneyError::TooPrecise));
        assert!(Money::parse("9.990").is_ok());
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert_eq!(Money::parse("-1.00"), Err(MoneyError::Negative));
        assert!(matches!(Money::parse("ten"), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_display_always_two_places() {
        assert_eq!(Money::parse("10").unwrap().to_string(), "10.00");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::parse("59.9").unwrap()).unwrap();
        assert_eq!(json, "\"59.90\"");
    }

    #[test]
    fn test_deserializes_from_string_or_number() {
        let a: Money = serde_json::from_str("\"12.34\"").unwrap();
        let b: Money = serde_json::from_str("12.34").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_minor_units() {
        let m = Money::parse("123.45").unwrap();
        assert_eq!(m.to_minor_units(), Some(12345));
        assert_eq!(Money::from_minor_units(12345), m);
    }

    #[test]
    fn test_times_and_sum() {
        let price = Money::parse("19.99").unwrap();
        let total: Money = [price.times(3), Money::parse("0.03").unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "60.00");
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::CAD);
        assert_eq!(CurrencyCode::CAD.lowercase(), "cad");
        assert_eq!("usd".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
