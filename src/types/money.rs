//! Money in integer minor currency units
//!
//! All split, balance and netting arithmetic runs on `Money`, a signed count of
//! the trip currency's minor units (cents for USD, yen for JPY). Decimal values
//! only exist at the boundary: journal parsing converts them in with
//! [`Money::from_decimal`] and report writing converts them back out with
//! [`Money::to_decimal`].

use super::error::SplitError;
use iso_currency::Currency;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Amount expressed in minor currency units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Wrap a raw count of minor units
    pub const fn from_minor(units: i64) -> Self {
        Money(units)
    }

    /// Raw count of minor units
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Convert a decimal amount into minor units of `currency`
    ///
    /// The conversion is exact: an amount carrying more fractional digits than
    /// the currency exponent allows (e.g. `1.005` USD) is rejected rather than
    /// rounded.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::InvalidAmount` if the amount has sub-minor-unit
    /// precision or does not fit in 64 bits of minor units.
    pub fn from_decimal(amount: Decimal, currency: Currency) -> Result<Self, SplitError> {
        let factor = Decimal::from(10_i64.pow(minor_digits(currency)));

        let scaled = amount.checked_mul(factor).ok_or_else(|| {
            SplitError::invalid_amount(amount, "amount is too large to represent")
        })?;

        if !scaled.fract().is_zero() {
            return Err(SplitError::invalid_amount(
                amount,
                &format!("more precise than one {} minor unit", currency.code()),
            ));
        }

        scaled.to_i64().map(Money).ok_or_else(|| {
            SplitError::invalid_amount(amount, "amount is too large to represent")
        })
    }

    /// Convert back to a decimal with the currency's number of decimal places
    pub fn to_decimal(self, currency: Currency) -> Decimal {
        Decimal::new(self.0, minor_digits(currency))
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

/// Number of decimal places of the currency's minor unit (USD = 2, JPY = 0)
pub fn minor_digits(currency: Currency) -> u32 {
    u32::from(currency.exponent().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case::usd_whole("100.00", Currency::USD, 10000)]
    #[case::usd_cents("99.99", Currency::USD, 9999)]
    #[case::usd_short_fraction("0.5", Currency::USD, 50)]
    #[case::usd_integer("12", Currency::USD, 1200)]
    #[case::jpy("1500", Currency::JPY, 1500)]
    #[case::bhd_three_digits("1.234", Currency::BHD, 1234)]
    #[case::negative("-3.10", Currency::USD, -310)]
    fn test_from_decimal(#[case] input: &str, #[case] currency: Currency, #[case] minor: i64) {
        let amount = Decimal::from_str(input).unwrap();
        assert_eq!(
            Money::from_decimal(amount, currency).unwrap(),
            Money::from_minor(minor)
        );
    }

    #[rstest]
    #[case::sub_cent("1.005", Currency::USD)]
    #[case::fractional_yen("10.5", Currency::JPY)]
    fn test_from_decimal_rejects_sub_minor_precision(
        #[case] input: &str,
        #[case] currency: Currency,
    ) {
        let amount = Decimal::from_str(input).unwrap();
        let result = Money::from_decimal(amount, currency);
        assert!(matches!(result, Err(SplitError::InvalidAmount { .. })));
    }

    #[test]
    fn test_from_decimal_rejects_out_of_range() {
        let result = Money::from_decimal(Decimal::MAX, Currency::USD);
        assert!(matches!(result, Err(SplitError::InvalidAmount { .. })));
    }

    #[rstest]
    #[case(10000, Currency::USD, "100.00")]
    #[case(3334, Currency::USD, "33.34")]
    #[case(-5, Currency::USD, "-0.05")]
    #[case(1500, Currency::JPY, "1500")]
    fn test_to_decimal_formats_with_currency_scale(
        #[case] minor: i64,
        #[case] currency: Currency,
        #[case] expected: &str,
    ) {
        assert_eq!(
            Money::from_minor(minor).to_decimal(currency).to_string(),
            expected
        );
    }

    #[test]
    fn test_checked_arithmetic_detects_overflow() {
        assert_eq!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
        assert_eq!(
            Money::from_minor(7).checked_sub(Money::from_minor(10)),
            Some(Money::from_minor(-3))
        );
    }
}
