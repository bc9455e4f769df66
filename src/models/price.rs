use std::fmt;
use std::str::FromStr;

use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::BigInt;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A fixed-point money amount with two decimal places
///
/// Stored as a count of hundredths in a BIGINT column and written on the
/// wire as a decimal string (`"12.50"`), so no precision is lost on either
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = BigInt)]
pub struct Price(i64);

/// Why a submitted price was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("A valid number is required.")]
    Invalid,
    #[error("Ensure that there are no more than {0} digits in total.")]
    TooManyDigits(usize),
    #[error("Ensure that there are no more than {0} decimal places.")]
    TooManyDecimalPlaces(usize),
    #[error("Ensure that there are no more than {0} digits before the decimal point.")]
    TooManyWholeDigits(usize),
}

impl Price {
    /// Maximum number of significant digits a price may carry
    pub const MAX_DIGITS: usize = 10;

    /// Digits kept after the decimal point
    pub const DECIMAL_PLACES: usize = 2;

    /// Creates a price from a count of hundredths
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Gets the price as a count of hundredths
    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    /// Parses a decimal literal, optionally with an exponent (`1.5e3`)
    ///
    /// Precision is judged on the significant digits and exponent the way
    /// a decimal type would hold them: leading zeros are dropped, trailing
    /// zeros are kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, Some(exponent)),
            None => (unsigned, None),
        };

        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(PriceError::Invalid);
        }

        let exponent: i64 = match exponent {
            None => 0,
            Some(text) => {
                let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
                if digits.is_empty() || !all_digits(digits) {
                    return Err(PriceError::Invalid);
                }
                // Too large to hold, and far outside the allowed precision
                text.parse().map_err(|_| PriceError::TooManyDigits(Self::MAX_DIGITS))?
            }
        };

        let digits = format!("{}{}", whole, fraction);
        let digits = match digits.trim_start_matches('0') {
            "" => "0",
            significant => significant,
        };
        let digit_count = digits.len() as i64;
        let exponent = exponent.saturating_sub(fraction.len() as i64);

        let (total_digits, whole_digits, decimal_places) = if exponent >= 0 {
            let total = digit_count.saturating_add(exponent);
            (total, total, 0)
        } else if digit_count > -exponent {
            (digit_count, digit_count + exponent, -exponent)
        } else {
            (-exponent, 0, -exponent)
        };

        let max_digits = Self::MAX_DIGITS as i64;
        let max_places = Self::DECIMAL_PLACES as i64;
        if total_digits > max_digits {
            return Err(PriceError::TooManyDigits(Self::MAX_DIGITS));
        }
        if decimal_places > max_places {
            return Err(PriceError::TooManyDecimalPlaces(Self::DECIMAL_PLACES));
        }
        if whole_digits > max_digits - max_places {
            return Err(PriceError::TooManyWholeDigits(Self::MAX_DIGITS - Self::DECIMAL_PLACES));
        }

        // At most ten digits scaled to hundredths, so this stays well inside i64
        let scale = u32::try_from(exponent + max_places).map_err(|_| PriceError::Invalid)?;
        let cents = digits
            .parse::<i64>()
            .ok()
            .and_then(|value| value.checked_mul(10_i64.pow(scale)))
            .ok_or(PriceError::Invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl FromSql<BigInt, Sqlite> for Price {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let cents = <i64 as FromSql<BigInt, Sqlite>>::from_sql(value)?;
        Ok(Price(cents))
    }
}

impl ToSql<BigInt, Sqlite> for Price {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        <i64 as ToSql<BigInt, Sqlite>>::to_sql(&self.0, out)
    }
}

#[cfg(test)]
mod tests;
