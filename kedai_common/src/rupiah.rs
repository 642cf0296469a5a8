use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const IDR_CURRENCY_CODE: &str = "IDR";
/// ISO 4217 numeric code, as used in QR payment payloads.
pub const IDR_NUMERIC_CODE: &str = "360";

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of Indonesian Rupiah. Rupiah are not subdivided in practice, so the inner value is whole Rupiah and is
/// also the smallest unit used for tolerance comparisons.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in Rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {value} is too large to convert to Rupiah")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp {grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The absolute difference between two amounts.
    pub fn abs_diff(&self, other: Rupiah) -> Rupiah {
        Self((self.0 - other.0).abs())
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_mul(&self, n: i64) -> Option<Rupiah> {
        self.0.checked_mul(n).map(Self)
    }

    pub fn checked_add(&self, other: Rupiah) -> Option<Rupiah> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sums a sequence of amounts, returning `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Rupiah>>(amounts: I) -> Option<Rupiah> {
        amounts.into_iter().try_fold(Self::default(), |acc, a| acc.checked_add(a))
    }

    /// Integer division by a count, e.g. for averages. Returns zero when `n` is zero.
    pub fn div_count(&self, n: i64) -> Rupiah {
        if n == 0 {
            Self::default()
        } else {
            Self(self.0 / n)
        }
    }
}
