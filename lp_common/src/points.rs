use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The smallest unit of account. 1 point = 100 centipoints.
const CENTIPOINTS_PER_POINT: i64 = 100;

//--------------------------------------      Points       ---------------------------------------------------------
/// A loyalty point amount, stored as a whole number of centipoints.
///
/// Reward amounts and withdrawal sums travel over the wire as decimal numbers (e.g. `729.98`), but floats are a
/// poor substrate for a ledger. Internally everything is an `i64` count of hundredths of a point, which is exact,
/// cheap to compare, and maps directly onto an INTEGER column.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Mul<i64> for Points {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in points: {0}")]
pub struct PointsConversionError(String);

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Points {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Points {}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let centi = (value * CENTIPOINTS_PER_POINT as f64).round();
        if centi.abs() >= i64::MAX as f64 {
            return Err(PointsConversionError(format!("{value} is too large to convert to Points")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(centi as i64))
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} pts", self.as_f64())
    }
}

impl Points {
    /// The raw centipoint count.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// A whole number of points.
    pub fn from_points(points: i64) -> Self {
        Self(points * CENTIPOINTS_PER_POINT)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / CENTIPOINTS_PER_POINT as f64
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

// Points serialize as decimal numbers on the wire, not as raw centipoint counts.
impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from(value).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Points::from_points(5);
        let b = Points::from(250);
        assert_eq!(a + b, Points::from(750));
        assert_eq!(a - b, Points::from(250));
        assert_eq!(-b, Points::from(-250));
        assert!((a - b - b - b).is_negative());
    }

    #[test]
    fn decimal_round_trip() {
        let p = Points::try_from(729.98).unwrap();
        assert_eq!(p.value(), 72998);
        assert_eq!(serde_json::to_string(&p).unwrap(), "729.98");
        let q: Points = serde_json::from_str("500").unwrap();
        assert_eq!(q, Points::from_points(500));
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Points::try_from(f64::NAN).is_err());
        assert!(Points::try_from(f64::INFINITY).is_err());
    }
}
