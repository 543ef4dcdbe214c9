//! Non-negative counts: workbook stock and submitted counts.

use core::num::{IntErrorKind, ParseIntError};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// A non-negative whole number of workbooks.
///
/// The type cannot hold a negative value, so a quantity that would go below
/// zero has to be rejected before one is built.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parse raw form text as a non-negative integer.
    ///
    /// `field` names the input in the error message.
    pub fn parse(raw: &str, field: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::required(field));
        }
        let value: i64 = trimmed.parse().map_err(|e: ParseIntError| match e.kind() {
            IntErrorKind::PosOverflow => too_large(field),
            IntErrorKind::NegOverflow => negative(field),
            _ => DomainError::validation(format!("{field} must be a whole number")),
        })?;
        if value < 0 {
            return Err(negative(field));
        }
        u32::try_from(value).map(Self).map_err(|_| too_large(field))
    }

    /// Apply a signed delta. Fails if the result would be negative or overflow.
    pub fn offset(self, delta: i64) -> Result<Self, DomainError> {
        let next = i64::from(self.0) + delta;
        if next < 0 {
            return Err(DomainError::invariant("Quantity cannot be negative"));
        }
        Self::try_from(next).map_err(|_| DomainError::invariant("Quantity is too large"))
    }
}

fn negative(field: &str) -> DomainError {
    DomainError::validation(format!("{field} cannot be negative"))
}

fn too_large(field: &str) -> DomainError {
    DomainError::validation(format!("{field} is too large"))
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::validation(format!("{value} is not a valid quantity")))
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_reports_the_field() {
        assert_eq!(Quantity::parse("12", "Count").unwrap(), Quantity::new(12));
        assert_eq!(Quantity::parse(" 0 ", "Count").unwrap(), Quantity::ZERO);
        assert_eq!(
            Quantity::parse("", "Count").unwrap_err(),
            DomainError::validation("Count must be filled")
        );
        assert_eq!(
            Quantity::parse("-3", "Count").unwrap_err(),
            DomainError::validation("Count cannot be negative")
        );
        assert_eq!(
            Quantity::parse("99999999999", "Count").unwrap_err(),
            DomainError::validation("Count is too large")
        );
        assert_eq!(
            Quantity::parse("99999999999999999999", "Quantity").unwrap_err(),
            DomainError::validation("Quantity is too large")
        );
        assert_eq!(
            Quantity::parse("4294967295", "Count").unwrap(),
            Quantity::new(u32::MAX)
        );
        assert_eq!(
            Quantity::parse("2.5", "Count").unwrap_err(),
            DomainError::validation("Count must be a whole number")
        );
    }

    #[test]
    fn offset_below_zero_is_an_invariant_violation() {
        let err = Quantity::new(10).offset(-50).unwrap_err();
        assert_eq!(err.to_string(), "Quantity cannot be negative");
    }

    proptest! {
        #[test]
        fn offset_never_produces_negative(current in 0u32..100_000, delta in -200_000i64..200_000) {
            match Quantity::new(current).offset(delta) {
                Ok(q) => prop_assert_eq!(i64::from(q.get()), i64::from(current) + delta),
                Err(_) => prop_assert!(i64::from(current) + delta < 0),
            }
        }
    }
}
