//! Academic term a workbook count is reported for.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// One of the three terms of a school year.
///
/// On the wire a term is the bare number `1`, `2` or `3`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Term {
    First,
    Second,
    Third,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::First, Term::Second, Term::Third];

    pub const fn number(self) -> u8 {
        match self {
            Term::First => 1,
            Term::Second => 2,
            Term::Third => 3,
        }
    }
}

impl ValueObject for Term {}

impl TryFrom<u8> for Term {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Term::First),
            2 => Ok(Term::Second),
            3 => Ok(Term::Third),
            other => Err(DomainError::validation(format!(
                "term must be 1, 2 or 3 (got {other})"
            ))),
        }
    }
}

impl From<Term> for u8 {
    fn from(value: Term) -> Self {
        value.number()
    }
}

impl FromStr for Term {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("Term")
            .map(str::trim)
            .unwrap_or(trimmed);
        let n: u8 = digits
            .parse()
            .map_err(|_| DomainError::validation(format!("'{s}' is not a term")))?;
        Term::try_from(n)
    }
}

impl core::fmt::Display for Term {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Term {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_labels() {
        assert_eq!("2".parse::<Term>().unwrap(), Term::Second);
        assert_eq!("Term 3".parse::<Term>().unwrap(), Term::Third);
        assert!("4".parse::<Term>().is_err());
        assert!("".parse::<Term>().is_err());
    }

    #[test]
    fn wire_form_is_a_bare_number() {
        assert_eq!(serde_json::to_string(&Term::First).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Term>("3").unwrap(), Term::Third);
        assert!(serde_json::from_str::<Term>("0").is_err());
    }
}
