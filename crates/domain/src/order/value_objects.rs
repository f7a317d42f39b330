//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Customer phone number: exactly 11 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    pub const LEN: usize = 11;

    /// Validates and wraps a phone number.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != Self::LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid(format!(
                "phone must be exactly {} digits, got '{raw}'",
                Self::LEN
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_eleven_digits() {
        let phone = Phone::parse("11999999999").unwrap();
        assert_eq!(phone.into_inner(), "11999999999");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Phone::parse("1199999999").is_err());
        assert!(Phone::parse("119999999999").is_err());
        assert!(Phone::parse("").is_err());
    }

    #[test]
    fn rejects_non_digits() {
        assert!(Phone::parse("1199999999a").is_err());
        assert!(Phone::parse("(11)9999999").is_err());
        // Non-ASCII digits are not accepted even when the char count matches.
        assert!(Phone::parse("١١٩٩٩٩٩٩٩٩٩").is_err());
    }
}
