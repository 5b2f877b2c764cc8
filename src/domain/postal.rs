use std::{fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};

/// The number of digits in a full postal code (CEP).
pub const POSTAL_CODE_DIGITS: usize = 8;

/// A full-length postal code, reduced to its digits.
///
/// Users type postal codes with all sorts of punctuation (`01001-000`,
/// `01.001-000`). Parsing strips every non-digit character and accepts the
/// result only if exactly [`POSTAL_CODE_DIGITS`] digits remain.
///
/// # Examples
///
/// ```
/// use needboard::PostalCode;
///
/// let code: PostalCode = "01001-000".parse().unwrap();
/// assert_eq!(code.as_str(), "01001000");
///
/// assert!("0100-100".parse::<PostalCode>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parses a postal code from free-text input.
    ///
    /// Returns `None` when the input does not contain exactly eight digits.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        (digits.len() == POSTAL_CODE_DIGITS).then_some(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for PostalCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl FromStr for PostalCode {
    type Err = InvalidPostalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidPostalCodeError(s.to_string()))
    }
}

impl TryFrom<&str> for PostalCode {
    type Error = InvalidPostalCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// Error returned when input does not reduce to an eight digit postal code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid postal code '{0}': expected exactly 8 digits")]
pub struct InvalidPostalCodeError(String);

/// The part of an address a postal code lookup can resolve.
///
/// Any component the lookup service omits is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    /// Street name (`logradouro`).
    pub street: String,
    /// Neighbourhood (`bairro`).
    pub district: String,
    /// City (`localidade`).
    pub city: String,
    /// State abbreviation (`uf`).
    pub state: String,
}

/// The full address of a need, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Postal code exactly as it was entered.
    pub postal_code: String,
    /// Street name and number.
    pub street: String,
    /// Neighbourhood.
    pub district: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_stripped() {
        let code = PostalCode::parse(" 01.001-000 ").unwrap();
        assert_eq!(code.as_str(), "01001000");
    }

    #[test]
    fn short_codes_are_rejected() {
        assert_eq!(PostalCode::parse("0100100"), None);
        assert_eq!(PostalCode::parse(""), None);
        assert_eq!(PostalCode::parse("abc-defgh"), None);
    }

    #[test]
    fn long_codes_are_rejected() {
        assert_eq!(PostalCode::parse("010010001"), None);
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        // Arabic-indic digits are numeric, but not part of a postal code.
        assert_eq!(PostalCode::parse("٠١٠٠١٠٠٠"), None);
    }

    #[test]
    fn display_uses_dashed_format() {
        let code: PostalCode = "01001000".parse().unwrap();
        assert_eq!(code.to_string(), "01001-000");
    }

    #[test]
    fn from_str_reports_input() {
        let err = "123".parse::<PostalCode>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid postal code '123': expected exactly 8 digits"
        );
    }

    #[test]
    fn address_uses_camel_case_keys() {
        let address = Address {
            postal_code: "01001-000".to_string(),
            street: "Praça da Sé".to_string(),
            district: "Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        };
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["postalCode"], "01001-000");
        assert_eq!(json["district"], "Sé");
    }
}
