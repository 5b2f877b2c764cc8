use std::fmt;

use crate::domain::PostalCode;

/// A message that must be shown to the user before they carry on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The contact is neither an e-mail address nor a phone number.
    InvalidContact,
    /// The lookup service does not know the postal code.
    PostalCodeNotFound(PostalCode),
    /// The lookup request failed and may be retried.
    LookupFailed,
    /// A need was registered.
    Registered,
}

impl Notice {
    /// Whether the notice reports a problem.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        !matches!(self, Self::Registered)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContact => {
                f.write_str("Please enter a valid e-mail address or phone number")
            }
            Self::PostalCodeNotFound(code) => write!(f, "Postal code {code} not found"),
            Self::LookupFailed => f.write_str("Failed to look up the postal code. Try again."),
            Self::Registered => f.write_str("Need registered successfully!"),
        }
    }
}
