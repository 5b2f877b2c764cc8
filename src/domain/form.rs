//! The registration form and its validation rules.
//!
//! A [`NeedForm`] is the plain record of what a user typed. It is read once
//! per operation, so validation and registration never depend on a live
//! input surface.

use std::{collections::BTreeSet, fmt, sync::LazyLock};

use nonempty::NonEmpty;
use regex::Regex;

use crate::domain::{notice::Notice, PostalCode};

/// A run of at least ten digits is taken to be a phone number.
static PHONE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{10,}").expect("phone pattern is valid"));

/// Identifies one field of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Name of the institution asking for help.
    Institution,
    /// Category of the requested aid.
    AidType,
    /// Short title of the need.
    Title,
    /// Free-text description.
    Description,
    /// Postal code.
    PostalCode,
    /// Street name and number.
    Street,
    /// Neighbourhood.
    District,
    /// City.
    City,
    /// State.
    State,
    /// E-mail address or phone number.
    Contact,
}

impl Field {
    /// Every field, in form order. All of them are required.
    pub const REQUIRED: [Self; 10] = [
        Self::Institution,
        Self::AidType,
        Self::Title,
        Self::Description,
        Self::PostalCode,
        Self::Street,
        Self::District,
        Self::City,
        Self::State,
        Self::Contact,
    ];

    /// The four fields written by a postal code lookup.
    pub const ADDRESS: [Self; 4] = [Self::Street, Self::District, Self::City, Self::State];

    /// The stable identifier of the field, matching the stored JSON key.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Institution => "institution",
            Self::AidType => "aidType",
            Self::Title => "title",
            Self::Description => "description",
            Self::PostalCode => "postalCode",
            Self::Street => "street",
            Self::District => "district",
            Self::City => "city",
            Self::State => "state",
            Self::Contact => "contact",
        }
    }

    /// A human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Institution => "Institution",
            Self::AidType => "Aid type",
            Self::Title => "Title",
            Self::Description => "Description",
            Self::PostalCode => "Postal code",
            Self::Street => "Street",
            Self::District => "District",
            Self::City => "City",
            Self::State => "State",
            Self::Contact => "Contact",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The current values of the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedForm {
    /// Name of the institution.
    pub institution: String,
    /// Aid type, one of the configured categories.
    pub aid_type: String,
    /// Title of the need.
    pub title: String,
    /// Description of the need.
    pub description: String,
    /// Postal code as typed.
    pub postal_code: String,
    /// Street.
    pub street: String,
    /// District.
    pub district: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// E-mail or phone number.
    pub contact: String,
}

impl NeedForm {
    /// Read the value of a field.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Institution => &self.institution,
            Field::AidType => &self.aid_type,
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::PostalCode => &self.postal_code,
            Field::Street => &self.street,
            Field::District => &self.district,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Contact => &self.contact,
        }
    }

    /// Overwrite the value of a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Institution => &mut self.institution,
            Field::AidType => &mut self.aid_type,
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::PostalCode => &mut self.postal_code,
            Field::Street => &mut self.street,
            Field::District => &mut self.district,
            Field::City => &mut self.city,
            Field::State => &mut self.state,
            Field::Contact => &mut self.contact,
        };
        *slot = value.into();
    }

    /// Clear every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The postal code, if the field holds a full-length code.
    #[must_use]
    pub fn postal_code(&self) -> Option<PostalCode> {
        PostalCode::parse(&self.postal_code)
    }

    /// Check every required field and the contact format.
    ///
    /// The whole form is re-checked on each call; nothing is remembered
    /// between attempts.
    #[must_use]
    pub fn validate(&self) -> Validation {
        let mut validation = Validation::default();

        for field in Field::REQUIRED {
            if self.value(field).trim().is_empty() {
                tracing::debug!("required field {field} is blank");
                validation.invalid.insert(field);
            }
        }

        if !is_plausible_contact(&self.contact) {
            tracing::debug!("contact {:?} is neither an e-mail nor a phone", self.contact);
            validation.invalid.insert(Field::Contact);
            validation.notices.push(Notice::InvalidContact);
        }

        validation
    }
}

/// Returns `true` if the contact looks like an e-mail address (contains
/// `@`) or a phone number (contains at least ten consecutive digits).
#[must_use]
pub fn is_plausible_contact(contact: &str) -> bool {
    contact.contains('@') || PHONE_DIGITS.is_match(contact)
}

/// The outcome of validating a [`NeedForm`].
///
/// Fields not in the invalid set are valid, which clears any mark left by a
/// previous attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    invalid: BTreeSet<Field>,
    notices: Vec<Notice>,
}

impl Validation {
    /// `true` iff every check passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    /// Whether the given field failed validation.
    #[must_use]
    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.contains(&field)
    }

    /// The fields that failed, in form order.
    #[must_use]
    pub fn invalid_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.invalid.iter().copied()
    }

    /// Mark a field invalid for a reason the form cannot check by itself,
    /// such as a value outside a configured list.
    pub fn mark_invalid(&mut self, field: Field) {
        self.invalid.insert(field);
    }

    /// Notices to show the user.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Convert into a `Result`, collecting the failed fields.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidForm`] if at least one field failed.
    pub fn into_result(self) -> Result<(), InvalidForm> {
        NonEmpty::from_vec(self.invalid.into_iter().collect())
            .map_or(Ok(()), |fields| Err(InvalidForm { fields }))
    }
}

/// A form that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct InvalidForm {
    fields: NonEmpty<Field>,
}

impl InvalidForm {
    /// The fields that failed, in form order.
    #[must_use]
    pub const fn fields(&self) -> &NonEmpty<Field> {
        &self.fields
    }
}

impl fmt::Display for InvalidForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid form fields: ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}
