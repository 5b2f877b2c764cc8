use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    form::{InvalidForm, NeedForm},
    Address,
};

/// The identifier of a need.
///
/// New needs get a random UUID. Collections saved before UUIDs were used
/// carry the creation time in milliseconds instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeedId {
    /// A random (v4) UUID.
    Uuid(Uuid),
    /// A creation timestamp, in milliseconds since the Unix epoch.
    Timestamp(u64),
}

impl fmt::Display for NeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(id) => write!(f, "{id}"),
            Self::Timestamp(millis) => write!(f, "{millis}"),
        }
    }
}

/// A registered request for donations, owned by one institution.
///
/// Needs are immutable once created. The only way to build one is from a
/// [`NeedForm`] that passes validation, so every persisted need has all its
/// required fields filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Need {
    id: NeedId,
    institution: String,
    aid_type: String,
    title: String,
    description: String,
    address: Address,
    contact: String,
    registered_at: String,
}

impl Need {
    /// Build a need from a validated form.
    ///
    /// A new UUID is generated. `registered_at` is stored verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidForm`] if the form does not pass validation.
    pub fn from_form(form: &NeedForm, registered_at: String) -> Result<Self, InvalidForm> {
        Self::from_form_with_id(form, registered_at, Uuid::new_v4())
    }

    pub(crate) fn from_form_with_id(
        form: &NeedForm,
        registered_at: String,
        id: Uuid,
    ) -> Result<Self, InvalidForm> {
        form.validate().into_result()?;

        Ok(Self {
            id: NeedId::Uuid(id),
            institution: form.institution.clone(),
            aid_type: form.aid_type.clone(),
            title: form.title.clone(),
            description: form.description.clone(),
            address: Address {
                postal_code: form.postal_code.clone(),
                street: form.street.clone(),
                district: form.district.clone(),
                city: form.city.clone(),
                state: form.state.clone(),
            },
            contact: form.contact.clone(),
            registered_at,
        })
    }

    /// The unique, stable identifier of this need.
    #[must_use]
    pub const fn id(&self) -> NeedId {
        self.id
    }

    /// The institution asking for help.
    #[must_use]
    pub fn institution(&self) -> &str {
        &self.institution
    }

    /// The aid category.
    #[must_use]
    pub fn aid_type(&self) -> &str {
        &self.aid_type
    }

    /// The title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Where the institution is.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// E-mail address or phone number.
    #[must_use]
    pub fn contact(&self) -> &str {
        &self.contact
    }

    /// The date the need was registered, as formatted at the time.
    #[must_use]
    pub fn registered_at(&self) -> &str {
        &self.registered_at
    }
}
