//! Postal code lookup and address enrichment.
//!
//! When the postal code on a [`NeedForm`] is complete, [`enrich`] asks a
//! [`PostalLookup`] for the matching address and copies it into the form's
//! street, district, city and state fields.

pub mod viacep;
pub use viacep::ViaCep;

use crate::domain::{Field, NeedForm, Notice, PostalCode, ResolvedAddress};

/// Resolves postal codes to addresses.
pub trait PostalLookup {
    /// Look up a postal code.
    ///
    /// Returns `Ok(None)` if the service does not know the code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// understood.
    fn lookup(&self, code: &PostalCode) -> Result<Option<ResolvedAddress>, LookupError>;
}

impl<L: PostalLookup + ?Sized> PostalLookup for &L {
    fn lookup(&self, code: &PostalCode) -> Result<Option<ResolvedAddress>, LookupError> {
        (**self).lookup(code)
    }
}

/// Errors raised by a [`PostalLookup`].
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The request could not be completed.
    #[error("postal code request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("unexpected postal code response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The outcome of [`enrich`].
#[derive(Debug)]
pub enum Enrichment {
    /// The postal code is not eight digits long; nothing was requested.
    Skipped,
    /// The address fields were overwritten with the resolved address.
    Filled(ResolvedAddress),
    /// The service does not know the postal code. The form is unchanged.
    NotFound(PostalCode),
    /// The lookup failed. The form is unchanged.
    Failed(LookupError),
}

impl Enrichment {
    /// The notice to show the user, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Skipped | Self::Filled(_) => None,
            Self::NotFound(code) => Some(Notice::PostalCodeNotFound(code.clone())),
            Self::Failed(_) => Some(Notice::LookupFailed),
        }
    }
}

/// Fill the address fields of `form` from its postal code.
///
/// Only the street, district, city and state fields are ever written, and
/// only when the lookup resolves the code. Components the service leaves out
/// are written as empty strings.
pub fn enrich<L: PostalLookup>(form: &mut NeedForm, lookup: &L) -> Enrichment {
    let Some(code) = form.postal_code() else {
        tracing::trace!("postal code {:?} is incomplete; skipping lookup", form.postal_code);
        return Enrichment::Skipped;
    };

    match lookup.lookup(&code) {
        Ok(Some(address)) => {
            tracing::debug!("postal code {code} resolved to {address:?}");
            for (field, value) in Field::ADDRESS.into_iter().zip([
                &address.street,
                &address.district,
                &address.city,
                &address.state,
            ]) {
                form.set(field, value.as_str());
            }
            Enrichment::Filled(address)
        }
        Ok(None) => {
            tracing::info!("postal code {code} not found");
            Enrichment::NotFound(code)
        }
        Err(e) => {
            tracing::error!("postal code lookup for {code} failed: {e}");
            Enrichment::Failed(e)
        }
    }
}
