//! Postal code lookups against the `ViaCEP` web service.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    domain::{Config, PostalCode, ResolvedAddress},
    lookup::{LookupError, PostalLookup},
};

/// An HTTP client for a `ViaCEP`-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ViaCep {
    client: Client,
    url_template: String,
}

impl ViaCep {
    /// A client for the endpoint and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        Self::with_endpoint(config.lookup_url.clone(), config.lookup_timeout())
    }

    /// A client for an explicit endpoint template.
    ///
    /// `{code}` in the template is replaced with the postal code digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_endpoint(url_template: String, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url_template,
        })
    }

    fn url_for(&self, code: &PostalCode) -> String {
        self.url_template.replace("{code}", code.as_str())
    }
}

impl PostalLookup for ViaCep {
    fn lookup(&self, code: &PostalCode) -> Result<Option<ResolvedAddress>, LookupError> {
        let url = self.url_for(code);
        tracing::debug!("GET {url}");

        let response = self.client.get(&url).send()?.error_for_status()?;
        let body = response.text()?;
        parse_response(&body)
    }
}

/// The subset of a `ViaCEP` response we use.
#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    /// Set when the code is well-formed but unknown. Older deployments send
    /// `true`, newer ones `"true"`.
    #[serde(default)]
    erro: Option<Value>,
}

/// Interpret a response body.
///
/// Returns `Ok(None)` if the service reports the code as unknown.
pub(crate) fn parse_response(body: &str) -> Result<Option<ResolvedAddress>, LookupError> {
    let response: Response = serde_json::from_str(body)?;

    if response.erro.as_ref().is_some_and(is_truthy) {
        return Ok(None);
    }

    Ok(Some(ResolvedAddress {
        street: response.logradouro.unwrap_or_default(),
        district: response.bairro.unwrap_or_default(),
        city: response.localidade.unwrap_or_default(),
        state: response.uf.unwrap_or_default(),
    }))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
