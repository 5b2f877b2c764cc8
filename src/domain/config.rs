use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// Configuration for a need board.
///
/// This struct holds the settings that would otherwise be baked into the
/// registration form: the aid categories on offer, the postal code lookup
/// endpoint and the date format used for `registeredAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The aid types a need may be registered under.
    ///
    /// If this is empty, any aid type is allowed.
    aid_types: Vec<String>,

    /// Endpoint template for postal code lookups.
    ///
    /// `{code}` is replaced with the eight digit postal code.
    pub lookup_url: String,

    /// How long to wait for the lookup service before giving up.
    pub lookup_timeout_secs: u64,

    /// `strftime`-style format used to stamp new needs.
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aid_types: default_aid_types(),
            lookup_url: default_lookup_url(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            date_format: default_date_format(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration, falling back to the defaults if the file is
    /// missing or unreadable.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the configured aid types.
    #[must_use]
    pub fn aid_types(&self) -> &[String] {
        &self.aid_types
    }

    /// Checks if an aid type is allowed by the configuration.
    ///
    /// If `aid_types` is empty, all aid types are allowed.
    /// Otherwise, the aid type must match one of the list exactly.
    #[must_use]
    pub fn is_aid_type_allowed(&self, aid_type: &str) -> bool {
        self.aid_types.is_empty() || self.aid_types.iter().any(|t| t == aid_type)
    }

    /// Adds an aid type.
    ///
    /// Returns `true` if it was added, `false` if it already existed.
    pub fn add_aid_type(&mut self, aid_type: String) -> bool {
        if self.aid_types.contains(&aid_type) {
            false
        } else {
            self.aid_types.push(aid_type);
            true
        }
    }

    /// The lookup timeout.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

fn default_aid_types() -> Vec<String> {
    ["Food", "Clothing", "Hygiene", "Medicine", "Furniture", "Volunteering"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_lookup_url() -> String {
    "https://viacep.com.br/ws/{code}/json/".to_string()
}

const fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_aid_types")]
        aid_types: Vec<String>,

        #[serde(default = "default_lookup_url")]
        lookup_url: String,

        #[serde(default = "default_lookup_timeout_secs")]
        lookup_timeout_secs: u64,

        #[serde(default = "default_date_format")]
        date_format: String,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                aid_types,
                lookup_url,
                lookup_timeout_secs,
                date_format,
            } => Self {
                aid_types,
                lookup_url,
                lookup_timeout_secs,
                date_format,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            aid_types: config.aid_types,
            lookup_url: config.lookup_url,
            lookup_timeout_secs: config.lookup_timeout_secs,
            date_format: config.date_format,
        }
    }
}
