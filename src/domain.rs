//! Domain models for the need board.
//!
//! This module contains the core domain types: needs, the registration
//! form and its validation rules, postal codes, search filters and
//! configuration.

/// Need domain model.
pub mod need;
pub use need::{Need, NeedId};

mod config;
pub use config::Config;

/// Search filters over a collection of needs.
pub mod filter;
pub use filter::Filter;

pub mod form;
pub use form::{Field, InvalidForm, NeedForm, Validation};

mod notice;
pub use notice::Notice;

/// Postal codes and addresses.
pub mod postal;
pub use postal::{Address, InvalidPostalCodeError, PostalCode, ResolvedAddress};
