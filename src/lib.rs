//! A board of charitable needs
//!
//! Institutions register requests for donations through a validated form
//! whose address is filled in from the postal code. Needs are kept as a
//! single versioned collection and can be searched by category and text.

pub mod domain;
pub use domain::{
    Config, Field, Filter, Need, NeedForm, NeedId, Notice, PostalCode, Validation,
};

/// Postal code lookup and address enrichment.
pub mod lookup;
pub use lookup::{enrich, Enrichment, LookupError, PostalLookup, ViaCep};

pub mod render;

/// Persistent storage for the needs collection.
pub mod storage;
pub use storage::{Board, FileStore, KeyValueStore, MemoryStore};
