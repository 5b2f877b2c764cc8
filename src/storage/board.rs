//! The persisted collection of needs.
//!
//! The [`Board`] owns the in-memory copy of the collection together with the
//! revision it was read at. Registering a need re-reads the stored revision
//! and refuses to write if anyone else has written since, so concurrent
//! writers cannot silently drop each other's needs.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Filter, Need},
    storage::store::{KeyValueStore, StoreError},
};

/// The key the collection is stored under.
pub const NEEDS_KEY: &str = "needs";

/// The collection of registered needs, backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct Board<S> {
    store: S,
    revision: u64,
    needs: Vec<Need>,
}

impl<S: KeyValueStore> Board<S> {
    /// Load the collection from the store.
    ///
    /// A store with nothing under [`NEEDS_KEY`] gives an empty board.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or holds data that is not
    /// a collection of needs.
    pub fn open(store: S) -> Result<Self, LoadError> {
        let snapshot = read_snapshot(&store)?;
        tracing::debug!(
            "Loaded {} needs at revision {}",
            snapshot.needs.len(),
            snapshot.revision
        );

        Ok(Self {
            store,
            revision: snapshot.revision,
            needs: snapshot.needs,
        })
    }

    /// Load the collection, treating unreadable data as an empty board.
    ///
    /// This suits read-only views. A board opened this way over corrupt data
    /// still refuses to register, because the stored revision cannot be
    /// confirmed.
    #[must_use]
    pub fn open_lenient(store: S) -> Self {
        match read_snapshot(&store) {
            Ok(snapshot) => Self {
                store,
                revision: snapshot.revision,
                needs: snapshot.needs,
            },
            Err(e) => {
                tracing::warn!("Ignoring unreadable needs collection: {e}");
                Self {
                    store,
                    revision: 0,
                    needs: Vec::new(),
                }
            }
        }
    }

    /// The needs on the board, in registration order.
    #[must_use]
    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    /// The revision of the stored collection this board reflects.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The needs that pass `filter`, in registration order.
    ///
    /// The filter always runs against the full collection.
    #[must_use]
    pub fn search(&self, filter: &Filter) -> Vec<&Need> {
        filter.apply(&self.needs)
    }

    /// Append a need and write the whole collection back.
    ///
    /// The stored revision is checked and the new collection written while
    /// the store holds the key, so a writer that got in first is never
    /// overwritten. The in-memory collection only changes once the write has
    /// succeeded.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    ///
    /// - the stored collection cannot be read back or parsed
    /// - another writer has changed the collection since it was loaded
    /// - the store rejects the write
    pub fn register(&mut self, need: Need) -> Result<&Need, RegisterError> {
        let expected = self.revision;
        let revision = expected + 1;
        let index = self.needs.len();

        let mut needs = self.needs.clone();
        needs.push(need);

        self.store.update(NEEDS_KEY, |current| {
            let found = match current {
                Some(raw) => parse_snapshot(&raw).map_err(LoadError::Json)?.revision,
                None => 0,
            };
            if found != expected {
                return Err(RegisterError::Conflict { expected, found });
            }

            serde_json::to_string(&Stored::V1 {
                revision,
                needs: needs.as_slice(),
            })
            .map_err(RegisterError::Serialize)
        })?;

        self.revision = revision;
        self.needs = needs;

        let need = &self.needs[index];
        tracing::info!("Registered need {} at revision {revision}", need.id());
        Ok(need)
    }

    /// Give back the underlying store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

struct Snapshot {
    revision: u64,
    needs: Vec<Need>,
}

fn read_snapshot<S: KeyValueStore>(store: &S) -> Result<Snapshot, LoadError> {
    match store.get(NEEDS_KEY)? {
        Some(raw) => Ok(parse_snapshot(&raw)?),
        None => Ok(Snapshot {
            revision: 0,
            needs: Vec::new(),
        }),
    }
}

/// Parse a stored collection.
///
/// A bare array was written before collections carried a revision, and is
/// read as revision 0.
fn parse_snapshot(raw: &str) -> Result<Snapshot, serde_json::Error> {
    if raw.trim_start().starts_with('[') {
        let needs = serde_json::from_str(raw)?;
        return Ok(Snapshot { revision: 0, needs });
    }

    match serde_json::from_str::<Stored<Vec<Need>>>(raw)? {
        Stored::V1 { revision, needs } => Ok(Snapshot { revision, needs }),
    }
}

/// The serialized versions of the collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Stored<N> {
    #[serde(rename = "1")]
    V1 { revision: u64, needs: N },
}

/// Errors raised while reading the collection.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The store could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored value is not a collection of needs.
    #[error("malformed needs collection: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while registering a need.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// The stored collection could not be read back before writing.
    #[error("failed to read the needs collection: {0}")]
    Load(#[from] LoadError),

    /// Another writer got there first.
    #[error(
        "the needs collection changed since it was loaded (revision {expected}, now {found}); \
         reload and try again"
    )]
    Conflict {
        /// The revision this board was loaded at.
        expected: u64,
        /// The revision now in the store.
        found: u64,
    },

    /// The collection could not be serialized.
    #[error("failed to serialize the needs collection: {0}")]
    Serialize(serde_json::Error),

    /// The store rejected the write.
    #[error("failed to save the needs collection: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::{form::tests::complete_form, NeedId},
        storage::store::{FileStore, MemoryStore},
    };

    fn need(title: &str) -> Need {
        let mut form = complete_form();
        form.title = title.to_string();
        Need::from_form(&form, "19/10/2026".to_string()).unwrap()
    }

    #[test]
    fn empty_store_opens_empty_board() {
        let board = Board::open(MemoryStore::new()).unwrap();
        assert!(board.needs().is_empty());
        assert_eq!(board.revision(), 0);
    }

    #[test]
    fn register_appends_and_persists() {
        let mut board = Board::open(MemoryStore::new()).unwrap();
        board.register(need("Rice")).unwrap();
        board.register(need("Beans")).unwrap();

        let reopened = Board::open(board.into_store()).unwrap();
        let titles: Vec<_> = reopened.needs().iter().map(Need::title).collect();
        assert_eq!(titles, ["Rice", "Beans"]);
        assert_eq!(reopened.revision(), 2);
    }

    #[test]
    fn register_preserves_existing_needs_unmodified() {
        let mut board = Board::open(MemoryStore::new()).unwrap();
        let first = board.register(need("Rice")).unwrap().clone();

        let mut board = Board::open(board.into_store()).unwrap();
        board.register(need("Beans")).unwrap();

        let reopened = Board::open(board.into_store()).unwrap();
        assert_eq!(reopened.needs().len(), 2);
        assert_eq!(reopened.needs()[0], first);
    }

    #[test]
    fn stale_board_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());

        let mut first = Board::open(store.clone()).unwrap();
        let mut second = Board::open(store.clone()).unwrap();

        first.register(need("Rice")).unwrap();
        let err = second.register(need("Beans")).unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Conflict {
                expected: 0,
                found: 1
            }
        ));
        assert!(second.needs().is_empty());

        let reopened = Board::open(store).unwrap();
        let titles: Vec<_> = reopened.needs().iter().map(Need::title).collect();
        assert_eq!(titles, ["Rice"]);
    }

    /// A store that lets another board register just before each update.
    struct InterleavingStore {
        inner: MemoryStore,
        other: Option<Need>,
    }

    impl KeyValueStore for InterleavingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn update<E, F>(&mut self, key: &str, f: F) -> Result<(), E>
        where
            E: From<StoreError>,
            F: FnOnce(Option<String>) -> Result<String, E>,
        {
            if let Some(need) = self.other.take() {
                let mut other = Board::open(&mut self.inner).unwrap();
                other.register(need).unwrap();
            }
            self.inner.update(key, f)
        }
    }

    #[test]
    fn writer_landing_before_the_write_is_not_overwritten() {
        let store = InterleavingStore {
            inner: MemoryStore::new(),
            other: Some(need("Other writer")),
        };
        let mut board = Board::open(store).unwrap();

        let err = board.register(need("Winter coats")).unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Conflict {
                expected: 0,
                found: 1
            }
        ));
        assert!(board.needs().is_empty());

        let reopened = Board::open(board.into_store().inner).unwrap();
        let titles: Vec<_> = reopened.needs().iter().map(Need::title).collect();
        assert_eq!(titles, ["Other writer"]);
        assert_eq!(reopened.revision(), 1);
    }

    #[test]
    fn failed_write_leaves_board_unchanged() {
        let mut board = Board::open(MemoryStore::with_quota(64)).unwrap();

        let err = board.register(need("Rice")).unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Store(StoreError::QuotaExceeded { .. })
        ));
        assert!(board.needs().is_empty());
        assert_eq!(board.revision(), 0);

        let store = board.into_store();
        assert_eq!(store.get(NEEDS_KEY).unwrap(), None);
    }

    #[test]
    fn legacy_array_is_read_as_revision_zero() {
        let mut store = MemoryStore::new();
        let legacy = serde_json::to_string(&vec![need("Rice")]).unwrap();
        store.set(NEEDS_KEY, &legacy).unwrap();

        let mut board = Board::open(store).unwrap();
        assert_eq!(board.revision(), 0);
        assert_eq!(board.needs().len(), 1);

        board.register(need("Beans")).unwrap();
        assert_eq!(board.revision(), 1);
    }

    #[test]
    fn legacy_timestamp_ids_are_read() {
        let mut store = MemoryStore::new();
        store
            .set(
                NEEDS_KEY,
                r#"[{
                    "id": 1729000000000,
                    "institution": "Casa de Apoio",
                    "aidType": "Food",
                    "title": "Rice",
                    "description": "Rice for the kitchen",
                    "address": {
                        "postalCode": "01001-000",
                        "street": "Praça da Sé",
                        "district": "Sé",
                        "city": "São Paulo",
                        "state": "SP"
                    },
                    "contact": "contato@casa.org",
                    "registeredAt": "14/10/2024"
                }]"#,
            )
            .unwrap();

        let mut board = Board::open(store).unwrap();
        assert_eq!(board.needs()[0].id(), NeedId::Timestamp(1_729_000_000_000));

        board.register(need("Beans")).unwrap();
        let reopened = Board::open(board.into_store()).unwrap();
        assert_eq!(reopened.needs()[0].id().to_string(), "1729000000000");
        assert!(matches!(reopened.needs()[1].id(), NeedId::Uuid(_)));
    }

    #[test]
    fn malformed_legacy_array_reports_the_field() {
        let mut store = MemoryStore::new();
        store.set(NEEDS_KEY, r#"[{"id": 1}]"#).unwrap();

        let err = Board::open(store).unwrap_err();
        assert!(err.to_string().contains("missing field"), "{err}");
    }

    #[test]
    fn malformed_data_fails_strict_open() {
        let mut store = MemoryStore::new();
        store.set(NEEDS_KEY, "{not json").unwrap();

        assert!(matches!(Board::open(store), Err(LoadError::Json(_))));
    }

    #[test]
    fn malformed_data_opens_empty_when_lenient() {
        let mut store = MemoryStore::new();
        store.set(NEEDS_KEY, "{not json").unwrap();

        let mut board = Board::open_lenient(store);
        assert!(board.needs().is_empty());

        // The corrupt value is not overwritten.
        assert!(matches!(
            board.register(need("Rice")),
            Err(RegisterError::Load(LoadError::Json(_)))
        ));
    }

    #[test]
    fn search_runs_against_full_collection() {
        let mut board = Board::open(MemoryStore::new()).unwrap();
        board.register(need("Winter coats")).unwrap();
        board.register(need("Blankets")).unwrap();

        let narrowed = board.search(&Filter::new("coat", ""));
        assert_eq!(narrowed.len(), 1);

        let widened = board.search(&Filter::default());
        assert_eq!(widened.len(), 2);
    }
}
