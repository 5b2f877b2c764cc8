pub mod board;
pub mod store;

pub use board::{Board, LoadError, RegisterError, NEEDS_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
