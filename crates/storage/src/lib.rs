#![forbid(unsafe_code)]

pub mod answer_store;
pub mod repository;
pub mod sqlite;

pub use answer_store::SessionAnswerStore;
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
