#![forbid(unsafe_code)]

pub mod local;
pub mod repository;
pub mod sqlite;

pub use local::LocalRecords;
pub use repository::{Storage, StorageError};
