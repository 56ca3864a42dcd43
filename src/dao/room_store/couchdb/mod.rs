//! CouchDB storage backend. One document per room, player and round; ids are prefixed so a
//! room's players and rounds can be listed with a key range.

mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchRoomStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Conflict { path } => StorageError::Conflict {
                message: format!("document `{path}` was updated concurrently"),
            },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
