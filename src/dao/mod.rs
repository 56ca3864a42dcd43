/// Database model definitions.
pub mod models;
/// Room, player and round storage backends.
pub mod room_store;
/// Storage abstraction layer for database operations.
pub mod storage;
