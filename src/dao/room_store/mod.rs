#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{PlayerEntity, RoomEntity, RoundEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for rooms, their players and rounds.
pub trait RoomStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
    /// Insert or replace a room.
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a room by its code.
    fn find_room(&self, room_id: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Delete a room together with its players and rounds. Returns `false` when it did not exist.
    fn delete_room(&self, room_id: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Insert or replace a player.
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Players of a room in join order.
    fn list_players(&self, room_id: String) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Remove a player from a room. Returns `false` when it did not exist.
    fn delete_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Insert or replace a round.
    fn save_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a round of a room.
    fn find_round(
        &self,
        room_id: String,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    /// Check the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
