//! Process-local storage backend, used when no database is configured and by the tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::{
    models::{PlayerEntity, RoomEntity, RoundEntity},
    room_store::RoomStore,
    storage::StorageResult,
};

#[derive(Default)]
struct Tables {
    rooms: DashMap<String, RoomEntity>,
    /// Players per room, kept in join order.
    players: DashMap<String, IndexMap<Uuid, PlayerEntity>>,
    rounds: DashMap<(String, Uuid), RoundEntity>,
}

/// [`RoomStore`] keeping every record in memory. Data is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    tables: Arc<Tables>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryRoomStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables.rooms.insert(room.room_id.clone(), room);
            Ok(())
        })
    }

    fn find_room(&self, room_id: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.rooms.get(&room_id).map(|entry| entry.clone())) })
    }

    fn delete_room(&self, room_id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let existed = tables.rooms.remove(&room_id).is_some();
            tables.players.remove(&room_id);
            tables.rounds.retain(|(room, _), _| *room != room_id);
            Ok(existed)
        })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables
                .players
                .entry(player.room_id.clone())
                .or_default()
                .insert(player.player_id, player);
            Ok(())
        })
    }

    fn list_players(&self, room_id: String) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            Ok(tables
                .players
                .get(&room_id)
                .map(|players| players.values().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn delete_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let removed = tables
                .players
                .get_mut(&room_id)
                .and_then(|mut players| players.shift_remove(&player_id))
                .is_some();
            Ok(removed)
        })
    }

    fn save_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables
                .rounds
                .insert((round.room_id.clone(), round.round_id), round);
            Ok(())
        })
    }

    fn find_round(
        &self,
        room_id: String,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            Ok(tables
                .rounds
                .get(&(room_id, round_id))
                .map(|entry| entry.clone()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
