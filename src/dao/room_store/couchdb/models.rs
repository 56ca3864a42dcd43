use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const ROOM_PREFIX: &str = "room::";
pub const PLAYER_PREFIX: &str = "player::";
pub const ROUND_PREFIX: &str = "round::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Any entity stored as a CouchDB document, with the bookkeeping fields CouchDB requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> CouchDocument<T> {
    pub fn new(id: String, body: T) -> Self {
        Self {
            id,
            rev: None,
            body,
        }
    }
}

pub fn room_doc_id(room_id: &str) -> String {
    format!("{ROOM_PREFIX}{room_id}")
}

/// Prefix shared by all player documents of a room.
pub fn room_players_prefix(room_id: &str) -> String {
    format!("{PLAYER_PREFIX}{room_id}::")
}

pub fn player_doc_id(room_id: &str, player_id: Uuid) -> String {
    format!("{}{}", room_players_prefix(room_id), player_id)
}

/// Prefix shared by all round documents of a room.
pub fn room_rounds_prefix(room_id: &str) -> String {
    format!("{ROUND_PREFIX}{room_id}::")
}

pub fn round_doc_id(room_id: &str, round_id: Uuid) -> String {
    format!("{}{}", room_rounds_prefix(room_id), round_id)
}
