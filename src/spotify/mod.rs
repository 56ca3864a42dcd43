//! Thin client for the parts of the Spotify platform the game relies on: playlist search,
//! playlist tracks and the audio preview exposed by the public track embed page.

mod client;
mod error;
pub mod models;
pub mod preview;

pub use client::{SpotifyClient, SpotifyCredentials};
pub use error::SpotifyError;
