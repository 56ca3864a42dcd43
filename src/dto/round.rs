use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerEntity, RoundEntity},
    dto::{format_system_time, validation::validate_spotify_id},
};

/// Payload starting a new round.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct StartRoundRequest {
    /// Playlist to draw from; defaults to the room's configured playlist.
    #[serde(default)]
    #[validate(custom(function = "validate_spotify_id"))]
    pub playlist_id: Option<String>,
}

/// Round returned to the host who started it, answer included.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartRoundResponse {
    pub round_id: Uuid,
    pub room_id: String,
    pub round_number: u32,
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub preview_url: String,
    pub album_image_url: Option<String>,
    /// RFC 3339 start timestamp.
    pub start_time: String,
}

impl From<&RoundEntity> for StartRoundResponse {
    fn from(round: &RoundEntity) -> Self {
        Self {
            round_id: round.round_id,
            room_id: round.room_id.clone(),
            round_number: round.round_number,
            track_id: round.track.track_id.clone(),
            track_name: round.track.track_name.clone(),
            artist_name: round.track.artist_name.clone(),
            preview_url: round.track.preview_url.clone(),
            album_image_url: round.track.album_image_url.clone(),
            start_time: format_system_time(round.start_time),
        }
    }
}

/// Track metadata, only exposed once the round is over.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackReveal {
    pub track_name: String,
    pub artist_name: String,
    pub album_image_url: Option<String>,
}

/// Answer as shown to other players. The guess itself stays hidden until the reveal.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerView {
    pub player_id: Uuid,
    pub is_correct: bool,
    pub score: u32,
    pub time_taken: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Round as seen by any player.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundView {
    pub round_id: Uuid,
    pub room_id: String,
    pub round_number: u32,
    pub preview_url: String,
    /// RFC 3339 start timestamp.
    pub start_time: String,
    /// True once every player answered or the answer window elapsed.
    pub finished: bool,
    /// Present only when `finished` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackReveal>,
    /// Answers in submission order.
    pub answers: Vec<AnswerView>,
}

impl RoundView {
    /// Project a stored round, hiding the solution and guesses unless `finished`.
    pub fn from_entity(round: RoundEntity, finished: bool) -> Self {
        let answers = round
            .answers
            .into_iter()
            .map(|(player_id, answer)| AnswerView::from_entity(player_id, answer, finished))
            .collect();

        let track = finished.then(|| TrackReveal {
            track_name: round.track.track_name,
            artist_name: round.track.artist_name,
            album_image_url: round.track.album_image_url,
        });

        Self {
            round_id: round.round_id,
            room_id: round.room_id,
            round_number: round.round_number,
            preview_url: round.track.preview_url,
            start_time: format_system_time(round.start_time),
            finished,
            track,
            answers,
        }
    }
}

impl AnswerView {
    fn from_entity(player_id: Uuid, answer: AnswerEntity, reveal: bool) -> Self {
        Self {
            player_id,
            is_correct: answer.is_correct,
            score: answer.score,
            time_taken: answer.time_taken,
            answer: reveal.then_some(answer.answer),
        }
    }
}

/// Guess submitted by a player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(max = 200))]
    pub answer: String,
}

/// Result of a submitted guess.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    pub score: u32,
    pub is_correct: bool,
    /// Seconds between round start and the answer.
    pub time_taken: f64,
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use indexmap::IndexMap;

    use super::*;
    use crate::dao::models::TrackEntity;

    fn round() -> RoundEntity {
        let player_id = Uuid::new_v4();
        let mut answers = IndexMap::new();
        answers.insert(
            player_id,
            AnswerEntity {
                answer: "bohemian".into(),
                score: 0,
                is_correct: false,
                time_taken: 3.5,
                answered_at: SystemTime::now(),
            },
        );
        RoundEntity {
            round_id: Uuid::new_v4(),
            room_id: "ABC234".into(),
            round_number: 1,
            track: TrackEntity {
                track_id: "t1".into(),
                track_name: "Bohemian Rhapsody".into(),
                artist_name: "Queen".into(),
                preview_url: "https://p.scdn.co/mp3-preview/abc".into(),
                album_image_url: None,
            },
            start_time: SystemTime::now(),
            answers,
        }
    }

    #[test]
    fn running_round_hides_solution_and_guesses() {
        let view = RoundView::from_entity(round(), false);
        assert!(view.track.is_none());
        assert!(view.answers[0].answer.is_none());

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("Bohemian"));
        assert!(!json.contains("bohemian"));
        assert!(json.contains("mp3-preview"));
    }

    #[test]
    fn finished_round_reveals_solution() {
        let view = RoundView::from_entity(round(), true);
        let track = view.track.expect("revealed track");
        assert_eq!(track.track_name, "Bohemian Rhapsody");
        assert_eq!(view.answers[0].answer.as_deref(), Some("bohemian"));
    }
}
