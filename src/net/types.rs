//! Wire DTOs for the game backend's REST API.
//!
//! DESIGN
//! ======
//! Field names follow the backend's camelCase JSON. Timestamps stay as the
//! strings the backend emits (zone-less local date-times) since the client
//! only displays them.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Token type assumed when the backend or a callback omits one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Display copy of the authenticated identity kept next to the token.
///
/// Never validated against the backend; it is a cache, not a source of truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// Successful login, registration verification, or OAuth callback payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type", default = "default_token_type")]
    pub token_type: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_owned()
}

impl AuthResponse {
    #[must_use]
    pub fn user(&self) -> CachedUser {
        CachedUser { user_id: self.user_id, username: self.username.clone(), email: self.email.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub recaptcha_token: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuestionRequest<'a> {
    pub question: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest<'a> {
    pub character_name: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Active,
    Won,
    Lost,
}

impl GameStatus {
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// One question/answer exchange in a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub question: String,
    pub answer: String,
    pub asked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: i64,
    pub status: GameStatus,
    pub questions_count: u32,
    pub started_at: String,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub guessed_correctly: bool,
    #[serde(default)]
    pub final_guess: Option<String>,
    #[serde(default)]
    pub revealed_character: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<QuestionResponse>,
}

/// Answer to a single `POST /game/ask`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswerResponse {
    pub question: String,
    pub answer: String,
    pub total_questions: u32,
}

/// Error body shape; only `message` is read.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
