//! Typed REST calls for the auth and game endpoints.
//!
//! Every call goes through [`HttpClient`], so bearer attachment and the
//! authorization-failure policy apply uniformly. Callers get `Result`s and
//! render [`ApiError::user_message`] next to the relevant form.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use reqwest::Method;

use super::error::ApiError;
use super::http::HttpClient;
use super::types::{
    AuthResponse, EmailRequest, Game, GuessRequest, LoginRequest, MessageResponse, QuestionAnswerResponse,
    QuestionRequest, RegisterRequest, ResetPasswordRequest,
};

const REGISTER: &str = "/auth/register";
const LOGIN: &str = "/auth/login";
const VERIFY_EMAIL: &str = "/auth/verify-email";
const RESEND_VERIFICATION: &str = "/auth/resend-verification";
const RESET_REQUEST: &str = "/auth/password-reset/request";
const RESET_VALIDATE: &str = "/auth/password-reset/validate";
const RESET_CONFIRM: &str = "/auth/password-reset/confirm";
const GAME_START: &str = "/game/start";
const GAME_ASK: &str = "/game/ask";
const GAME_GUESS: &str = "/game/guess";
const GAME_CURRENT: &str = "/game/current";
const GAME_HISTORY: &str = "/game/history";

impl HttpClient {
    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status
    /// (duplicate username, failed captcha, ...).
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<MessageResponse, ApiError> {
        self.send_json(self.request(Method::POST, REGISTER).json(body)).await
    }

    /// `POST /auth/login`. Does not persist the result; see
    /// [`crate::client::GameClient::sign_in`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or rejected credentials.
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.send_json(self.request(Method::POST, LOGIN).json(body)).await
    }

    /// `GET /auth/verify-email?token=`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the token is unknown or expired.
    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse, ApiError> {
        self.send_json(self.request(Method::GET, VERIFY_EMAIL).query(&[("token", token)])).await
    }

    /// `POST /auth/resend-verification`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn resend_verification(&self, email: &str) -> Result<MessageResponse, ApiError> {
        self.send_json(self.request(Method::POST, RESEND_VERIFICATION).json(&EmailRequest { email })).await
    }

    /// `POST /auth/password-reset/request`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        self.send_json(self.request(Method::POST, RESET_REQUEST).json(&EmailRequest { email })).await
    }

    /// `GET /auth/password-reset/validate?token=`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the reset token is invalid or expired.
    pub async fn validate_reset_token(&self, token: &str) -> Result<MessageResponse, ApiError> {
        self.send_json(self.request(Method::GET, RESET_VALIDATE).query(&[("token", token)])).await
    }

    /// `POST /auth/password-reset/confirm`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the reset token is invalid or the password
    /// is rejected.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<MessageResponse, ApiError> {
        let body = ResetPasswordRequest { token, new_password };
        self.send_json(self.request(Method::POST, RESET_CONFIRM).json(&body)).await
    }

    // =========================================================================
    // GAME
    // =========================================================================

    /// `POST /game/start`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn start_game(&self) -> Result<Game, ApiError> {
        self.send_json(self.request(Method::POST, GAME_START)).await
    }

    /// `POST /game/ask`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when there is no active game or the question is
    /// rejected.
    pub async fn ask_question(&self, question: &str) -> Result<QuestionAnswerResponse, ApiError> {
        self.send_json(self.request(Method::POST, GAME_ASK).json(&QuestionRequest { question })).await
    }

    /// `POST /game/guess`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when there is no active game.
    pub async fn submit_guess(&self, character_name: &str) -> Result<Game, ApiError> {
        self.send_json(self.request(Method::POST, GAME_GUESS).json(&GuessRequest { character_name })).await
    }

    /// `GET /game/current`; `Ok(None)` when the backend answers `404`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for any failure other than `404`.
    pub async fn current_game(&self) -> Result<Option<Game>, ApiError> {
        match self.send_json(self.request(Method::GET, GAME_CURRENT)).await {
            Ok(game) => Ok(Some(game)),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// `GET /game/history`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn game_history(&self) -> Result<Vec<Game>, ApiError> {
        self.send_json(self.request(Method::GET, GAME_HISTORY)).await
    }
}
