//! High-level client flows on top of the HTTP pipeline and session state.
//!
//! ARCHITECTURE
//! ============
//! `GameClient` owns one `HttpClient`, the shared `SnapshotReader`, and the
//! local game cache. Each flow validates its form first, then calls the
//! backend, then folds the result into the credential store or the game
//! cache. Front ends mount a `SessionWatch` on [`GameClient::reader`] to
//! follow auth changes.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ClientConfig;
use crate::net::oauth::{OAUTH_FAILED_ROUTE, OAUTH_SUCCESS_ROUTE, OAuthCallbackError, parse_callback};
use crate::net::types::{CachedUser, Game, LoginRequest, MessageResponse, RegisterRequest};
use crate::net::{ApiError, HttpClient, Navigator, SIGN_IN_ROUTE};
use crate::state::credentials::CredentialStore;
use crate::state::game::GameState;
use crate::state::session::SessionView;
use crate::state::snapshot::SnapshotReader;
use crate::util::validation::{
    FieldError, validate_forgot_password, validate_guess, validate_login, validate_question, validate_register,
    validate_reset_password,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The form failed local validation; nothing was sent.
    #[error("invalid input: {}", join_field_errors(.0))]
    Invalid(Vec<FieldError>),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    OAuth(#[from] OAuthCallbackError),
}

impl ClientError {
    /// Single line for display: the first field error, the backend message,
    /// or `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Invalid(errors) => errors.first().map_or_else(|| fallback.to_owned(), |e| e.message.to_owned()),
            Self::Api(error) => error.user_message(fallback),
            Self::OAuth(_) => fallback.to_owned(),
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

fn check(errors: Vec<FieldError>) -> Result<(), ClientError> {
    if errors.is_empty() { Ok(()) } else { Err(ClientError::Invalid(errors)) }
}

/// Registration form as entered.
#[derive(Clone, Debug, Default)]
pub struct RegisterForm<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub recaptcha_token: &'a str,
}

pub struct GameClient {
    http: HttpClient,
    navigator: Arc<dyn Navigator>,
    reader: Arc<SnapshotReader>,
    game: Mutex<GameState>,
}

impl GameClient {
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot initialize.
    pub fn new(
        config: &ClientConfig,
        credentials: CredentialStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::new(config, credentials.clone(), navigator.clone())?;
        Ok(Self {
            http,
            navigator,
            reader: Arc::new(SnapshotReader::new(credentials)),
            game: Mutex::new(GameState::default()),
        })
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        self.http.credentials()
    }

    /// Shared snapshot reader to mount session watches on.
    #[must_use]
    pub fn reader(&self) -> Arc<SnapshotReader> {
        self.reader.clone()
    }

    /// Copy of the local game cache.
    #[must_use]
    pub fn game_state(&self) -> GameState {
        self.lock_game().clone()
    }

    fn lock_game(&self) -> std::sync::MutexGuard<'_, GameState> {
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    /// Validate, log in, and persist the credential (one auth-change publish).
    ///
    /// # Errors
    ///
    /// [`ClientError::Invalid`] before any request, or the backend rejection.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<CachedUser, ClientError> {
        check(validate_login(username, password))?;
        let auth = self.http.login(&LoginRequest { username, password }).await?;
        self.credentials().handle_auth_response(&auth);
        Ok(auth.user())
    }

    /// Clear the credential, drop the game cache, and go to sign-in.
    pub fn sign_out(&self) {
        self.credentials().clear_credential();
        self.lock_game().reset();
        self.navigator.navigate(SIGN_IN_ROUTE);
    }

    /// Finish an OAuth redirect. On success the credential is persisted and
    /// the navigator sent to the game; on failure to the failed-login route.
    ///
    /// # Errors
    ///
    /// Returns the parse failure after navigating away.
    pub fn complete_oauth(&self, callback: &str) -> Result<CachedUser, ClientError> {
        match parse_callback(callback) {
            Ok(auth) => {
                self.credentials().handle_auth_response(&auth);
                self.navigator.navigate(OAUTH_SUCCESS_ROUTE);
                Ok(auth.user())
            }
            Err(error) => {
                tracing::warn!(%error, "oauth callback rejected");
                self.navigator.navigate(OAUTH_FAILED_ROUTE);
                Err(error.into())
            }
        }
    }

    /// Send the navigator to sign-in when the settled session is signed out.
    /// Returns whether it redirected.
    pub fn guard(&self, view: &SessionView) -> bool {
        if view.should_redirect_to_sign_in() {
            self.navigator.navigate(SIGN_IN_ROUTE);
            return true;
        }
        false
    }

    // =========================================================================
    // ACCOUNT
    // =========================================================================

    /// # Errors
    ///
    /// [`ClientError::Invalid`] before any request, or the backend rejection.
    pub async fn register(&self, form: &RegisterForm<'_>) -> Result<MessageResponse, ClientError> {
        check(validate_register(form.username, form.email, form.password, form.confirm_password))?;
        let body = RegisterRequest {
            username: form.username,
            email: form.email,
            password: form.password,
            recaptcha_token: form.recaptcha_token,
        };
        Ok(self.http.register(&body).await?)
    }

    /// # Errors
    ///
    /// [`ClientError::Invalid`] before any request, or the backend rejection.
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ClientError> {
        check(validate_forgot_password(email))?;
        Ok(self.http.request_password_reset(email).await?)
    }

    /// # Errors
    ///
    /// [`ClientError::Invalid`] before any request, or the backend rejection.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<MessageResponse, ClientError> {
        check(validate_reset_password(token, password, confirm_password))?;
        Ok(self.http.confirm_password_reset(token, password).await?)
    }

    // =========================================================================
    // GAME
    // =========================================================================

    /// # Errors
    ///
    /// Returns the backend failure; the cache is untouched.
    pub async fn start_game(&self) -> Result<Game, ClientError> {
        let game = self.http.start_game().await?;
        self.lock_game().apply_started(game.clone());
        Ok(game)
    }

    /// Refresh the cached current game from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the cache is untouched.
    pub async fn refresh_current(&self) -> Result<Option<Game>, ClientError> {
        let game = self.http.current_game().await?;
        self.lock_game().apply_current(game.clone());
        Ok(game)
    }

    /// Start a game when the session is signed in and the backend reports no
    /// game in progress. Returns the started game, if any.
    ///
    /// # Errors
    ///
    /// Returns the backend failure of the lookup or the start.
    pub async fn auto_start(&self, view: &SessionView) -> Result<Option<Game>, ClientError> {
        if !view.is_signed_in() {
            return Ok(None);
        }
        if self.lock_game().current.is_some() {
            return Ok(None);
        }
        if self.refresh_current().await?.is_some() {
            return Ok(None);
        }
        tracing::debug!("no game in progress; starting one");
        Ok(Some(self.start_game().await?))
    }

    /// # Errors
    ///
    /// [`ClientError::Invalid`] before any request, or the backend failure.
    pub async fn ask(&self, question: &str) -> Result<String, ClientError> {
        check(validate_question(question))?;
        let answer = self.http.ask_question(question).await?;
        self.lock_game().apply_answer(&answer);
        Ok(answer.answer)
    }

    /// # Errors
    ///
    /// [`ClientError::Invalid`] before any request, or the backend failure.
    pub async fn guess(&self, character_name: &str) -> Result<Game, ClientError> {
        check(validate_guess(character_name))?;
        let game = self.http.submit_guess(character_name).await?;
        self.lock_game().apply_guess_result(game.clone());
        Ok(game)
    }

    /// Finished games, refetched only when a start or guess made the cached
    /// list stale (or nothing is cached yet).
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub async fn history(&self) -> Result<Vec<Game>, ClientError> {
        {
            let mut state = self.lock_game();
            let stale = state.take_history_stale();
            if !stale && !state.history.is_empty() {
                return Ok(state.history.clone());
            }
        }
        match self.http.game_history().await {
            Ok(history) => {
                self.lock_game().apply_history(history.clone());
                Ok(history)
            }
            Err(error) => {
                self.lock_game().history_stale = true;
                Err(error.into())
            }
        }
    }
}

impl std::fmt::Debug for GameClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient").field("http", &self.http).finish_non_exhaustive()
    }
}
