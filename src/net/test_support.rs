//! Local HTTP fixtures shared by the networking tests.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{any, get};
use serde_json::{Value, json};

use super::http::{HttpClient, Navigator};
use crate::config::{ClientConfig, Timeouts};
use crate::state::credentials::CredentialStore;
use crate::state::notifier::Notifier;
use crate::storage::MemoryStorage;

/// Navigator that records every route it was sent to.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub routes: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_owned());
    }
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

/// Serve `router` on an ephemeral port; returns the origin.
pub(crate) async fn spawn(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub(crate) struct Fixture {
    pub client: HttpClient,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

pub(crate) fn client_for(origin: &str) -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let credentials = CredentialStore::new(storage.clone(), Notifier::new());
    let navigator = Arc::new(RecordingNavigator::default());
    let config = ClientConfig::new(origin, std::env::temp_dir(), Timeouts::default()).unwrap();
    let client = HttpClient::new(&config, credentials, navigator.clone()).unwrap();
    Fixture { client, storage, navigator }
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    Json(json!({ "present": headers.contains_key("authorization"), "value": auth }))
}

async fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token expired" })))
}

async fn conflict() -> (StatusCode, Json<Value>) {
    (StatusCode::CONFLICT, Json(json!({ "message": "Username is already taken" })))
}

async fn server_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

/// Router exposing the pipeline probes under `/api/probe/*`.
pub(crate) fn probe_router() -> axum::Router {
    axum::Router::new()
        .route("/api/probe/auth", get(echo_auth))
        .route("/api/probe/unauthorized", any(unauthorized))
        .route("/api/probe/conflict", any(conflict))
        .route("/api/probe/error", any(server_error))
}

// =============================================================================
// FAKE BACKEND
// =============================================================================

#[derive(Clone, Default)]
struct Backend {
    game: Arc<Mutex<Option<Value>>>,
    history: Arc<Mutex<Vec<Value>>>,
}

fn game_json(id: i64, status: &str, history: &[Value]) -> Value {
    json!({
        "gameId": id,
        "status": status,
        "questionsCount": history.len(),
        "startedAt": "2024-05-01T10:00:00",
        "guessedCorrectly": status == "WON",
        "conversationHistory": history,
    })
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message })))
}

async fn login(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if body["username"] == "sora" && body["password"] == "secret" {
        return Ok(Json(json!({
            "token": "jwt-sora",
            "type": "Bearer",
            "userId": 7,
            "username": "sora",
            "email": "sora@example.com",
        })));
    }
    Err(bad_request("Invalid username or password"))
}

async fn register(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if body["recaptchaToken"].as_str().is_none_or(str::is_empty) {
        return Err(bad_request("reCAPTCHA verification failed"));
    }
    Ok(Json(json!({ "message": format!("Registered {}", body["username"].as_str().unwrap_or("")) })))
}

async fn token_message(
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match params.get("token").map(String::as_str) {
        Some("good") => Ok(Json(json!({ "message": "Token is valid" }))),
        _ => Err(bad_request("Invalid or expired token")),
    }
}

async fn email_message(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "message": format!("Sent to {}", body["email"].as_str().unwrap_or("")) }))
}

async fn confirm_reset(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if body["token"] == "good" && body["newPassword"].as_str().is_some_and(|p| p.len() >= 6) {
        return Ok(Json(json!({ "message": "Password updated" })));
    }
    Err(bad_request("Invalid or expired token"))
}

fn require_auth(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer jwt-sora") => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })))),
    }
}

async fn start_game(
    axum::extract::State(backend): axum::extract::State<Backend>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_auth(&headers)?;
    let id = i64::try_from(backend.history.lock().unwrap().len()).unwrap() + 1;
    let game = game_json(id, "ACTIVE", &[]);
    *backend.game.lock().unwrap() = Some(game.clone());
    Ok(Json(game))
}

async fn ask(
    axum::extract::State(backend): axum::extract::State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_auth(&headers)?;
    let mut slot = backend.game.lock().unwrap();
    let Some(game) = slot.as_mut() else {
        return Err(bad_request("No active game"));
    };
    let question = body["question"].as_str().unwrap_or("").to_owned();
    let entry = json!({ "question": question, "answer": "Yes", "askedAt": "2024-05-01T10:00:05" });
    let history = game["conversationHistory"].as_array_mut().unwrap();
    history.push(entry);
    let total = history.len();
    game["questionsCount"] = json!(total);
    Ok(Json(json!({ "question": question, "answer": "Yes", "totalQuestions": total })))
}

async fn guess(
    axum::extract::State(backend): axum::extract::State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_auth(&headers)?;
    let Some(mut game) = backend.game.lock().unwrap().take() else {
        return Err(bad_request("No active game"));
    };
    let name = body["characterName"].as_str().unwrap_or("").to_owned();
    let won = name.eq_ignore_ascii_case("Naruto Uzumaki");
    game["status"] = json!(if won { "WON" } else { "LOST" });
    game["guessedCorrectly"] = json!(won);
    game["finalGuess"] = json!(name);
    game["revealedCharacter"] = json!("Naruto Uzumaki");
    game["endedAt"] = json!("2024-05-01T10:05:00");
    backend.history.lock().unwrap().push(game.clone());
    Ok(Json(game))
}

async fn current(
    axum::extract::State(backend): axum::extract::State<Backend>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_auth(&headers)?;
    match backend.game.lock().unwrap().clone() {
        Some(game) => Ok(Json(game)),
        None => Err((StatusCode::NOT_FOUND, Json(json!({ "message": "No active game" })))),
    }
}

async fn history(
    axum::extract::State(backend): axum::extract::State<Backend>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_auth(&headers)?;
    Ok(Json(Value::Array(backend.history.lock().unwrap().clone())))
}

/// In-memory stand-in for the game backend. The only valid login is
/// `sora` / `secret`; the only accepted bearer is `jwt-sora`; the secret
/// character is "Naruto Uzumaki"; the only valid email/reset token is `good`.
pub(crate) fn fake_backend() -> axum::Router {
    use axum::routing::post;

    axum::Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify-email", get(token_message))
        .route("/api/auth/resend-verification", post(email_message))
        .route("/api/auth/password-reset/request", post(email_message))
        .route("/api/auth/password-reset/validate", get(token_message))
        .route("/api/auth/password-reset/confirm", post(confirm_reset))
        .route("/api/game/start", post(start_game))
        .route("/api/game/ask", post(ask))
        .route("/api/game/guess", post(guess))
        .route("/api/game/current", get(current))
        .route("/api/game/history", get(history))
        .with_state(Backend::default())
}
