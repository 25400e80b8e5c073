use super::*;

// =============================================================
// AuthResponse
// =============================================================

#[test]
fn auth_response_parses_backend_shape() {
    let json = r#"{"token":"jwt","type":"Bearer","userId":7,"username":"sora","email":"sora@example.com"}"#;
    let resp: AuthResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.token, "jwt");
    assert_eq!(resp.token_type, "Bearer");
    assert_eq!(resp.user_id, 7);
}

#[test]
fn auth_response_defaults_missing_type_to_bearer() {
    let json = r#"{"token":"jwt","userId":7,"username":"sora","email":"sora@example.com"}"#;
    let resp: AuthResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.token_type, DEFAULT_TOKEN_TYPE);
}

#[test]
fn auth_response_user_copies_identity_fields() {
    let resp = AuthResponse {
        token: "jwt".to_owned(),
        token_type: "Bearer".to_owned(),
        user_id: 3,
        username: "kai".to_owned(),
        email: "kai@example.com".to_owned(),
    };
    assert_eq!(
        resp.user(),
        CachedUser { user_id: 3, username: "kai".to_owned(), email: "kai@example.com".to_owned() }
    );
}

// =============================================================
// CachedUser
// =============================================================

#[test]
fn cached_user_serializes_camel_case() {
    let user = CachedUser { user_id: 1, username: "a".to_owned(), email: "a@x.com".to_owned() };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json, serde_json::json!({"userId": 1, "username": "a", "email": "a@x.com"}));
}

// =============================================================
// Game
// =============================================================

#[test]
fn game_parses_active_game_without_optional_fields() {
    let json = r#"{
        "gameId": 12,
        "status": "ACTIVE",
        "questionsCount": 1,
        "startedAt": "2024-05-01T10:00:00",
        "guessedCorrectly": false,
        "conversationHistory": [
            {"question": "Is your character human?", "answer": "Yes", "askedAt": "2024-05-01T10:00:05"}
        ]
    }"#;
    let game: Game = serde_json::from_str(json).unwrap();
    assert_eq!(game.status, GameStatus::Active);
    assert!(!game.status.is_finished());
    assert_eq!(game.ended_at, None);
    assert_eq!(game.conversation_history.len(), 1);
    assert_eq!(game.conversation_history[0].answer, "Yes");
}

#[test]
fn game_parses_finished_game() {
    let json = r#"{
        "gameId": 12,
        "status": "WON",
        "questionsCount": 4,
        "startedAt": "2024-05-01T10:00:00",
        "endedAt": "2024-05-01T10:05:00",
        "guessedCorrectly": true,
        "finalGuess": "Naruto Uzumaki",
        "revealedCharacter": "Naruto Uzumaki",
        "conversationHistory": []
    }"#;
    let game: Game = serde_json::from_str(json).unwrap();
    assert_eq!(game.status, GameStatus::Won);
    assert!(game.status.is_finished());
    assert_eq!(game.revealed_character.as_deref(), Some("Naruto Uzumaki"));
}

#[test]
fn game_status_serializes_upper_case() {
    assert_eq!(serde_json::to_string(&GameStatus::Lost).unwrap(), "\"LOST\"");
}

// =============================================================
// Request bodies
// =============================================================

#[test]
fn register_request_uses_recaptcha_token_key() {
    let req = RegisterRequest { username: "u", email: "e@x.com", password: "secret", recaptcha_token: "r" };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["recaptchaToken"], "r");
}

#[test]
fn guess_and_reset_requests_use_camel_case() {
    let guess = serde_json::to_value(GuessRequest { character_name: "Goku" }).unwrap();
    assert_eq!(guess, serde_json::json!({"characterName": "Goku"}));
    let reset = serde_json::to_value(ResetPasswordRequest { token: "t", new_password: "p" }).unwrap();
    assert_eq!(reset, serde_json::json!({"token": "t", "newPassword": "p"}));
}
