use super::*;
use crate::net::test_support::{Fixture, client_for, fake_backend, spawn};
use crate::net::types::GameStatus;

async fn fixture() -> Fixture {
    let origin = spawn(fake_backend()).await;
    client_for(&origin)
}

async fn signed_in() -> Fixture {
    let fx = fixture().await;
    let auth = fx.client.login(&LoginRequest { username: "sora", password: "secret" }).await.unwrap();
    fx.client.credentials().handle_auth_response(&auth);
    fx
}

// =============================================================
// Auth endpoints
// =============================================================

#[tokio::test]
async fn login_returns_auth_response_without_persisting() {
    let fx = fixture().await;
    let auth = fx.client.login(&LoginRequest { username: "sora", password: "secret" }).await.unwrap();
    assert_eq!(auth.token, "jwt-sora");
    assert_eq!(auth.user_id, 7);
    assert!(!fx.client.credentials().is_authenticated());
}

#[tokio::test]
async fn login_rejection_surfaces_backend_message() {
    let fx = fixture().await;
    let err = fx.client.login(&LoginRequest { username: "sora", password: "nope" }).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message("Login failed. Please try again."), "Invalid username or password");
}

#[tokio::test]
async fn register_sends_recaptcha_token() {
    let fx = fixture().await;
    let body = RegisterRequest { username: "mika", email: "mika@x.com", password: "secret1", recaptcha_token: "tok" };
    let resp = fx.client.register(&body).await.unwrap();
    assert_eq!(resp.message, "Registered mika");
}

#[tokio::test]
async fn verify_email_passes_token_as_query() {
    let fx = fixture().await;
    assert_eq!(fx.client.verify_email("good").await.unwrap().message, "Token is valid");
    let err = fx.client.verify_email("bad").await.unwrap_err();
    assert_eq!(err.user_message("Verification failed."), "Invalid or expired token");
}

#[tokio::test]
async fn password_reset_flow() {
    let fx = fixture().await;
    let sent = fx.client.request_password_reset("sora@example.com").await.unwrap();
    assert_eq!(sent.message, "Sent to sora@example.com");
    fx.client.validate_reset_token("good").await.unwrap();
    let done = fx.client.confirm_password_reset("good", "newsecret").await.unwrap();
    assert_eq!(done.message, "Password updated");
    assert!(fx.client.confirm_password_reset("stale", "newsecret").await.is_err());
}

#[tokio::test]
async fn resend_verification_posts_email() {
    let fx = fixture().await;
    let resp = fx.client.resend_verification("kai@x.com").await.unwrap();
    assert_eq!(resp.message, "Sent to kai@x.com");
}

// =============================================================
// Game endpoints
// =============================================================

#[tokio::test]
async fn current_game_is_none_on_404() {
    let fx = signed_in().await;
    assert_eq!(fx.client.current_game().await.unwrap(), None);
}

#[tokio::test]
async fn full_game_round() {
    let fx = signed_in().await;

    let game = fx.client.start_game().await.unwrap();
    assert_eq!(game.status, GameStatus::Active);
    assert_eq!(game.questions_count, 0);

    let answer = fx.client.ask_question("Is your character a ninja?").await.unwrap();
    assert_eq!(answer.answer, "Yes");
    assert_eq!(answer.total_questions, 1);

    let current = fx.client.current_game().await.unwrap().unwrap();
    assert_eq!(current.conversation_history.len(), 1);

    let result = fx.client.submit_guess("Naruto Uzumaki").await.unwrap();
    assert_eq!(result.status, GameStatus::Won);
    assert!(result.guessed_correctly);

    let history = fx.client.game_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].final_guess.as_deref(), Some("Naruto Uzumaki"));
}

#[tokio::test]
async fn game_call_without_token_triggers_sign_in_redirect() {
    let fx = fixture().await;
    let err = fx.client.start_game().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(fx.navigator.visited(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn current_game_unauthorized_is_not_swallowed() {
    let fx = fixture().await;
    assert!(matches!(fx.client.current_game().await, Err(ApiError::Unauthorized)));
}
