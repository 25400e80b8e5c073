//! Local cache of the current game and the history list.
//!
//! DESIGN
//! ======
//! Mirrors the server state closely enough to render without refetching
//! after every action: a started or finished game replaces `current`, an
//! answer is appended to the conversation locally, and any change that
//! affects the finished-games list marks history stale so the next view
//! refetches it.

#[cfg(test)]
#[path = "game_test.rs"]
mod game_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::net::types::{Game, QuestionAnswerResponse, QuestionResponse};

#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub current: Option<Game>,
    pub history: Vec<Game>,
    pub history_stale: bool,
    pub error: Option<String>,
}

impl GameState {
    /// A freshly started game becomes current; history is stale.
    pub fn apply_started(&mut self, game: Game) {
        self.current = Some(game);
        self.history_stale = true;
        self.error = None;
    }

    /// Result of `GET /game/current`.
    pub fn apply_current(&mut self, game: Option<Game>) {
        self.current = game;
    }

    /// Append an answered question to the current game, stamped now.
    ///
    /// No-op without a current game.
    pub fn apply_answer(&mut self, answer: &QuestionAnswerResponse) {
        self.apply_answer_at(answer, OffsetDateTime::now_utc());
    }

    fn apply_answer_at(&mut self, answer: &QuestionAnswerResponse, now: OffsetDateTime) {
        let Some(game) = self.current.as_mut() else {
            return;
        };
        game.questions_count = answer.total_questions;
        game.conversation_history.push(QuestionResponse {
            question: answer.question.clone(),
            answer: answer.answer.clone(),
            asked_at: now.format(&Rfc3339).unwrap_or_default(),
        });
        self.error = None;
    }

    /// A guess result replaces `current`; history is stale.
    pub fn apply_guess_result(&mut self, game: Game) {
        self.current = Some(game);
        self.history_stale = true;
        self.error = None;
    }

    pub fn apply_history(&mut self, history: Vec<Game>) {
        self.history = history;
        self.history_stale = false;
    }

    /// Whether history must be refetched; clears the flag.
    pub fn take_history_stale(&mut self) -> bool {
        std::mem::take(&mut self.history_stale)
    }

    /// Whether the current game is still accepting questions.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(|game| !game.status.is_finished())
    }

    /// Drop everything, e.g. on sign-out.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
