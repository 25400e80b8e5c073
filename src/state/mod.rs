//! Client-side session and game state.
//!
//! DESIGN
//! ======
//! Leaf to root: `notifier` (in-process change signal), `credentials`
//! (durable token + cached user), `snapshot` (memoized derived value),
//! `session` (watch binding with hydration). `game` is the local cache of
//! the current game, independent of the session chain.

pub mod credentials;
pub mod game;
pub mod notifier;
pub mod session;
pub mod snapshot;
