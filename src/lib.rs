//! # guessgame
//!
//! Client library for the character guessing game backend.
//!
//! This crate contains the durable credential store, the in-process auth
//! change notifier, the memoized session snapshot and its watch binding,
//! the authenticated HTTP pipeline, typed API calls, form validation, and
//! the local game cache. It is UI-framework independent: browser concerns
//! (local storage, idle callbacks, navigation) are injected as traits.

pub mod client;
pub mod config;
pub mod net;
pub mod state;
pub mod storage;
pub mod util;
