//! Utility helpers shared across client flows.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pure functions with no I/O, kept apart from the networking and state
//! modules so front ends can call them before touching the backend.

pub mod validation;
