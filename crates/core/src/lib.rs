//! Core business logic for spshare.
//!
//! Services hold their repositories explicitly and are wired together by the
//! server binary; nothing here reaches for a global connection.

pub mod services;

pub use services::*;
