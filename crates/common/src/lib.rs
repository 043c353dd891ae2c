//! Common utilities and shared types for spshare.
//!
//! This crate provides foundational components used across all spshare crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Quota**: Typed quota violations via [`QuotaViolation`]
//! - **ID Generation**: Session tokens and upload file names via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use spshare_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let token = id_gen.generate_token();
//!     println!("Listening on port {} with token {}", config.server.port, token);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod quota;

pub use config::Config;
pub use error::{AppError, AppResult, GENERIC_FAILURE_MESSAGE};
pub use id::IdGenerator;
pub use quota::{BYTES_PER_MB, QuotaKind, QuotaViolation, bytes_to_mb};
