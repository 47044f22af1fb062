//! Common utilities and shared types for volunteer-hub.
//!
//! This crate provides foundational components used across all volunteer-hub crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers via [`IdGenerator`], plus validation
//!   of client-supplied identifiers
//! - **Storage**: Local upload storage with the upload allow-list
//!
//! # Example
//!
//! ```no_run
//! use volunteer_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, ensure_valid_id, ensure_valid_uuid};
pub use storage::{LocalStorage, StorageBackend, UploadKind, UploadedFile, generate_storage_key};
