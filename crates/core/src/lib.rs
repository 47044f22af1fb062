//! Core business logic for volunteer-hub.

pub mod pagination;
pub mod services;

pub use pagination::{Page, PageRequest};
pub use services::*;
