//! HTTP API for volunteer-hub.
//!
//! Routes are mounted under `/api` by the server. Requests carrying
//! `Authorization: Bearer <token>` are resolved to a user by
//! [`middleware::auth_middleware`]; handlers then pick the principal up through
//! the extractors in [`extractors`].

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod upload;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
