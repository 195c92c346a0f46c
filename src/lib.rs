//! Minimal user-account backend: registration with email verification,
//! cookie-based JWT sessions, and one-time password-reset tokens.

pub mod app;
pub mod config;
pub mod error;
pub mod mailer;
pub mod state;
pub mod users;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
