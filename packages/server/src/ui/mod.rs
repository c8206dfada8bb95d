//! Playback sync server implementation.

mod error;
mod extract;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ApiError;
pub use extract::AuthenticatedUser;
pub use server::{Server, router};
pub use state::AppState;
