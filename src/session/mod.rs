//! Sessions
//!
//! Server-held state of one user's navigation, configuration and last
//! extraction result.

mod state;
mod store;

pub use state::{transition, Action, Screen, SessionState, TransitionError};
pub use store::{Session, SessionError, SessionStore};
