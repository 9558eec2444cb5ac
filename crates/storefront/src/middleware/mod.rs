//! HTTP middleware and session plumbing.

pub mod session;

pub use session::{
    SESSION_COOKIE_NAME, clear_session, create_session_layer, current_session,
    set_current_session,
};
