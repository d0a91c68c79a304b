mod engine;
mod session;

pub use engine::FocusTimer;
pub use session::{FocusSession, SessionState};
