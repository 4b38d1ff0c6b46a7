/// Session management module - Gateway

mod state;

pub use state::{ChatTurn, Role, SessionState};
