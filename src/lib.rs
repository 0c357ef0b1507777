pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod extract;
pub mod fallback;
pub mod prompt;
pub mod rules;
pub mod schema;
pub mod session;
pub mod store;

// Convenient re-exports
pub use driver::SessionDriver;
pub use events::SessionEvent;
pub use extract::{extract_object, parse_payload};
pub use session::{Phase, QuizSession, SessionState};
