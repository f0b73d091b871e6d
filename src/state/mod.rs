//! State machine module for spelling sessions
//!
//! Provides an explicit state machine with three states:
//! - Idle: Created, not consuming tokens yet
//! - Listening: Letters, deletes and confirm are applied to the buffer
//! - Terminated: Confirmed or aborted, later tokens are ignored

mod machine;

pub use machine::{Notification, SpellingSession, DEFAULT_CONFIDENCE_THRESHOLD};
