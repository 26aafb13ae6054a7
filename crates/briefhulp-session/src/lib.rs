//! Briefhulp Session: what one user is working on: the letter, its
//! explanation, the follow-up transcript and whether feedback was given.
//! Sessions live in memory only; feedback goes to a [`FeedbackSink`].

pub mod feedback;
pub mod manager;
pub mod types;

pub use feedback::FeedbackSink;
pub use manager::SessionManager;
pub use types::{Session, SessionMode};
