//! User feedback on composed answers
//!
//! Accepted ratings are appended to a [`FeedbackLog`] and summarized by the
//! [`FeedbackCollector`]. The reward they carry is fed to the strategy
//! policy by the composer.

mod collector;
mod log;
mod types;

pub use collector::{FeedbackCollector, FeedbackSummary};
pub use log::{FeedbackLog, InMemoryFeedbackLog, JsonlFeedbackLog};
pub use types::*;
