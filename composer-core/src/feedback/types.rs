use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ratings are on a 1-5 scale
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Ratings at or above this count as high satisfaction
pub const HIGH_SATISFACTION_RATING: u8 = 4;

/// Aspect of the answer a rating refers to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    #[default]
    Quality,
    Relevance,
    Accuracy,
    Helpfulness,
    Overall,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Relevance => "relevance",
            Self::Accuracy => "accuracy",
            Self::Helpfulness => "helpfulness",
            Self::Overall => "overall",
        }
    }

    pub fn all() -> &'static [FeedbackType] {
        &[
            Self::Quality,
            Self::Relevance,
            Self::Accuracy,
            Self::Helpfulness,
            Self::Overall,
        ]
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing FeedbackType from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFeedbackTypeError(String);

impl fmt::Display for ParseFeedbackTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown feedback type: {}", self.0)
    }
}

impl std::error::Error for ParseFeedbackTypeError {}

impl FromStr for FeedbackType {
    type Err = ParseFeedbackTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "relevance" => Ok(Self::Relevance),
            "accuracy" => Ok(Self::Accuracy),
            "helpfulness" => Ok(Self::Helpfulness),
            "overall" => Ok(Self::Overall),
            _ => Err(ParseFeedbackTypeError(s.to_string())),
        }
    }
}

/// Whether `rating` is on the 1-5 scale
pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// One accepted rating of a composed answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Reward derived from the rating and the trace outcome
    pub reward: f64,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(
        trace_id: impl Into<String>,
        rating: u8,
        feedback_type: FeedbackType,
        comments: Option<String>,
        reward: f64,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            trace_id: trace_id.into(),
            user_id: None,
            rating,
            feedback_type,
            comments,
            reward,
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
