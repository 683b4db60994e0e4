//! States of one composition run

use crate::strategy::Strategy;

/// Next action of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Select,
    Render(Strategy),
    Verify,
    FallbackExtractive,
    FallbackImprove,
    Done,
}

impl Step {
    /// Transition out of VERIFY after verification number `attempt`
    pub(crate) fn after_verify(grounded: bool, attempt: u32, max_attempts: u32) -> Self {
        if grounded || attempt >= max_attempts {
            Self::Done
        } else if attempt == 1 {
            Self::FallbackExtractive
        } else {
            Self::FallbackImprove
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Render(_) => "render",
            Self::Verify => "verify",
            Self::FallbackExtractive => "fallback_extractive",
            Self::FallbackImprove => "fallback_improve",
            Self::Done => "done",
        }
    }
}
