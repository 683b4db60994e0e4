//! Rendering collaborators
//!
//! The orchestrator renders through three seams: a [`TemplateRenderer`]
//! turning a strategy into text, a [`Smoother`] adjusting fluency and an
//! optional [`Enhancer`]. Each is a pure function of its inputs.
//!
//! Built-in implementations:
//! - [`BuiltinTemplates`]: bilingual templates for every strategy
//! - [`NgramSmoother`]: phrase-table smoothing
//! - [`RuleEnhancer`]: deterministic polishing rules

mod enhancer;
mod smoother;
mod templates;

pub use enhancer::RuleEnhancer;
pub use smoother::NgramSmoother;
pub use templates::{BuiltinTemplates, minimal_template, numbered_citations};

use crate::error::Result;
use crate::strategy::Strategy;
use crate::types::{CompositionContext, Lang};

/// Renders a strategy's template for one request
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, strategy: Strategy, context: &CompositionContext<'_>) -> Result<String>;
}

/// Fluency adjustment of rendered text
pub trait Smoother: Send + Sync {
    fn smooth(&self, text: &str, lang: Lang) -> Result<String>;
}

/// Best-effort polishing stage
pub trait Enhancer: Send + Sync {
    /// Whether the stage should run at all
    fn is_available(&self) -> bool;

    fn enhance(&self, text: &str, context: &CompositionContext<'_>) -> Result<String>;
}
