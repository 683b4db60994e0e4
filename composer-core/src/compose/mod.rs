//! Composition orchestration
//!
//! [`Composer`] drives one request through the strategy policy, the
//! rendering collaborators and grounding verification, with a bounded
//! fallback sequence when the text is not grounded.

mod composer;
mod machine;

pub use composer::{Composer, IMPROVED_SUFFIX};
