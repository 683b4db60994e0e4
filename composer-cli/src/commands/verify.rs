use anyhow::Result;
use clap::Args;
use composer_core::grounding::SentenceReport;
use composer_core::{ComposerConfig, GroundingResult, GroundingScorer};
use serde::Serialize;

use super::{print_json, read_chunks};

#[derive(Args)]
pub struct VerifyArgs {
    /// Text to verify
    #[arg(long)]
    pub text: String,

    /// JSON file with the source chunks, or - for stdin
    #[arg(long, value_name = "FILE")]
    pub chunks: String,
}

#[derive(Serialize)]
struct Verification {
    grounding: GroundingResult,
    sentences: SentenceReport,
}

pub fn run(args: VerifyArgs, config: &ComposerConfig) -> Result<()> {
    let chunks = read_chunks(&args.chunks)?;
    let scorer = GroundingScorer::new(config.grounding.clone());

    print_json(&Verification {
        grounding: scorer.verify(&args.text, &chunks),
        sentences: scorer.verify_sentences(&args.text, &chunks),
    })
}
