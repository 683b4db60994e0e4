use anyhow::{Result, bail};
use clap::Args;
use composer_core::{Composer, ComposerConfig, FeedbackType};

#[derive(Args)]
pub struct FeedbackArgs {
    /// Trace id of the composition being rated
    #[arg(long)]
    pub trace_id: String,

    /// Rating from 1 (poor) to 5 (excellent)
    #[arg(long)]
    pub rating: u8,

    /// What the rating refers to
    #[arg(long = "type", default_value = "quality")]
    pub feedback_type: FeedbackType,

    /// Free-form comments
    #[arg(long)]
    pub comments: Option<String>,
}

pub async fn run(args: FeedbackArgs, config: &ComposerConfig) -> Result<()> {
    let composer = Composer::open(config).await?;
    let accepted = composer
        .submit_feedback(&args.trace_id, args.rating, args.feedback_type, args.comments)
        .await;
    composer.shutdown().await;

    if !accepted {
        bail!(
            "Feedback rejected: rating must be 1-5 and trace {} must exist",
            args.trace_id
        );
    }
    println!("Feedback recorded for {}", args.trace_id);
    Ok(())
}
