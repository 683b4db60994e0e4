use anyhow::Result;
use clap::Args;
use composer_core::{Composer, ComposerConfig, Lang};
use uuid::Uuid;

use super::{print_json, read_chunks};

#[derive(Args)]
pub struct ComposeArgs {
    /// Trace id echoed in the result and logs (generated when omitted)
    #[arg(long)]
    pub trace_id: Option<String>,

    /// Extractive answer to compose from
    #[arg(long)]
    pub answer: String,

    /// JSON file with the source chunks, or - for stdin
    #[arg(long, value_name = "FILE")]
    pub chunks: String,

    /// Answer language (EN or HI)
    #[arg(long, default_value = "EN")]
    pub lang: Lang,
}

pub async fn run(args: ComposeArgs, config: &ComposerConfig) -> Result<()> {
    let chunks = read_chunks(&args.chunks)?;
    let trace_id = args
        .trace_id
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let composer = Composer::open(config).await?;
    let result = composer.compose(&trace_id, &args.answer, &chunks, args.lang);
    composer.shutdown().await;

    print_json(&result)
}
