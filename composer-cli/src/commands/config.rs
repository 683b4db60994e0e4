use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};
use composer_core::ComposerConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration and data file paths
    Path,
}

pub fn run(args: ConfigArgs, config: &ComposerConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Path => show_paths(config),
    }
}

fn show_config(config: &ComposerConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths(config: &ComposerConfig) -> Result<()> {
    let paths = config.paths();
    println!("User config:    {}", ConfigLoader::user_config_path().display());
    println!("Project config: {}", ConfigLoader::project_config_path().display());
    println!("Data dir:       {}", paths.data_dir.display());
    println!("Policy:         {}", paths.policy_path.display());
    println!("Traces:         {}", paths.traces_path.display());
    println!("Feedback:       {}", paths.feedback_path.display());
    Ok(())
}
