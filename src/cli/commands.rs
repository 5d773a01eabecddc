use clap::Parser;

/// Settings come from the environment (and an optional `.env` file).
#[derive(Parser)]
#[command(name = "social-feed")]
#[command(about = "Refresh the Instagram and TikTok entries of assets/social-feed.json")]
#[command(version)]
pub struct Cli {}
