use clap::{Parser, Subcommand};
use donescore_corpus::DEFAULT_DOMAIN;

#[derive(Parser)]
#[command(
    name = "donescore",
    about = "Done-score gate: a deterministic 0-100 quality score for structured document corpora",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score one domain's corpus and gate it against a threshold
    Score {
        /// Docs root holding one directory per domain
        #[arg(long)]
        docs_root: String,

        /// Minimum overall score (0-100) required to pass
        #[arg(long, default_value = "70")]
        min_score: String,

        /// Domain profile to score
        #[arg(long, default_value = DEFAULT_DOMAIN)]
        domain: String,

        /// TOML file overriding corpus configuration and domain profiles
        #[arg(long)]
        config: Option<String>,

        /// JSON object mapping IDs to artifact paths (relative to the docs root)
        #[arg(long)]
        registry: Option<String>,

        /// Write corpus.txt and edges.tsv into this directory
        #[arg(long)]
        emit_intermediates: Option<String>,

        /// Print nothing; report through the exit code only
        #[arg(long)]
        quiet: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective domain profiles and scoring configuration
    Profiles {
        /// TOML file overriding corpus configuration and domain profiles
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
